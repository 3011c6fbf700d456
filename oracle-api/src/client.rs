use std::time::Duration;
use log::debug;
use serde::{Serialize, Deserialize};
use url::Url;
use crate::{Error, Verdict};

pub struct Client {
    client: reqwest::Client,
    url:    Url,
}

#[derive(Debug, Serialize)]
struct Request {
    input_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Response {
    predictions: Vec<Verdict>,
}

impl Client {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: client,
            url:    Url::parse(url)?,
        })
    }

    pub async fn classify(&self, descriptors: Vec<String>) -> Result<Vec<Verdict>, Error> {
        let n = descriptors.len();

        debug!("classifying {} descriptors", n);

        let request  = Request { input_text: descriptors };
        let response = self.send(&request).await?;

        match response.predictions.len() {
            m if m == n => Ok(response.predictions),
            m           => Err(Error::Mismatch(n, m)),
        }
    }

    async fn send(&self, request: &Request) -> Result<Response, Error> {
        let response = self.client.post(self.url.clone()).json(request).send().await?;
        let status   = response.status();
        match status {
            _ if status.is_success() => Ok(response.json().await?),
            _                        => Err(Error::Status(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_shape() -> Result<(), serde_json::Error> {
        let request = Request { input_text: vec!["none 10.0.0.1 1234 10.0.0.2 53 UDP dns".to_owned()] };
        let json    = serde_json::to_value(&request)?;
        assert_eq!(json["input_text"][0], "none 10.0.0.1 1234 10.0.0.2 53 UDP dns");
        Ok(())
    }

    #[test]
    fn response_shape() -> Result<(), serde_json::Error> {
        let response: Response = serde_json::from_str(r#"{"predictions": ["allow", "deny"]}"#)?;
        assert_eq!(response.predictions, vec![Verdict::Allow, Verdict::Deny]);
        Ok(())
    }

    #[test]
    fn response_rejects_unknown_verdict() {
        let response = serde_json::from_str::<Response>(r#"{"predictions": ["maybe"]}"#);
        assert!(response.is_err());
    }
}
