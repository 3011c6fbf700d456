use std::collections::HashMap;
use std::fmt;
use anyhow::Result;
use serde::{Serialize, Deserialize};
use sha2::{Digest, Sha256};
use oracle_api::Verdict;
use super::decode::{Event, Network, Transport};

pub const NONE:    &str = "none";
pub const UNKNOWN: &str = "unknown";

pub type Ports = HashMap<String, String>;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub domain:               String,
    pub source_ip:            String,
    pub source_port:          String,
    pub destination_ip:       String,
    pub destination_port:     String,
    pub transport_protocol:   String,
    pub application_protocol: String,
    pub verdict:              Option<Verdict>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Fingerprint([u8; 32]);

impl FlowRecord {
    pub fn new(event: &Event, ports: &Ports) -> Self {
        let (source_ip, destination_ip) = match &event.network {
            Some(Network::V4 { src, dst }) => (src.to_string(), dst.to_string()),
            Some(Network::V6 { src, dst }) => (src.to_string(), dst.to_string()),
            None                           => (NONE.to_owned(), NONE.to_owned()),
        };

        let (source_port, destination_port, transport) = match event.transport {
            Some(Transport::Tcp { src, dst }) => (src.to_string(), dst.to_string(), "TCP"),
            Some(Transport::Udp { src, dst }) => (src.to_string(), dst.to_string(), "UDP"),
            None                              => (NONE.to_owned(), NONE.to_owned(), NONE),
        };

        let application_protocol = ports.get(&source_port)
            .or_else(|| ports.get(&destination_port))
            .cloned()
            .unwrap_or_else(|| UNKNOWN.to_owned());

        let domain = match &event.dns {
            Some(name) => name.trim_end_matches('.').to_owned(),
            None       => NONE.to_owned(),
        };

        Self {
            domain:               domain,
            source_ip:            source_ip,
            source_port:          source_port,
            destination_ip:       destination_ip,
            destination_port:     destination_port,
            transport_protocol:   transport.to_owned(),
            application_protocol: application_protocol,
            verdict:              None,
        }
    }

    pub fn fingerprint(&self) -> Result<Fingerprint> {
        // canonical form: serde_json maps are key-sorted
        let value = serde_json::to_value(self)?;
        let bytes = serde_json::to_vec(&value)?;
        Ok(Fingerprint(Sha256::digest(&bytes).into()))
    }

    pub fn descriptor(&self) -> String {
        format!("{} {} {} {} {} {} {}",
                self.domain,
                self.source_ip,         self.source_port,
                self.destination_ip,    self.destination_port,
                self.transport_protocol,
                self.application_protocol,
        )
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}
