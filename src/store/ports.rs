use std::fs;
use anyhow::Result;
use log::info;
use crate::capture::Ports;

pub fn load(path: &str) -> Result<Ports> {
    let data  = fs::read(path)?;
    let ports = serde_json::from_slice::<Ports>(&data)?;

    info!("{} known ports loaded from {}", ports.len(), path);

    Ok(ports)
}
