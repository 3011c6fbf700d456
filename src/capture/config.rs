use std::convert::TryInto;
use std::time::Duration;
use anyhow::{Result, anyhow};
use pcap::{Capture, Active};

#[derive(Clone, Debug)]
pub struct Config {
    pub device:      String,
    pub interval:    Duration,
    pub buffer_size: u64,
    pub snaplen:     u64,
    pub promisc:     bool,
}

pub fn capture(cfg: &Config) -> Result<Capture<Active>> {
    let mut cap = Capture::from_device(cfg.device.as_str())?
        .buffer_size(cfg.buffer_size as i32)
        .timeout(cfg.interval.as_millis().try_into()?)
        .snaplen(cfg.snaplen as i32)
        .promisc(cfg.promisc)
        .open()?;

    match cap.list_datalinks()?.into_iter().find(|lt| lt.0 == 1) {
        Some(linktype) => cap.set_datalink(linktype)?,
        None           => return Err(anyhow!("device {} not ethernet", cfg.device)),
    }

    Ok(cap)
}
