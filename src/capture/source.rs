use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use anyhow::Result;
use log::{debug, info};
use super::{capture, decode, Config};
use super::queue::Queue;
use super::record::{FlowRecord, Ports};
use pcap::Error::*;

pub struct Source {
    cfg:   Config,
    ports: Arc<Ports>,
    queue: Arc<Queue>,
    stop:  Arc<AtomicBool>,
}

impl Source {
    pub fn new(cfg: Config, ports: Arc<Ports>, queue: Arc<Queue>, stop: Arc<AtomicBool>) -> Self {
        Self {
            cfg:   cfg,
            ports: ports,
            queue: queue,
            stop:  stop,
        }
    }

    pub fn poll(&mut self) -> Result<()> {
        let mut cap = capture(&self.cfg)?;

        info!("capturing on {}", self.cfg.device);

        while !self.stop.load(Ordering::Acquire) {
            match cap.next() {
                Ok(packet)          => self.record(packet.data)?,
                Err(TimeoutExpired) => continue,
                Err(NoMorePackets)  => break,
                Err(e)              => return Err(e.into()),
            }
        }

        self.queue.drain()?;

        info!("capture on {} stopped", self.cfg.device);

        Ok(())
    }

    fn record(&self, data: &[u8]) -> Result<()> {
        match decode(data) {
            Some(event) => {
                let record = FlowRecord::new(&event, &self.ports);
                self.queue.record(record)?;
            }
            None => debug!("dropped undecodable packet of {} bytes", data.len()),
        }
        Ok(())
    }
}
