use anyhow::Result;
use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use tokio::runtime::Runtime;
use oracle_api::{Client, Verdict};
use crate::capture::{FlowRecord, Work};
use crate::store::{Store, BLOCKED, PASSED, RAW};
use super::cache::Cache;

pub struct Classify {
    client: Client,
    cache:  Cache,
    store:  Store,
    rt:     Runtime,
}

impl Classify {
    pub fn new(client: Client, store: Store) -> Result<Self> {
        Ok(Self {
            client: client,
            cache:  Cache::new(),
            store:  store,
            rt:     Runtime::new()?,
        })
    }

    pub fn reset(&mut self) {
        self.cache.reset();
    }

    pub fn run(&mut self, rx: Receiver<Work>) -> Result<()> {
        info!("consumer started");

        while let Ok(work) = rx.recv() {
            match work {
                Work::Batch(batch) => self.process(batch)?,
                Work::Shutdown     => break,
            }
        }

        info!("consumer stopped");

        Ok(())
    }

    pub(crate) fn process(&mut self, mut batch: Vec<FlowRecord>) -> Result<()> {
        self.classify(&mut batch)?;
        self.route(&batch);
        Ok(())
    }

    /// Assign a verdict to every record the cache already knows, then make
    /// one oracle round trip for the rest. Oracle failure leaves those
    /// verdicts pending; the batch is routed regardless.
    fn classify(&mut self, batch: &mut [FlowRecord]) -> Result<()> {
        let mut uncached = Vec::new();

        for (index, record) in batch.iter_mut().enumerate() {
            let print = record.fingerprint()?;
            match self.cache.get(&print) {
                Some(verdict) => record.verdict = Some(verdict),
                None          => uncached.push((index, print)),
            }
        }

        debug!("batch of {}: {} cached, {} uncached",
               batch.len(), batch.len() - uncached.len(), uncached.len());

        if uncached.is_empty() {
            return Ok(());
        }

        let descriptors = uncached.iter()
            .map(|(index, _)| batch[*index].descriptor())
            .collect();

        match self.rt.block_on(self.client.classify(descriptors)) {
            Ok(verdicts) => {
                for ((index, print), verdict) in uncached.into_iter().zip(verdicts) {
                    self.cache.put(print, verdict);
                    batch[index].verdict = Some(verdict);
                }
                debug!("{} verdicts cached", self.cache.len());
            }
            Err(e) => warn!("oracle request failed: {}", e),
        }

        Ok(())
    }

    /// Everything lands in the raw sink; denied records land in blocked and
    /// the rest, pending verdicts included, in passed.
    fn route(&mut self, batch: &[FlowRecord]) {
        let all: Vec<&FlowRecord> = batch.iter().collect();

        let (blocked, passed): (Vec<&FlowRecord>, Vec<&FlowRecord>) = batch.iter()
            .partition(|record| record.verdict == Some(Verdict::Deny));

        self.insert(RAW, &all);

        if !blocked.is_empty() {
            self.insert(BLOCKED, &blocked);
        }
        if !passed.is_empty() {
            self.insert(PASSED, &passed);
        }
    }

    fn insert(&mut self, table: &str, records: &[&FlowRecord]) {
        if let Err(e) = self.store.insert_batch(table, records) {
            warn!("insert of {} records into {} failed: {}", records.len(), table, e);
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Store {
        &self.store
    }
}
