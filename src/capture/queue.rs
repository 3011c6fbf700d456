use std::collections::HashSet;
use std::mem;
use anyhow::Result;
use crossbeam_channel::Sender;
use log::debug;
use parking_lot::Mutex;
use super::record::{Fingerprint, FlowRecord};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Work {
    Batch(Vec<FlowRecord>),
    Shutdown,
}

pub struct Queue {
    state: Mutex<State>,
    tx:    Sender<Work>,
    size:  usize,
}

struct State {
    seen:   HashSet<Fingerprint>,
    buffer: Vec<FlowRecord>,
}

impl Queue {
    pub fn new(size: usize, tx: Sender<Work>) -> Self {
        Self {
            state: Mutex::new(State {
                seen:   HashSet::new(),
                buffer: Vec::with_capacity(size),
            }),
            tx:    tx,
            size:  size,
        }
    }

    /// Admit one record: first occurrence this run is buffered, repeats are
    /// suppressed. A full buffer is swapped out inside the critical section
    /// and pushed after the lock is released, so the channel's backpressure
    /// blocks only the capture path.
    pub fn record(&self, record: FlowRecord) -> Result<bool> {
        let print = record.fingerprint()?;

        let batch = {
            let mut state = self.state.lock();

            if !state.seen.insert(print) {
                return Ok(false);
            }

            state.buffer.push(record);

            match state.buffer.len() >= self.size {
                true  => mem::replace(&mut state.buffer, Vec::with_capacity(self.size)),
                false => return Ok(true),
            }
        };

        self.push(batch)?;

        Ok(true)
    }

    pub fn drain(&self) -> Result<()> {
        let batch = mem::take(&mut self.state.lock().buffer);
        match batch.is_empty() {
            true  => Ok(()),
            false => self.push(batch),
        }
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.seen.clear();
        state.buffer.clear();
    }

    fn push(&self, batch: Vec<FlowRecord>) -> Result<()> {
        debug!("queueing batch of {}", batch.len());
        self.tx.send(Work::Batch(batch))?;
        Ok(())
    }
}
