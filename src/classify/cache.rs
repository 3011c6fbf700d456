use std::collections::HashMap;
use oracle_api::Verdict;
use crate::capture::Fingerprint;

/// Run-scoped fingerprint -> verdict memo. Owned by the consumer loop
/// alone, so no lock guards it; a parallel-consumer design would need one.
#[derive(Default)]
pub struct Cache {
    map: HashMap<Fingerprint, Verdict>,
}

impl Cache {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    pub fn get(&self, print: &Fingerprint) -> Option<Verdict> {
        self.map.get(print).copied()
    }

    pub fn put(&mut self, print: Fingerprint, verdict: Verdict) {
        self.map.insert(print, verdict);
    }

    pub fn reset(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
