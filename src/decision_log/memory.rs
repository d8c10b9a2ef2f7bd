//! In-memory decision store.

use super::{DecisionFilter, DecisionLogEntry, DecisionStore, StoreError};
use std::sync::{Arc, RwLock};

type Snapshot = Arc<Vec<Arc<DecisionLogEntry>>>;

/// Decision store backed by a copy-on-write vector.
///
/// The lock is held only to swap or clone the `Arc`; queries filter a
/// snapshot after releasing it, so a long query never delays an append.
#[derive(Debug, Default)]
pub struct InMemoryDecisionLog {
    entries: RwLock<Snapshot>,
}

impl InMemoryDecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshot().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.entries.read().map_err(|_| StoreError::Poisoned)?.clone())
    }
}

impl DecisionStore for InMemoryDecisionLog {
    fn append(&self, entry: &DecisionLogEntry) -> Result<(), StoreError> {
        let entry = Arc::new(entry.clone());
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        // Copies the pointer list only while an older snapshot is still alive
        Arc::make_mut(&mut *entries).push(entry);
        Ok(())
    }

    fn query(&self, filter: &DecisionFilter) -> Result<Vec<DecisionLogEntry>, StoreError> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .iter()
            .filter(|e| filter.matches(e))
            .map(|e| DecisionLogEntry::clone(e))
            .collect())
    }
}
