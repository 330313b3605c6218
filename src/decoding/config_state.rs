use std::sync::{Arc, PoisonError, RwLock};

use crate::models::ConfigRecord;

/// The config currently in effect, shared between the decoder (single
/// writer) and anyone displaying samples.
///
/// Readers get an `Arc` snapshot, so a swap never exposes a half-written
/// record and a reader never holds the lock while rendering.
#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    current: Arc<RwLock<Option<Arc<ConfigRecord>>>>,
}

impl ConfigState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<ConfigRecord>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a new config and return the shared snapshot.
    pub fn replace(&self, record: ConfigRecord) -> Arc<ConfigRecord> {
        let record = Arc::new(record);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Arc::clone(&record));
        record
    }

    pub fn clear(&self) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
