use std::sync::{Arc, Mutex};

use super::{PendingStore, StorageError};
use crate::changelog::PendingAction;

#[derive(Debug, Default)]
struct Slot {
    json: Option<String>,
    fail_writes: bool,
}

/// In-process store holding the serialized buffer.
///
/// Clones share the same slot, so a test can keep a handle, drop the article
/// and build a new one over the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `save` fail, as a full disk or quota would.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.fail_writes = fail;
        }
    }

    /// The raw JSON currently stored.
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.json.clone())
    }
}

impl PendingStore for MemoryStore {
    fn load(&self) -> Result<Vec<PendingAction>, StorageError> {
        let Ok(slot) = self.slot.lock() else {
            return Err(StorageError::Unavailable("memory store poisoned".to_string()));
        };
        match &slot.json {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, actions: &[PendingAction]) -> Result<(), StorageError> {
        let Ok(mut slot) = self.slot.lock() else {
            return Err(StorageError::Unavailable("memory store poisoned".to_string()));
        };
        if slot.fail_writes {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        slot.json = Some(serde_json::to_string(actions)?);
        Ok(())
    }
}
