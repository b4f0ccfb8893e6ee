use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use sealdrop_core::SecretId;

use super::{RelayStorage, StorageError, StoredRecord};

/// In-memory storage for development, tests and simulation.
///
/// A single mutex guards the map, so `take` is a plain `HashMap::remove` under
/// the lock and two concurrent takes can never both see the record. Nothing
/// survives a restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<HashMap<SecretId, StoredRecord>>>,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SecretId, StoredRecord>>, StorageError> {
        self.inner.lock().map_err(|_| StorageError::Io("memory storage lock poisoned".to_string()))
    }
}

impl RelayStorage for MemoryStorage {
    fn insert(&self, id: SecretId, record: &StoredRecord) -> Result<(), StorageError> {
        let mut records = self.lock()?;
        if records.contains_key(&id) {
            return Err(StorageError::Conflict { id: id.to_string() });
        }
        records.insert(id, record.clone());
        Ok(())
    }

    fn take(&self, id: SecretId, now_ms: u64) -> Result<Option<StoredRecord>, StorageError> {
        let removed = self.lock()?.remove(&id);
        Ok(removed.filter(|record| !record.is_expired(now_ms)))
    }

    fn purge_expired(&self, now_ms: u64) -> Result<usize, StorageError> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now_ms));
        Ok(before - records.len())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }
}
