use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::traits::Backend;

type Records = HashMap<Vec<u8>, Vec<u8>>;

/// In-memory, HashMap-based backend.
///
/// Intended for tests and embedding. Records are held behind a `RwLock` for
/// safe concurrent access and are copied on read and write.
pub struct InMemoryBackend {
    records: RwLock<Records>,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Total key and value bytes across all records.
    pub fn total_bytes(&self) -> StoreResult<u64> {
        Ok(self
            .read()?
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum())
    }

    /// Remove all records.
    pub fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Sorted list of all stored keys.
    pub fn keys(&self) -> StoreResult<Vec<Vec<u8>>> {
        let mut keys: Vec<Vec<u8>> = self.read()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Records>> {
        self.records.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Records>> {
        self.records.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for InMemoryBackend {
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.write()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        match self.write()?.remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(key)),
        }
    }

    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.records.read().map(|r| r.len()).ok();
        f.debug_struct("InMemoryBackend")
            .field("record_count", &count)
            .finish()
    }
}
