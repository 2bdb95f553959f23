use std::sync::Arc;

use crate::error::StoreResult;

/// Byte-oriented key-value backend.
///
/// All implementations must satisfy these invariants:
/// - One record per key. A `put` on an existing key replaces its value.
/// - `delete` removes the record, or fails with `StoreError::NotFound` when
///   there is none. Nothing else is changed in that case.
/// - Keys and values are opaque. The backend never interprets them.
/// - Every call is a single round trip. Failures are returned, never retried.
pub trait Backend: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Fetch the value stored under `key`.
    ///
    /// Returns `Ok(None)` if there is no record.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Remove the record under `key`.
    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Check whether a record exists under `key`.
    ///
    /// Default implementation calls `get()`. Backends may override to avoid
    /// copying the value.
    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        (**self).contains(key)
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        (**self).contains(key)
    }
}

impl<B: Backend + ?Sized> Backend for &B {
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        (**self).delete(key)
    }

    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        (**self).contains(key)
    }
}
