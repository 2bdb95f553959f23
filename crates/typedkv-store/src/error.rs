/// Errors from backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists under the given key.
    #[error("key not found: {}", hex::encode(.key))]
    NotFound { key: Vec<u8> },

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A log record could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A thread panicked while holding the backend lock.
    #[error("backend lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn not_found(key: &[u8]) -> Self {
        Self::NotFound { key: key.to_vec() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
