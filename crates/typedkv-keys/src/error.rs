use thiserror::Error;
use typedkv_codec::{CodecError, ValueKind};

/// Errors produced while validating or deriving keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The candidate's variant is not allowed as a key.
    #[error("{kind} values cannot be used as keys")]
    NotHashable { kind: ValueKind },

    /// The key could not be encoded.
    #[error("key encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("invalid key id: {0}")]
    InvalidKeyId(String),
}

/// Result alias for key operations.
pub type KeyResult<T> = Result<T, KeyError>;
