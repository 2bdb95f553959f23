use thiserror::Error;
use typedkv_codec::CodecError;
use typedkv_keys::{Key, KeyError};
use typedkv_store::StoreError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("key not found: {0}")]
    KeyNotFound(Key),

    #[error("key encodes to {size} bytes, limit is {limit}")]
    KeyTooLarge { size: usize, limit: usize },

    #[error("value encodes to {size} bytes, limit is {limit}")]
    ValueTooLarge { size: usize, limit: usize },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// The key's variant may not be used as a key.
    pub fn is_not_hashable(&self) -> bool {
        matches!(self, Self::Key(KeyError::NotHashable { .. }))
    }

    /// No record exists for the key.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::KeyNotFound(_) => true,
            Self::Store(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Stored bytes could not be decoded.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self.codec_error(),
            Some(CodecError::CorruptPayload { .. })
        )
    }

    /// The key or value has no encoding.
    pub fn is_unsupported_type(&self) -> bool {
        matches!(
            self.codec_error(),
            Some(CodecError::UnsupportedType { .. })
        )
    }

    fn codec_error(&self) -> Option<&CodecError> {
        match self {
            Self::Codec(e) | Self::Key(KeyError::Codec(e)) => Some(e),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
