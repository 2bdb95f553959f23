use thiserror::Error;

/// Errors produced while encoding or decoding values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value has no representation in the canonical encoding.
    #[error("unsupported type {type_name}: {reason}")]
    UnsupportedType { type_name: String, reason: String },

    /// The bytes are not a valid encoding: unknown tag, bad length field,
    /// truncation, trailing data or an invalid payload.
    #[error("corrupt payload at byte {offset}: {reason}")]
    CorruptPayload { offset: usize, reason: String },
}

impl CodecError {
    pub(crate) fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self::CorruptPayload {
            offset,
            reason: reason.into(),
        }
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
