use crate::value::{Value, ValueKind};

/// One-byte discriminant that starts every encoded value.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Integer = b'#',
    Float = b'%',
    Bytes = b'\'',
    Text = b'"',
    Sequence = b'[',
    Tuple = b'(',
    Bool = b'?',
    Timestamp = b'+',
}

impl Tag {
    /// Every tag, in declaration order.
    pub const ALL: [Tag; 8] = [
        Tag::Integer,
        Tag::Float,
        Tag::Bytes,
        Tag::Text,
        Tag::Sequence,
        Tag::Tuple,
        Tag::Bool,
        Tag::Timestamp,
    ];

    /// Parse a tag byte. Returns `None` for unknown discriminants.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'#' => Some(Self::Integer),
            b'%' => Some(Self::Float),
            b'\'' => Some(Self::Bytes),
            b'"' => Some(Self::Text),
            b'[' => Some(Self::Sequence),
            b'(' => Some(Self::Tuple),
            b'?' => Some(Self::Bool),
            b'+' => Some(Self::Timestamp),
            _ => None,
        }
    }

    /// The tag that encodes `value`.
    pub fn of(value: &Value) -> Self {
        Self::for_kind(value.kind())
    }

    pub fn for_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Integer => Self::Integer,
            ValueKind::Float => Self::Float,
            ValueKind::Bytes => Self::Bytes,
            ValueKind::Text => Self::Text,
            ValueKind::Sequence => Self::Sequence,
            ValueKind::Tuple => Self::Tuple,
            ValueKind::Bool => Self::Bool,
            ValueKind::Timestamp => Self::Timestamp,
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Self::Integer => ValueKind::Integer,
            Self::Float => ValueKind::Float,
            Self::Bytes => ValueKind::Bytes,
            Self::Text => ValueKind::Text,
            Self::Sequence => ValueKind::Sequence,
            Self::Tuple => ValueKind::Tuple,
            Self::Bool => ValueKind::Bool,
            Self::Timestamp => ValueKind::Timestamp,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}
