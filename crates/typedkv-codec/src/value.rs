use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

use crate::error::{CodecError, CodecResult};

/// The variant of a [`Value`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Text,
    Bytes,
    Integer,
    Float,
    Sequence,
    Tuple,
    Bool,
    Timestamp,
}

impl ValueKind {
    /// Lower-case name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Sequence => "sequence",
            Self::Tuple => "tuple",
            Self::Bool => "bool",
            Self::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically-typed value that can be stored and read back with its
/// exact type.
///
/// The set of variants is closed. Equality follows the canonical encoding:
/// two values are equal exactly when they encode to the same bytes. In
/// particular floats compare by bit pattern (`0.0 != -0.0`, a NaN equals
/// itself) and timestamps compare both instant and UTC offset.
#[derive(Clone, Debug)]
pub enum Value {
    /// UTF-8 text. May contain any character, including NUL.
    Text(String),
    /// Raw octets.
    Bytes(Vec<u8>),
    /// Signed 64-bit integer.
    Integer(i64),
    /// IEEE-754 double.
    Float(f64),
    /// Ordered list of values. Nesting is allowed.
    Sequence(Vec<Value>),
    /// Fixed ordered group of values. Unlike a sequence it may be used as a
    /// key when every element may.
    Tuple(Vec<Value>),
    /// Boolean. Storable, but never accepted as a key.
    Bool(bool),
    /// Instant with its UTC offset. Storable, but never accepted as a key.
    Timestamp(DateTime<FixedOffset>),
}

impl Value {
    /// The variant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Sequence(_) => ValueKind::Sequence,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::Bool(_) => ValueKind::Bool,
            Self::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    /// Build a sequence from anything convertible into values.
    pub fn sequence<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        items.into_iter().collect()
    }

    /// Build a tuple from anything convertible into values.
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b && a.offset() == b.offset(),
            _ => false,
        }
    }
}

impl Eq for Value {}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(b: &[u8; N]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

macro_rules! integer_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Self::Integer(i64::from(n))
                }
            }
        )*
    };
}

integer_from!(i8, i16, i32, i64, u16, u32);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts.fixed_offset())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::Sequence(iter.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = CodecError;

    /// Convert a JSON document into a value.
    ///
    /// `null`, objects and integers outside the `i64` range have no variant
    /// and are rejected.
    fn try_from(json: serde_json::Value) -> CodecResult<Self> {
        use serde_json::Value as Json;

        match json {
            Json::String(s) => Ok(Self::Text(s)),
            Json::Bool(b) => Ok(Self::Bool(b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if n.is_u64() {
                    Err(CodecError::unsupported(
                        "json number",
                        format!("{n} does not fit a signed 64-bit integer"),
                    ))
                } else {
                    n.as_f64().map(Self::Float).ok_or_else(|| {
                        CodecError::unsupported("json number", format!("{n} is not representable"))
                    })
                }
            }
            Json::Array(items) => items
                .into_iter()
                .map(Value::try_from)
                .collect::<CodecResult<Vec<_>>>()
                .map(Self::Sequence),
            Json::Null => Err(CodecError::unsupported("json null", "no value variant for null")),
            Json::Object(_) => Err(CodecError::unsupported(
                "json object",
                "mappings cannot be stored as values",
            )),
        }
    }
}
