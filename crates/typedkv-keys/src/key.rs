use std::fmt;
use std::hash::{Hash, Hasher};

use typedkv_codec::{TypeCodec, Value, ValueKind};

use crate::error::{KeyError, KeyResult};
use crate::hasher::{KeyHasher, KeyId};

/// A value that is allowed to address a record.
///
/// Text, bytes, integers and floats qualify, as do tuples made only of
/// those. Equality and hashing follow the canonical encoding, so floats
/// compare by bit pattern.
#[derive(Clone, Debug)]
pub enum Key {
    Text(String),
    Bytes(Vec<u8>),
    Integer(i64),
    Float(f64),
    Tuple(Vec<Key>),
}

impl Key {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::Tuple(_) => ValueKind::Tuple,
        }
    }

    /// Build a tuple key.
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Key>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Whether values of `kind` can ever be keys. A tuple additionally needs
    /// every element to qualify; see [`Key::validate`].
    pub fn allows(kind: ValueKind) -> bool {
        matches!(
            kind,
            ValueKind::Text
                | ValueKind::Bytes
                | ValueKind::Integer
                | ValueKind::Float
                | ValueKind::Tuple
        )
    }

    /// Check that `value` may be used as a key without converting it.
    ///
    /// The error names the first offending variant, which may be nested
    /// inside a tuple.
    pub fn validate(value: &Value) -> KeyResult<()> {
        match value {
            Value::Tuple(items) => items.iter().try_for_each(Key::validate),
            other if Key::allows(other.kind()) => Ok(()),
            other => Err(KeyError::NotHashable { kind: other.kind() }),
        }
    }

    pub fn to_value(&self) -> Value {
        self.clone().into()
    }

    /// Canonical encoding of this key.
    pub fn encode(&self) -> KeyResult<Vec<u8>> {
        Ok(TypeCodec::encode(&self.to_value())?)
    }

    /// Stable identifier derived from the canonical encoding.
    pub fn id(&self) -> KeyResult<KeyId> {
        Ok(KeyHasher::KEY.hash(&self.encode()?))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Text(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::Integer(n) => n.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Tuple(items) => items.hash(state),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Text(s) => Value::Text(s),
            Key::Bytes(b) => Value::Bytes(b),
            Key::Integer(n) => Value::Integer(n),
            Key::Float(f) => Value::Float(f),
            Key::Tuple(items) => Value::Tuple(items.into_iter().map(Value::from).collect()),
        }
    }
}

impl TryFrom<Value> for Key {
    type Error = KeyError;

    fn try_from(value: Value) -> KeyResult<Self> {
        match value {
            Value::Text(s) => Ok(Self::Text(s)),
            Value::Bytes(b) => Ok(Self::Bytes(b)),
            Value::Integer(n) => Ok(Self::Integer(n)),
            Value::Float(f) => Ok(Self::Float(f)),
            Value::Tuple(items) => items
                .into_iter()
                .map(Key::try_from)
                .collect::<KeyResult<Vec<_>>>()
                .map(Self::Tuple),
            other => Err(KeyError::NotHashable { kind: other.kind() }),
        }
    }
}

impl TryFrom<&Value> for Key {
    type Error = KeyError;

    fn try_from(value: &Value) -> KeyResult<Self> {
        Key::validate(value)?;
        Key::try_from(value.clone())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Key {
    fn from(b: &[u8; N]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Key {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}
