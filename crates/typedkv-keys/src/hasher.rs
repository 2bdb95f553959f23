use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KeyError, KeyResult};

/// Stable 32-byte identifier of a key: the BLAKE3 digest of its canonical
/// encoding under a domain tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId([u8; 32]);

impl KeyId {
    /// Wrap a pre-computed digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> KeyResult<Self> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidKeyId(e.to_string()))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            KeyError::InvalidKeyId(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.short_hex())
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<KeyId> for [u8; 32] {
    fn from(id: KeyId) -> Self {
        id.0
    }
}

/// Domain-separated BLAKE3 hasher for key identifiers.
///
/// The domain tag is prepended to every digest so key ids never collide with
/// digests computed for other purposes over the same bytes.
pub struct KeyHasher {
    domain: &'static str,
}

impl KeyHasher {
    /// Hasher for canonical key encodings.
    pub const KEY: Self = Self {
        domain: "typedkv-key-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    pub fn hash(&self, data: &[u8]) -> KeyId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        KeyId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Check that `data` hashes to `expected`.
    pub fn verify(&self, data: &[u8], expected: &KeyId) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}
