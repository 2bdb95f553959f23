use serde::{Deserialize, Serialize};
use tracing::trace;
use typedkv_codec::{TypeCodec, Value};

use crate::error::KeyResult;
use crate::hasher::KeyHasher;
use crate::key::Key;

/// How a validated key is turned into the bytes the backend indexes by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
    /// The canonical tagged encoding itself.
    #[default]
    Canonical,
    /// The 32-byte domain-separated BLAKE3 digest of the canonical encoding.
    Digest,
}

/// Validates key values and produces their storage form.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeyNormalizer {
    encoding: KeyEncoding,
}

impl KeyNormalizer {
    pub fn new(encoding: KeyEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Check that `value` may be used as a key.
    pub fn classify(&self, value: &Value) -> KeyResult<Key> {
        Key::try_from(value)
    }

    /// Validate `value` and return its storage form.
    ///
    /// Two values normalize to the same bytes exactly when they are equal,
    /// including their variant.
    pub fn normalize(&self, value: &Value) -> KeyResult<Vec<u8>> {
        Key::validate(value)?;
        let canonical = TypeCodec::encode(value)?;
        Ok(self.finish(canonical))
    }

    /// Storage form of an already validated key.
    pub fn normalize_key(&self, key: &Key) -> KeyResult<Vec<u8>> {
        Ok(self.finish(key.encode()?))
    }

    fn finish(&self, canonical: Vec<u8>) -> Vec<u8> {
        match self.encoding {
            KeyEncoding::Canonical => canonical,
            KeyEncoding::Digest => {
                let id = KeyHasher::KEY.hash(&canonical);
                trace!(key_id = %id.short_hex(), "digested key");
                id.as_bytes().to_vec()
            }
        }
    }
}
