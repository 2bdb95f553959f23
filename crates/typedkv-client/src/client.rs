use tracing::debug;
use typedkv_codec::{TypeCodec, Value};
use typedkv_keys::{Key, KeyId, KeyNormalizer};
use typedkv_store::{open_backend, Backend, InMemoryBackend, StoreError};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Mapping-style client over a byte backend.
///
/// Keys are validated and normalized, values are encoded with their type
/// tag, and every operation makes exactly one backend call. Reads return the
/// same variant that was written.
pub struct StoreClient<B: Backend = Box<dyn Backend>> {
    backend: B,
    normalizer: KeyNormalizer,
    config: ClientConfig,
}

impl StoreClient<InMemoryBackend> {
    /// Client over a fresh in-memory backend with default settings.
    pub fn in_memory() -> Self {
        Self::new(InMemoryBackend::new())
    }
}

impl StoreClient<Box<dyn Backend>> {
    /// Open the backend named by `config.backend`.
    pub fn open(config: ClientConfig) -> ClientResult<Self> {
        let backend = open_backend(&config.backend)?;
        Ok(Self::with_config(backend, config))
    }
}

impl<B: Backend> StoreClient<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ClientConfig::default())
    }

    /// Client over `backend` using the key encoding and limits in `config`.
    ///
    /// `config.backend` is ignored here.
    pub fn with_config(backend: B, config: ClientConfig) -> Self {
        Self {
            backend,
            normalizer: KeyNormalizer::new(config.key_encoding),
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// The key and value are fully validated before the backend is touched,
    /// so a rejected call leaves no record behind.
    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) -> ClientResult<()> {
        let (key, storage_key) = self.resolve(key.into())?;
        let value = value.into();

        let size = TypeCodec::encoded_len(&value)?;
        if let Some(limit) = self.config.max_value_size {
            if size > limit {
                return Err(ClientError::ValueTooLarge { size, limit });
            }
        }
        let encoded = TypeCodec::encode(&value)?;

        self.backend.put(&storage_key, &encoded)?;
        debug!(
            key_id = %short_id(&key),
            kind = %value.kind(),
            bytes = encoded.len(),
            "set"
        );
        Ok(())
    }

    /// Fetch the value stored under `key`, or `None` if there is none.
    ///
    /// An invalid key fails even when nothing is stored.
    pub fn get(&self, key: impl Into<Value>) -> ClientResult<Option<Value>> {
        let (_, storage_key) = self.resolve(key.into())?;
        match self.backend.get(&storage_key)? {
            Some(bytes) => Ok(Some(TypeCodec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get), returning `default` when there is no record.
    pub fn get_or(&self, key: impl Into<Value>, default: impl Into<Value>) -> ClientResult<Value> {
        Ok(self.get(key)?.unwrap_or_else(|| default.into()))
    }

    /// Remove the record under `key`.
    ///
    /// Fails with [`ClientError::KeyNotFound`] when there is no record.
    pub fn delete(&self, key: impl Into<Value>) -> ClientResult<()> {
        let (key, storage_key) = self.resolve(key.into())?;
        match self.backend.delete(&storage_key) {
            Ok(()) => {
                debug!(key_id = %short_id(&key), "delete");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(ClientError::KeyNotFound(key)),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a record exists under `key`.
    pub fn contains(&self, key: impl Into<Value>) -> ClientResult<bool> {
        let (_, storage_key) = self.resolve(key.into())?;
        Ok(self.backend.contains(&storage_key)?)
    }

    /// The stable identifier of `key`, independent of the key encoding.
    pub fn key_id(&self, key: impl Into<Value>) -> ClientResult<KeyId> {
        let key = self.normalizer.classify(&key.into())?;
        Ok(key.id()?)
    }

    /// Validate a candidate key and derive its storage form.
    fn resolve(&self, candidate: Value) -> ClientResult<(Key, Vec<u8>)> {
        let key = Key::try_from(candidate)?;
        if let Some(limit) = self.config.max_key_size {
            let size = TypeCodec::encoded_len(&key.to_value())?;
            if size > limit {
                return Err(ClientError::KeyTooLarge { size, limit });
            }
        }
        let storage_key = self.normalizer.normalize_key(&key)?;
        Ok((key, storage_key))
    }
}

impl<B: Backend + std::fmt::Debug> std::fmt::Debug for StoreClient<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("backend", &self.backend)
            .field("key_encoding", &self.config.key_encoding)
            .finish()
    }
}

fn short_id(key: &Key) -> String {
    key.id().map(|id| id.short_hex()).unwrap_or_default()
}
