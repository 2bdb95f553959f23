use std::path::Path;

use serde::{Deserialize, Serialize};
use typedkv_keys::KeyEncoding;
use typedkv_store::BackendConfig;

use crate::error::{ClientError, ClientResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Storage form of keys handed to the backend.
    pub key_encoding: KeyEncoding,
    /// Limit on a key's canonical encoding. `None` disables the check.
    pub max_key_size: Option<usize>,
    /// Limit on a value's encoding. `None` disables the check.
    pub max_value_size: Option<usize>,
    pub backend: BackendConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            key_encoding: KeyEncoding::Canonical,
            max_key_size: None,
            max_value_size: None,
            backend: BackendConfig::Memory,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> ClientResult<Self> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ClientResult<String> {
        toml::to_string(self).map_err(|e| ClientError::Config(e.to_string()))
    }
}
