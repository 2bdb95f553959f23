use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::log::{LogBackend, SyncMode};
use crate::memory::InMemoryBackend;
use crate::traits::Backend;

/// Which backend to open and how.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Volatile in-process storage.
    #[default]
    Memory,
    /// Append-only log file at `path`.
    Log {
        path: PathBuf,
        #[serde(default)]
        sync_mode: SyncMode,
    },
}

/// Build the backend described by `config`.
pub fn open_backend(config: &BackendConfig) -> StoreResult<Box<dyn Backend>> {
    match config {
        BackendConfig::Memory => Ok(Box::new(InMemoryBackend::new())),
        BackendConfig::Log { path, sync_mode } => Ok(Box::new(LogBackend::open(path, *sync_mode)?)),
    }
}
