//! Byte-level storage backends for typedkv.
//!
//! A backend maps opaque byte keys to opaque byte values. It knows nothing
//! about types: keys arrive already normalized and values already encoded.
//!
//! # Storage Backends
//!
//! All backends implement the [`Backend`] trait:
//!
//! - [`InMemoryBackend`] -- `HashMap`-based store for tests and embedding
//! - [`LogBackend`] -- append-only, CRC-framed log file replayed on open
//!
//! # Design Rules
//!
//! 1. One record per key; the last `put` wins.
//! 2. Deleting an absent key is an error, not a no-op.
//! 3. Each operation is one round trip with no retries.
//! 4. I/O failures surface as [`StoreError::Io`].

pub mod config;
pub mod error;
pub mod log;
pub mod memory;
pub mod traits;

pub use config::{open_backend, BackendConfig};
pub use error::{StoreError, StoreResult};
pub use log::{LogBackend, LogRecord, ReplayStats, SyncMode};
pub use memory::InMemoryBackend;
pub use traits::Backend;
