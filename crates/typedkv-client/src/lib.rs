//! Type-preserving key-value store client.
//!
//! [`StoreClient`] offers a mapping-style API (`set`, `get`, `get_or`,
//! `delete`, `contains`) over any [`Backend`]. Values come back as the same
//! variant they were stored as: an `Integer(55)` never reads back as a
//! `Float(55.0)`, and a `Bytes` value never reads back as `Text`.
//!
//! # Example
//!
//! ```
//! use typedkv_client::{StoreClient, Value};
//!
//! let kv = StoreClient::in_memory();
//! kv.set("foo", b"bar")?;
//! assert_eq!(kv.get("foo")?, Some(Value::from(b"bar")));
//! kv.delete("foo")?;
//! assert!(kv.delete("foo").unwrap_err().is_not_found());
//! # Ok::<(), typedkv_client::ClientError>(())
//! ```
//!
//! Text, bytes, integers, floats and tuples of those may be used as keys.
//! Sequences, booleans and timestamps are accepted as values but rejected as
//! keys with a not-hashable error before the backend is touched.

pub mod client;
pub mod config;
pub mod error;

pub use client::StoreClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};

pub use typedkv_codec::{CodecError, TypeCodec, Value, ValueKind};
pub use typedkv_keys::{Key, KeyEncoding, KeyError, KeyId};
pub use typedkv_store::{Backend, BackendConfig, InMemoryBackend, LogBackend, StoreError, SyncMode};
