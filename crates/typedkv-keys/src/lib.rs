//! Key validation and storage-form derivation for typedkv.
//!
//! Text, bytes, integers and floats may address a record, and so may tuples
//! whose elements all qualify. A key's storage form is either its canonical
//! [`typedkv_codec`] encoding or the domain-separated BLAKE3 digest of that
//! encoding, chosen by [`KeyEncoding`]. Both forms are injective over [`Key`] equality, so
//! `Integer(1)` and `Float(1.0)` always land on different records.

pub mod error;
pub mod hasher;
pub mod key;
pub mod normalizer;

pub use error::{KeyError, KeyResult};
pub use hasher::{KeyHasher, KeyId};
pub use key::Key;
pub use normalizer::{KeyEncoding, KeyNormalizer};
