//! Type-preserving value codec for typedkv.
//!
//! Every value is encoded as a one-byte tag followed by a variant-specific
//! payload, so decoding never needs an external type hint and an `Integer`
//! can never come back as a `Float`.
//!
//! # Key Types
//!
//! - [`Value`] -- closed tagged union of storable data
//! - [`TypeCodec`] -- canonical encoder/decoder for [`Value`]
//! - [`Tag`] -- the discriminant byte of each variant
//!
//! # Encoding Rules
//!
//! 1. Equal values encode to identical bytes; distinct variants never share a
//!    tag.
//! 2. Every byte string accepted by the decoder re-encodes to itself.
//! 3. Multi-byte integers and length fields are big-endian.
//! 4. Malformed input is reported as [`CodecError::CorruptPayload`], never
//!    repaired.

pub mod codec;
pub mod error;
pub mod tag;
pub mod value;

pub use codec::{TypeCodec, MAX_DEPTH};
pub use error::{CodecError, CodecResult};
pub use tag::Tag;
pub use value::{Value, ValueKind};
