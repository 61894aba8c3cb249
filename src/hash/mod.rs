//! Copy digests.
//!
//! - [`Digest`] - 32-byte content digest reported by a block copy
//! - `Blake3Hasher` - incremental BLAKE3 state (feature `hash-blake3`)

#[cfg(feature = "hash-blake3")]
mod blake3;
mod digest;

#[cfg(feature = "hash-blake3")]
pub(crate) use blake3::Blake3Hasher;
pub use digest::Digest;
