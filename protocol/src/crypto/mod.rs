//! Cryptographic primitives: Ed25519 keys and signatures, plus the two
//! hash functions the protocol is allowed to use.
//!
//! Everything that signs or verifies goes through the wrappers in
//! [`keys`]. One audit point, consistent error behavior, and type safety
//! so a hash can't be passed where a message belongs.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, sha256};
pub use keys::{CourierKeypair, CourierPublicKey, CourierSignature, KeyError};
