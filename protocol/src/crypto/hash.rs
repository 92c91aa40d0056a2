//! Hashing utilities. Two functions, no more:
//!
//! - **BLAKE3** for address derivation (account and program addresses).
//!   Fast everywhere, 32-byte output, proper cryptographic hash.
//! - **SHA-256** for the replay lease, where a boring, universally
//!   recognized digest is the point: external systems checking a lease
//!   should not need a BLAKE3 implementation.

use sha2::{Digest, Sha256};

/// BLAKE3 digest of the input, as a fixed 32-byte array.
///
/// The workhorse hash for Courier-native data structures. SIMD-accelerated
/// by the `blake3` crate on every platform that matters.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// SHA-256 digest of the input, as a fixed 32-byte array.
///
/// Used for the transaction replay lease, see
/// [`crate::transaction::builder::lease_for_payload`].
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}
