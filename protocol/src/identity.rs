//! # Courier Addresses
//!
//! An address is the human-facing identity of either an **account** (a
//! keypair holder) or a **program** (compiled spending-condition
//! bytecode). Both derive the same way:
//!
//! ```text
//! account: BLAKE3(public_key)                  -> Bech32("courier", hash)
//! program: BLAKE3("Program" || canonical form) -> Bech32("courier", hash)
//! ```
//!
//! The `"Program"` domain tag keeps the two derivations disjoint: no
//! program can collide with an account and no delegation signature can be
//! confused with a signature over account data.
//!
//! Content-addressing programs is what makes the pipeline verifiable with
//! zero side channels: a verifier holding only the payload re-derives the
//! program address from the program bytes it just decoded. There is
//! nothing to look up and nothing the sender can lie about.
//!
//! Bech32 gives checksummed, case-insensitive strings with a recognizable
//! `courier1` prefix, which matters when users copy addresses between a
//! text message and a web form.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{ADDRESS_HASH_LENGTH, ADDRESS_HRP};
use crate::crypto::hash::blake3_hash;
use crate::crypto::keys::CourierPublicKey;

/// Failures while parsing an address string.
#[derive(Debug, Error)]
pub enum AddressError {
    /// Not valid Bech32 at all.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// Valid Bech32, wrong network prefix.
    #[error("invalid address prefix: expected '{expected}', got '{got}'")]
    InvalidHrp {
        /// The prefix this network uses.
        expected: String,
        /// What the string carried.
        got: String,
    },

    /// The data part is not a 32-byte hash.
    #[error("invalid address payload length: expected {expected} bytes, got {got}")]
    InvalidDataLength {
        /// Expected byte count.
        expected: usize,
        /// Actual byte count.
        got: usize,
    },
}

/// A Courier address. Internally the 32-byte BLAKE3 digest; the Bech32
/// string is derived on demand.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    hash: [u8; ADDRESS_HASH_LENGTH],
}

impl Address {
    /// Derive the address of the account controlled by `public_key`.
    pub fn from_public_key(public_key: &CourierPublicKey) -> Self {
        Self {
            hash: blake3_hash(public_key.as_bytes()),
        }
    }

    /// Derive the address of a program from its canonical bytes (domain
    /// tag included by the caller, see
    /// [`AuthorizationProgram::canonical_bytes`](crate::program::AuthorizationProgram::canonical_bytes)).
    pub fn from_canonical_program_bytes(canonical: &[u8]) -> Self {
        Self {
            hash: blake3_hash(canonical),
        }
    }

    /// Parse a `courier1...` Bech32 string.
    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        if hrp.as_str() != ADDRESS_HRP {
            return Err(AddressError::InvalidHrp {
                expected: ADDRESS_HRP.to_string(),
                got: hrp.as_str().to_string(),
            });
        }

        let hash: [u8; ADDRESS_HASH_LENGTH] =
            data.as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidDataLength {
                    expected: ADDRESS_HASH_LENGTH,
                    got: data.len(),
                })?;

        Ok(Self { hash })
    }

    /// The Bech32 string form.
    ///
    /// Encoding a fixed 32-byte array under a known-good HRP cannot fail,
    /// hence no `Result` in the signature.
    pub fn to_bech32(&self) -> String {
        let hrp = Hrp::parse(ADDRESS_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.hash).expect("32-byte payload always encodes")
    }

    /// The raw digest.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_HASH_LENGTH] {
        &self.hash
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bech32())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_bech32())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
