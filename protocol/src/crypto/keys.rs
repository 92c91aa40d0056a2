//! # Keys and Signatures
//!
//! Ed25519 keypair wrappers for Courier accounts. Every delegation in the
//! protocol is an Ed25519 signature produced here and verified here.
//!
//! ## Why Ed25519
//!
//! - Deterministic signatures: no nonce management, no RNG at sign time.
//! - 32-byte keys and 64-byte signatures: both are fixed-width fields in
//!   the SMS payload, where every byte is budget.
//! - Strict, well-audited verification via `ed25519-dalek`.
//!
//! ## Security notes
//!
//! - Key generation uses `OsRng` only.
//! - Secret key bytes are never logged and never appear in `Debug` output.
//! - Errors are vague on purpose; see [`KeyError`].

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failures in key handling. Deliberately uninformative about key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The secret key bytes are the wrong length or not valid hex.
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// The public key bytes do not describe a valid Ed25519 point.
    #[error("invalid public key")]
    InvalidPublicKey,
}

// ---------------------------------------------------------------------------
// CourierKeypair
// ---------------------------------------------------------------------------

/// An account keypair. The signing key is the single secret that controls
/// the account; the holder of these 32 bytes can delegate spending of
/// everything the account owns.
///
/// Intentionally not `Serialize`: exporting a secret key must be an
/// explicit call to [`secret_key_bytes`](Self::secret_key_bytes), not a
/// side effect of serializing a struct that happens to contain one.
pub struct CourierKeypair {
    signing_key: SigningKey,
}

impl CourierKeypair {
    /// Generate a fresh keypair from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic construction from a 32-byte seed. In Ed25519 the
    /// seed *is* the secret key. A weak seed makes a weak key; callers
    /// are expected to supply CSPRNG or KDF output.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Load a keypair from hex-encoded secret key material, as stored in
    /// key files and pasted into the gateway's signing form.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    /// The public half, safe to hand out.
    pub fn public_key(&self) -> CourierPublicKey {
        CourierPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Deterministic per RFC 8032: same key, same
    /// message, same signature, forever.
    pub fn sign(&self, message: &[u8]) -> CourierSignature {
        CourierSignature {
            bytes: self.signing_key.sign(message).to_bytes(),
        }
    }

    /// Export the raw secret key. Handle like the account itself,
    /// because it is.
    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// Hex export of the secret key, for key files. Same warning applies.
    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key_bytes())
    }
}

impl Clone for CourierKeypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for CourierKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secret material never reaches Debug output, not even truncated.
        write!(f, "CourierKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// CourierPublicKey
// ---------------------------------------------------------------------------

/// The public half of an account identity. Travels inside every encoded
/// payload so the receiving side can verify the delegation without any
/// out-of-band key lookup.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourierPublicKey {
    bytes: [u8; 32],
}

impl CourierPublicKey {
    /// Wrap raw bytes without point validation. For bytes that came from
    /// [`CourierKeypair::public_key`] or a decoded payload, where the
    /// subsequent signature verification rejects degenerate points anyway.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Parse from a byte slice, validating length and that the bytes are
    /// an actual curve point. Rejects low-order and malformed points.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| KeyError::InvalidPublicKey)?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        if key.is_weak() {
            return Err(KeyError::InvalidPublicKey);
        }
        Ok(Self { bytes })
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature over a message. A plain boolean: callers here
    /// never care *why* verification failed, and we would not tell the
    /// payload's sender anyway.
    pub fn verify(&self, message: &[u8], signature: &CourierSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let dalek_sig = DalekSignature::from_bytes(&signature.bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }

    /// Hex form, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Base58 form, the compact human-pasteable spelling.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl fmt::Display for CourierPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CourierPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourierPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// CourierSignature
// ---------------------------------------------------------------------------

/// A 64-byte Ed25519 signature. Fixed-width by construction, so the
/// payload codec never needs a length prefix for it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourierSignature {
    #[serde(with = "serde_sig_bytes")]
    bytes: [u8; 64],
}

impl CourierSignature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    /// Parse from a slice; fails unless it is exactly 64 bytes.
    pub fn try_from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 64] = slice.try_into().ok()?;
        Some(Self { bytes })
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }

    /// Hex form, 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for CourierSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.to_hex();
        write!(f, "CourierSignature({}...{})", &h[..8], &h[120..])
    }
}

/// serde helper: `[u8; 64]` has no derived Serialize; store as a byte
/// sequence so JSON output stays compact and symmetric.
mod serde_sig_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<[u8; 64], D::Error> {
        let v: Vec<u8> = Vec::deserialize(de)?;
        v.as_slice()
            .try_into()
            .map_err(|_| D::Error::custom("signature must be 64 bytes"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
