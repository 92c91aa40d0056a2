//! Payment construction from a consumed authorization.
//!
//! The builder is pure: it turns a [`ValidatedAuthorization`] plus a
//! [`TransactionIntent`] into a [`PaymentTransaction`] with a
//! deterministic id, and touches neither the session store nor the
//! network. Consume-once discipline and submission live in
//! [`crate::service`].

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{Amount, TransactionIntent};
use crate::authorization::{DelegatedAuthorization, ValidatedAuthorization};
use crate::crypto::hash::{blake3_hash, sha256};
use crate::error::CourierError;
use crate::identity::Address;

/// Current payment layout version.
pub const TX_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// PaymentTransaction
// ---------------------------------------------------------------------------

/// A token transfer authorized by a delegated program signature.
///
/// The `id` is `hex(blake3(signable_bytes))`, so two transactions with
/// the same fields collide and two differing in any field do not. The
/// `lease` is the SHA-256 of the exact payload text that authorized the
/// transfer; the ledger refuses a second transaction carrying the same
/// lease, which is what makes a captured SMS worthless after first use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    /// `hex(blake3(signable_bytes))`.
    pub id: String,

    /// Payment layout version, for forward rule changes.
    pub version: u16,

    /// Sender address derived from the authorization's signer key,
    /// Bech32-encoded.
    pub sender: String,

    /// Receiver address, Bech32-encoded.
    pub receiver: String,

    /// Transfer amount in microtokens.
    pub amount: Amount,

    /// Unix timestamp in milliseconds at build time.
    pub timestamp: u64,

    /// Optional UTF-8 memo.
    pub note: Option<String>,

    /// Hex-encoded SHA-256 of the authorizing payload text.
    pub lease: String,

    /// The delegated authorization that makes this transfer valid. The
    /// ledger re-verifies it at submission; the builder having checked
    /// it once is not trusted across the wire.
    pub authorization: DelegatedAuthorization,
}

impl PaymentTransaction {
    /// Canonical bytes for id computation.
    ///
    /// Deterministic concatenation with null separators and fixed-width
    /// big-endian integers; serde is avoided because field order across
    /// formats is not guaranteed. The `id` field itself is excluded,
    /// everything else participates, including the authorization's
    /// canonical program bytes and signature.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        buf.extend_from_slice(&self.version.to_be_bytes());
        buf.extend_from_slice(self.sender.as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(self.receiver.as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(&self.amount.micros().to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());

        match &self.note {
            Some(note) => {
                buf.push(0x01);
                buf.extend_from_slice(&(note.len() as u32).to_be_bytes());
                buf.extend_from_slice(note.as_bytes());
            }
            None => buf.push(0x00),
        }

        buf.extend_from_slice(self.lease.as_bytes());
        buf.push(0x00);
        buf.extend_from_slice(&self.authorization.program.canonical_bytes());
        buf.extend_from_slice(self.authorization.signer_public_key.as_bytes());
        buf.extend_from_slice(self.authorization.signature.as_bytes());

        buf
    }

    pub fn compute_id(&self) -> String {
        hex::encode(blake3_hash(&self.signable_bytes()))
    }
}

/// Lease bytes for a payload: SHA-256 over the exact text, whitespace
/// included. Byte-identical payloads, and only those, share a lease.
pub fn lease_for_payload(payload_text: &str) -> [u8; 32] {
    sha256(payload_text.as_bytes())
}

// ---------------------------------------------------------------------------
// build_payment
// ---------------------------------------------------------------------------

/// Build a [`PaymentTransaction`] from a consumed authorization.
///
/// The receiver address is parsed up front so a typo fails here, before
/// anything reaches the network.
pub fn build_payment(
    auth: ValidatedAuthorization,
    intent: &TransactionIntent,
) -> Result<PaymentTransaction, CourierError> {
    let receiver: Address = intent
        .receiver
        .parse()
        .map_err(|e| CourierError::InvalidAddress {
            detail: format!("receiver: {}", e),
        })?;

    let sender = auth.signer_address();
    let (authorization, payload_text) = auth.into_parts();
    let lease = hex::encode(lease_for_payload(&payload_text));

    let mut tx = PaymentTransaction {
        id: String::new(),
        version: TX_VERSION,
        sender: sender.to_bech32(),
        receiver: receiver.to_bech32(),
        amount: intent.amount,
        timestamp: Utc::now().timestamp_millis() as u64,
        note: intent.note.clone(),
        lease,
        authorization,
    };
    tx.id = tx.compute_id();

    tracing::debug!(tx_id = %tx.id, sender = %tx.sender, receiver = %tx.receiver,
        amount = %tx.amount, "payment built");
    Ok(tx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
