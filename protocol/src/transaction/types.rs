//! Core type definitions for Courier payment transactions.
//!
//! These types form the vocabulary of everything the transaction
//! builder emits. They are intentionally small and `Copy`-friendly
//! where possible.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::MICROS_PER_TOKEN;

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// A token amount in microtokens, the smallest indivisible unit.
///
/// Always an integer; no floating point anywhere near money.
/// `Amount::from_micros(1_000_000)` is one whole token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Whole tokens, for callers that deal in human units. Saturates at
    /// `u64::MAX` micros rather than wrapping.
    pub fn from_tokens(tokens: u64) -> Self {
        Self(tokens.saturating_mul(MICROS_PER_TOKEN))
    }

    pub fn micros(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Human-readable decimal form, e.g. `1500000` renders `"1.500000"`.
    pub fn display_decimal(&self) -> String {
        format!(
            "{}.{:06}",
            self.0 / MICROS_PER_TOKEN,
            self.0 % MICROS_PER_TOKEN
        )
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} micro", self.0)
    }
}

// ---------------------------------------------------------------------------
// TransactionIntent
// ---------------------------------------------------------------------------

/// What a caller wants the builder to do with a consumed authorization:
/// pay `amount` to `receiver`, optionally carrying a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    /// Receiver address, Bech32-encoded (`courier1...`).
    pub receiver: String,
    pub amount: Amount,
    /// Optional UTF-8 memo attached to the transaction.
    pub note: Option<String>,
}

impl TransactionIntent {
    pub fn new(receiver: impl Into<String>, amount: Amount) -> Self {
        Self {
            receiver: receiver.into(),
            amount,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

// ---------------------------------------------------------------------------
// SubmittedTransaction
// ---------------------------------------------------------------------------

/// Receipt for a transaction the network accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    /// Deterministic transaction id, `hex(blake3(signable_bytes))`.
    pub tx_id: String,
    /// Round the network reports the transaction landed in.
    pub confirmed_round: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
