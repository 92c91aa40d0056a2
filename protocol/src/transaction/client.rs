//! Network seam and the in-process ledger.
//!
//! [`NetworkClient`] is the trait through which payments leave the
//! process. [`DevLedger`] is an in-memory implementation with real
//! semantics: balance accounting, authorization re-verification, and
//! lease replay rejection. It backs the test suite and the gateway's
//! development mode.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use super::builder::PaymentTransaction;
use super::types::{Amount, SubmittedTransaction};
use crate::error::CourierError;
use crate::identity::Address;

/// Submission side of the network integration.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    /// Submit a payment and wait for the network's accept/reject
    /// decision. Acceptance means the transfer is final; there is no
    /// pending state surfaced here.
    async fn submit(&self, tx: &PaymentTransaction) -> Result<SubmittedTransaction, CourierError>;

    /// Current spendable balance of `address`.
    async fn balance(&self, address: &Address) -> Result<Amount, CourierError>;
}

// ---------------------------------------------------------------------------
// DevLedger
// ---------------------------------------------------------------------------

/// In-memory ledger that enforces the rules a real network would.
///
/// It does not trust the submitter: the delegated signature is verified
/// again here, the sender must match the authorization's signer, and a
/// lease that has appeared in any earlier accepted transaction is
/// refused. The lease set, not the session store, is the system's
/// replay backstop.
#[derive(Default)]
pub struct DevLedger {
    balances: DashMap<String, u64>,
    seen_leases: DashSet<String>,
    round: AtomicU64,
}

impl DevLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `address` out of thin air. Test and faucet use only.
    pub fn fund(&self, address: &Address, amount: Amount) {
        let mut entry = self.balances.entry(address.to_bech32()).or_insert(0);
        *entry = entry.saturating_add(amount.micros());
    }

    fn verify_submission(&self, tx: &PaymentTransaction) -> Result<(), CourierError> {
        if !tx.authorization.verify() {
            return Err(CourierError::InvalidSignature);
        }
        let signer = tx.authorization.signer_address().to_bech32();
        if signer != tx.sender {
            return Err(CourierError::SubmissionFailed {
                detail: "sender does not match authorization signer".to_string(),
            });
        }
        if tx.receiver.parse::<Address>().is_err() {
            return Err(CourierError::SubmissionFailed {
                detail: "receiver address is not well formed".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NetworkClient for DevLedger {
    async fn submit(&self, tx: &PaymentTransaction) -> Result<SubmittedTransaction, CourierError> {
        self.verify_submission(tx)?;

        // First writer wins; a second transaction with the same lease is
        // a replay even if every other field differs.
        if !self.seen_leases.insert(tx.lease.clone()) {
            return Err(CourierError::SubmissionFailed {
                detail: format!("overlapping lease {}", tx.lease),
            });
        }

        let debit = {
            let mut sender = self.balances.entry(tx.sender.clone()).or_insert(0);
            match sender.checked_sub(tx.amount.micros()) {
                Some(rest) => {
                    *sender = rest;
                    true
                }
                None => false,
            }
        };
        if !debit {
            // The lease stays burned. A failed spend must not make the
            // payload reusable.
            return Err(CourierError::SubmissionFailed {
                detail: "insufficient balance".to_string(),
            });
        }

        let mut receiver = self.balances.entry(tx.receiver.clone()).or_insert(0);
        *receiver = receiver.saturating_add(tx.amount.micros());
        drop(receiver);

        let round = self.round.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(tx_id = %tx.id, round, "payment accepted");
        Ok(SubmittedTransaction {
            tx_id: tx.id.clone(),
            confirmed_round: round,
        })
    }

    async fn balance(&self, address: &Address) -> Result<Amount, CourierError> {
        Ok(Amount::from_micros(
            self.balances
                .get(&address.to_bech32())
                .map(|v| *v)
                .unwrap_or(0),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
