//! Short-lived store of validated authorizations, keyed by the sender's
//! phone number.
//!
//! Receiving an SMS and building a transaction from it are two separate
//! requests, possibly minutes apart. The gap is bridged here: a payload
//! that validates is parked under the sender's number, and the
//! transaction builder later *consumes* it. Consumption is atomic and
//! destructive, so one inbound message can fund at most one transaction
//! no matter how many builders race for it.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::authorization::ValidatedAuthorization;
use crate::error::CourierError;
use crate::identity::Address;

struct Slot {
    auth: ValidatedAuthorization,
    expires_at: DateTime<Utc>,
}

/// Concurrent, TTL-bounded map from sender number to pending
/// authorization.
///
/// A second payload from the same sender replaces the first; the old
/// authorization is dropped, not queued. Entries past their TTL behave
/// exactly as if they were never stored.
pub struct SessionStore {
    slots: DashMap<String, Slot>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
        }
    }

    /// Park a validated authorization under `sender`, replacing any
    /// earlier one.
    pub fn put(&self, sender: &str, auth: ValidatedAuthorization) {
        let expires_at = Utc::now() + self.ttl;
        tracing::debug!(sender, %expires_at, "authorization parked");
        self.slots.insert(sender.to_string(), Slot { auth, expires_at });
    }

    /// Atomically take the pending authorization for `sender`, but only
    /// if its signer matches `expected_signer`.
    ///
    /// On a signer mismatch the entry is *left in place* and the call
    /// fails with [`CourierError::AddressMismatch`]; the rightful signer
    /// can still consume it. An empty or expired slot is
    /// [`CourierError::SessionEmpty`].
    pub fn consume_for_signer(
        &self,
        sender: &str,
        expected_signer: &Address,
    ) -> Result<ValidatedAuthorization, CourierError> {
        // Check-then-remove under the shard lock held by the entry.
        match self.slots.entry(sender.to_string()) {
            dashmap::mapref::entry::Entry::Vacant(_) => Err(CourierError::SessionEmpty),
            dashmap::mapref::entry::Entry::Occupied(occupied) => {
                let slot = occupied.get();
                if slot.expires_at <= Utc::now() {
                    occupied.remove();
                    return Err(CourierError::SessionEmpty);
                }
                let signer = slot.auth.signer_address();
                if signer != *expected_signer {
                    return Err(CourierError::AddressMismatch {
                        expected: expected_signer.to_bech32(),
                        got: signer.to_bech32(),
                    });
                }
                Ok(occupied.remove().auth)
            }
        }
    }

    /// Drop every expired entry. Callers run this on whatever cadence
    /// they like; correctness never depends on it because
    /// [`consume_for_signer`](Self::consume_for_signer) checks expiry
    /// itself.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.expires_at > now);
        before - self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::{sign_program, validate};
    use crate::codec;
    use crate::config::SMS_MULTI_SEGMENT_CHARS;
    use crate::crypto::keys::CourierKeypair;
    use crate::program::AuthorizationProgram;

    fn validated(kp: &CourierKeypair) -> ValidatedAuthorization {
        let addr = Address::from_public_key(&kp.public_key());
        let auth =
            sign_program(AuthorizationProgram::new(vec![0x01, 0x02]).unwrap(), kp, &addr).unwrap();
        let text = codec::encode(&auth, SMS_MULTI_SEGMENT_CHARS).unwrap();
        validate(&text).unwrap()
    }

    #[test]
    fn consume_is_destructive() {
        let store = SessionStore::new(Duration::seconds(60));
        let kp = CourierKeypair::generate();
        let signer = Address::from_public_key(&kp.public_key());

        store.put("+15550001111", validated(&kp));
        assert!(store.consume_for_signer("+15550001111", &signer).is_ok());
        assert!(matches!(
            store.consume_for_signer("+15550001111", &signer),
            Err(CourierError::SessionEmpty)
        ));
    }

    #[test]
    fn signer_mismatch_leaves_entry_intact() {
        let store = SessionStore::new(Duration::seconds(60));
        let kp = CourierKeypair::generate();
        let signer = Address::from_public_key(&kp.public_key());
        let stranger = Address::from_public_key(&CourierKeypair::generate().public_key());

        store.put("+15550001111", validated(&kp));

        assert!(matches!(
            store.consume_for_signer("+15550001111", &stranger),
            Err(CourierError::AddressMismatch { .. })
        ));
        // The rightful signer still gets it.
        assert!(store.consume_for_signer("+15550001111", &signer).is_ok());
    }

    #[test]
    fn empty_sender_is_session_empty() {
        let store = SessionStore::new(Duration::seconds(60));
        let signer = Address::from_public_key(&CourierKeypair::generate().public_key());
        assert!(matches!(
            store.consume_for_signer("+15559990000", &signer),
            Err(CourierError::SessionEmpty)
        ));
    }

    #[test]
    fn expired_entry_acts_like_missing() {
        let store = SessionStore::new(Duration::seconds(-1));
        let kp = CourierKeypair::generate();
        let signer = Address::from_public_key(&kp.public_key());

        store.put("+15550001111", validated(&kp));
        assert!(matches!(
            store.consume_for_signer("+15550001111", &signer),
            Err(CourierError::SessionEmpty)
        ));
        // The expired slot was dropped on the failed consume.
        assert!(store.is_empty());
    }

    #[test]
    fn newer_payload_replaces_older() {
        let store = SessionStore::new(Duration::seconds(60));
        let kp_a = CourierKeypair::generate();
        let kp_b = CourierKeypair::generate();
        let signer_b = Address::from_public_key(&kp_b.public_key());

        store.put("+15550001111", validated(&kp_a));
        store.put("+15550001111", validated(&kp_b));

        assert_eq!(store.len(), 1);
        let got = store.consume_for_signer("+15550001111", &signer_b).unwrap();
        assert_eq!(got.signer_address(), signer_b);
    }

    #[test]
    fn purge_drops_only_expired() {
        let live = SessionStore::new(Duration::seconds(60));
        let kp = CourierKeypair::generate();
        live.put("+15550001111", validated(&kp));
        assert_eq!(live.purge_expired(), 0);
        assert_eq!(live.len(), 1);

        let dead = SessionStore::new(Duration::seconds(-1));
        dead.put("+15550002222", validated(&kp));
        assert_eq!(dead.purge_expired(), 1);
        assert!(dead.is_empty());
    }
}
