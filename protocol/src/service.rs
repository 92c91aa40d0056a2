//! End-to-end facade over the sign/send/receive/spend flow.
//!
//! [`CourierService`] wires the codec, session store, transport and
//! network client together and owns the timeouts. Every operation here
//! maps to one step of the protocol:
//!
//! 1. [`sign_and_encode`](CourierService::sign_and_encode) on the
//!    sender's device,
//! 2. [`send_payload`](CourierService::send_payload) to hand the text
//!    to the carrier,
//! 3. [`receive_and_validate`](CourierService::receive_and_validate)
//!    when the webhook delivers it,
//! 4. [`build_transaction`](CourierService::build_transaction) when the
//!    sender asks the operator to spend it.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::authorization::{sign_program, validate};
use crate::codec;
use crate::config::{
    DEFAULT_SEND_TIMEOUT_SECS, DEFAULT_SESSION_TTL_SECS, DEFAULT_SUBMIT_TIMEOUT_SECS,
    SMS_SINGLE_SEGMENT_CHARS,
};
use crate::crypto::keys::CourierKeypair;
use crate::error::CourierError;
use crate::identity::Address;
use crate::program::AuthorizationProgram;
use crate::session::SessionStore;
use crate::transaction::{
    build_payment, Amount, NetworkClient, SubmittedTransaction, TransactionIntent,
};
use crate::transport::{InboundMessage, SmsTransport};

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

/// Runtime knobs for a [`CourierService`].
///
/// The defaults fit a single-segment GSM deployment; operators with
/// concatenated-SMS carriers raise `max_payload_chars`.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Hard cap on the encoded payload length in characters.
    pub max_payload_chars: usize,
    /// How long a validated authorization may sit unconsumed.
    pub session_ttl: chrono::Duration,
    /// Budget for a network submission round trip.
    pub submit_timeout: StdDuration,
    /// Budget for handing one message to the carrier.
    pub send_timeout: StdDuration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_payload_chars: SMS_SINGLE_SEGMENT_CHARS,
            session_ttl: chrono::Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            submit_timeout: StdDuration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS),
            send_timeout: StdDuration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationReceipt
// ---------------------------------------------------------------------------

/// Summary returned to the webhook caller after an inbound payload
/// validates. Deliberately free of key material.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationReceipt {
    pub sender_number: String,
    /// Bech32 address of the key that signed the program.
    pub signer_address: String,
    /// Bech32 content address of the program itself.
    pub program_address: String,
    pub payload_chars: usize,
}

// ---------------------------------------------------------------------------
// CourierService
// ---------------------------------------------------------------------------

/// The protocol engine. Generic over its two I/O seams so tests run it
/// against [`MemoryTransport`](crate::transport::MemoryTransport) and
/// [`DevLedger`](crate::transaction::DevLedger) unchanged.
pub struct CourierService<N, T> {
    config: ServiceConfig,
    sessions: SessionStore,
    network: Arc<N>,
    transport: Arc<T>,
}

impl<N, T> CourierService<N, T>
where
    N: NetworkClient,
    T: SmsTransport,
{
    pub fn new(config: ServiceConfig, network: Arc<N>, transport: Arc<T>) -> Self {
        let sessions = SessionStore::new(config.session_ttl);
        Self {
            config,
            sessions,
            network,
            transport,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn network(&self) -> &Arc<N> {
        &self.network
    }

    /// Sign `program` with `keypair` on behalf of `claimed_address` and
    /// encode the result within this service's payload budget.
    pub fn sign_and_encode(
        &self,
        program: AuthorizationProgram,
        keypair: &CourierKeypair,
        claimed_address: &Address,
    ) -> Result<String, CourierError> {
        let auth = sign_program(program, keypair, claimed_address)?;
        codec::encode(&auth, self.config.max_payload_chars)
    }

    /// Hand a finished payload to the carrier, addressed to
    /// `receiver_number`. A transport that stalls past the configured
    /// send timeout surfaces as [`CourierError::TransportTimeout`].
    pub async fn send_payload(
        &self,
        receiver_number: &str,
        payload: &str,
    ) -> Result<(), CourierError> {
        let send = self.transport.send(receiver_number, payload);
        match tokio::time::timeout(self.config.send_timeout, send).await {
            Ok(result) => {
                let ack = result?;
                tracing::info!(to = receiver_number, message_id = ?ack.message_id,
                    "payload handed to carrier");
                Ok(())
            }
            Err(_) => Err(CourierError::TransportTimeout {
                seconds: self.config.send_timeout.as_secs(),
            }),
        }
    }

    /// Validate an inbound SMS and park the authorization under the
    /// sender's number.
    ///
    /// A payload that fails to validate changes nothing: whatever the
    /// sender had parked before stays parked.
    pub fn receive_and_validate(
        &self,
        inbound: &InboundMessage,
    ) -> Result<ValidationReceipt, CourierError> {
        let validated = validate(&inbound.body)?;

        let receipt = ValidationReceipt {
            sender_number: inbound.sender_number.clone(),
            signer_address: validated.signer_address().to_bech32(),
            program_address: validated.program_address().to_bech32(),
            payload_chars: validated.payload_text().len(),
        };
        self.sessions.put(&inbound.sender_number, validated);

        tracing::info!(sender = %receipt.sender_number,
            signer = %receipt.signer_address, "inbound payload validated");
        Ok(receipt)
    }

    /// Consume the authorization parked under `sender_number` and spend
    /// it: pay `amount` from `sender` to `receiver`.
    ///
    /// The authorization is consumed before submission and never put
    /// back. A submission failure therefore costs the sender a
    /// re-send of the SMS, which is the cheap side of the trade; the
    /// expensive side would be a retry loop double-spending through a
    /// network that actually accepted the first attempt.
    pub async fn build_transaction(
        &self,
        sender_number: &str,
        sender: &Address,
        receiver: &str,
        amount: Amount,
    ) -> Result<SubmittedTransaction, CourierError> {
        // Consume under the store's lock; submit well after it is released.
        let auth = self.sessions.consume_for_signer(sender_number, sender)?;

        let intent = TransactionIntent::new(receiver, amount);
        let tx = build_payment(auth, &intent)?;

        let submit = self.network.submit(&tx);
        match tokio::time::timeout(self.config.submit_timeout, submit).await {
            Ok(result) => result,
            Err(_) => Err(CourierError::SubmissionFailed {
                detail: format!(
                    "timed out after {}s awaiting network acceptance",
                    self.config.submit_timeout.as_secs()
                ),
            }),
        }
    }

    /// Drop expired sessions. Exposed for the gateway's housekeeping
    /// loop.
    pub fn purge_expired_sessions(&self) -> usize {
        self.sessions.purge_expired()
    }

    pub fn pending_sessions(&self) -> usize {
        self.sessions.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::CourierKeypair;
    use crate::transaction::DevLedger;
    use crate::transport::{MemoryTransport, SendAck};
    use async_trait::async_trait;

    fn service(config: ServiceConfig) -> CourierService<DevLedger, MemoryTransport> {
        CourierService::new(
            config,
            Arc::new(DevLedger::new()),
            Arc::new(MemoryTransport::new()),
        )
    }

    fn funded_sender(
        svc: &CourierService<DevLedger, MemoryTransport>,
        micros: u64,
    ) -> (CourierKeypair, Address) {
        let kp = CourierKeypair::generate();
        let addr = Address::from_public_key(&kp.public_key());
        svc.network().fund(&addr, Amount::from_micros(micros));
        (kp, addr)
    }

    #[tokio::test]
    async fn full_flow_sign_send_receive_spend() {
        let svc = service(ServiceConfig::default());
        let (kp, sender) = funded_sender(&svc, 10_000);
        let receiver =
            Address::from_public_key(&CourierKeypair::generate().public_key());

        let payload = svc
            .sign_and_encode(AuthorizationProgram::new(vec![0x01, 0x02]).unwrap(), &kp, &sender)
            .unwrap();
        svc.send_payload("+15550009999", &payload).await.unwrap();

        let inbound = InboundMessage::new("+15551230000", "+15550009999", payload);
        let receipt = svc.receive_and_validate(&inbound).unwrap();
        assert_eq!(receipt.signer_address, sender.to_bech32());

        let submitted = svc
            .build_transaction(
                "+15551230000",
                &sender,
                &receiver.to_bech32(),
                Amount::from_micros(1000),
            )
            .await
            .unwrap();
        assert!(!submitted.tx_id.is_empty());

        assert_eq!(
            svc.network().balance(&receiver).await.unwrap(),
            Amount::from_micros(1000)
        );
    }

    #[tokio::test]
    async fn second_build_from_same_session_is_session_empty() {
        let svc = service(ServiceConfig::default());
        let (kp, sender) = funded_sender(&svc, 10_000);
        let receiver =
            Address::from_public_key(&CourierKeypair::generate().public_key()).to_bech32();

        let payload = svc
            .sign_and_encode(AuthorizationProgram::new(vec![0x05]).unwrap(), &kp, &sender)
            .unwrap();
        let inbound = InboundMessage::new("+15551230000", "+15550009999", payload);
        svc.receive_and_validate(&inbound).unwrap();

        svc.build_transaction("+15551230000", &sender, &receiver, Amount::from_micros(10))
            .await
            .unwrap();
        let err = svc
            .build_transaction("+15551230000", &sender, &receiver, Amount::from_micros(10))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::SessionEmpty));
    }

    #[tokio::test]
    async fn wrong_sender_address_does_not_consume() {
        let svc = service(ServiceConfig::default());
        let (kp, sender) = funded_sender(&svc, 10_000);
        let stranger =
            Address::from_public_key(&CourierKeypair::generate().public_key());
        let receiver =
            Address::from_public_key(&CourierKeypair::generate().public_key()).to_bech32();

        let payload = svc
            .sign_and_encode(AuthorizationProgram::new(vec![0x05]).unwrap(), &kp, &sender)
            .unwrap();
        svc.receive_and_validate(&InboundMessage::new(
            "+15551230000",
            "+15550009999",
            payload,
        ))
        .unwrap();

        let err = svc
            .build_transaction("+15551230000", &stranger, &receiver, Amount::from_micros(10))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::AddressMismatch { .. }));

        // Still there for the real sender.
        svc.build_transaction("+15551230000", &sender, &receiver, Amount::from_micros(10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn invalid_inbound_leaves_existing_session_alone() {
        let svc = service(ServiceConfig::default());
        let (kp, sender) = funded_sender(&svc, 10_000);
        let receiver =
            Address::from_public_key(&CourierKeypair::generate().public_key()).to_bech32();

        let payload = svc
            .sign_and_encode(AuthorizationProgram::new(vec![0x05]).unwrap(), &kp, &sender)
            .unwrap();
        svc.receive_and_validate(&InboundMessage::new(
            "+15551230000",
            "+15550009999",
            payload,
        ))
        .unwrap();

        let err = svc
            .receive_and_validate(&InboundMessage::new(
                "+15551230000",
                "+15550009999",
                "complete garbage",
            ))
            .unwrap_err();
        assert!(matches!(err, CourierError::Malformed));
        assert_eq!(svc.pending_sessions(), 1);

        svc.build_transaction("+15551230000", &sender, &receiver, Amount::from_micros(10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn payload_over_budget_fails_at_signing_side() {
        let tight = ServiceConfig {
            max_payload_chars: 140,
            ..ServiceConfig::default()
        };
        let svc = service(tight);
        let kp = CourierKeypair::generate();
        let addr = Address::from_public_key(&kp.public_key());

        let err = svc
            .sign_and_encode(AuthorizationProgram::new(vec![0xAA; 400]).unwrap(), &kp, &addr)
            .unwrap_err();
        assert!(matches!(err, CourierError::TooLarge { limit: 140, .. }));
    }

    struct StalledTransport;

    #[async_trait]
    impl SmsTransport for StalledTransport {
        async fn send(&self, _to: &str, _body: &str) -> Result<SendAck, CourierError> {
            tokio::time::sleep(StdDuration::from_secs(3600)).await;
            unreachable!("the timeout fires first")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_carrier_times_out() {
        let config = ServiceConfig {
            send_timeout: StdDuration::from_secs(2),
            ..ServiceConfig::default()
        };
        let svc = CourierService::new(
            config,
            Arc::new(DevLedger::new()),
            Arc::new(StalledTransport),
        );

        let err = svc.send_payload("+15550000000", "body").await.unwrap_err();
        assert!(matches!(err, CourierError::TransportTimeout { seconds: 2 }));
    }

    struct StalledLedger;

    #[async_trait]
    impl NetworkClient for StalledLedger {
        async fn submit(
            &self,
            _tx: &crate::transaction::PaymentTransaction,
        ) -> Result<SubmittedTransaction, CourierError> {
            tokio::time::sleep(StdDuration::from_secs(3600)).await;
            unreachable!("the timeout fires first")
        }

        async fn balance(&self, _address: &Address) -> Result<Amount, CourierError> {
            Ok(Amount::ZERO)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_network_reports_submission_failed_and_consumes() {
        let config = ServiceConfig {
            submit_timeout: StdDuration::from_secs(5),
            ..ServiceConfig::default()
        };
        let svc = CourierService::new(
            config,
            Arc::new(StalledLedger),
            Arc::new(MemoryTransport::new()),
        );

        let kp = CourierKeypair::generate();
        let sender = Address::from_public_key(&kp.public_key());
        let receiver =
            Address::from_public_key(&CourierKeypair::generate().public_key()).to_bech32();
        let payload = svc
            .sign_and_encode(AuthorizationProgram::new(vec![0x01]).unwrap(), &kp, &sender)
            .unwrap();
        svc.receive_and_validate(&InboundMessage::new(
            "+15551230000",
            "+15550009999",
            payload,
        ))
        .unwrap();

        let err = svc
            .build_transaction("+15551230000", &sender, &receiver, Amount::from_micros(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::SubmissionFailed { ref detail }
            if detail.contains("timed out")));

        // The authorization was consumed; the network may have taken the
        // money even though the acceptance never arrived.
        let err = svc
            .build_transaction("+15551230000", &sender, &receiver, Amount::from_micros(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::SessionEmpty));
    }
}
