//! SMS transport seam.
//!
//! The protocol does not speak to any carrier itself; it hands finished
//! message bodies to an [`SmsTransport`] and receives [`InboundMessage`]s
//! from whoever owns the webhook. Everything carrier-specific lives
//! behind this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CourierError;

/// One SMS as delivered by a carrier webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// E.164 number of the device that sent the message.
    pub sender_number: String,
    /// The provisioned number that received it.
    pub receiver_number: String,
    /// Raw body, whitespace mangling and all.
    pub body: String,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender_number: sender.into(),
            receiver_number: receiver.into(),
            body: body.into(),
            received_at: Utc::now(),
        }
    }
}

/// Acknowledgement returned by a carrier for an accepted outbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendAck {
    /// Carrier-assigned message id, if the carrier provides one.
    pub message_id: Option<String>,
    pub accepted_at: DateTime<Utc>,
}

/// Outbound side of the carrier integration.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Hand `body` to the carrier addressed to `to`. Acceptance by the
    /// carrier is not delivery to the handset; the ack only means the
    /// carrier took custody.
    async fn send(&self, to: &str, body: &str) -> Result<SendAck, CourierError>;
}

/// In-memory transport that records every send. The test double used
/// throughout the suite and by the gateway's dry-run mode.
#[derive(Default)]
pub struct MemoryTransport {
    sent: parking_lot::Mutex<Vec<(String, String)>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every (recipient, body) pair sent so far, in order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl SmsTransport for MemoryTransport {
    async fn send(&self, to: &str, body: &str) -> Result<SendAck, CourierError> {
        self.sent.lock().push((to.to_string(), body.to_string()));
        Ok(SendAck {
            message_id: None,
            accepted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_transport_records_in_order() {
        let t = MemoryTransport::new();
        t.send("+15550001111", "first").await.unwrap();
        t.send("+15550002222", "second").await.unwrap();

        let sent = t.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], ("+15550001111".into(), "first".into()));
        assert_eq!(sent[1].1, "second");
    }
}
