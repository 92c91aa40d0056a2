//! # Spool Transport
//!
//! Outbound SMS as files. The gateway process never talks to a carrier
//! directly; each accepted message becomes one JSON file in the spool
//! directory and an external bridge drains the directory at its own
//! pace. A crash between write and drain loses nothing, and local
//! development needs no carrier credentials at all.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use courier_protocol::transport::{SendAck, SmsTransport};
use courier_protocol::CourierError;

/// One spooled outbound message, as serialized to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpooledMessage {
    pub id: String,
    pub to: String,
    pub body: String,
    pub queued_at: String,
}

/// [`SmsTransport`] that writes each message to
/// `<spool_dir>/<timestamp>-<id>.json`.
///
/// File names sort chronologically so the bridge can drain in order.
/// The write goes to a `.tmp` name first and is renamed into place, so
/// the bridge never observes a half-written file.
pub struct SpoolTransport {
    spool_dir: PathBuf,
}

impl SpoolTransport {
    /// Open a spool at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            spool_dir: dir.to_path_buf(),
        })
    }

    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }
}

#[async_trait]
impl SmsTransport for SpoolTransport {
    async fn send(&self, to: &str, body: &str) -> Result<SendAck, CourierError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let message = SpooledMessage {
            id: id.clone(),
            to: to.to_string(),
            body: body.to_string(),
            queued_at: now.to_rfc3339(),
        };

        let file_name = format!("{}-{}.json", now.format("%Y%m%dT%H%M%S%.3f"), id);
        let final_path = self.spool_dir.join(&file_name);
        let tmp_path = self.spool_dir.join(format!("{}.tmp", file_name));

        let json = serde_json::to_vec_pretty(&message).map_err(|e| {
            CourierError::SubmissionFailed {
                detail: format!("spool serialization: {}", e),
            }
        })?;

        let write = async {
            tokio::fs::write(&tmp_path, &json).await?;
            tokio::fs::rename(&tmp_path, &final_path).await
        };
        write.await.map_err(|e| CourierError::SubmissionFailed {
            detail: format!("spool write: {}", e),
        })?;

        tracing::debug!(to, file = %final_path.display(), "message spooled");
        Ok(SendAck {
            message_id: Some(id),
            accepted_at: now,
        })
    }
}
