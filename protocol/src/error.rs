//! # Error Taxonomy
//!
//! One closed enum for every failure the pipeline can surface. Callers
//! branch on the variant, never on message text.
//!
//! Two variants are deliberately opaque: [`CourierError::Malformed`] and
//! [`CourierError::InvalidSignature`] carry no offset, field name, or
//! partial-parse detail. A decoder that reports *where* a candidate
//! payload failed hands an attacker an oracle for guessing valid
//! payloads faster than brute force. "It didn't decode" is all anyone
//! outside this crate gets to know.
//!
//! Nothing here is retried automatically. Every variant is terminal for
//! the current attempt; retry policy belongs to the caller, who is the
//! only party that can track idempotency across attempts.

use thiserror::Error;

/// Every failure mode of the sign/encode/transport/decode/validate/submit
/// pipeline.
#[derive(Debug, Error)]
pub enum CourierError {
    /// The external compiler rejected the program source.
    #[error("program compilation failed: {detail}")]
    CompileFailed {
        /// Compiler diagnostic, passed through verbatim.
        detail: String,
    },

    /// The private key does not control the address the caller claimed.
    /// Raised before any signature is produced.
    #[error("private key does not match the claimed signer address")]
    KeyMismatch,

    /// The encoded payload would exceed the transport budget.
    /// Encoding fails whole; it never truncates.
    #[error("encoded payload is {encoded} chars, exceeds the {limit}-char budget")]
    TooLarge {
        /// Length the encoding would have had.
        encoded: usize,
        /// The configured budget it exceeded.
        limit: usize,
    },

    /// The input is not a well-formed payload. Intentionally detail-free.
    #[error("malformed payload")]
    Malformed,

    /// The payload declares a format version this build does not speak.
    /// No best-effort parsing of unknown layouts.
    #[error("unsupported payload version {version}")]
    UnsupportedVersion {
        /// The version tag found in the payload.
        version: u8,
    },

    /// The delegation signature did not verify. Intentionally detail-free.
    #[error("invalid authorization signature")]
    InvalidSignature,

    /// The transaction sender is not the account that signed the
    /// delegation. A transaction cannot spend under someone else's
    /// authorization.
    #[error("sender {got} does not match the authorization signer {expected}")]
    AddressMismatch {
        /// The signer address bound into the authorization.
        expected: String,
        /// The sender address the caller supplied.
        got: String,
    },

    /// No validated authorization is held for this session. Either none
    /// was ever decoded, it expired, or it was already consumed.
    #[error("no authorization available for this session")]
    SessionEmpty,

    /// An address string at the API boundary failed to parse.
    #[error("invalid address: {detail}")]
    InvalidAddress {
        /// What the parser objected to.
        detail: String,
    },

    /// The SMS transport did not acknowledge within the configured window.
    #[error("transport send timed out after {seconds}s")]
    TransportTimeout {
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// The network rejected the transaction, or the submission outcome
    /// is unknown (e.g. response timeout). Never retried here: the first
    /// attempt may have settled, and a blind resend is a double-spend.
    #[error("submission failed: {detail}")]
    SubmissionFailed {
        /// Network diagnostic or timeout note.
        detail: String,
    },
}

impl CourierError {
    /// Stable machine-readable kind, for API responses and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CompileFailed { .. } => "compile_failed",
            Self::KeyMismatch => "key_mismatch",
            Self::TooLarge { .. } => "too_large",
            Self::Malformed => "malformed",
            Self::UnsupportedVersion { .. } => "unsupported_version",
            Self::InvalidSignature => "invalid_signature",
            Self::AddressMismatch { .. } => "address_mismatch",
            Self::SessionEmpty => "session_empty",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::TransportTimeout { .. } => "transport_timeout",
            Self::SubmissionFailed { .. } => "submission_failed",
        }
    }
}
