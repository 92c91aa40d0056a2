//! Inbound payload validation.
//!
//! The checks run cheapest-first: decode (which itself gates on the
//! version tag), then the Ed25519 verification. Any failure discards the
//! candidate entirely; a partially-validated authorization never leaves
//! this module.
//!
//! The output type, [`ValidatedAuthorization`], has no public constructor.
//! Downstream stages (session store, transaction builder) take it by
//! value, so "was this input validated?" is answered by the type system
//! instead of by programmer discipline. That replaces the original
//! flow's habit of re-checking trust at every step of a multi-call
//! sequence.

use crate::codec;
use crate::error::CourierError;
use crate::identity::Address;

use super::DelegatedAuthorization;

/// Proof that a payload decoded cleanly and its delegation signature
/// verified. Only [`validate`] produces one.
#[derive(Clone, Debug)]
pub struct ValidatedAuthorization {
    auth: DelegatedAuthorization,
    signer: Address,
    payload_text: String,
}

impl ValidatedAuthorization {
    /// The verified authorization.
    pub fn authorization(&self) -> &DelegatedAuthorization {
        &self.auth
    }

    /// The delegating account, derived from the embedded public key.
    pub fn signer_address(&self) -> Address {
        self.signer
    }

    /// The program's content-derived address.
    pub fn program_address(&self) -> Address {
        self.auth.program.address()
    }

    /// The exact printable payload this value was decoded from. The
    /// transaction's replay lease is derived from this text, binding
    /// each transported artifact to a single spend.
    pub fn payload_text(&self) -> &str {
        &self.payload_text
    }

    /// Split into the authorization and its source text, for the
    /// transaction builder which owns both from here on.
    pub fn into_parts(self) -> (DelegatedAuthorization, String) {
        (self.auth, self.payload_text)
    }
}

/// Decode and verify one inbound payload.
///
/// Failure modes, in check order:
///
/// 1. [`CourierError::Malformed`] — not a decodable payload.
/// 2. [`CourierError::UnsupportedVersion`] — decodable framing but a
///    version tag this build does not speak.
/// 3. [`CourierError::InvalidSignature`] — well-formed, but the
///    signature does not verify over the program's canonical bytes
///    against the embedded public key.
///
/// Per the error policy, 1 and 3 carry no positional detail.
pub fn validate(payload_text: &str) -> Result<ValidatedAuthorization, CourierError> {
    let auth = codec::decode(payload_text)?;

    if !auth.verify() {
        tracing::warn!("inbound payload failed signature verification");
        return Err(CourierError::InvalidSignature);
    }

    let signer = auth.signer_address();
    tracing::info!(
        signer = %signer,
        program = %auth.program.address(),
        chars = payload_text.len(),
        "payload validated"
    );

    Ok(ValidatedAuthorization {
        auth,
        signer,
        payload_text: payload_text.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
