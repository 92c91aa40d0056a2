//! # Delegated Authorizations
//!
//! The central artifact of the protocol: a program plus an Ed25519
//! signature from the delegating account over the program's canonical
//! bytes. Whoever holds the encoded artifact can build one transaction
//! that spends from the signer's account under the program's conditions.
//!
//! Producing one is [`signer::sign_program`]; checking one that came off
//! the wire is [`validation::validate`], which is the only way to obtain
//! a [`validation::ValidatedAuthorization`] handle.

pub mod signer;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::crypto::keys::{CourierPublicKey, CourierSignature};
use crate::identity::Address;
use crate::program::AuthorizationProgram;

pub use signer::sign_program;
pub use validation::{validate, ValidatedAuthorization};

/// A program with a delegation signature and the signer's public key.
///
/// The public key travels with the artifact (rather than the address)
/// so the signer address is always *derived* during validation and can
/// never disagree with the key that actually signed.
///
/// Equality is field-wise; the round-trip guarantee of the codec is
/// stated in terms of this equality.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatedAuthorization {
    /// The spending-condition program being delegated.
    pub program: AuthorizationProgram,
    /// Public key of the delegating account.
    pub signer_public_key: CourierPublicKey,
    /// Ed25519 signature over [`AuthorizationProgram::canonical_bytes`].
    pub signature: CourierSignature,
}

impl DelegatedAuthorization {
    /// The delegating account's address, derived from the embedded key.
    pub fn signer_address(&self) -> Address {
        Address::from_public_key(&self.signer_public_key)
    }

    /// Whether the signature verifies against the program and key held
    /// in this value. Used by validation and re-checked by the ledger.
    pub fn verify(&self) -> bool {
        self.signer_public_key
            .verify(&self.program.canonical_bytes(), &self.signature)
    }
}
