//! Delegation signing.
//!
//! Signing is kept separate from program construction because the keypair
//! is typically supplied at the last moment (pasted into a form, read
//! from a key file) while the program was compiled long before.
//!
//! The one rule that matters here: the key/address consistency check runs
//! **before** the signature is produced. Signing first and checking after
//! would briefly bring into existence a signature that authorizes
//! spending from an account the caller never claimed, and signatures,
//! once made, have a way of escaping.

use crate::crypto::keys::CourierKeypair;
use crate::error::CourierError;
use crate::identity::Address;
use crate::program::AuthorizationProgram;

use super::DelegatedAuthorization;

/// Sign a program with `keypair`, delegating spending rights from
/// `claimed_signer`.
///
/// `claimed_signer` is the address the caller believes the keypair
/// controls. If the address derived from the keypair differs, the call
/// fails with [`CourierError::KeyMismatch`] and nothing is signed.
///
/// The signed message is the program's canonical byte form, so any
/// verifier can rebuild it from the program alone; no side channel
/// carries the message.
pub fn sign_program(
    program: AuthorizationProgram,
    keypair: &CourierKeypair,
    claimed_signer: &Address,
) -> Result<DelegatedAuthorization, CourierError> {
    let public_key = keypair.public_key();
    let derived = Address::from_public_key(&public_key);
    if derived != *claimed_signer {
        return Err(CourierError::KeyMismatch);
    }

    let signature = keypair.sign(&program.canonical_bytes());
    tracing::debug!(signer = %derived, program = %program.address(), "program delegation signed");

    Ok(DelegatedAuthorization {
        program,
        signer_public_key: public_key,
        signature,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
