//! # Authorization Programs
//!
//! A program is immutable, previously compiled bytecode expressing a
//! spending condition, optionally with a list of runtime arguments. The
//! core never interprets the bytecode; it treats programs as opaque bytes
//! to be bound into a delegation, transported, and handed to the network.
//!
//! What the core *does* own is the program's **canonical byte form**: the
//! exact byte string that is hashed into the program address and signed
//! by the delegating account. Arguments are part of it. If they were not,
//! a byte flipped inside an argument would survive validation and produce
//! an authorization different from the one that was signed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{MAX_PROGRAM_ARGS, MAX_PROGRAM_FIELD_BYTES, PROGRAM_DOMAIN_TAG};
use crate::error::CourierError;
use crate::identity::Address;

/// Compiled spending-condition bytecode plus its runtime arguments.
///
/// Immutable once constructed and identified by its own bytes: two
/// programs with identical bytecode and arguments are the same program
/// and share one address.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationProgram {
    bytecode: Vec<u8>,
    args: Vec<Vec<u8>>,
}

impl AuthorizationProgram {
    /// Wrap compiled bytecode with no arguments.
    ///
    /// Fails with `Malformed` when the bytecode exceeds the canonical
    /// form's u16 length prefix.
    pub fn new(bytecode: Vec<u8>) -> Result<Self, CourierError> {
        Self::with_args(bytecode, Vec::new())
    }

    /// Wrap compiled bytecode with runtime arguments.
    ///
    /// Fails with `Malformed` when the argument count exceeds the
    /// payload format's single-byte counter, or when the bytecode or
    /// any argument exceeds its u16 length prefix. The length checks
    /// must happen here, not at encode time: a field longer than its
    /// prefix can express would wrap the prefix in `canonical_bytes`,
    /// and two distinct programs would then share one canonical form,
    /// one address, and one delegation signature.
    pub fn with_args(bytecode: Vec<u8>, args: Vec<Vec<u8>>) -> Result<Self, CourierError> {
        if args.len() > MAX_PROGRAM_ARGS {
            return Err(CourierError::Malformed);
        }
        if bytecode.len() > MAX_PROGRAM_FIELD_BYTES
            || args.iter().any(|arg| arg.len() > MAX_PROGRAM_FIELD_BYTES)
        {
            return Err(CourierError::Malformed);
        }
        Ok(Self { bytecode, args })
    }

    /// The raw bytecode.
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// The runtime arguments.
    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// The canonical byte form: domain tag, then length-framed bytecode
    /// and arguments. This is the message a delegating account signs and
    /// the preimage of the program address, so a verifier can reconstruct
    /// both from a decoded payload alone.
    ///
    /// Layout (integers big-endian):
    ///
    /// ```text
    /// "Program" | u16 bytecode_len | bytecode | u8 arg_count | (u16 len | bytes)*
    /// ```
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            PROGRAM_DOMAIN_TAG.len() + 3 + self.bytecode.len() + self.args.len() * 2,
        );
        buf.extend_from_slice(PROGRAM_DOMAIN_TAG);
        // Lossless casts: field lengths are bounded at construction.
        buf.extend_from_slice(&(self.bytecode.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.bytecode);
        buf.push(self.args.len() as u8);
        for arg in &self.args {
            buf.extend_from_slice(&(arg.len() as u16).to_be_bytes());
            buf.extend_from_slice(arg);
        }
        buf
    }

    /// The program's content-derived address.
    pub fn address(&self) -> Address {
        Address::from_canonical_program_bytes(&self.canonical_bytes())
    }
}

impl fmt::Debug for AuthorizationProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuthorizationProgram({} bytes, {} args, addr={})",
            self.bytecode.len(),
            self.args.len(),
            self.address()
        )
    }
}

// ---------------------------------------------------------------------------
// Compiler seam
// ---------------------------------------------------------------------------

/// External collaborator that turns program source into bytecode.
///
/// The real compiler lives on a network node; the core only needs this
/// seam so the gateway can accept source uploads without the pipeline
/// knowing anything about the source language.
pub trait ProgramCompiler: Send + Sync {
    /// Compile source bytes to an [`AuthorizationProgram`], or
    /// [`CourierError::CompileFailed`] with the compiler's diagnostic.
    fn compile(&self, source: &[u8]) -> Result<AuthorizationProgram, CourierError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_content_derived() {
        let p1 = AuthorizationProgram::new(vec![0x01, 0x02]).unwrap();
        let p2 = AuthorizationProgram::new(vec![0x01, 0x02]).unwrap();
        let p3 = AuthorizationProgram::new(vec![0x01, 0x03]).unwrap();
        assert_eq!(p1.address(), p2.address());
        assert_ne!(p1.address(), p3.address());
    }

    #[test]
    fn args_change_the_address() {
        let plain = AuthorizationProgram::new(vec![0xAA]).unwrap();
        let with_arg =
            AuthorizationProgram::with_args(vec![0xAA], vec![vec![0x01]]).unwrap();
        assert_ne!(plain.address(), with_arg.address());
    }

    #[test]
    fn canonical_bytes_start_with_domain_tag() {
        let p = AuthorizationProgram::new(vec![0xFF; 4]).unwrap();
        assert!(p.canonical_bytes().starts_with(b"Program"));
    }

    #[test]
    fn arg_framing_is_unambiguous() {
        // Moving a byte across an argument boundary must change the
        // canonical form even though the concatenated content is equal.
        let a = AuthorizationProgram::with_args(vec![0x01], vec![vec![0x02, 0x03], vec![]])
            .unwrap();
        let b = AuthorizationProgram::with_args(vec![0x01], vec![vec![0x02], vec![0x03]])
            .unwrap();
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn too_many_args_rejected() {
        let args = vec![vec![0u8]; 256];
        assert!(AuthorizationProgram::with_args(vec![0x01], args).is_err());
    }

    #[test]
    fn empty_bytecode_is_allowed() {
        // The core does not judge bytecode; an empty program is the
        // network's problem to reject.
        let p = AuthorizationProgram::new(vec![]).unwrap();
        assert_eq!(p.canonical_bytes().len(), b"Program".len() + 3);
    }

    #[test]
    fn bytecode_at_prefix_ceiling_accepted() {
        let p = AuthorizationProgram::new(vec![0x2A; MAX_PROGRAM_FIELD_BYTES]).unwrap();
        assert!(AuthorizationProgram::new(vec![0x2A; MAX_PROGRAM_FIELD_BYTES + 1]).is_err());
        // The length prefix in the canonical form reads back intact.
        let canon = p.canonical_bytes();
        let tag = PROGRAM_DOMAIN_TAG.len();
        let len = u16::from_be_bytes([canon[tag], canon[tag + 1]]) as usize;
        assert_eq!(len, MAX_PROGRAM_FIELD_BYTES);
    }

    #[test]
    fn oversized_argument_rejected() {
        let arg = vec![0u8; MAX_PROGRAM_FIELD_BYTES + 1];
        assert!(matches!(
            AuthorizationProgram::with_args(vec![0x01], vec![arg]),
            Err(CourierError::Malformed)
        ));
    }

    #[test]
    fn wrapped_length_prefix_collision_unconstructible() {
        // A 65538-byte program's u16 length prefix would wrap to 2,
        // giving it the same canonical bytes as a crafted 2-byte program
        // carrying a 65534-byte argument, so one delegation signature
        // would cover both. Neither side of that pair may construct.
        let big = AuthorizationProgram::new(vec![0x2A; (u16::MAX as usize) + 3]);
        assert!(matches!(big, Err(CourierError::Malformed)));

        let twin = AuthorizationProgram::with_args(
            vec![0x2A, 0x2A],
            vec![vec![0x2A; (u16::MAX as usize) - 1]],
        )
        .unwrap();
        // The in-bounds twin stands alone: its canonical form states its
        // own lengths exactly.
        let canon = twin.canonical_bytes();
        let tag = PROGRAM_DOMAIN_TAG.len();
        assert_eq!(u16::from_be_bytes([canon[tag], canon[tag + 1]]), 2);
        assert_eq!(canon.len(), tag + 2 + 2 + 1 + 2 + (u16::MAX as usize) - 1);
    }
}
