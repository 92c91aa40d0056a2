// Copyright (c) 2026 Courier Labs. MIT License.
// See LICENSE for details.

//! # Courier Protocol — Core Library
//!
//! Token transfers authorized over SMS, for phones that have never heard
//! of an app store. A sender signs a delegated authorization over a
//! compiled program, the whole thing travels as one printable text
//! message, and the receiving side turns it into exactly one payment.
//!
//! The threat model is blunt: SMS is plaintext, carriers mangle bodies,
//! and anyone who sees the message can replay it verbatim. So the
//! payload is self-contained and tamper-evident, decoding is total, and
//! a lease derived from the exact payload text makes the second
//! submission worthless.
//!
//! ## Architecture
//!
//! - **crypto** — Ed25519 keys and the two hashes everything hangs off.
//! - **identity** — Bech32 `courier1...` addresses for keys and programs.
//! - **program** — Compiled authorization programs, content-addressed.
//! - **authorization** — Delegated signing and payload validation.
//! - **codec** — The SMS wire format: binary framing under base64url.
//! - **session** — Validated payloads parked between webhook and spend.
//! - **transaction** — Payment construction and the network seam.
//! - **transport** — The carrier seam.
//! - **service** — The facade that strings the steps together.
//! - **config** — Protocol constants.
//!
//! ## Design Philosophy
//!
//! 1. A truncated or tampered payload must fail loudly, never pay.
//! 2. One SMS, at most one transaction, no matter who retries what.
//! 3. Decoding never panics; every input maps to a closed error set.
//! 4. If it touches money, it has tests. Plural.

pub mod authorization;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod program;
pub mod service;
pub mod session;
pub mod transaction;
pub mod transport;

pub use authorization::{sign_program, validate, DelegatedAuthorization, ValidatedAuthorization};
pub use error::CourierError;
pub use identity::Address;
pub use program::{AuthorizationProgram, ProgramCompiler};
pub use service::{CourierService, ServiceConfig, ValidationReceipt};
