//! # Protocol Constants
//!
//! Every magic number in Courier lives here. The payload wire format and
//! the address derivation rules are consensus-critical for anyone holding
//! an encoded authorization in their SMS inbox: change them and every
//! token already in flight becomes unredeemable. Choose carefully.

// ---------------------------------------------------------------------------
// Payload Wire Format
// ---------------------------------------------------------------------------

/// Version tag written as the first byte of every encoded payload.
///
/// Bumped only on incompatible layout changes. Decoders must refuse
/// versions they do not understand rather than guess at field boundaries.
pub const PAYLOAD_VERSION: u8 = 1;

/// Ed25519 public key length in bytes. Fixed-width field in the payload.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length in bytes. Fixed-width field in the payload.
pub const SIGNATURE_LENGTH: usize = 64;

/// Maximum number of program arguments a payload may carry.
///
/// The count is stored in a single byte; 255 is the format ceiling, but
/// anything near it would never fit an SMS budget anyway.
pub const MAX_PROGRAM_ARGS: usize = 255;

/// Maximum length of program bytecode, and of each individual argument.
///
/// Both are framed by u16 length prefixes in the canonical program form
/// and on the wire. Enforced at program construction so the prefixes can
/// never wrap: a wrapped prefix would give two different programs the
/// same canonical bytes, the same address, and one valid signature.
pub const MAX_PROGRAM_FIELD_BYTES: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// SMS Budgets
// ---------------------------------------------------------------------------

/// Characters available in a single GSM-7 SMS segment.
pub const SMS_SINGLE_SEGMENT_CHARS: usize = 160;

/// Tight budget used when the carrier reserves headroom for routing
/// metadata (some gateways clip bodies at 140).
pub const SMS_TIGHT_BUDGET_CHARS: usize = 140;

/// Loose budget for transports that reassemble concatenated segments.
/// Four segments of 150 usable characters is a conservative floor for
/// every concatenating carrier we have seen.
pub const SMS_MULTI_SEGMENT_CHARS: usize = 600;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Bech32 human-readable prefix for all Courier addresses.
pub const ADDRESS_HRP: &str = "courier";

/// Domain separation tag prepended to program bytecode before hashing
/// and signing. Guarantees a delegation signature can never be replayed
/// as a signature over arbitrary account data, and vice versa.
pub const PROGRAM_DOMAIN_TAG: &[u8] = b"Program";

/// Address hash output length. BLAKE3 digests are 32 bytes.
pub const ADDRESS_HASH_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// Smallest indivisible unit: one token = 1_000_000 micros.
/// All protocol arithmetic is integer micros; no floats near money.
pub const MICROS_PER_TOKEN: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Timing Defaults
// ---------------------------------------------------------------------------

/// Default lifetime of a decoded-but-unconsumed authorization in the
/// session store, in seconds. Ten minutes covers a user walking through
/// the redeem flow; anything older is stale and must be re-decoded.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 600;

/// Default timeout for one network submission attempt, in seconds.
pub const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 10;

/// Default timeout for one SMS send through the transport, in seconds.
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;

/// Replay lease length in bytes (SHA-256 digest of the payload text).
pub const LEASE_LENGTH: usize = 32;
