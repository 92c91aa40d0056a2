//! # CLI Interface
//!
//! Defines the command-line argument structure for `courier-gateway`
//! using `clap` derive. Supports three subcommands: `run`, `keygen`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Courier SMS payment gateway.
///
/// Receives delegated-authorization payloads over an SMS webhook,
/// validates them, and turns them into token transfers on the
/// configured ledger.
#[derive(Parser, Debug)]
#[command(
    name = "courier-gateway",
    about = "Courier SMS payment gateway",
    version,
    propagate_version = true
)]
pub struct CourierGatewayCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the gateway binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the gateway HTTP server.
    Run(RunArgs),
    /// Generate a fresh account keypair and print the address.
    Keygen(KeygenArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the HTTP API.
    #[arg(long, env = "COURIER_PORT", default_value_t = 8470)]
    pub port: u16,

    /// Directory where outbound SMS bodies are spooled as JSON files
    /// for the external carrier bridge to drain.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, env = "COURIER_SPOOL_DIR", default_value = "./spool")]
    pub spool_dir: PathBuf,

    /// Maximum encoded payload length in characters. 160 fits a single
    /// GSM-7 segment; carriers with concatenation support go higher.
    #[arg(long, env = "COURIER_MAX_PAYLOAD_CHARS", default_value_t = 160)]
    pub max_payload_chars: usize,

    /// Seconds a validated payload may wait unconsumed before the
    /// session expires.
    #[arg(long, env = "COURIER_SESSION_TTL_SECS", default_value_t = 600)]
    pub session_ttl_secs: i64,

    /// Microtokens credited to every account created through
    /// `POST /accounts`. Development convenience; set to 0 to disable.
    #[arg(long, env = "COURIER_FAUCET_MICROS", default_value_t = 10_000_000)]
    pub faucet_micros: u64,

    /// Emit logs as JSON lines instead of pretty-printed text.
    #[arg(long, env = "COURIER_LOG_JSON")]
    pub log_json: bool,
}

/// Arguments for the `keygen` subcommand.
#[derive(Parser, Debug)]
pub struct KeygenArgs {
    /// Write the secret key hex to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}
