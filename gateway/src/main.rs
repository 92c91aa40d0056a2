// Copyright (c) 2026 Courier Labs. MIT License.
// See LICENSE for details.

//! # Courier Gateway
//!
//! Entry point for the `courier-gateway` binary. Parses CLI arguments,
//! initializes logging, and serves the HTTP API that bridges SMS
//! traffic to the ledger.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the gateway HTTP server
//! - `keygen`  — generate an account keypair
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod spool;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use courier_protocol::crypto::keys::CourierKeypair;
use courier_protocol::service::{CourierService, ServiceConfig};
use courier_protocol::transaction::DevLedger;
use courier_protocol::Address;

use cli::{Commands, CourierGatewayCli};
use logging::LogFormat;
use spool::SpoolTransport;

/// How often the housekeeping task drops expired sessions.
const SESSION_PURGE_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CourierGatewayCli::parse();

    match cli.command {
        Commands::Run(args) => run_gateway(args).await,
        Commands::Keygen(args) => keygen(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the gateway: spool transport, dev ledger, protocol service,
/// and the HTTP API.
async fn run_gateway(args: cli::RunArgs) -> Result<()> {
    let format = if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    logging::init_logging("courier_gateway=info,courier_protocol=info,tower_http=debug", format);

    tracing::info!(
        port = args.port,
        spool_dir = %args.spool_dir.display(),
        max_payload_chars = args.max_payload_chars,
        session_ttl_secs = args.session_ttl_secs,
        "starting courier-gateway"
    );

    let transport = SpoolTransport::open(&args.spool_dir).with_context(|| {
        format!("failed to open spool directory: {}", args.spool_dir.display())
    })?;

    let config = ServiceConfig {
        max_payload_chars: args.max_payload_chars,
        session_ttl: chrono::Duration::seconds(args.session_ttl_secs),
        ..ServiceConfig::default()
    };
    let service = Arc::new(CourierService::new(
        config,
        Arc::new(DevLedger::new()),
        Arc::new(transport),
    ));

    let app_state = api::AppState {
        version: format!(
            "{} (payload v{})",
            env!("CARGO_PKG_VERSION"),
            courier_protocol::config::PAYLOAD_VERSION,
        ),
        service: Arc::clone(&service),
        last_inbound: Arc::new(parking_lot::RwLock::new(None)),
        faucet_micros: args.faucet_micros,
    };

    let router = api::create_router(app_state);
    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", addr))?;
    tracing::info!("API server listening on {}", addr);

    // Expired sessions are also rejected lazily at consume time; this
    // loop just keeps the map from accumulating dead entries.
    let purge_service = Arc::clone(&service);
    let purge_loop = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            SESSION_PURGE_INTERVAL_SECS,
        ));
        loop {
            interval.tick().await;
            let dropped = purge_service.purge_expired_sessions();
            if dropped > 0 {
                tracing::debug!(dropped, "expired sessions purged");
            }
        }
    });

    tokio::select! {
        res = axum::serve(listener, router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    purge_loop.abort();
    tracing::info!("courier-gateway stopped");
    Ok(())
}

/// Generates an account keypair and prints the address. The secret key
/// goes to the `--out` file (mode 0600) or, failing that flag, stdout.
fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let keypair = CourierKeypair::generate();
    let address = Address::from_public_key(&keypair.public_key());
    let secret_hex = keypair.secret_key_hex();

    println!("Address    : {}", address.to_bech32());
    println!("Public key : {}", keypair.public_key().to_base58());

    match args.out {
        Some(path) => {
            std::fs::write(&path, &secret_hex)
                .with_context(|| format!("failed to write secret key to {}", path.display()))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
            }
            println!("Secret key : written to {}", path.display());
        }
        None => {
            println!("Secret key : {}", secret_hex);
        }
    }

    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("courier-gateway {}", env!("CARGO_PKG_VERSION"));
    println!("payload format v{}", courier_protocol::config::PAYLOAD_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
