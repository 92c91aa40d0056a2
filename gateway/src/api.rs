//! # REST API
//!
//! Builds the axum router for the gateway's HTTP interface. All
//! endpoints share application state through axum's `State` extractor
//! and speak JSON.
//!
//! ## Endpoints
//!
//! | Method | Path                | Description                                |
//! |--------|---------------------|--------------------------------------------|
//! | GET    | `/health`           | Liveness probe                             |
//! | POST   | `/accounts`         | Generate (and faucet-fund) an account      |
//! | POST   | `/sign`             | Sign + encode a payload, optionally send   |
//! | POST   | `/webhooks/inbound` | Carrier webhook for inbound SMS            |
//! | GET    | `/inbound`          | Most recent inbound message                |
//! | POST   | `/decode`           | Validate a payload into a session          |
//! | POST   | `/transactions`     | Consume a session and submit a payment     |

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use courier_protocol::crypto::keys::CourierKeypair;
use courier_protocol::service::CourierService;
use courier_protocol::transaction::{Amount, DevLedger};
use courier_protocol::transport::InboundMessage;
use courier_protocol::{Address, AuthorizationProgram, CourierError};

use crate::spool::SpoolTransport;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone, everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The gateway's reported version string.
    pub version: String,
    /// The protocol engine, wired to the dev ledger and spool transport.
    pub service: Arc<CourierService<DevLedger, SpoolTransport>>,
    /// Most recent inbound SMS from the carrier webhook.
    pub last_inbound: Arc<RwLock<Option<InboundMessage>>>,
    /// Microtokens credited to each newly created account. 0 disables
    /// the faucet.
    pub faucet_micros: u64,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and
/// request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/accounts", post(create_account_handler))
        .route("/sign", post(sign_handler))
        .route("/webhooks/inbound", post(inbound_webhook_handler))
        .route("/inbound", get(fetch_inbound_handler))
        .route("/decode", post(decode_handler))
        .route("/transactions", post(create_transaction_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `POST /accounts`.
///
/// The secret key appears here once and nowhere else; it is never
/// logged and the gateway keeps no copy.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    /// Bech32 address (`courier1...`).
    pub address: String,
    /// Hex-encoded Ed25519 public key.
    pub public_key: String,
    /// Hex-encoded Ed25519 secret key. Shown once.
    pub secret_key: String,
    /// Microtokens credited by the development faucet.
    pub funded_micros: u64,
}

/// Request body for `POST /sign`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignRequest {
    /// Compiled program bytecode, standard base64.
    pub program: String,
    /// Optional program arguments, each standard base64.
    #[serde(default)]
    pub args: Vec<String>,
    /// Hex-encoded secret key of the signer.
    pub secret_key: String,
    /// The address the caller claims the key controls.
    pub address: String,
    /// When set, the encoded payload is also sent to this number
    /// through the spool transport.
    pub receiver_number: Option<String>,
}

/// Response payload for `POST /sign`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignResponse {
    /// The encoded payload, ready to travel as an SMS body.
    pub payload: String,
    /// Payload length in characters.
    pub chars: usize,
    /// Content address of the signed program.
    pub program_address: String,
    /// Number the payload was spooled to, if requested.
    pub sent_to: Option<String>,
}

/// Request body for `POST /webhooks/inbound`, matching the carrier
/// bridge's delivery format.
#[derive(Debug, Serialize, Deserialize)]
pub struct InboundWebhookRequest {
    pub sender_number: String,
    pub receiver_number: String,
    pub text: String,
}

/// Request body for `POST /decode`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeRequest {
    /// Session key, by convention the sender's phone number.
    pub session_id: String,
    /// The payload text to validate.
    pub text: String,
}

/// Request body for `POST /transactions`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    /// Session holding the authorization, as used in `POST /decode`.
    pub session_id: String,
    /// Sender address; must match the authorization's signer.
    pub sender: String,
    /// Receiver address.
    pub receiver: String,
    /// Transfer amount in microtokens.
    pub amount_micros: u64,
}

/// Response payload for `POST /transactions`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    pub tx_id: String,
    pub confirmed_round: u64,
    /// Whether the confirmation SMS reached the spool.
    pub confirmation_sent: bool,
}

/// Generic error body returned by all endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable kind, from [`CourierError::kind`].
    pub kind: String,
    /// Human-readable message.
    pub error: String,
}

/// Maps a protocol error to an HTTP status and JSON body.
fn error_response(err: CourierError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        CourierError::SessionEmpty => StatusCode::NOT_FOUND,
        CourierError::AddressMismatch { .. } => StatusCode::FORBIDDEN,
        CourierError::TransportTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        CourierError::SubmissionFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::BAD_REQUEST,
    };
    let body = ErrorResponse {
        kind: err.kind().to_string(),
        error: err.to_string(),
    };
    (status, Json(body))
}

fn bad_request(kind: &str, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            kind: kind.to_string(),
            error: message.into(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the gateway is alive.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
        "pending_sessions": state.service.pending_sessions(),
    }))
}

/// `POST /accounts` — generates a fresh keypair and, when the faucet is
/// enabled, credits the new address on the dev ledger.
async fn create_account_handler(State(state): State<AppState>) -> impl IntoResponse {
    let keypair = CourierKeypair::generate();
    let address = Address::from_public_key(&keypair.public_key());

    if state.faucet_micros > 0 {
        state
            .service
            .network()
            .fund(&address, Amount::from_micros(state.faucet_micros));
    }

    // The address is loggable; the secret never is.
    tracing::info!(address = %address, funded = state.faucet_micros, "account created");

    Json(AccountResponse {
        address: address.to_bech32(),
        public_key: keypair.public_key().to_hex(),
        secret_key: keypair.secret_key_hex(),
        funded_micros: state.faucet_micros,
    })
}

/// `POST /sign` — signs a program, encodes the payload within the
/// configured budget, and optionally spools it to a phone number.
async fn sign_handler(
    State(state): State<AppState>,
    Json(req): Json<SignRequest>,
) -> impl IntoResponse {
    let bytecode = match BASE64_STANDARD.decode(&req.program) {
        Ok(b) => b,
        Err(e) => return bad_request("malformed", format!("program is not base64: {}", e)).into_response(),
    };
    let mut args = Vec::with_capacity(req.args.len());
    for (i, arg) in req.args.iter().enumerate() {
        match BASE64_STANDARD.decode(arg) {
            Ok(a) => args.push(a),
            Err(e) => {
                return bad_request("malformed", format!("arg {} is not base64: {}", i, e))
                    .into_response()
            }
        }
    }

    let keypair = match CourierKeypair::from_hex(&req.secret_key) {
        Ok(kp) => kp,
        Err(e) => return bad_request("key_mismatch", e.to_string()).into_response(),
    };
    let address: Address = match req.address.parse() {
        Ok(a) => a,
        Err(e) => {
            return error_response(CourierError::InvalidAddress {
                detail: e.to_string(),
            })
            .into_response()
        }
    };

    let program = match AuthorizationProgram::with_args(bytecode, args) {
        Ok(p) => p,
        Err(e) => return error_response(e).into_response(),
    };
    let program_address = program.address().to_bech32();

    let payload = match state.service.sign_and_encode(program, &keypair, &address) {
        Ok(p) => p,
        Err(e) => return error_response(e).into_response(),
    };

    let sent_to = match &req.receiver_number {
        Some(number) => match state.service.send_payload(number, &payload).await {
            Ok(()) => Some(number.clone()),
            Err(e) => return error_response(e).into_response(),
        },
        None => None,
    };

    Json(SignResponse {
        chars: payload.len(),
        payload,
        program_address,
        sent_to,
    })
    .into_response()
}

/// `POST /webhooks/inbound` — accepts an SMS delivery from the carrier
/// bridge and stores it as the most recent inbound message.
///
/// Storage only; validation happens when a client posts the text to
/// `/decode`. The webhook always answers 200 so the bridge does not
/// retry deliveries the gateway has already seen.
async fn inbound_webhook_handler(
    State(state): State<AppState>,
    Json(req): Json<InboundWebhookRequest>,
) -> impl IntoResponse {
    let message = InboundMessage::new(req.sender_number, req.receiver_number, req.text);
    tracing::info!(sender = %message.sender_number, chars = message.body.len(),
        "inbound SMS received");
    *state.last_inbound.write() = Some(message);

    Json(serde_json::json!({ "stored": true }))
}

/// `GET /inbound` — returns the most recent inbound message, or 404 if
/// none has arrived yet.
async fn fetch_inbound_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.last_inbound.read().clone() {
        Some(message) => Json(message).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                kind: "no_inbound".to_string(),
                error: "no inbound message received yet".to_string(),
            }),
        )
            .into_response(),
    }
}

/// `POST /decode` — validates a payload and parks the authorization
/// under the given session id.
async fn decode_handler(
    State(state): State<AppState>,
    Json(req): Json<DecodeRequest>,
) -> impl IntoResponse {
    let inbound = InboundMessage::new(req.session_id, String::new(), req.text);
    match state.service.receive_and_validate(&inbound) {
        Ok(receipt) => Json(receipt).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// `POST /transactions` — consumes the session's authorization, submits
/// the payment, and spools a confirmation SMS back to the session's
/// number.
///
/// The confirmation is best-effort: a spool failure after an accepted
/// payment is reported as `confirmation_sent: false`, never as a
/// transaction error. The money has moved either way.
async fn create_transaction_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateTransactionRequest>,
) -> impl IntoResponse {
    let sender: Address = match req.sender.parse() {
        Ok(a) => a,
        Err(e) => {
            return error_response(CourierError::InvalidAddress {
                detail: e.to_string(),
            })
            .into_response()
        }
    };

    let submitted = match state
        .service
        .build_transaction(
            &req.session_id,
            &sender,
            &req.receiver,
            Amount::from_micros(req.amount_micros),
        )
        .await
    {
        Ok(s) => s,
        Err(e) => return error_response(e).into_response(),
    };

    let confirmation = format!(
        "Courier: payment of {} micro confirmed. Ref {}",
        req.amount_micros,
        &submitted.tx_id[..16.min(submitted.tx_id.len())]
    );
    let confirmation_sent = match state
        .service
        .send_payload(&req.session_id, &confirmation)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(tx_id = %submitted.tx_id, error = %e,
                "confirmation SMS failed after accepted payment");
            false
        }
    };

    Json(CreateTransactionResponse {
        tx_id: submitted.tx_id,
        confirmed_round: submitted.confirmed_round,
        confirmation_sent,
    })
    .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
