//! # REST API
//!
//! Builds the axum router that exposes the witness node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//! Binary values (account input, hashes, keys, signatures) travel as hex.
//!
//! ## Endpoints
//!
//! | Method | Path               | Description                                |
//! |--------|--------------------|--------------------------------------------|
//! | GET    | `/health`          | Liveness probe                             |
//! | GET    | `/status`          | Version, witness count, own identity       |
//! | POST   | `/witness/hash`    | Witness hash of hex account input          |
//! | GET    | `/witness/:hash`   | Witness by hash, with age and category     |
//! | POST   | `/witness/publish` | Publish a witness signed with the node key |
//! | POST   | `/witness/verify`  | Verify a peer's claim on a stored witness  |
//! | POST   | `/limit`           | Age-scaled trade limit                     |
//! | GET    | `/metrics`         | Prometheus exposition                      |

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use agewitness_protocol::config::{PolicyConfig, PROTOCOL_VERSION};
use agewitness_protocol::crypto::{PublicKey, Signature};
use agewitness_protocol::identity::{KeyRing, LocalKeyRing};
use agewitness_protocol::storage::WitnessDb;
use agewitness_protocol::trade::{CurrencyKind, FadeInSchedule, TradeLimitPolicy};
use agewitness_protocol::witness::age::{account_age_at, category_at};
use agewitness_protocol::witness::{
    derive_hash, AccountAge, PublishOutcome, RawAccountPayload, Witness, WitnessPublisher,
    WitnessStore, WitnessVerifier,
};

use crate::metrics::{metrics_handler, SharedMetrics};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything is behind `Arc` or `Copy`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// In-memory witness store, fed from the database.
    pub store: Arc<WitnessStore>,
    /// This node's signing identity.
    pub key_ring: Arc<LocalKeyRing>,
    /// Publishes witnesses into the database.
    pub publisher: Arc<WitnessPublisher<LocalKeyRing, WitnessDb>>,
    pub verifier: WitnessVerifier,
    pub limits: TradeLimitPolicy,
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Wires the handlers' collaborators from the node's parts.
    pub fn new(
        version: String,
        store: Arc<WitnessStore>,
        key_ring: Arc<LocalKeyRing>,
        db: Arc<WitnessDb>,
        policy: &PolicyConfig,
        metrics: SharedMetrics,
    ) -> Self {
        let publisher = Arc::new(WitnessPublisher::new(
            Arc::clone(&key_ring),
            db,
            Arc::clone(&store),
        ));
        Self {
            version,
            limits: TradeLimitPolicy::new(Arc::clone(&store), FadeInSchedule::from_policy(policy)),
            verifier: WitnessVerifier::from_policy(policy),
            store,
            key_ring,
            publisher,
            metrics,
        }
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/witness/hash", post(hash_handler))
        .route("/witness/publish", post(publish_handler))
        .route("/witness/verify", post(verify_handler))
        .route("/witness/:hash", get(witness_handler))
        .route("/limit", post(limit_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub protocol_version: String,
    /// Witnesses in the in-memory store.
    pub witness_count: usize,
    /// Hex hash160 of this node's signing key.
    pub identity_hash: String,
    /// Hex Ed25519 public key of this node.
    pub public_key: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Body of requests that carry only account input.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountInputRequest {
    /// Hex-encoded witness input bytes of the payment account.
    pub input: String,
}

/// Response payload for `POST /witness/hash`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HashResponse {
    pub hash: String,
}

/// A witness as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct WitnessResponse {
    pub hash: String,
    pub signer_identity_hash: String,
    pub signature: String,
    /// Unix timestamp (milliseconds).
    pub date: i64,
    /// Milliseconds since `date`.
    pub age_ms: i64,
    pub category: AccountAge,
}

impl WitnessResponse {
    fn new(witness: &Witness, now_ms: i64) -> Self {
        Self {
            hash: witness.hash_hex(),
            signer_identity_hash: witness.signer_identity_hash().to_hex(),
            signature: witness.signature().to_hex(),
            date: witness.date(),
            age_ms: account_age_at(witness, now_ms),
            category: category_at(Some(witness), now_ms),
        }
    }
}

/// Response payload for `POST /witness/publish`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    /// `submitted` or `already_present`.
    pub outcome: String,
    pub witness: Option<WitnessResponse>,
}

/// Body of `POST /witness/verify`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Hex account input the peer claims.
    pub input: String,
    /// Hex salt the peer claims. Has no effect on the hash.
    #[serde(default)]
    pub salt: String,
    /// Hex hash of the stored witness the peer claims.
    pub witness_hash: String,
    /// Hex Ed25519 public key of the peer.
    pub peer_public_key: String,
    /// Nonce the verifier handed to the peer.
    pub nonce: i32,
    /// Hex signature of the peer over the encoded nonce.
    pub nonce_signature: String,
}

/// Response payload for `POST /witness/verify`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    /// Label of the failing check, absent when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of `POST /limit`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LimitRequest {
    /// Base trade limit of the payment method, smallest unit.
    pub base_limit: u64,
    /// Currency code, e.g. `EUR` or `BTC`.
    pub currency: String,
    /// Hex account input.
    pub input: String,
}

/// Response payload for `POST /limit`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LimitResponse {
    pub limit: u64,
    pub currency_kind: CurrencyKind,
    /// Age category used, absent for non-fiat currencies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<AccountAge>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, Response> {
    hex::decode(value)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("invalid hex in {field}: {e}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — returns node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        version: state.version.clone(),
        protocol_version: PROTOCOL_VERSION.to_string(),
        witness_count: state.store.len(),
        identity_hash: state.key_ring.identity_hash().to_hex(),
        public_key: state.key_ring.public_key().to_hex(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// `POST /witness/hash` — derives the witness hash of an account input.
async fn hash_handler(Json(req): Json<AccountInputRequest>) -> Response {
    let input = match decode_hex("input", &req.input) {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };
    Json(HashResponse {
        hash: derive_hash(&input).to_hex(),
    })
    .into_response()
}

/// `GET /witness/:hash` — returns a stored witness.
///
/// Malformed and unknown hashes are both 404: the store has no such entry.
async fn witness_handler(Path(hash): Path<String>, State(state): State<AppState>) -> Response {
    match state.store.lookup_by_hex(&hash) {
        Some(witness) => {
            Json(WitnessResponse::new(&witness, Utc::now().timestamp_millis())).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("witness not found: {hash}")),
    }
}

/// `POST /witness/publish` — publishes a witness for an account with the
/// node key.
async fn publish_handler(
    State(state): State<AppState>,
    Json(req): Json<AccountInputRequest>,
) -> Response {
    let input = match decode_hex("input", &req.input) {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };
    let account = RawAccountPayload::new(input);
    let now = Utc::now().timestamp_millis();

    match state.publisher.publish_at(&account, now) {
        Ok(PublishOutcome::Submitted(witness)) => {
            state.metrics.witnesses_published_total.inc();
            // Own witnesses are known at once, without waiting for the feed.
            state.store.on_new_witness(witness.clone());
            Json(PublishResponse {
                outcome: "submitted".into(),
                witness: Some(WitnessResponse::new(&witness, now)),
            })
            .into_response()
        }
        Ok(PublishOutcome::AlreadyPresent) => Json(PublishResponse {
            outcome: "already_present".into(),
            witness: state
                .store
                .lookup_by_payload(&account)
                .map(|w| WitnessResponse::new(&w, now)),
        })
        .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// `POST /witness/verify` — runs the full verification chain against a
/// stored witness.
///
/// Returns 404 if the claimed witness is not in the store, 400 for
/// undecodable fields, and otherwise 200 with `valid` and the failing check.
async fn verify_handler(State(state): State<AppState>, Json(req): Json<VerifyRequest>) -> Response {
    let (input, salt, nonce_signature) = match decode_verify_fields(&req) {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };
    let peer_key = match PublicKey::from_hex(&req.peer_public_key) {
        Ok(key) => key,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid peer_public_key: {e}"))
        }
    };
    let Some(witness) = state.store.lookup_by_hex(&req.witness_hash) else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("witness not found: {}", req.witness_hash),
        );
    };

    let result = state.verifier.verify_detailed(
        &input,
        &witness,
        &salt,
        &peer_key,
        req.nonce,
        &Signature::from_vec(nonce_signature),
    );
    let response = match result {
        Ok(()) => {
            state.metrics.record_verification("passed");
            VerifyResponse {
                valid: true,
                reason: None,
            }
        }
        Err(failure) => {
            state.metrics.record_verification(failure.label());
            VerifyResponse {
                valid: false,
                reason: Some(failure.label().to_string()),
            }
        }
    };
    Json(response).into_response()
}

fn decode_verify_fields(req: &VerifyRequest) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>), Response> {
    Ok((
        decode_hex("input", &req.input)?,
        decode_hex("salt", &req.salt)?,
        decode_hex("nonce_signature", &req.nonce_signature)?,
    ))
}

/// `POST /limit` — age-scaled trade limit for an account.
async fn limit_handler(State(state): State<AppState>, Json(req): Json<LimitRequest>) -> Response {
    let input = match decode_hex("input", &req.input) {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };
    let account = RawAccountPayload::new(input);
    let now = Utc::now().timestamp_millis();

    let witness = state.store.lookup_by_payload(&account);
    let limit =
        state
            .limits
            .compute_limit_for_witness(req.base_limit, &req.currency, witness.as_deref(), now);
    state.metrics.limits_computed_total.inc();

    let currency_kind = CurrencyKind::of(&req.currency);
    let category = match currency_kind {
        CurrencyKind::Fiat => Some(category_at(witness.as_deref(), now)),
        CurrencyKind::Crypto => None,
    };
    Json(LimitResponse {
        limit,
        currency_kind,
        category,
    })
    .into_response()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
