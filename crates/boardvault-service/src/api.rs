//! REST API for the custody vault
//!
//! The caller identity is taken from the `x-caller-identity` header, which
//! the fronting authentication layer sets after verifying the request.
//! One vault instance sits behind a mutex, so mutating calls are admitted
//! one at a time.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use boardvault_common::{Identity, TreasuryError, VaultError, WorkflowError, VERSION};
use boardvault_custody::{CustodyVault, InMemoryPayoutRail, ReleaseState};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Header carrying the authenticated caller identity
pub const CALLER_HEADER: &str = "x-caller-identity";

/// Shared service state
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Mutex<CustodyVault>>,
    pub rail: Arc<InMemoryPayoutRail>,
}

impl AppState {
    pub fn new(vault: CustodyVault, rail: Arc<InMemoryPayoutRail>) -> Self {
        Self {
            vault: Arc::new(Mutex::new(vault)),
            rail,
        }
    }
}

/// API error response
#[derive(Debug)]
pub enum ApiError {
    /// No or malformed caller header
    MissingCaller,
    Vault(VaultError),
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        ApiError::Vault(err)
    }
}

fn status_for(err: &VaultError) -> StatusCode {
    match err {
        VaultError::Treasury(TreasuryError::ZeroOrNegativeAmount)
        | VaultError::Treasury(TreasuryError::BalanceOverflow)
        | VaultError::Identity(_) => StatusCode::UNPROCESSABLE_ENTITY,
        VaultError::Treasury(TreasuryError::TransferFailed { .. }) => StatusCode::BAD_GATEWAY,
        VaultError::Workflow(WorkflowError::NotBoardMember(_))
        | VaultError::Workflow(WorkflowError::Unauthorized { .. }) => StatusCode::FORBIDDEN,
        VaultError::Workflow(_) => StatusCode::CONFLICT,
        VaultError::Board(_)
        | VaultError::Serialization(_)
        | VaultError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::MissingCaller => (
                StatusCode::UNAUTHORIZED,
                "MissingCaller",
                format!("missing or invalid {} header", CALLER_HEADER),
            ),
            ApiError::Vault(err) => (status_for(&err), err.code(), err.to_string()),
        };
        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Authenticated caller extracted from [`CALLER_HEADER`]
pub struct Caller(pub Identity);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Identity::new(v).ok())
            .map(Caller)
            .ok_or(ApiError::MissingCaller)
    }
}

#[derive(Deserialize)]
struct DepositBody {
    amount: Decimal,
}

#[derive(Deserialize)]
struct ReleaseBody {
    recipient: String,
}

#[derive(Deserialize)]
struct JournalQuery {
    since: Option<u64>,
}

fn parse_identity(raw: &str) -> Result<Identity, ApiError> {
    Identity::new(raw).map_err(|e| ApiError::Vault(e.into()))
}

/// Create REST API routes for the vault
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(CALLER_HEADER),
        ]);

    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy"})) }))
        .route(
            "/api/v1/version",
            get(|| async {
                Json(json!({
                    "service": "boardvault-service",
                    "version": VERSION,
                    "description": "Pooled-funds custody with unanimous board release",
                }))
            }),
        )
        .route("/api/v1/vault", get(vault_status))
        .route("/api/v1/deposits", post(deposit))
        .route("/api/v1/release/request", post(request_release))
        .route("/api/v1/release/sign", post(sign_release))
        .route("/api/v1/release/execute", post(release_funds))
        .route("/api/v1/release/cancel", post(cancel_release))
        .route("/api/v1/release/signatures/:member", get(has_signed))
        .route("/api/v1/journal", get(journal))
        .route("/api/v1/recipients/:id/balance", get(recipient_balance))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn vault_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.vault.lock().snapshot();
    Json(json!(snapshot))
}

async fn deposit(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(body): Json<DepositBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let balance = state.vault.lock().deposit(&caller, body.amount)?;
    Ok(Json(json!({ "balance": balance })))
}

async fn request_release(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cycle = state.vault.lock().request_release(&caller)?;
    Ok(Json(json!({ "release_requested": true, "cycle": cycle })))
}

async fn sign_release(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut vault = state.vault.lock();
    let outcome = vault.sign_release(&caller)?;
    Ok(Json(json!({
        "recorded": outcome.recorded,
        "signature_count": outcome.signature_count,
        "fully_signed": vault.state() == ReleaseState::FullySigned,
    })))
}

async fn release_funds(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(body): Json<ReleaseBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let recipient = parse_identity(&body.recipient)?;
    let receipt = state.vault.lock().release_funds(&caller, &recipient)?;
    Ok(Json(json!(receipt)))
}

async fn cancel_release(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cycle = state.vault.lock().cancel_release(&caller)?;
    Ok(Json(json!({ "cancelled": cycle })))
}

async fn has_signed(
    State(state): State<AppState>,
    Path(member): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let member = parse_identity(&member)?;
    let vault = state.vault.lock();
    Ok(Json(json!({
        "member": member,
        "is_member": vault.is_member(&member),
        "has_signed": vault.has_signed(&member),
        "signature_count": vault.signature_count(),
    })))
}

async fn journal(
    State(state): State<AppState>,
    Query(query): Query<JournalQuery>,
) -> Json<serde_json::Value> {
    let vault = state.vault.lock();
    let journal = vault.journal();
    Json(json!({
        "entries": journal.entries_since(query.since),
        "next_revision": journal.next_revision(),
        "chain_valid": journal.verify_chain(),
    }))
}

async fn recipient_balance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let recipient = parse_identity(&id)?;
    Ok(Json(json!({
        "recipient": recipient,
        "balance": state.rail.balance_of(&recipient),
    })))
}
