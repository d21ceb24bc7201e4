//! HTTP API of the SecureWrap Authority.
//!
//! The Authority is a thin JSON layer over a [`RuleRegistry`]. Issuers
//! register rules; agents pre-check their device and then verify their
//! password. Every call produces one audit line. Passwords are never logged.
//!
//! Registry calls block on SQLite, so handlers run them on tokio's blocking
//! pool.

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use securewrap_registry::{RegistryError, RuleRegistry, Verdict};
use securewrap_types::Decision;
use securewrap_types::wire::{
    DEREGISTER_PATH, DeregisterRequest, ErrorResponse, HEALTH_PATH, PRE_CHECK_PATH,
    PreCheckRequest, REGISTER_PATH, RegisterRequest, Status, StatusResponse, VERIFY_PATH,
    VerifyRequest,
};
use tracing::{error, info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<dyn RuleRegistry>,
    vague_denials: bool,
}

impl AppState {
    pub fn new(registry: Arc<dyn RuleRegistry>) -> Self {
        Self {
            registry,
            vague_denials: false,
        }
    }

    /// When enabled, verify denials carry no reason and every denial is 403.
    #[must_use]
    pub fn with_vague_denials(mut self, vague: bool) -> Self {
        self.vague_denials = vague;
        self
    }

    fn status_for(&self, verdict: Verdict) -> StatusCode {
        match verdict {
            Verdict::Allowed => StatusCode::OK,
            Verdict::UnknownPackage if !self.vague_denials => StatusCode::NOT_FOUND,
            Verdict::UnknownPackage | Verdict::Mismatch => StatusCode::FORBIDDEN,
        }
    }
}

/// Failures reported as `{error}` bodies.
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Storage(RegistryError),
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<securewrap_types::Error> for ApiError {
    fn from(e: securewrap_types::Error) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => {
                warn!("Rejected malformed request: {}", msg);
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
            }
            Self::Storage(e) => {
                error!("Rule storage failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("failed to store rule")),
                )
                    .into_response()
            }
            Self::Internal(msg) => {
                error!("Registry task failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("internal error")),
                )
                    .into_response()
            }
        }
    }
}

/// Runs `f` against the registry on the blocking pool.
async fn with_registry<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn RuleRegistry) -> T + Send + 'static,
    T: Send + 'static,
{
    let registry = Arc::clone(&state.registry);
    tokio::task::spawn_blocking(move || f(registry.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("spawn_blocking failed: {e}")))
}

async fn health_handler() -> Json<StatusResponse> {
    Json(StatusResponse::new(Status::Ok))
}

async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(rule) = payload?;
    rule.validate()?;

    let stored = rule.clone();
    with_registry(&state, move |registry| registry.register(&stored))
        .await?
        .map_err(|e| match e {
            RegistryError::InvalidRule(inner) => ApiError::from(inner),
            other => ApiError::Storage(other),
        })?;

    info!(
        "register {}: bound to {} / {}",
        rule.package_id, rule.ip, rule.mac
    );
    Ok(Json(StatusResponse::new(Status::Registered)))
}

async fn pre_check_handler(
    State(state): State<AppState>,
    payload: Result<Json<PreCheckRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Decision>), ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    let (package_id, fingerprint) = (req.package_id.clone(), req.fingerprint());
    let verdict = with_registry(&state, move |registry| {
        registry.check_fingerprint(&package_id, &fingerprint)
    })
    .await?;
    info!(
        "pre-check {} from {} / {}: {:?}",
        req.package_id, req.ip, req.mac, verdict
    );

    Ok((state.status_for(verdict), Json(verdict.pre_check_decision())))
}

async fn verify_handler(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Decision>), ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    let (package_id, password, fingerprint) =
        (req.package_id.clone(), req.password.clone(), req.fingerprint());
    let verdict = with_registry(&state, move |registry| {
        registry.check_credentials(&package_id, &password, &fingerprint)
    })
    .await?;
    info!(
        "verify {} from {} / {}: {:?}",
        req.package_id, req.ip, req.mac, verdict
    );

    let mut decision = verdict.verify_decision();
    if state.vague_denials {
        decision = decision.without_reason();
    }
    Ok((state.status_for(verdict), Json(decision)))
}

async fn deregister_handler(
    State(state): State<AppState>,
    payload: Result<Json<DeregisterRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(req) = payload?;
    req.validate()?;

    let package_id = req.package_id.clone();
    let existed = with_registry(&state, move |registry| registry.deregister(&package_id))
        .await?
        .map_err(ApiError::Storage)?;
    info!("deregister {}: existed={}", req.package_id, existed);
    Ok(Json(StatusResponse::new(Status::Deregistered)))
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(REGISTER_PATH, post(register_handler))
        .route(PRE_CHECK_PATH, post(pre_check_handler))
        .route(VERIFY_PATH, post(verify_handler))
        .route(DEREGISTER_PATH, post(deregister_handler))
        .with_state(state)
}
