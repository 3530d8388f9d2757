//! Axum HTTP server: the solve endpoint for the squid frontend.
//!
//! The solve itself is a pure function of the request body. The only shared
//! state is the pair of collaborators that gate the paid formats, held as
//! trait objects so tests can substitute fixed answers.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/solve` | Solve one `GameConfig`, returns the result JSON |
//!
//! Any other method on `/api/solve` answers 405 with `Allow: POST`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api_computations::{solve, validate_config};
use crate::auth::{bearer_token, IdentityVerifier, VerifiedIdentity};
use crate::entitlement::EntitlementChecker;
use crate::error::{ApiError, ValidationError};
use crate::types::{Format, SolveResult};

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityVerifier>,
    pub entitlements: Arc<dyn EntitlementChecker>,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityVerifier>,
        entitlements: Arc<dyn EntitlementChecker>,
    ) -> Self {
        Self {
            identity,
            entitlements,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route(
            "/api/solve",
            post(handle_solve).fallback(handle_method_not_allowed),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health_check() -> Json<Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn handle_method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn handle_solve(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SolveResult>, ApiError> {
    let outcome = solve_request(&state, &headers, &body).await;
    if let Err(err) = &outcome {
        if err.status().is_server_error() {
            tracing::error!(status = %err.status(), error = %err, "solve failed");
        } else {
            tracing::warn!(status = %err.status(), error = %err, "solve rejected");
        }
    }
    outcome.map(Json)
}

async fn solve_request(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<SolveResult, ApiError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| ValidationError::InvalidBody)?;
    let cfg = validate_config(&value)?;

    if cfg.format != Format::Single {
        let identity = authorize(state, headers).await?;
        tracing::info!(
            subject = %identity.subject_id,
            format = cfg.format.as_str(),
            "paid format authorized"
        );
    }

    Ok(solve(&cfg)?)
}

/// Verify the bearer credential, then the entitlement of its email.
async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<VerifiedIdentity, ApiError> {
    let token = bearer_token(headers)?;
    let identity = state.identity.verify(token).await?;
    if !state.entitlements.is_entitled(&identity.email).await? {
        return Err(ApiError::Forbidden);
    }
    Ok(identity)
}
