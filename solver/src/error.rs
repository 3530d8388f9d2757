//! Error types for the solver and its HTTP boundary.
//!
//! Each concern has its own enum; [`ApiError`] is the union the router returns
//! and decides the status code. Display strings are the messages sent to the
//! client in `{"error": ...}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Request rejected before the solver runs (HTTP 400).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid request body")]
    InvalidBody,
    #[error("Players must be between 2 and 20")]
    Players,
    #[error("Win rate must be between 0 and 1 (exclusive)")]
    WinRate,
    #[error("Penalty must be between 0 and 100000")]
    Penalty,
    #[error("Format must be single, progressive, or multiplier")]
    Format,
    #[error("Sudden death orbits must be between 1 and 100")]
    SuddenDeathOrbit,
    #[error("Squids dealt cannot exceed total squids")]
    SquidsDealt,
    #[error("Hero squids cannot exceed squids dealt")]
    HeroSquids,
    #[error("Total squids must be at most 500")]
    TotalSquids,
    #[error("Tier multipliers must be finite and positive")]
    Tiers,
    #[error("Opponent holdings must list at most n - 1 opponents, none above squids dealt")]
    OpponentHoldings,
    #[error("Invalid field: {0}")]
    Field(String),
}

/// Identity verification failure (HTTP 401).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,
    #[error("GOOGLE_CLIENT_ID not configured")]
    NotConfigured,
    #[error("token rejected: {0}")]
    Rejected(String),
    #[error("audience mismatch")]
    AudienceMismatch,
    #[error("verification request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Entitlement lookup failure (HTTP 500).
#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("{0} not configured")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// The solver produced something it should never produce.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    #[error("non-finite {0} in result")]
    NonFinite(&'static str),
}

/// Everything the `/api/solve` handler can answer with besides 200.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Sign in with Google to use this format")]
    MissingCredential,
    #[error("Auth failed: {0}")]
    Unauthorized(AuthError),
    #[error("Subscription required")]
    Forbidden,
    #[error("Entitlement check failed: {0}")]
    Entitlement(#[from] EntitlementError),
    #[error("Solver error: {0}")]
    Solver(#[from] SolveError),
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => ApiError::MissingCredential,
            other => ApiError::Unauthorized(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredential | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Entitlement(_) | ApiError::Solver(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        let mut response = (status, body).into_response();
        if matches!(self, ApiError::MethodNotAllowed) {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}
