//! Shared API plumbing: the error type and the blocking-database helper.

use crate::AppState;
use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hirelyze_identity::IdentityError;
use hirelyze_records::RecordError;
use rusqlite::Connection;
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("identity error: {0}")]
    Identity(IdentityError),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Database(_)
            | IdentityError::PasswordHash(_)
            | IdentityError::Serialization(_) => {
                ApiError::InternalServerError(e.to_string())
            }
            other => ApiError::Identity(other),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Invalid(msg) => ApiError::BadRequest(msg),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

fn identity_status(e: &IdentityError) -> StatusCode {
    match e {
        IdentityError::EmailAlreadyInUse => StatusCode::CONFLICT,
        IdentityError::InvalidEmail
        | IdentityError::WeakPassword { .. }
        | IdentityError::InvalidSessionDuration { .. } => StatusCode::BAD_REQUEST,
        IdentityError::UserNotFound => StatusCode::NOT_FOUND,
        IdentityError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        IdentityError::UserDisabled => StatusCode::FORBIDDEN,
        _ => StatusCode::UNAUTHORIZED,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Identity(e) => {
                let body = Json(serde_json::json!({
                    "error": e.user_message(),
                    "code": e.code(),
                }));
                return (identity_status(&e), body).into_response();
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Runs `f` on the blocking pool with a pooled connection.
pub async fn run_blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AppState, &Connection) -> Result<T, ApiError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        f(&*state, &*conn)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
}
