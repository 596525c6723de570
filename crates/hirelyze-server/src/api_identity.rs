//! Identity-provider endpoints: the client half of sign-up and sign-in.

use crate::api::{run_blocking, ApiError};
use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for account creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Response body for a created account.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Request body for password sign-in.
#[derive(Debug, Deserialize)]
pub struct PasswordSignInRequest {
    pub email: String,
    pub password: String,
}

/// Response body carrying a fresh ID token.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenResponse {
    pub id_token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Handler for `POST /api/identity/accounts`.
pub async fn create_account_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account = run_blocking(&state, move |state, conn| {
        Ok(state.identity.create_user(
            conn,
            &payload.email,
            &payload.password,
            payload.display_name.as_deref(),
        )?)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            uid: account.uid,
            email: account.email,
            display_name: account.display_name,
        }),
    ))
}

/// Handler for `POST /api/identity/token`.
pub async fn token_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PasswordSignInRequest>,
) -> Result<Json<IdTokenResponse>, ApiError> {
    let id_token = run_blocking(&state, move |state, conn| {
        Ok(state
            .identity
            .sign_in_with_password(conn, &payload.email, &payload.password)?)
    })
    .await?;

    Ok(Json(IdTokenResponse {
        id_token,
        expires_in: state.identity.settings().id_token_ttl.as_secs(),
    }))
}
