//! JSON endpoints for the authentication actions.

use crate::actions::{self, SignInParams, SignUpParams};
use crate::api::{run_blocking, ApiError};
use crate::session::{clear_session_cookie, get_current_user};
use crate::AppState;
use axum::extract::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use hirelyze_types::{AuthResponse, User};
use serde::Serialize;
use std::sync::Arc;

/// Response body for `GET /api/auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    pub user: Option<User>,
}

/// Handler for `POST /api/auth/sign-up`.
pub async fn sign_up_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(params): Json<SignUpParams>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = run_blocking(&state, move |state, conn| {
        Ok(actions::sign_up(state, conn, &params))
    })
    .await?;
    Ok(Json(response))
}

/// Handler for `POST /api/auth/sign-in`.
pub async fn sign_in_handler(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
    Json(params): Json<SignInParams>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let outcome = run_blocking(&state, move |state, conn| {
        Ok(actions::sign_in(state, conn, &params))
    })
    .await?;

    let jar = match outcome.session_cookie {
        Some(cookie) => jar.add(cookie),
        None => jar,
    };
    Ok((jar, Json(outcome.response)))
}

/// Handler for `POST /api/auth/sign-out`.
pub async fn sign_out_handler(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<AuthResponse>) {
    (
        clear_session_cookie(jar, &state.session),
        Json(actions::sign_out()),
    )
}

/// Handler for `GET /api/auth/me`.
pub async fn me_handler(
    Extension(state): Extension<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<MeResponse>) {
    let (jar, user) = get_current_user(&state, jar).await;
    (
        jar,
        Json(MeResponse {
            authenticated: user.is_some(),
            user,
        }),
    )
}
