//! Server-side authentication actions.
//!
//! These run after the client half of the identity flow: sign-up receives
//! the UID of an already created identity account, sign-in receives an ID
//! token obtained by password. Failures come back in-band as
//! [`AuthResponse`] values; nothing here returns an HTTP error.

use crate::session::{lookup_session, mint_session_cookie, SessionLookup};
use crate::AppState;
use axum_extra::extract::cookie::Cookie;
use hirelyze_identity::{normalize_email, IdentityError};
use hirelyze_records::{
    create_user_profile, ensure_user_profile, get_user_profile, ProfileSeed, RecordError,
};
use hirelyze_types::AuthResponse;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;

pub const USER_ALREADY_EXISTS: &str = "User already exists. Please sign in instead.";
pub const SIGN_UP_SUCCESS: &str = "Sign up successful. You can now sign in.";
pub const EMAIL_ALREADY_IN_USE: &str = "Email already in use. Please use a different email.";
pub const SIGN_UP_FAILED: &str = "An error occurred during sign up. Please try again later.";
pub const USER_DOES_NOT_EXIST: &str = "User does not exist. Create an account.";
pub const SESSION_FAILED: &str = "Failed to create session. Please try again.";
pub const SIGN_IN_SUCCESS: &str = "Sign in successful.";
pub const SIGN_IN_FAILED: &str = "Failed to log into account. Please try again.";
pub const SIGN_OUT_SUCCESS: &str = "Signed out successfully.";

#[derive(Debug, Error)]
enum ActionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpParams {
    pub uid: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInParams {
    pub email: String,
    pub id_token: String,
}

/// Creates the profile document for a freshly created identity account.
pub fn sign_up(state: &AppState, conn: &Connection, params: &SignUpParams) -> AuthResponse {
    match try_sign_up(state, conn, params) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, uid = %params.uid, "sign up failed");
            AuthResponse::fail(SIGN_UP_FAILED)
        }
    }
}

fn try_sign_up(
    state: &AppState,
    conn: &Connection,
    params: &SignUpParams,
) -> Result<AuthResponse, ActionError> {
    if get_user_profile(conn, &params.uid)?.is_some() {
        return Ok(AuthResponse::fail(USER_ALREADY_EXISTS));
    }

    let email = normalize_email(&params.email);
    match state.identity.get_user_by_email(conn, &email) {
        Ok(account) if account.uid != params.uid => {
            return Ok(AuthResponse::fail(EMAIL_ALREADY_IN_USE));
        }
        Ok(_) | Err(IdentityError::UserNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let seed = ProfileSeed {
        uid: params.uid.clone(),
        name: params.name.trim().to_string(),
        email,
    };
    if !create_user_profile(conn, &seed)? {
        return Ok(AuthResponse::fail(USER_ALREADY_EXISTS));
    }

    Ok(AuthResponse::ok(SIGN_UP_SUCCESS))
}

/// Result of [`sign_in`]: the response plus the cookie to set on success.
#[derive(Debug)]
pub struct SignInOutcome {
    pub response: AuthResponse,
    pub session_cookie: Option<Cookie<'static>>,
}

impl SignInOutcome {
    fn fail(message: &str) -> Self {
        Self {
            response: AuthResponse::fail(message),
            session_cookie: None,
        }
    }
}

/// Exchanges an ID token for a session and returns the signed-in user.
pub fn sign_in(state: &AppState, conn: &Connection, params: &SignInParams) -> SignInOutcome {
    let account = match state.identity.get_user_by_email(conn, &params.email) {
        Ok(account) => account,
        Err(IdentityError::UserNotFound) => return SignInOutcome::fail(USER_DOES_NOT_EXIST),
        Err(e) => {
            tracing::error!(error = %e, "sign in lookup failed");
            return SignInOutcome::fail(SIGN_IN_FAILED);
        }
    };

    let seed = ProfileSeed::from_identity(
        &account.uid,
        account.display_name.as_deref(),
        Some(&account.email),
    );
    if let Err(e) = ensure_user_profile(conn, &seed) {
        tracing::error!(error = %e, uid = %account.uid, "failed to ensure user profile");
        return SignInOutcome::fail(SIGN_IN_FAILED);
    }

    // The token must belong to the account named by the email.
    match state.identity.verify_id_token(&params.id_token) {
        Ok(claims) if claims.uid == account.uid => {}
        Ok(claims) => {
            tracing::warn!(token_uid = %claims.uid, uid = %account.uid, "id token does not match account");
            return SignInOutcome::fail(SESSION_FAILED);
        }
        Err(e) => {
            tracing::warn!(code = e.code(), "id token rejected");
            return SignInOutcome::fail(SESSION_FAILED);
        }
    }

    let cookie = match mint_session_cookie(state, &params.id_token) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!(error = %e, uid = %account.uid, "failed to create session cookie");
            return SignInOutcome::fail(SESSION_FAILED);
        }
    };

    let user = match lookup_session(state, conn, Some(cookie.value())) {
        SessionLookup::Authenticated(user) => Some(user),
        _ => None,
    };

    tracing::info!(uid = %account.uid, "user signed in");
    SignInOutcome {
        response: AuthResponse::ok(SIGN_IN_SUCCESS).with_user(user),
        session_cookie: Some(cookie),
    }
}

/// The response for a completed sign-out; clearing the cookie is up to the
/// caller.
pub fn sign_out() -> AuthResponse {
    AuthResponse::ok(SIGN_OUT_SUCCESS)
}
