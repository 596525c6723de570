//! Session cookie handling and current-user resolution.
//!
//! The browser holds a single `session` cookie minted by the identity
//! provider. Every signed-in request verifies it, including the revocation
//! check, and lazily creates the profile document for accounts that do not
//! have one yet. A cookie that fails verification is cleared on the same
//! response, so a stale cookie never outlives one failed check.

use crate::AppState;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use hirelyze_identity::IdentityError;
use hirelyze_records::{ensure_user_profile, ProfileSeed};
use hirelyze_types::User;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Duration;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Cookie attributes derived from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Cookie and session lifetime.
    pub max_age: Duration,
    /// Adds the `Secure` attribute; enabled in production.
    pub secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(60 * 60 * 24 * 7),
            secure: false,
        }
    }
}

fn build_cookie(value: String, max_age_secs: i64, settings: &SessionSettings) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// The cookie carrying a freshly minted session.
pub fn session_cookie(value: String, settings: &SessionSettings) -> Cookie<'static> {
    let max_age = i64::try_from(settings.max_age.as_secs()).unwrap_or(i64::MAX);
    build_cookie(value, max_age, settings)
}

/// An empty, immediately expiring `session` cookie.
pub fn cleared_session_cookie(settings: &SessionSettings) -> Cookie<'static> {
    build_cookie(String::new(), 0, settings)
}

/// Overwrites the session cookie with an empty, expired one.
pub fn clear_session_cookie(jar: CookieJar, settings: &SessionSettings) -> CookieJar {
    jar.add(cleared_session_cookie(settings))
}

/// Verifies `id_token` and mints the session cookie for it.
pub fn mint_session_cookie(
    state: &AppState,
    id_token: &str,
) -> Result<Cookie<'static>, IdentityError> {
    let value = state
        .identity
        .create_session_cookie(id_token, state.session.max_age)?;
    Ok(session_cookie(value, &state.session))
}

/// Outcome of checking a session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Authenticated(User),
    /// No cookie, or the check could not be completed.
    Anonymous,
    /// The cookie is invalid, expired or revoked and should be cleared.
    Stale,
}

/// Resolves a session cookie value to the signed-in user's profile.
pub fn lookup_session(state: &AppState, conn: &Connection, cookie: Option<&str>) -> SessionLookup {
    let Some(value) = cookie.filter(|v| !v.is_empty()) else {
        return SessionLookup::Anonymous;
    };

    let claims = match state.identity.verify_session_cookie(conn, value, true) {
        Ok(claims) => claims,
        Err(e) if e.invalidates_session() => {
            tracing::debug!(code = e.code(), "rejecting session cookie");
            return SessionLookup::Stale;
        }
        Err(e) => {
            tracing::error!(error = %e, "session verification failed");
            return SessionLookup::Anonymous;
        }
    };

    let account = match state.identity.get_user(conn, &claims.uid) {
        Ok(account) => account,
        Err(IdentityError::UserNotFound) => return SessionLookup::Stale,
        Err(e) => {
            tracing::error!(error = %e, uid = %claims.uid, "failed to load identity account");
            return SessionLookup::Anonymous;
        }
    };

    let seed = ProfileSeed::from_identity(
        &account.uid,
        account.display_name.as_deref(),
        Some(&account.email),
    );
    match ensure_user_profile(conn, &seed) {
        Ok(user) => SessionLookup::Authenticated(user),
        Err(e) => {
            tracing::error!(error = %e, uid = %account.uid, "failed to load user profile");
            SessionLookup::Anonymous
        }
    }
}

/// Returns the signed-in user, if any, and the jar to send back. The jar
/// carries a cleared cookie when the presented one was stale.
pub async fn get_current_user(state: &Arc<AppState>, jar: CookieJar) -> (CookieJar, Option<User>) {
    let cookie = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    if cookie.as_deref().map_or(true, str::is_empty) {
        return (jar, None);
    }

    let task_state = Arc::clone(state);
    let lookup = tokio::task::spawn_blocking(move || {
        let conn = task_state.pool.get()?;
        Ok::<_, r2d2::Error>(lookup_session(&task_state, &conn, cookie.as_deref()))
    })
    .await;

    match lookup {
        Ok(Ok(SessionLookup::Authenticated(user))) => (jar, Some(user)),
        Ok(Ok(SessionLookup::Stale)) => (clear_session_cookie(jar, &state.session), None),
        Ok(Ok(SessionLookup::Anonymous)) => (jar, None),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "db connection failed during session check");
            (jar, None)
        }
        Err(e) => {
            tracing::error!(error = %e, "session check task failed");
            (jar, None)
        }
    }
}

/// Whether the request carries a valid session.
pub async fn is_authenticated(state: &Arc<AppState>, jar: CookieJar) -> (CookieJar, bool) {
    let (jar, user) = get_current_user(state, jar).await;
    (jar, user.is_some())
}
