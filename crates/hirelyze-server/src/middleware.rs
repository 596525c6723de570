use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use hirelyze_types::User;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::api::ApiError;
use crate::session::get_current_user;
use crate::AppState;

/// The signed-in user's profile, stored in request extensions by the
/// session gates.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

fn app_state(req: &Request<Body>) -> Option<Arc<AppState>> {
    req.extensions().get::<Arc<AppState>>().cloned()
}

/// Gate for signed-in pages. Anonymous requests are redirected to
/// `/sign-in`; a stale cookie is cleared on the redirect.
pub async fn require_session(jar: CookieJar, mut req: Request<Body>, next: Next) -> Response {
    let Some(state) = app_state(&req) else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let (jar, user) = get_current_user(&state, jar).await;

    match user {
        Some(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            (jar, next.run(req).await).into_response()
        }
        None => (jar, Redirect::to("/sign-in")).into_response(),
    }
}

/// Gate for JSON endpoints. Anonymous requests get `401`.
pub async fn require_api_session(jar: CookieJar, mut req: Request<Body>, next: Next) -> Response {
    let Some(state) = app_state(&req) else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let (jar, user) = get_current_user(&state, jar).await;

    match user {
        Some(user) => {
            req.extensions_mut().insert(CurrentUser(user));
            (jar, next.run(req).await).into_response()
        }
        None => (jar, ApiError::Unauthorized).into_response(),
    }
}

/// Rate limiting key. Credential endpoints are counted separately from
/// everything else so page loads do not eat into the sign-in budget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateLimitKey {
    Auth(IpAddr),
    General(IpAddr),
}

/// In-memory rate limiter state.
///
/// Uses a simple fixed window counter.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    state: Arc<Mutex<HashMap<RateLimitKey, (u32, Instant)>>>,
    window: Duration,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(60))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            window,
        }
    }

    /// Check if the request is allowed.
    ///
    /// Returns `true` if allowed, `false` if limit exceeded.
    pub fn check(&self, key: RateLimitKey, limit: u32) -> bool {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("rate limiter lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };
        let now = Instant::now();
        let window = self.window;

        // Evict only expired windows; clearing everything would reset live limits.
        if state.len() > 10000 {
            state.retain(|_, (_, start)| now.duration_since(*start) <= window);
        }

        let (count, start) = state.entry(key).or_insert((0, now));

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
            true
        } else {
            *count += 1;
            *count <= limit
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `path` handles credentials and falls under the auth limit.
pub fn is_auth_path(path: &str) -> bool {
    path == "/sign-in"
        || path == "/sign-up"
        || path.starts_with("/api/auth/")
        || path.starts_with("/api/identity/")
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let state = app_state(&req).ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    // Missing ConnectInfo means the server was not started with it; fail closed.
    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() else {
        tracing::error!("rate limiter has no peer address");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    };
    let ip = addr.ip();
    let path = req.uri().path().to_string();

    let (key, limit) = if is_auth_path(&path) {
        (RateLimitKey::Auth(ip), state.rate_limits.auth_limit)
    } else {
        (RateLimitKey::General(ip), state.rate_limits.default_limit)
    };

    if !state.rate_limiter.check(key, limit) {
        tracing::warn!(%ip, %path, "rate limit exceeded");
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        response.headers_mut().insert(
            axum::http::header::RETRY_AFTER,
            axum::http::HeaderValue::from_static("60"),
        );
        return Ok(response);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_paths() {
        assert!(is_auth_path("/sign-in"));
        assert!(is_auth_path("/api/auth/sign-in"));
        assert!(is_auth_path("/api/identity/token"));
        assert!(!is_auth_path("/"));
        assert!(!is_auth_path("/interview/abc"));
    }

    #[test]
    fn limiter_counts_per_key() {
        let limiter = RateLimiter::new();
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(limiter.check(RateLimitKey::Auth(ip), 2));
        assert!(limiter.check(RateLimitKey::Auth(ip), 2));
        assert!(!limiter.check(RateLimitKey::Auth(ip), 2));
        assert!(limiter.check(RateLimitKey::General(ip), 2));
    }

    #[test]
    fn limiter_window_resets() {
        let limiter = RateLimiter::with_window(Duration::from_millis(10));
        let ip: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(RateLimitKey::General(ip), 1));
        assert!(!limiter.check(RateLimitKey::General(ip), 1));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check(RateLimitKey::General(ip), 1));
    }
}
