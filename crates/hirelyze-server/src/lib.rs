//! HireLyze server library logic.

pub mod actions;
pub mod api;
pub mod api_auth;
pub mod api_identity;
pub mod api_interviews;
pub mod config;
pub mod forms;
pub mod middleware;
pub mod pages;
pub mod render;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::{Config, RateLimitConfig};
use hirelyze_db::DbPool;
use hirelyze_identity::{IdentityProvider, IdentitySettings, TokenSigner};
use hirelyze_voice::{AgentSettings, InterviewerConfig};
use middleware::RateLimiter;
use serde_json::{json, Value};
use session::SessionSettings;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Request bodies are small JSON documents and form posts.
const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Identity provider (accounts, tokens, session cookies).
    pub identity: Arc<IdentityProvider>,
    /// Session cookie attributes.
    pub session: SessionSettings,
    /// Rate limiter state.
    pub rate_limiter: RateLimiter,
    pub rate_limits: RateLimitConfig,
    /// Voice agent settings handed to the client.
    pub agent: AgentSettings,
    /// Public web token for the voice platform's browser SDK.
    pub voice_web_token: String,
    /// Size of the discovery feed on the home page.
    pub feed_limit: u32,
    /// Directory of static assets; skipped when it does not exist.
    pub public_dir: String,
}

impl AppState {
    /// Builds the state from configuration.
    ///
    /// Without a configured session secret a random one is generated, so
    /// sessions do not survive a restart.
    pub fn from_config(config: &Config, pool: DbPool) -> Self {
        let signer = match config.session.secret.as_deref() {
            Some(secret) => TokenSigner::from_passphrase(secret),
            None => {
                tracing::warn!(
                    "no session secret configured, generating an ephemeral one; sessions will not survive restarts"
                );
                TokenSigner::new(rand::random::<[u8; 32]>())
            }
        };

        let identity_settings = IdentitySettings {
            id_token_ttl: Duration::from_secs(config.identity.id_token_ttl_secs),
            max_failed_sign_ins: config.identity.max_failed_sign_ins,
            failed_sign_in_window: Duration::from_secs(config.identity.failed_sign_in_window_secs),
            ..IdentitySettings::default()
        };

        Self {
            pool,
            identity: Arc::new(IdentityProvider::new(signer, identity_settings)),
            session: SessionSettings {
                max_age: Duration::from_secs(config.session.max_age_secs),
                secure: config.server.production,
            },
            rate_limiter: RateLimiter::new(),
            rate_limits: config.rate_limit,
            agent: AgentSettings {
                workflow_id: config.voice.workflow_id.clone(),
                interviewer: InterviewerConfig::default(),
            },
            voice_web_token: config.voice.web_token.clone(),
            feed_limit: config.feed.latest_limit,
            public_dir: config.server.public_dir.clone(),
        }
    }
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let signed_in_pages = Router::new()
        .route("/", get(pages::home_page))
        .route("/interview", get(pages::interview_page))
        .route("/interview/{id}", get(pages::interview_detail_page))
        .route("/interview/{id}/feedback", get(pages::feedback_page))
        .layer(axum::middleware::from_fn(middleware::require_session));

    let signed_in_api = Router::new()
        .route(
            "/api/interviews",
            post(api_interviews::create_interview_handler),
        )
        .route(
            "/api/interviews/{id}/feedback",
            post(api_interviews::create_feedback_handler),
        )
        .layer(axum::middleware::from_fn(middleware::require_api_session));

    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/sign-in",
            get(pages::sign_in_page).post(pages::sign_in_submit),
        )
        .route(
            "/sign-up",
            get(pages::sign_up_page).post(pages::sign_up_submit),
        )
        .route("/sign-out", post(pages::sign_out_submit))
        .route("/api/auth/sign-up", post(api_auth::sign_up_handler))
        .route("/api/auth/sign-in", post(api_auth::sign_in_handler))
        .route("/api/auth/sign-out", post(api_auth::sign_out_handler))
        .route("/api/auth/me", get(api_auth::me_handler))
        .route(
            "/api/identity/accounts",
            post(api_identity::create_account_handler),
        )
        .route("/api/identity/token", post(api_identity::token_handler))
        .merge(signed_in_pages)
        .merge(signed_in_api);

    let router = if std::path::Path::new(&state.public_dir).is_dir() {
        router.fallback_service(ServeDir::new(&state.public_dir))
    } else {
        router
    };

    router
        .layer(axum::middleware::from_fn(middleware::rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(Extension(Arc::new(state)))
}
