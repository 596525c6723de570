#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, Response},
    Router,
};
use hirelyze_db::{create_pool, run_migrations, DbRuntimeSettings};
use hirelyze_server::{app, config::Config, AppState};
use serde_json::Value;
use std::net::SocketAddr;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router over a fresh on-disk database. The temp dir lives as long as
/// the harness.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.session.secret = Some("test-session-secret".to_string());
    config.server.public_dir = "does-not-exist".to_string();
    config.voice.workflow_id = "wf-test".to_string();
    config.rate_limit.auth_limit = 1000;
    config.rate_limit.default_limit = 1000;
    config
}

pub fn spawn_app_with(config: Config) -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("hirelyze-test.db");
    let pool = create_pool(
        path.to_str().expect("temp path is not utf-8"),
        DbRuntimeSettings::default(),
    )
    .expect("failed to create pool");
    {
        let conn = pool.get().expect("failed to get connection");
        run_migrations(&conn).expect("failed to run migrations");
    }

    let state = AppState::from_config(&config, pool);
    TestApp {
        router: app(state.clone()),
        state,
        _dir: dir,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000)))
}

fn builder(method: &str, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .extension(peer());
    if let Some(value) = cookie {
        builder = builder.header(header::COOKIE, format!("session={value}"));
    }
    builder
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    builder("GET", uri, cookie).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    builder("POST", uri, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    builder("POST", uri, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Creates the identity account and the profile, returning the UID.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        let res = self
            .send(post_json(
                "/api/identity/accounts",
                serde_json::json!({ "email": email, "password": password, "displayName": name }),
                None,
            ))
            .await;
        assert_eq!(res.status(), 201);
        let uid = body_json(res).await["uid"].as_str().unwrap().to_string();

        let res = self
            .send(post_json(
                "/api/auth/sign-up",
                serde_json::json!({ "uid": uid, "name": name, "email": email }),
                None,
            ))
            .await;
        assert_eq!(body_json(res).await["success"], true);
        uid
    }

    pub async fn id_token(&self, email: &str, password: &str) -> String {
        let res = self
            .send(post_json(
                "/api/identity/token",
                serde_json::json!({ "email": email, "password": password }),
                None,
            ))
            .await;
        assert_eq!(res.status(), 200);
        body_json(res).await["idToken"].as_str().unwrap().to_string()
    }

    /// Signs in through the JSON action and returns the session cookie value.
    pub async fn sign_in(&self, email: &str, password: &str) -> String {
        let id_token = self.id_token(email, password).await;
        let res = self
            .send(post_json(
                "/api/auth/sign-in",
                serde_json::json!({ "email": email, "idToken": id_token }),
                None,
            ))
            .await;
        session_cookie(&res).expect("sign in should set the session cookie")
    }

    /// Registers and signs in a user, returning `(uid, cookie)`.
    pub async fn signed_in_user(&self, name: &str, email: &str) -> (String, String) {
        let uid = self.register(name, email, "secret1").await;
        let cookie = self.sign_in(email, "secret1").await;
        (uid, cookie)
    }
}

/// The raw `session` Set-Cookie header, if present.
pub fn session_set_cookie(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .map(str::to_string)
}

/// The value of the `session` cookie set by the response, if any.
pub fn session_cookie(res: &Response<Body>) -> Option<String> {
    session_set_cookie(res).map(|raw| {
        raw.trim_start_matches("session=")
            .split(';')
            .next()
            .unwrap_or_default()
            .to_string()
    })
}

pub fn location(res: &Response<Body>) -> Option<String> {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(res: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

pub async fn body_text(res: Response<Body>) -> String {
    String::from_utf8(body_bytes(res).await).unwrap()
}
