mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_json, get, spawn_app, spawn_app_with, test_config};

#[tokio::test]
async fn health_check_returns_ok() {
    let app = spawn_app();

    let res = app.send(get("/health", None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let json = body_json(res).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_auth_endpoints_are_rate_limited() {
    let mut config = test_config();
    config.rate_limit.auth_limit = 2;
    let app = spawn_app_with(config);

    assert_eq!(app.send(get("/sign-in", None)).await.status(), StatusCode::OK);
    assert_eq!(app.send(get("/sign-up", None)).await.status(), StatusCode::OK);

    let res = app.send(get("/sign-in", None)).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        res.headers().get(header::RETRY_AFTER).unwrap(),
        "60"
    );

    // Other routes have their own budget.
    assert_eq!(app.send(get("/health", None)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_peer_address_is_rejected() {
    let app = spawn_app();

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = spawn_app();
    let res = app.send(get("/nope", None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
