mod common;

use common::{
    body_json, get, location, post_json, session_cookie, session_set_cookie, spawn_app,
};
use hirelyze_identity::{now_ms, TokenClaims, TokenKind};
use hirelyze_records::get_user_profile;
use serde_json::json;

#[tokio::test]
async fn test_sign_up_and_sign_in_flow() {
    let app = spawn_app();

    // 1. Client half: create the identity account.
    let res = app
        .send(post_json(
            "/api/identity/accounts",
            json!({ "email": " Jo@X.com ", "password": "secret1", "displayName": "Jo Doe" }),
            None,
        ))
        .await;
    assert_eq!(res.status(), 201);
    let account = body_json(res).await;
    let uid = account["uid"].as_str().unwrap().to_string();
    assert_eq!(account["email"], "jo@x.com");

    // 2. Server action: profile with trimmed / lower-cased fields.
    let res = app
        .send(post_json(
            "/api/auth/sign-up",
            json!({ "uid": uid, "name": "  Jo Doe ", "email": " Jo@X.com " }),
            None,
        ))
        .await;
    let body = body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Sign up successful. You can now sign in.");

    {
        let conn = app.state.pool.get().unwrap();
        let profile = get_user_profile(&conn, &uid).unwrap().expect("profile created");
        assert_eq!(profile.name, "Jo Doe");
        assert_eq!(profile.email, "jo@x.com");
    }

    // 3. A second sign-up for the same UID is refused.
    let res = app
        .send(post_json(
            "/api/auth/sign-up",
            json!({ "uid": uid, "name": "Jo Doe", "email": "jo@x.com" }),
            None,
        ))
        .await;
    let body = body_json(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User already exists. Please sign in instead.");

    // 4. Password sign-in, then the session exchange.
    let id_token = app.id_token("jo@x.com", "secret1").await;
    let res = app
        .send(post_json(
            "/api/auth/sign-in",
            json!({ "email": "JO@x.com", "idToken": id_token }),
            None,
        ))
        .await;
    let raw_cookie = session_set_cookie(&res).expect("session cookie set");
    assert!(raw_cookie.contains("HttpOnly"));
    assert!(raw_cookie.contains("SameSite=Lax"));
    assert!(raw_cookie.contains("Path=/"));
    assert!(raw_cookie.contains("Max-Age=604800"));
    assert!(!raw_cookie.contains("Secure"));
    let cookie = session_cookie(&res).unwrap();

    let body = body_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Sign in successful.");
    assert_eq!(body["user"]["name"], "Jo Doe");

    // 5. The cookie identifies the user.
    let res = app.send(get("/api/auth/me", Some(&cookie))).await;
    let body = body_json(res).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["id"], uid);

    // 6. Sign-out overwrites the cookie with an expired empty one.
    let res = app
        .send(post_json("/api/auth/sign-out", json!({}), Some(&cookie)))
        .await;
    let cleared = session_set_cookie(&res).expect("cookie cleared");
    assert!(cleared.starts_with("session=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(body_json(res).await["message"], "Signed out successfully.");
}

#[tokio::test]
async fn test_sign_in_unknown_email() {
    let app = spawn_app();

    let res = app
        .send(post_json(
            "/api/auth/sign-in",
            json!({ "email": "ghost@x.com", "idToken": "anything" }),
            None,
        ))
        .await;
    assert!(session_set_cookie(&res).is_none());
    let body = body_json(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User does not exist. Create an account.");
}

#[tokio::test]
async fn test_sign_in_rejects_foreign_or_bad_token() {
    let app = spawn_app();
    app.register("Alice", "alice@x.com", "secret1").await;
    app.register("Bobby", "bob@x.com", "secret1").await;

    let bob_token = app.id_token("bob@x.com", "secret1").await;
    for token in [bob_token.as_str(), "not-a-token"] {
        let res = app
            .send(post_json(
                "/api/auth/sign-in",
                json!({ "email": "alice@x.com", "idToken": token }),
                None,
            ))
            .await;
        assert!(session_set_cookie(&res).is_none());
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Failed to create session. Please try again.");
    }
}

#[tokio::test]
async fn test_sign_up_with_email_of_another_account() {
    let app = spawn_app();
    app.register("Alice", "alice@x.com", "secret1").await;

    let res = app
        .send(post_json(
            "/api/auth/sign-up",
            json!({ "uid": "someone-else", "name": "Mallory", "email": "Alice@x.com" }),
            None,
        ))
        .await;
    let body = body_json(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Email already in use. Please use a different email."
    );
}

#[tokio::test]
async fn test_identity_errors_are_categorized() {
    let app = spawn_app();
    app.register("Alice", "alice@x.com", "secret1").await;

    let res = app
        .send(post_json(
            "/api/identity/accounts",
            json!({ "email": "alice@x.com", "password": "secret1" }),
            None,
        ))
        .await;
    assert_eq!(res.status(), 409);
    assert_eq!(body_json(res).await["code"], "auth/email-already-in-use");

    let res = app
        .send(post_json(
            "/api/identity/accounts",
            json!({ "email": "new@x.com", "password": "12345" }),
            None,
        ))
        .await;
    assert_eq!(res.status(), 400);
    assert_eq!(body_json(res).await["code"], "auth/weak-password");

    let res = app
        .send(post_json(
            "/api/identity/token",
            json!({ "email": "alice@x.com", "password": "wrong-password" }),
            None,
        ))
        .await;
    assert_eq!(res.status(), 401);
    let body = body_json(res).await;
    assert_eq!(body["code"], "auth/wrong-password");
    assert_eq!(body["error"], "Incorrect password. Please try again.");

    let res = app
        .send(post_json(
            "/api/identity/token",
            json!({ "email": "ghost@x.com", "password": "secret1" }),
            None,
        ))
        .await;
    assert_eq!(res.status(), 404);
    assert_eq!(body_json(res).await["code"], "auth/user-not-found");
}

#[tokio::test]
async fn test_tampered_cookie_is_cleared() {
    let app = spawn_app();
    let (_, cookie) = app.signed_in_user("Alice", "alice@x.com").await;

    let mut tampered = cookie.clone();
    tampered.push('0');

    let res = app.send(get("/api/auth/me", Some(&tampered))).await;
    let cleared = session_set_cookie(&res).expect("stale cookie cleared");
    assert!(cleared.contains("Max-Age=0"));
    assert_eq!(body_json(res).await["authenticated"], false);

    // No cookie at all: anonymous, nothing to clear.
    let res = app.send(get("/api/auth/me", None)).await;
    assert!(session_set_cookie(&res).is_none());
    assert_eq!(body_json(res).await["authenticated"], false);
}

#[tokio::test]
async fn test_revoked_session_is_cleared() {
    let app = spawn_app();
    let (uid, cookie) = app.signed_in_user("Alice", "alice@x.com").await;

    {
        let conn = app.state.pool.get().unwrap();
        app.state.identity.revoke_refresh_tokens(&conn, &uid).unwrap();
    }

    let res = app.send(get("/api/auth/me", Some(&cookie))).await;
    assert!(session_set_cookie(&res).is_some());
    assert_eq!(body_json(res).await["authenticated"], false);
}

#[tokio::test]
async fn test_profile_created_once_on_first_sign_in() {
    let app = spawn_app();

    // Identity account only, no sign-up action.
    let res = app
        .send(post_json(
            "/api/identity/accounts",
            json!({ "email": "lazy@x.com", "password": "secret1" }),
            None,
        ))
        .await;
    let uid = body_json(res).await["uid"].as_str().unwrap().to_string();

    let cookie = app.sign_in("lazy@x.com", "secret1").await;
    let first = {
        let conn = app.state.pool.get().unwrap();
        get_user_profile(&conn, &uid).unwrap().expect("profile created lazily")
    };
    assert_eq!(first.name, "lazy");
    assert_eq!(first.email, "lazy@x.com");

    let res = app.send(get("/api/auth/me", Some(&cookie))).await;
    assert_eq!(body_json(res).await["user"]["createdAt"], first.created_at);

    let conn = app.state.pool.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users WHERE id = ?1", [&uid], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_expired_session_cookie_is_cleared_by_the_gate() {
    let app = spawn_app();
    let uid = app.register("Alice", "alice@x.com", "secret1").await;

    let now = now_ms();
    let expired = app
        .state
        .identity
        .signer()
        .sign(&TokenClaims {
            kind: TokenKind::SessionCookie,
            uid,
            email: "alice@x.com".to_string(),
            auth_time_ms: now - 10 * 86_400_000,
            issued_at_ms: now - 8 * 86_400_000,
            expires_at_ms: now - 86_400_000,
        })
        .unwrap();

    let res = app.send(get("/", Some(&expired))).await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res).as_deref(), Some("/sign-in"));
    let cleared = session_set_cookie(&res).expect("expired cookie cleared");
    assert!(cleared.starts_with("session=;"));
    assert!(cleared.contains("Max-Age=0"));

    let res = app.send(get("/api/auth/me", Some(&expired))).await;
    assert!(session_set_cookie(&res).is_some());
    assert_eq!(body_json(res).await["authenticated"], false);
}

#[tokio::test]
async fn test_missing_profile_is_recreated_on_read() {
    let app = spawn_app();
    let (uid, cookie) = app.signed_in_user("Alice", "alice@x.com").await;

    {
        let conn = app.state.pool.get().unwrap();
        conn.execute("DELETE FROM users", []).unwrap();
        assert!(get_user_profile(&conn, &uid).unwrap().is_none());
    }

    let res = app.send(get("/api/auth/me", Some(&cookie))).await;
    assert!(session_set_cookie(&res).is_none());
    let body = body_json(res).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["id"], uid);
    assert_eq!(body["user"]["email"], "alice@x.com");

    // A second read finds the recreated profile instead of inserting again.
    let res = app.send(get("/api/auth/me", Some(&cookie))).await;
    assert_eq!(body_json(res).await["authenticated"], true);

    let conn = app.state.pool.get().unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users WHERE id = ?1", [&uid], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(count, 1);
}
