use hirelyze_db::run_migrations;
use hirelyze_identity::{
    now_ms, IdentityError, IdentityProvider, IdentitySettings, TokenClaims, TokenKind, TokenSigner,
};
use rusqlite::Connection;
use std::time::Duration;

const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn setup() -> (Connection, IdentityProvider) {
    let conn = Connection::open_in_memory().expect("failed to open in-memory db");
    run_migrations(&conn).expect("migrations failed");
    let provider = IdentityProvider::new(
        TokenSigner::from_passphrase("test-secret"),
        IdentitySettings::default(),
    );
    (conn, provider)
}

#[test]
fn test_session_cookie_lifecycle() {
    let (conn, provider) = setup();

    // 1. Create account and sign in by password
    let account = provider
        .create_user(&conn, "jo@x.com", "secret1", Some("Jo"))
        .expect("failed to create account");
    let id_token = provider
        .sign_in_with_password(&conn, "Jo@X.com", "secret1")
        .expect("sign-in failed");

    let id_claims = provider.verify_id_token(&id_token).expect("id token invalid");
    assert_eq!(id_claims.uid, account.uid);
    assert_eq!(id_claims.kind, TokenKind::IdToken);

    // 2. Exchange for a session cookie
    let cookie = provider
        .create_session_cookie(&id_token, WEEK)
        .expect("failed to create session cookie");
    let claims = provider
        .verify_session_cookie(&conn, &cookie, true)
        .expect("session should verify");
    assert_eq!(claims.uid, account.uid);
    assert_eq!(claims.auth_time_ms, id_claims.auth_time_ms);
    let lifetime = claims.expires_at_ms - claims.issued_at_ms;
    assert_eq!(lifetime, 604_800_000);

    // 3. Revoke; the old cookie dies only when revocation is checked
    std::thread::sleep(Duration::from_millis(5));
    provider
        .revoke_refresh_tokens(&conn, &account.uid)
        .expect("revoke failed");

    assert!(matches!(
        provider.verify_session_cookie(&conn, &cookie, true),
        Err(IdentityError::SessionCookieRevoked)
    ));
    assert!(provider.verify_session_cookie(&conn, &cookie, false).is_ok());

    // 4. A fresh sign-in after revocation works again
    std::thread::sleep(Duration::from_millis(5));
    let id_token = provider
        .sign_in_with_password(&conn, "jo@x.com", "secret1")
        .expect("second sign-in failed");
    let cookie = provider.create_session_cookie(&id_token, WEEK).unwrap();
    assert!(provider.verify_session_cookie(&conn, &cookie, true).is_ok());

    // 5. Disabling the account invalidates the session
    provider
        .set_disabled(&conn, &account.uid, true)
        .expect("disable failed");
    assert!(matches!(
        provider.verify_session_cookie(&conn, &cookie, true),
        Err(IdentityError::UserDisabled)
    ));
}

#[test]
fn test_expired_session_cookie() {
    let (conn, provider) = setup();
    let account = provider
        .create_user(&conn, "jo@x.com", "secret1", None)
        .unwrap();

    let now = now_ms();
    let expired = provider
        .signer()
        .sign(&TokenClaims {
            kind: TokenKind::SessionCookie,
            uid: account.uid,
            email: account.email,
            auth_time_ms: now - 10_000,
            issued_at_ms: now - 10_000,
            expires_at_ms: now - 1,
        })
        .unwrap();

    let err = provider
        .verify_session_cookie(&conn, &expired, true)
        .unwrap_err();
    assert!(matches!(err, IdentityError::SessionCookieExpired));
    assert!(err.invalidates_session());
}

#[test]
fn test_session_for_deleted_account() {
    let (conn, provider) = setup();
    let account = provider
        .create_user(&conn, "jo@x.com", "secret1", None)
        .unwrap();
    let id_token = provider
        .sign_in_with_password(&conn, "jo@x.com", "secret1")
        .unwrap();
    let cookie = provider.create_session_cookie(&id_token, WEEK).unwrap();

    conn.execute("DELETE FROM auth_accounts WHERE uid = ?1", [&account.uid])
        .unwrap();

    assert!(matches!(
        provider.verify_session_cookie(&conn, &cookie, true),
        Err(IdentityError::UserNotFound)
    ));
}

#[test]
fn test_lookup_by_email_and_uid() {
    let (conn, provider) = setup();
    let created = provider
        .create_user(&conn, "jo@x.com", "secret1", None)
        .unwrap();

    let by_email = provider.get_user_by_email(&conn, " JO@x.com ").unwrap();
    let by_uid = provider.get_user(&conn, &created.uid).unwrap();
    assert_eq!(by_email, by_uid);

    assert!(matches!(
        provider.get_user_by_email(&conn, "nobody@x.com"),
        Err(IdentityError::UserNotFound)
    ));
}
