//! The identity provider: accounts, password sign-in, ID tokens and session
//! cookies.

use crate::accounts::{
    find_account_by_email, find_account_by_uid, insert_account, update_disabled,
    update_tokens_valid_after, AuthAccount,
};
use crate::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::throttle::SignInThrottle;
use crate::token::{TokenClaims, TokenKind, TokenSigner};
use crate::IdentityError;
use rusqlite::Connection;
use std::time::Duration;

/// Tunables for token lifetimes and sign-in throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentitySettings {
    /// Lifetime of ID tokens issued by password sign-in.
    pub id_token_ttl: Duration,
    /// Shortest session cookie lifetime that may be requested.
    pub min_session_duration: Duration,
    /// Longest session cookie lifetime that may be requested.
    pub max_session_duration: Duration,
    /// Failed sign-ins per email allowed inside one window.
    pub max_failed_sign_ins: u32,
    pub failed_sign_in_window: Duration,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            id_token_ttl: Duration::from_secs(60 * 60),
            min_session_duration: Duration::from_secs(5 * 60),
            max_session_duration: Duration::from_secs(14 * 24 * 60 * 60),
            max_failed_sign_ins: 5,
            failed_sign_in_window: Duration::from_secs(60),
        }
    }
}

/// Current time in unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Trims and lower-cases an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose structural email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Local identity provider backed by the `auth_accounts` table.
///
/// Every operation takes the connection explicitly; the provider itself only
/// holds the signing key, settings and the in-memory sign-in throttle, so it
/// can be shared across request handlers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    signer: TokenSigner,
    settings: IdentitySettings,
    throttle: SignInThrottle,
}

impl IdentityProvider {
    pub fn new(signer: TokenSigner, settings: IdentitySettings) -> Self {
        Self {
            throttle: SignInThrottle::new(
                settings.max_failed_sign_ins,
                settings.failed_sign_in_window,
            ),
            signer,
            settings,
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn settings(&self) -> &IdentitySettings {
        &self.settings
    }

    /// Creates an account with an email and password.
    ///
    /// # Errors
    ///
    /// `InvalidEmail`, `WeakPassword` or `EmailAlreadyInUse`.
    pub fn create_user(
        &self,
        conn: &Connection,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthAccount, IdentityError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(IdentityError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        if find_account_by_email(conn, &email)?.is_some() {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let account = AuthAccount {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email,
            display_name: display_name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            password_hash: hash_password(password)?,
            disabled: false,
            tokens_valid_after_ms: 0,
            created_at: hirelyze_types::now_timestamp(),
        };
        insert_account(conn, &account)?;

        tracing::info!(uid = %account.uid, "identity account created");
        Ok(account)
    }

    /// Verifies an email/password pair and returns a fresh ID token.
    ///
    /// # Errors
    ///
    /// `TooManyRequests` while throttled, `UserNotFound`, `WrongPassword` or
    /// `UserDisabled`.
    pub fn sign_in_with_password(
        &self,
        conn: &Connection,
        email: &str,
        password: &str,
    ) -> Result<String, IdentityError> {
        let email = normalize_email(email);
        if !self.throttle.is_allowed(&email) {
            tracing::warn!(email = %email, "sign-in throttled");
            return Err(IdentityError::TooManyRequests);
        }

        let account = find_account_by_email(conn, &email)?.ok_or(IdentityError::UserNotFound)?;

        match verify_password(password, &account.password_hash) {
            Ok(()) => {}
            Err(IdentityError::WrongPassword) => {
                self.throttle.record_failure(&email);
                return Err(IdentityError::WrongPassword);
            }
            Err(e) => return Err(e),
        }

        if account.disabled {
            return Err(IdentityError::UserDisabled);
        }

        self.throttle.reset(&email);
        self.issue_id_token(&account, now_ms())
    }

    /// Mints an ID token for `account`, authenticated at `auth_time_ms`.
    pub fn issue_id_token(
        &self,
        account: &AuthAccount,
        auth_time_ms: i64,
    ) -> Result<String, IdentityError> {
        let now = now_ms();
        self.signer.sign(&TokenClaims {
            kind: TokenKind::IdToken,
            uid: account.uid.clone(),
            email: account.email.clone(),
            auth_time_ms,
            issued_at_ms: now,
            expires_at_ms: now + duration_ms(self.settings.id_token_ttl),
        })
    }

    /// Verifies an ID token's signature and expiry.
    pub fn verify_id_token(&self, id_token: &str) -> Result<TokenClaims, IdentityError> {
        self.signer.verify(id_token, TokenKind::IdToken, now_ms())
    }

    /// Exchanges a valid ID token for a session cookie value that expires
    /// after `expires_in`.
    ///
    /// # Errors
    ///
    /// `InvalidSessionDuration` when `expires_in` is outside the configured
    /// range, or any ID token verification error.
    pub fn create_session_cookie(
        &self,
        id_token: &str,
        expires_in: Duration,
    ) -> Result<String, IdentityError> {
        let min = self.settings.min_session_duration;
        let max = self.settings.max_session_duration;
        if expires_in < min || expires_in > max {
            return Err(IdentityError::InvalidSessionDuration {
                min_secs: min.as_secs(),
                max_secs: max.as_secs(),
            });
        }

        let id_claims = self.verify_id_token(id_token)?;
        let now = now_ms();
        self.signer.sign(&TokenClaims {
            kind: TokenKind::SessionCookie,
            uid: id_claims.uid,
            email: id_claims.email,
            auth_time_ms: id_claims.auth_time_ms,
            issued_at_ms: now,
            expires_at_ms: now + duration_ms(expires_in),
        })
    }

    /// Verifies a session cookie.
    ///
    /// With `check_revoked`, the account is also loaded: it must still exist,
    /// be enabled, and not have revoked its sessions after this one signed in.
    pub fn verify_session_cookie(
        &self,
        conn: &Connection,
        cookie: &str,
        check_revoked: bool,
    ) -> Result<TokenClaims, IdentityError> {
        let claims = self
            .signer
            .verify(cookie, TokenKind::SessionCookie, now_ms())?;

        if check_revoked {
            let account =
                find_account_by_uid(conn, &claims.uid)?.ok_or(IdentityError::UserNotFound)?;
            if account.disabled {
                return Err(IdentityError::UserDisabled);
            }
            if claims.auth_time_ms <= account.tokens_valid_after_ms {
                return Err(IdentityError::SessionCookieRevoked);
            }
        }

        Ok(claims)
    }

    /// Fetches an account by UID.
    pub fn get_user(&self, conn: &Connection, uid: &str) -> Result<AuthAccount, IdentityError> {
        find_account_by_uid(conn, uid)?.ok_or(IdentityError::UserNotFound)
    }

    /// Fetches an account by email; the email is normalized first.
    pub fn get_user_by_email(
        &self,
        conn: &Connection,
        email: &str,
    ) -> Result<AuthAccount, IdentityError> {
        find_account_by_email(conn, &normalize_email(email))?.ok_or(IdentityError::UserNotFound)
    }

    /// Revokes every session minted for `uid` up to now.
    pub fn revoke_refresh_tokens(&self, conn: &Connection, uid: &str) -> Result<(), IdentityError> {
        update_tokens_valid_after(conn, uid, now_ms())?;
        tracing::info!(uid, "sessions revoked");
        Ok(())
    }

    pub fn set_disabled(
        &self,
        conn: &Connection,
        uid: &str,
        disabled: bool,
    ) -> Result<(), IdentityError> {
        update_disabled(conn, uid, disabled)?;
        tracing::info!(uid, disabled, "account disabled flag updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Connection, IdentityProvider) {
        let conn = Connection::open_in_memory().expect("failed to open in-memory db");
        hirelyze_db::run_migrations(&conn).expect("failed to run migrations");
        let provider = IdentityProvider::new(TokenSigner::new([9u8; 32]), IdentitySettings::default());
        (conn, provider)
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("jo@x.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        for bad in ["", "jo", "jo@", "@x.com", "jo@x", "jo@.com", "jo@x.", "j o@x.com", "a@b@c.com"] {
            assert!(!is_valid_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn create_user_normalizes_email() {
        let (conn, provider) = setup();
        let account = provider
            .create_user(&conn, "  Jo@X.com ", "secret1", Some(" Jo "))
            .expect("should create");
        assert_eq!(account.email, "jo@x.com");
        assert_eq!(account.display_name.as_deref(), Some("Jo"));
        assert_eq!(account.uid.len(), 32);
    }

    #[test]
    fn create_user_rejections() {
        let (conn, provider) = setup();
        assert!(matches!(
            provider.create_user(&conn, "not-an-email", "secret1", None),
            Err(IdentityError::InvalidEmail)
        ));
        assert!(matches!(
            provider.create_user(&conn, "jo@x.com", "12345", None),
            Err(IdentityError::WeakPassword { min: 6 })
        ));
        provider.create_user(&conn, "jo@x.com", "secret1", None).unwrap();
        assert!(matches!(
            provider.create_user(&conn, "JO@x.com", "secret1", None),
            Err(IdentityError::EmailAlreadyInUse)
        ));
    }

    #[test]
    fn password_sign_in_errors() {
        let (conn, provider) = setup();
        let account = provider.create_user(&conn, "jo@x.com", "secret1", None).unwrap();

        assert!(matches!(
            provider.sign_in_with_password(&conn, "nobody@x.com", "secret1"),
            Err(IdentityError::UserNotFound)
        ));
        assert!(matches!(
            provider.sign_in_with_password(&conn, "jo@x.com", "wrong-one"),
            Err(IdentityError::WrongPassword)
        ));

        provider.set_disabled(&conn, &account.uid, true).unwrap();
        assert!(matches!(
            provider.sign_in_with_password(&conn, "jo@x.com", "secret1"),
            Err(IdentityError::UserDisabled)
        ));
    }

    #[test]
    fn repeated_failures_are_throttled() {
        let (conn, provider) = setup();
        provider.create_user(&conn, "jo@x.com", "secret1", None).unwrap();

        for _ in 0..5 {
            assert!(matches!(
                provider.sign_in_with_password(&conn, "jo@x.com", "wrong-one"),
                Err(IdentityError::WrongPassword)
            ));
        }
        assert!(matches!(
            provider.sign_in_with_password(&conn, "jo@x.com", "secret1"),
            Err(IdentityError::TooManyRequests)
        ));
    }

    #[test]
    fn session_duration_bounds() {
        let (conn, provider) = setup();
        provider.create_user(&conn, "jo@x.com", "secret1", None).unwrap();
        let id_token = provider
            .sign_in_with_password(&conn, "jo@x.com", "secret1")
            .unwrap();

        for bad in [Duration::from_secs(60), Duration::from_secs(15 * 24 * 60 * 60)] {
            assert!(matches!(
                provider.create_session_cookie(&id_token, bad),
                Err(IdentityError::InvalidSessionDuration { .. })
            ));
        }
        assert!(provider
            .create_session_cookie(&id_token, Duration::from_secs(7 * 24 * 60 * 60))
            .is_ok());
    }

    #[test]
    fn id_token_is_not_a_session_cookie() {
        let (conn, provider) = setup();
        provider.create_user(&conn, "jo@x.com", "secret1", None).unwrap();
        let id_token = provider
            .sign_in_with_password(&conn, "jo@x.com", "secret1")
            .unwrap();

        assert!(matches!(
            provider.verify_session_cookie(&conn, &id_token, true),
            Err(IdentityError::InvalidToken)
        ));
    }
}
