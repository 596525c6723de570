//! Identity provider errors and their user-facing categories.

use thiserror::Error;

/// Errors produced by the identity provider.
///
/// Every variant carries a stable provider code (see [`IdentityError::code`])
/// so callers can branch on the category without matching message text.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("the email address is already in use by another account")]
    EmailAlreadyInUse,
    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },
    #[error("the email address is badly formatted")]
    InvalidEmail,
    #[error("there is no user record corresponding to this identifier")]
    UserNotFound,
    #[error("the password is invalid")]
    WrongPassword,
    #[error("the user account has been disabled")]
    UserDisabled,
    #[error("too many unsuccessful sign-in attempts")]
    TooManyRequests,
    #[error("the token is malformed or its signature does not match")]
    InvalidToken,
    #[error("the ID token has expired")]
    IdTokenExpired,
    #[error("the session cookie has expired")]
    SessionCookieExpired,
    #[error("the session cookie has been revoked")]
    SessionCookieRevoked,
    #[error("session duration must be between {min_secs} and {max_secs} seconds")]
    InvalidSessionDuration { min_secs: u64, max_secs: u64 },
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("claims serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IdentityError {
    /// Stable provider code, e.g. `auth/user-not-found`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword { .. } => "auth/weak-password",
            Self::InvalidEmail => "auth/invalid-email",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::UserDisabled => "auth/user-disabled",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::InvalidToken => "auth/argument-error",
            Self::IdTokenExpired => "auth/id-token-expired",
            Self::SessionCookieExpired => "auth/session-cookie-expired",
            Self::SessionCookieRevoked => "auth/session-cookie-revoked",
            Self::InvalidSessionDuration { .. } => "auth/invalid-session-cookie-duration",
            Self::PasswordHash(_) | Self::Database(_) | Self::Serialization(_) => "auth/internal-error",
        }
    }

    /// Message shown to the user when this error reaches a form.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => {
                "Email is already in use. Please use a different email or sign in."
            }
            Self::WeakPassword { .. } => "Password is too weak. Please choose a stronger password.",
            Self::UserNotFound => "No account found with this email. Please sign up first.",
            Self::WrongPassword => "Incorrect password. Please try again.",
            Self::InvalidEmail => "Invalid email address. Please check and try again.",
            Self::UserDisabled => "This account has been disabled. Please contact support.",
            Self::TooManyRequests => "Too many failed attempts. Please try again later.",
            _ => "An unexpected error occurred. Please try again.",
        }
    }

    /// Whether a session cookie that failed with this error is stale and
    /// should be cleared from the browser.
    pub fn invalidates_session(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken
                | Self::SessionCookieExpired
                | Self::SessionCookieRevoked
                | Self::UserNotFound
                | Self::UserDisabled
        )
    }
}
