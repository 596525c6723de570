//! Identity provider for HireLyze.
//!
//! Stands in for a managed auth service: it owns email/password accounts,
//! issues short-lived ID tokens after password sign-in, and exchanges them
//! for long-lived session cookies that the web server verifies on every
//! request. Only the provider's token contract matters to callers; tokens
//! are opaque strings.

pub mod accounts;
mod error;
pub mod password;
pub mod provider;
pub mod throttle;
pub mod token;

pub use accounts::AuthAccount;
pub use error::IdentityError;
pub use provider::{is_valid_email, normalize_email, now_ms, IdentityProvider, IdentitySettings};
pub use throttle::SignInThrottle;
pub use token::{TokenClaims, TokenKind, TokenSigner};
