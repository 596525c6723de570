//! Signed ID tokens and session cookies.
//!
//! Token format: `base64url(json claims) "." hex(hmac_sha256(secret, payload))`.
//! The `kind` claim keeps an ID token from being replayed as a session
//! cookie and vice versa.

use crate::IdentityError;
use base64::Engine;
use hmac::digest::Key;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Which kind of credential a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived token handed to the client after password sign-in.
    IdToken,
    /// Long-lived token stored in the `session` cookie.
    SessionCookie,
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub kind: TokenKind,
    pub uid: String,
    pub email: String,
    /// When the user last proved their password, in unix milliseconds.
    /// Session cookies inherit it from the ID token they were minted from.
    pub auth_time_ms: i64,
    pub issued_at_ms: i64,
    pub expires_at_ms: i64,
}

/// Signs and verifies tokens with an HMAC-SHA256 key.
#[derive(Clone)]
pub struct TokenSigner {
    secret: [u8; 32],
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenSigner {
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// Derives a signing key from an arbitrary-length configured secret.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"hirelyze-token-v1:");
        hasher.update(passphrase.as_bytes());
        let digest = hasher.finalize();
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&digest);
        Self { secret }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC zero-pads short keys to the block size, so the padded block
        // is the same key.
        let mut key = Key::<HmacSha256>::default();
        key[..self.secret.len()].copy_from_slice(&self.secret);
        <HmacSha256 as Mac>::new(&key)
    }

    /// Serializes and signs `claims`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Serialization` if the claims cannot be encoded.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String, IdentityError> {
        let json = serde_json::to_vec(claims)?;
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!("{}.{}", payload, hex::encode(signature)))
    }

    /// Checks the signature, kind and expiry of `token` at time `now_ms`.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` for malformed tokens, bad signatures or the wrong kind.
    /// - `IdTokenExpired` / `SessionCookieExpired` once `expires_at_ms` has passed.
    pub fn verify(
        &self,
        token: &str,
        kind: TokenKind,
        now_ms: i64,
    ) -> Result<TokenClaims, IdentityError> {
        let (payload, sig_hex) = token.split_once('.').ok_or(IdentityError::InvalidToken)?;
        let provided_sig = hex::decode(sig_hex).map_err(|_| IdentityError::InvalidToken)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&provided_sig)
            .map_err(|_| IdentityError::InvalidToken)?;

        let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload.as_bytes())
            .map_err(|_| IdentityError::InvalidToken)?;
        let claims: TokenClaims =
            serde_json::from_slice(&json).map_err(|_| IdentityError::InvalidToken)?;

        if claims.kind != kind {
            return Err(IdentityError::InvalidToken);
        }

        if now_ms >= claims.expires_at_ms {
            return Err(match kind {
                TokenKind::IdToken => IdentityError::IdTokenExpired,
                TokenKind::SessionCookie => IdentityError::SessionCookieExpired,
            });
        }

        Ok(claims)
    }
}
