//! Identity account storage.
//!
//! Manages the `auth_accounts` table: one row per sign-in identity with its
//! password hash, disabled flag and revocation watermark.

use crate::IdentityError;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// An identity-provider account record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAccount {
    pub uid: String,
    /// Trimmed, lower-cased email.
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub disabled: bool,
    /// Sessions authenticated at or before this instant (unix ms) are revoked.
    pub tokens_valid_after_ms: i64,
    pub created_at: String,
}

const ACCOUNT_COLUMNS: &str = "uid, email, display_name, password_hash, disabled, tokens_valid_after, created_at";

fn map_row_to_account(row: &Row) -> rusqlite::Result<AuthAccount> {
    Ok(AuthAccount {
        uid: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
        disabled: row.get(4)?,
        tokens_valid_after_ms: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Inserts a new account.
///
/// # Errors
///
/// Returns `IdentityError::EmailAlreadyInUse` when the email is taken, or
/// `IdentityError::Database` for any other failure.
pub fn insert_account(conn: &Connection, account: &AuthAccount) -> Result<(), IdentityError> {
    let result = conn.execute(
        "INSERT INTO auth_accounts (
            uid, email, display_name, password_hash, disabled, tokens_valid_after, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            account.uid,
            account.email,
            account.display_name,
            account.password_hash,
            account.disabled,
            account.tokens_valid_after_ms,
            account.created_at,
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(IdentityError::EmailAlreadyInUse)
        }
        Err(e) => Err(IdentityError::Database(e)),
    }
}

/// Looks an account up by UID.
pub fn find_account_by_uid(
    conn: &Connection,
    uid: &str,
) -> Result<Option<AuthAccount>, IdentityError> {
    Ok(conn
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM auth_accounts WHERE uid = ?1"),
            [uid],
            map_row_to_account,
        )
        .optional()?)
}

/// Looks an account up by (already normalized) email.
pub fn find_account_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<AuthAccount>, IdentityError> {
    Ok(conn
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM auth_accounts WHERE email = ?1"),
            [email],
            map_row_to_account,
        )
        .optional()?)
}

/// Sets the disabled flag.
///
/// # Errors
///
/// Returns `IdentityError::UserNotFound` if no account has this UID.
pub fn update_disabled(conn: &Connection, uid: &str, disabled: bool) -> Result<(), IdentityError> {
    let changed = conn.execute(
        "UPDATE auth_accounts SET disabled = ?1 WHERE uid = ?2",
        params![disabled, uid],
    )?;
    if changed == 0 {
        return Err(IdentityError::UserNotFound);
    }
    Ok(())
}

/// Moves the revocation watermark forward to `valid_after_ms`.
///
/// # Errors
///
/// Returns `IdentityError::UserNotFound` if no account has this UID.
pub fn update_tokens_valid_after(
    conn: &Connection,
    uid: &str,
    valid_after_ms: i64,
) -> Result<(), IdentityError> {
    let changed = conn.execute(
        "UPDATE auth_accounts SET tokens_valid_after = MAX(tokens_valid_after, ?1) WHERE uid = ?2",
        params![valid_after_ms, uid],
    )?;
    if changed == 0 {
        return Err(IdentityError::UserNotFound);
    }
    Ok(())
}
