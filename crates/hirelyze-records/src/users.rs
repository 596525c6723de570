//! User profile documents.

use crate::RecordError;
use hirelyze_types::{now_timestamp, User};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Fields used to create a profile document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSeed {
    pub uid: String,
    pub name: String,
    pub email: String,
}

impl ProfileSeed {
    /// Builds a seed from what the identity provider knows about an account.
    ///
    /// The name falls back to the email's local part, then to
    /// `"Unknown User"`; a missing email is stored as the empty string.
    pub fn from_identity(uid: &str, display_name: Option<&str>, email: Option<&str>) -> Self {
        let email = email.map(str::trim).unwrap_or_default();
        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| email.split('@').next().filter(|local| !local.is_empty()))
            .unwrap_or("Unknown User");

        Self {
            uid: uid.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Fetches the profile document for `uid`.
pub fn get_user_profile(conn: &Connection, uid: &str) -> Result<Option<User>, RecordError> {
    Ok(conn
        .query_row(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = ?1",
            [uid],
            map_row_to_user,
        )
        .optional()?)
}

/// Creates the profile document for `seed.uid` unless one already exists.
///
/// Returns `true` if a document was written, `false` if one was already
/// present (the existing document is left untouched).
pub fn create_user_profile(conn: &Connection, seed: &ProfileSeed) -> Result<bool, RecordError> {
    if seed.uid.is_empty() {
        return Err(RecordError::Invalid("profile uid must not be empty".to_string()));
    }

    let now = now_timestamp();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (id, name, email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![seed.uid, seed.name, seed.email, now],
    )?;

    if inserted > 0 {
        tracing::info!(uid = %seed.uid, "user profile created");
    }
    Ok(inserted > 0)
}

/// Returns the profile for `seed.uid`, creating it from `seed` first if it
/// does not exist yet.
pub fn ensure_user_profile(conn: &Connection, seed: &ProfileSeed) -> Result<User, RecordError> {
    create_user_profile(conn, seed)?;
    get_user_profile(conn, &seed.uid)?
        .ok_or_else(|| RecordError::Invalid(format!("profile {} vanished after insert", seed.uid)))
}
