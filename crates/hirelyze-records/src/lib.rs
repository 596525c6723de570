//! Document access for HireLyze.
//!
//! One module per collection: user profiles, interviews and feedback. Every
//! function is a single query against the connection it is given: no retries,
//! no caching, no pagination cursors. A missing document is `Ok(None)`, never
//! an error.

pub mod feedback;
pub mod interviews;
pub mod users;

use thiserror::Error;

pub use feedback::{create_feedback, get_feedback_by_interview_id, FeedbackQuery, NewFeedback};
pub use interviews::{
    create_interview, get_interview_by_id, get_interviews_by_user_id, get_latest_interviews,
    LatestInterviewsQuery, NewInterview, DEFAULT_LATEST_LIMIT,
};
pub use users::{create_user_profile, ensure_user_profile, get_user_profile, ProfileSeed};

/// Errors that can occur while reading or writing documents.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid record: {0}")]
    Invalid(String),
}

/// Reads a JSON array column, surfacing decode failures as row conversion
/// errors so they flow through `query_row` / `query_map`.
pub(crate) fn json_column<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Generates a fresh document identifier.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
