//! Interview documents.

use crate::{json_column, new_document_id, RecordError};
use hirelyze_types::{now_timestamp, Interview};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// Number of interviews returned by the discovery feed when no limit is given.
pub const DEFAULT_LATEST_LIMIT: u32 = 10;

const INTERVIEW_COLUMNS: &str =
    "id, user_id, role, type, techstack_json, questions_json, finalized, created_at";

/// Parameters for the discovery feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestInterviewsQuery {
    /// The requesting user; their own interviews are excluded.
    pub user_id: String,
    pub limit: Option<u32>,
}

/// Fields for a newly generated interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInterview {
    pub user_id: String,
    pub role: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    #[serde(default)]
    pub techstack: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub finalized: bool,
}

fn map_row_to_interview(row: &Row) -> rusqlite::Result<Interview> {
    Ok(Interview {
        id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        interview_type: row.get(3)?,
        techstack: json_column(row, 4)?,
        questions: json_column(row, 5)?,
        finalized: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Stores a new interview and returns it with its generated id and
/// creation time.
pub fn create_interview(conn: &Connection, new: &NewInterview) -> Result<Interview, RecordError> {
    if new.user_id.trim().is_empty() {
        return Err(RecordError::Invalid("interview userId must not be empty".to_string()));
    }
    if new.role.trim().is_empty() {
        return Err(RecordError::Invalid("interview role must not be empty".to_string()));
    }

    let interview = Interview {
        id: new_document_id(),
        user_id: new.user_id.clone(),
        role: new.role.trim().to_string(),
        interview_type: new.interview_type.trim().to_string(),
        techstack: new.techstack.clone(),
        questions: new.questions.clone(),
        finalized: new.finalized,
        created_at: now_timestamp(),
    };

    conn.execute(
        "INSERT INTO interviews (
            id, user_id, role, type, techstack_json, questions_json, finalized, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            interview.id,
            interview.user_id,
            interview.role,
            interview.interview_type,
            serde_json::to_string(&interview.techstack)?,
            serde_json::to_string(&interview.questions)?,
            interview.finalized,
            interview.created_at,
        ],
    )?;

    tracing::info!(
        interview_id = %interview.id,
        user_id = %interview.user_id,
        questions = interview.questions.len(),
        "interview stored"
    );
    Ok(interview)
}

/// Fetches one interview by id.
pub fn get_interview_by_id(conn: &Connection, id: &str) -> Result<Option<Interview>, RecordError> {
    Ok(conn
        .query_row(
            &format!("SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = ?1"),
            [id],
            map_row_to_interview,
        )
        .optional()?)
}

/// Lists the interviews owned by `user_id`, newest first.
pub fn get_interviews_by_user_id(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<Interview>, RecordError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INTERVIEW_COLUMNS} FROM interviews
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC"
    ))?;

    let rows = stmt.query_map([user_id], map_row_to_interview)?;
    let mut interviews = Vec::new();
    for row in rows {
        interviews.push(row?);
    }
    Ok(interviews)
}

/// Lists finalized interviews generated for other users, newest first,
/// bounded by `query.limit` (default [`DEFAULT_LATEST_LIMIT`]).
pub fn get_latest_interviews(
    conn: &Connection,
    query: &LatestInterviewsQuery,
) -> Result<Vec<Interview>, RecordError> {
    let limit = query.limit.unwrap_or(DEFAULT_LATEST_LIMIT);

    let mut stmt = conn.prepare(&format!(
        "SELECT {INTERVIEW_COLUMNS} FROM interviews
         WHERE finalized = 1 AND user_id != ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![query.user_id, limit], map_row_to_interview)?;
    let mut interviews = Vec::new();
    for row in rows {
        interviews.push(row?);
    }
    Ok(interviews)
}
