//! Feedback documents, keyed by `(interview_id, user_id)`.

use crate::{json_column, new_document_id, RecordError};
use hirelyze_types::{now_timestamp, CategoryScore, Feedback};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

const MAX_SCORE: u32 = 100;

/// Identifies a feedback document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    pub interview_id: String,
    pub user_id: String,
}

/// Fields of a feedback report produced by the feedback generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub interview_id: String,
    pub user_id: String,
    pub total_score: u32,
    #[serde(default)]
    pub category_scores: Vec<CategoryScore>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub final_assessment: String,
}

impl NewFeedback {
    fn validate(&self) -> Result<(), RecordError> {
        if self.interview_id.is_empty() || self.user_id.is_empty() {
            return Err(RecordError::Invalid(
                "feedback needs both interviewId and userId".to_string(),
            ));
        }
        if self.total_score > MAX_SCORE {
            return Err(RecordError::Invalid(format!(
                "totalScore {} exceeds {MAX_SCORE}",
                self.total_score
            )));
        }
        if let Some(bad) = self.category_scores.iter().find(|c| c.score > MAX_SCORE) {
            return Err(RecordError::Invalid(format!(
                "category '{}' score {} exceeds {MAX_SCORE}",
                bad.name, bad.score
            )));
        }
        Ok(())
    }
}

fn map_row_to_feedback(row: &Row) -> rusqlite::Result<Feedback> {
    Ok(Feedback {
        id: row.get(0)?,
        interview_id: row.get(1)?,
        user_id: row.get(2)?,
        total_score: row.get(3)?,
        category_scores: json_column(row, 4)?,
        strengths: json_column(row, 5)?,
        areas_for_improvement: json_column(row, 6)?,
        final_assessment: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Fetches the feedback a user received for an interview.
pub fn get_feedback_by_interview_id(
    conn: &Connection,
    query: &FeedbackQuery,
) -> Result<Option<Feedback>, RecordError> {
    Ok(conn
        .query_row(
            "SELECT id, interview_id, user_id, total_score, category_scores_json,
                    strengths_json, areas_for_improvement_json, final_assessment, created_at
             FROM feedback
             WHERE interview_id = ?1 AND user_id = ?2",
            params![query.interview_id, query.user_id],
            map_row_to_feedback,
        )
        .optional()?)
}

/// Stores a feedback report. A second report for the same
/// `(interview_id, user_id)` pair replaces the first but keeps its id.
pub fn create_feedback(conn: &Connection, new: &NewFeedback) -> Result<Feedback, RecordError> {
    new.validate()?;

    conn.execute(
        "INSERT INTO feedback (
            id, interview_id, user_id, total_score, category_scores_json,
            strengths_json, areas_for_improvement_json, final_assessment, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT (interview_id, user_id) DO UPDATE SET
            total_score = excluded.total_score,
            category_scores_json = excluded.category_scores_json,
            strengths_json = excluded.strengths_json,
            areas_for_improvement_json = excluded.areas_for_improvement_json,
            final_assessment = excluded.final_assessment,
            created_at = excluded.created_at",
        params![
            new_document_id(),
            new.interview_id,
            new.user_id,
            new.total_score,
            serde_json::to_string(&new.category_scores)?,
            serde_json::to_string(&new.strengths)?,
            serde_json::to_string(&new.areas_for_improvement)?,
            new.final_assessment,
            now_timestamp(),
        ],
    )?;

    let stored = get_feedback_by_interview_id(
        conn,
        &FeedbackQuery {
            interview_id: new.interview_id.clone(),
            user_id: new.user_id.clone(),
        },
    )?
    .ok_or_else(|| RecordError::Invalid("feedback missing after upsert".to_string()))?;

    tracing::info!(
        feedback_id = %stored.id,
        interview_id = %stored.interview_id,
        total_score = stored.total_score,
        "feedback stored"
    );
    Ok(stored)
}
