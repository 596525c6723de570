//! Ingestion endpoints for generated interviews and feedback reports.
//!
//! Both routes sit behind the API session gate; the owner of every stored
//! document is the signed-in user.

use crate::api::{run_blocking, ApiError};
use crate::middleware::CurrentUser;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use hirelyze_records::{
    create_feedback, create_interview, get_interview_by_id, NewFeedback, NewInterview,
};
use hirelyze_types::CategoryScore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A list field that may arrive as an array or as one comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    Many(Vec<String>),
    Joined(String),
}

impl Default for ListField {
    fn default() -> Self {
        ListField::Many(Vec::new())
    }
}

impl ListField {
    pub fn into_vec(self) -> Vec<String> {
        let items = match self {
            ListField::Many(items) => items,
            ListField::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Request body for `POST /api/interviews`.
#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub role: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    #[serde(default)]
    pub techstack: ListField,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default = "default_finalized")]
    pub finalized: bool,
}

fn default_finalized() -> bool {
    true
}

/// Request body for `POST /api/interviews/{id}/feedback`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
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

/// Response body for a stored document.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: String,
}

/// Handler for `POST /api/interviews`.
pub async fn create_interview_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateInterviewRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let new = NewInterview {
        user_id: user.id,
        role: payload.role.trim().to_string(),
        interview_type: payload.interview_type.trim().to_string(),
        techstack: payload.techstack.into_vec(),
        questions: payload.questions,
        finalized: payload.finalized,
    };

    let interview = run_blocking(&state, move |_, conn| Ok(create_interview(conn, &new)?)).await?;
    tracing::info!(interview_id = %interview.id, user_id = %interview.user_id, "interview stored");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: interview.id,
        }),
    ))
}

/// Handler for `POST /api/interviews/{id}/feedback`.
pub async fn create_feedback_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(interview_id): Path<String>,
    Json(payload): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let feedback = run_blocking(&state, move |_, conn| {
        if get_interview_by_id(conn, &interview_id)?.is_none() {
            return Err(ApiError::NotFound(format!("interview {} not found", interview_id)));
        }
        let new = NewFeedback {
            interview_id,
            user_id: user.id,
            total_score: payload.total_score,
            category_scores: payload.category_scores,
            strengths: payload.strengths,
            areas_for_improvement: payload.areas_for_improvement,
            final_assessment: payload.final_assessment,
        };
        Ok(create_feedback(conn, &new)?)
    })
    .await?;
    tracing::info!(feedback_id = %feedback.id, interview_id = %feedback.interview_id, "feedback stored");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: feedback.id,
        }),
    ))
}
