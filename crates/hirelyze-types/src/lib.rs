//! Shared record types and helpers for the HireLyze platform.
//!
//! This crate holds the documents every other crate passes around: user
//! profiles, interview records, feedback records and the result shape of the
//! authentication actions. Field names serialize in camelCase so JSON bodies
//! match the collection documents one to one.
//!
//! No crate in the workspace depends on anything *except* `hirelyze-types` for
//! cross-cutting type definitions.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Returns the current time as an ISO-8601 UTC string with millisecond
/// precision (`2024-05-01T10:00:00.000Z`).
///
/// Every stored `createdAt` / `updatedAt` uses this format, so ordering the
/// strings lexicographically orders them chronologically.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A user profile document, keyed by the identity-provider UID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity-provider UID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Lower-cased email address.
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A generated mock interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    /// UID of the user the interview was generated for.
    pub user_id: String,
    /// Job role, e.g. "frontend developer".
    pub role: String,
    /// Free-text interview type ("behavioral", "technical", "mixed", ...).
    #[serde(rename = "type")]
    pub interview_type: String,
    pub techstack: Vec<String>,
    pub questions: Vec<String>,
    /// Only finalized interviews appear in the discovery feed.
    pub finalized: bool,
    pub created_at: String,
}

impl Interview {
    /// Interview type as shown on cards: anything mentioning "mix" reads
    /// "Mixed", everything else is shown as stored.
    pub fn display_type(&self) -> String {
        normalize_interview_type(&self.interview_type)
    }
}

/// Normalizes a free-text interview type for display.
pub fn normalize_interview_type(raw: &str) -> String {
    if raw.to_lowercase().contains("mix") {
        "Mixed".to_string()
    } else {
        raw.to_string()
    }
}

/// One scored category of a feedback report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    /// Score out of 100.
    pub score: u32,
    pub comment: String,
}

/// The scored outcome of a completed interview.
///
/// Identified by the `(interview_id, user_id)` pair; absence of a record for
/// a pair means the user has not taken that interview yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub interview_id: String,
    pub user_id: String,
    /// Overall score out of 100.
    pub total_score: u32,
    pub category_scores: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
    pub created_at: String,
}

/// Result of an authentication action (sign up, sign in, sign out).
///
/// Failures are reported in-band with `success: false` and a user-facing
/// message rather than as HTTP errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl AuthResponse {
    /// A successful response without a user payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            user: None,
        }
    }

    /// A failed response.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            user: None,
        }
    }

    /// Attaches the signed-in user.
    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }
}
