//! The boundary to the real-time voice platform.

use crate::error::VoiceError;
use crate::events::EventBus;
use crate::interviewer::InterviewerConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a call is started against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallTarget {
    /// A hosted workflow, used to generate a new interview.
    #[serde(rename_all = "camelCase")]
    Workflow {
        workflow_id: String,
        variable_values: BTreeMap<String, String>,
    },
    /// An inline assistant, used to run an interview.
    #[serde(rename_all = "camelCase")]
    Assistant {
        assistant: InterviewerConfig,
        variable_values: BTreeMap<String, String>,
    },
}

impl CallTarget {
    pub fn variable_values(&self) -> &BTreeMap<String, String> {
        match self {
            Self::Workflow {
                variable_values, ..
            }
            | Self::Assistant {
                variable_values, ..
            } => variable_values,
        }
    }
}

/// A real-time voice SDK client.
///
/// Implementations deliver lifecycle, speech and transcript events through
/// [`VoiceSdk::events`].
#[async_trait]
pub trait VoiceSdk: Send + Sync {
    /// Starts a call. Returns once the start request has been accepted; the
    /// call itself becomes live on the `call-start` event.
    async fn start(&self, target: CallTarget) -> Result<(), VoiceError>;

    /// Ends the current call.
    async fn stop(&self) -> Result<(), VoiceError>;

    fn events(&self) -> &EventBus;
}
