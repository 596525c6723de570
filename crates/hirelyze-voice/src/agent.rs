//! The interview agent: call state machine driven by voice SDK events.

use crate::error::VoiceError;
use crate::events::{EventKind, Role, Subscription, TranscriptType, VoiceEvent, VoiceMessage};
use crate::interviewer::{format_questions, InterviewerConfig};
use crate::sdk::{CallTarget, VoiceSdk};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Mocked id returned by [`MockFeedbackGenerator`].
pub const MOCK_FEEDBACK_ID: &str = "feedback-id-12345";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    Inactive,
    Connecting,
    Active,
    Finished,
}

/// One final transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedMessage {
    pub role: Role,
    pub content: String,
}

/// What the agent is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentMode {
    /// Talk to the generation workflow to create a new interview.
    Generate,
    /// Run an existing interview.
    #[serde(rename_all = "camelCase")]
    Interview {
        interview_id: String,
        questions: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProps {
    pub user_name: String,
    pub user_id: String,
    pub mode: AgentMode,
}

/// Voice platform settings the agent needs to start calls.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    /// Workflow used in generate mode.
    pub workflow_id: String,
    pub interviewer: InterviewerConfig,
}

impl AgentProps {
    /// Builds the call target for this agent's mode.
    pub fn call_target(&self, settings: &AgentSettings) -> CallTarget {
        match &self.mode {
            AgentMode::Generate => CallTarget::Workflow {
                workflow_id: settings.workflow_id.clone(),
                variable_values: BTreeMap::from([
                    ("username".to_string(), self.user_name.clone()),
                    ("userid".to_string(), self.user_id.clone()),
                ]),
            },
            AgentMode::Interview { questions, .. } => CallTarget::Assistant {
                assistant: settings.interviewer.clone(),
                variable_values: BTreeMap::from([(
                    "questions".to_string(),
                    format_questions(questions),
                )]),
            },
        }
    }
}

/// Input to the feedback generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub interview_id: String,
    pub user_id: String,
    pub transcript: Vec<SavedMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    pub success: bool,
    pub id: Option<String>,
}

/// Turns an interview transcript into a stored feedback report.
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    async fn generate(&self, request: FeedbackRequest) -> Result<FeedbackOutcome, VoiceError>;
}

/// Feedback generator that always succeeds with [`MOCK_FEEDBACK_ID`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MockFeedbackGenerator;

#[async_trait]
impl FeedbackGenerator for MockFeedbackGenerator {
    async fn generate(&self, request: FeedbackRequest) -> Result<FeedbackOutcome, VoiceError> {
        info!(
            interview_id = %request.interview_id,
            lines = request.transcript.len(),
            "generating feedback"
        );
        Ok(FeedbackOutcome {
            success: true,
            id: Some(MOCK_FEEDBACK_ID.to_string()),
        })
    }
}

/// Client-side navigation.
pub trait Navigator: Send + Sync {
    fn push(&self, route: &str);
}

#[derive(Debug, Default)]
struct Transcript {
    speaking: bool,
    messages: Vec<SavedMessage>,
}

fn lock(state: &Mutex<Transcript>) -> MutexGuard<'_, Transcript> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            error!("agent state lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// A mounted agent.
///
/// Mounting registers one handler per SDK event; dropping the agent drops the
/// subscriptions and with them every handler.
pub struct Agent {
    sdk: Arc<dyn VoiceSdk>,
    props: AgentProps,
    settings: AgentSettings,
    feedback: Arc<dyn FeedbackGenerator>,
    navigator: Arc<dyn Navigator>,
    status: Arc<watch::Sender<CallStatus>>,
    transcript: Arc<Mutex<Transcript>>,
    finish_handled: AtomicBool,
    stop_issued: AtomicBool,
    _subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("props", &self.props)
            .field("status", &self.status())
            .finish()
    }
}

impl Agent {
    pub fn mount(
        sdk: Arc<dyn VoiceSdk>,
        props: AgentProps,
        settings: AgentSettings,
        feedback: Arc<dyn FeedbackGenerator>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (status_tx, _) = watch::channel(CallStatus::Inactive);
        let status = Arc::new(status_tx);
        let transcript = Arc::new(Mutex::new(Transcript::default()));
        let events = sdk.events();

        let subscriptions = vec![
            {
                let status = Arc::clone(&status);
                // Only a connecting call becomes active; a call-start that
                // lands after a disconnect leaves the call finished.
                events.on(EventKind::CallStart, move |_| {
                    status.send_if_modified(|s| {
                        let connecting = *s == CallStatus::Connecting;
                        if connecting {
                            *s = CallStatus::Active;
                        }
                        connecting
                    });
                })
            },
            {
                let status = Arc::clone(&status);
                events.on(EventKind::CallEnd, move |_| {
                    status.send_replace(CallStatus::Finished);
                })
            },
            {
                let transcript = Arc::clone(&transcript);
                events.on(EventKind::Message, move |event| {
                    if let VoiceEvent::Message(VoiceMessage::Transcript {
                        role,
                        transcript_type: TranscriptType::Final,
                        transcript: content,
                    }) = event
                    {
                        lock(&transcript).messages.push(SavedMessage {
                            role: *role,
                            content: content.clone(),
                        });
                    }
                })
            },
            {
                let transcript = Arc::clone(&transcript);
                events.on(EventKind::SpeechStart, move |_| {
                    lock(&transcript).speaking = true;
                })
            },
            {
                let transcript = Arc::clone(&transcript);
                events.on(EventKind::SpeechEnd, move |_| {
                    lock(&transcript).speaking = false;
                })
            },
            {
                let status = Arc::clone(&status);
                let transcript = Arc::clone(&transcript);
                events.on(EventKind::Error, move |event| {
                    if let VoiceEvent::Error(message) = event {
                        error!(error = %message, "error during call");
                    }
                    status.send_replace(CallStatus::Inactive);
                    lock(&transcript).speaking = false;
                })
            },
        ];

        Self {
            sdk,
            props,
            settings,
            feedback,
            navigator,
            status,
            transcript,
            finish_handled: AtomicBool::new(false),
            stop_issued: AtomicBool::new(false),
            _subscriptions: subscriptions,
        }
    }

    pub fn status(&self) -> CallStatus {
        *self.status.borrow()
    }

    pub fn is_speaking(&self) -> bool {
        lock(&self.transcript).speaking
    }

    pub fn messages(&self) -> Vec<SavedMessage> {
        lock(&self.transcript).messages.clone()
    }

    /// Content of the most recent transcript line.
    pub fn latest_message(&self) -> Option<String> {
        lock(&self.transcript)
            .messages
            .last()
            .map(|m| m.content.clone())
    }

    /// Starts a call for this agent's mode.
    ///
    /// # Errors
    ///
    /// Returns the SDK error if the start request is refused; the agent is
    /// then back to `Inactive`.
    pub async fn handle_call(&self) -> Result<(), VoiceError> {
        self.finish_handled.store(false, Ordering::SeqCst);
        self.stop_issued.store(false, Ordering::SeqCst);
        self.status.send_replace(CallStatus::Connecting);

        let target = self.props.call_target(&self.settings);
        info!(user_id = %self.props.user_id, "starting voice call");

        if let Err(e) = self.sdk.start(target).await {
            error!(error = %e, "failed to start voice call");
            self.status.send_replace(CallStatus::Inactive);
            lock(&self.transcript).speaking = false;
            return Err(e);
        }
        Ok(())
    }

    /// Ends the call: marks it finished, then asks the SDK to stop. Only the
    /// first disconnect of a call reaches the SDK.
    pub async fn handle_disconnect(&self) -> Result<(), VoiceError> {
        self.status.send_replace(CallStatus::Finished);
        if self.stop_issued.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.sdk.stop().await
    }

    /// Waits for the call to finish, then runs the finish effect.
    ///
    /// Returns the route navigated to, or `None` if the effect already ran
    /// for this call.
    pub async fn run_until_finished(&self) -> Result<Option<String>, VoiceError> {
        let mut rx = self.status.subscribe();
        rx.wait_for(|s| *s == CallStatus::Finished)
            .await
            .map(|_| ())
            .map_err(|_| VoiceError::Closed)?;
        Ok(self.on_finished().await)
    }

    async fn on_finished(&self) -> Option<String> {
        if self.finish_handled.swap(true, Ordering::SeqCst) {
            return None;
        }

        let route = match &self.props.mode {
            AgentMode::Generate => "/".to_string(),
            AgentMode::Interview { interview_id, .. } => {
                let request = FeedbackRequest {
                    interview_id: interview_id.clone(),
                    user_id: self.props.user_id.clone(),
                    transcript: self.messages(),
                };
                match self.feedback.generate(request).await {
                    Ok(FeedbackOutcome {
                        success: true,
                        id: Some(_),
                    }) => format!("/interview/{interview_id}/feedback"),
                    Ok(_) => {
                        warn!(interview_id = %interview_id, "failed to generate feedback");
                        "/".to_string()
                    }
                    Err(e) => {
                        error!(interview_id = %interview_id, error = %e, "failed to generate feedback");
                        "/".to_string()
                    }
                }
            }
        };

        self.navigator.push(&route);
        Some(route)
    }
}
