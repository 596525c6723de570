//! Voice-agent integration for HireLyze.
//!
//! The voice platform is reached through the [`VoiceSdk`] trait: it starts
//! and stops calls and emits lifecycle, speech and transcript events on an
//! [`EventBus`]. The [`Agent`] mounts handlers on that bus and turns the
//! event stream into call state, a transcript log and, once the call is
//! over, a navigation decision.

pub mod agent;
pub mod error;
pub mod events;
pub mod interviewer;
pub mod sdk;

pub use agent::{
    Agent, AgentMode, AgentProps, AgentSettings, CallStatus, FeedbackGenerator, FeedbackOutcome,
    FeedbackRequest, MockFeedbackGenerator, Navigator, SavedMessage, MOCK_FEEDBACK_ID,
};
pub use error::VoiceError;
pub use events::{
    EventBus, EventKind, Role, Subscription, TranscriptType, VoiceEvent, VoiceMessage,
};
pub use interviewer::{format_questions, InterviewerConfig, QUESTIONS_PLACEHOLDER};
pub use sdk::{CallTarget, VoiceSdk};
