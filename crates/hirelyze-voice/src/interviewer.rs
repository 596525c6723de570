//! Assistant configuration for interview-mode calls.

use serde::{Deserialize, Serialize};

/// Placeholder in the system prompt that the voice platform substitutes with
/// the `questions` variable.
pub const QUESTIONS_PLACEHOLDER: &str = "{{questions}}";

/// Formats interview questions for the `questions` call variable: one
/// `" - question"` line per entry, joined by newlines. No questions gives
/// the empty string.
pub fn format_questions(questions: &[String]) -> String {
    questions
        .iter()
        .map(|q| format!(" - {q}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriberConfig {
    pub provider: String,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub provider: String,
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub speed: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub messages: Vec<PromptMessage>,
}

/// The interviewer assistant handed to the voice SDK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewerConfig {
    pub name: String,
    pub first_message: String,
    pub transcriber: TranscriberConfig,
    pub voice: SpeechConfig,
    pub model: ModelConfig,
}

const SYSTEM_PROMPT: &str = "You are a professional job interviewer running a real-time voice interview with a candidate. \
Assess their qualifications, motivation and fit for the role.

Follow this question list:
{{questions}}

Ask the questions in order and listen to each answer. If an answer is vague, ask one brief follow-up. \
Keep replies short, as in a real spoken conversation. Stay warm and professional.

If the candidate asks about the role or the company, answer briefly or point them to HR. \
When the questions are done, thank the candidate and end the conversation politely.";

impl Default for InterviewerConfig {
    fn default() -> Self {
        Self {
            name: "Interviewer".to_string(),
            first_message: "Hello! Thank you for taking the time to speak with me today. \
                            I'm excited to learn more about you and your experience."
                .to_string(),
            transcriber: TranscriberConfig {
                provider: "deepgram".to_string(),
                model: "nova-2".to_string(),
                language: "en".to_string(),
            },
            voice: SpeechConfig {
                provider: "11labs".to_string(),
                voice_id: "sarah".to_string(),
                stability: 0.4,
                similarity_boost: 0.8,
                speed: 0.9,
                style: 0.5,
                use_speaker_boost: true,
            },
            model: ModelConfig {
                provider: "openai".to_string(),
                model: "gpt-4".to_string(),
                messages: vec![PromptMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                }],
            },
        }
    }
}

impl InterviewerConfig {
    /// Whether any system message contains the questions placeholder.
    pub fn has_questions_placeholder(&self) -> bool {
        self.model
            .messages
            .iter()
            .any(|m| m.role == "system" && m.content.contains(QUESTIONS_PLACEHOLDER))
    }
}
