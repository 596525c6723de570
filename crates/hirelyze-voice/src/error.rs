use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("voice SDK error: {0}")]
    Sdk(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("feedback generation failed: {0}")]
    Feedback(String),

    #[error("agent status channel closed")]
    Closed,
}
