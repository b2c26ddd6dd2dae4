use async_trait::async_trait;
use thiserror::Error;
use thymos_core::{RawClassification, Role};

/// Why a classification attempt produced no usable result.
/// The update engine treats every variant the same way (fail-open).
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("classifier transport error: {0}")]
    Transport(String),
    #[error("classifier returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("classifier response malformed: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClassifierError::Transport(format!("request timed out: {}", e))
        } else if e.is_decode() {
            ClassifierError::Malformed(e.to_string())
        } else {
            ClassifierError::Transport(e.to_string())
        }
    }
}

/// An emotion classifier for a single message.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    async fn classify(&self, text: &str, role: Role) -> Result<RawClassification, ClassifierError>;
}
