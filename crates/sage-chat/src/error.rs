//! Error types for the conversational core.

use sage_core::error::SageError;

/// Errors from routing, handlers, and session management.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The question was blank after trimming.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("question exceeds maximum length of {0} characters")]
    QuestionTooLong(usize),
    /// An outbound call to a hosted service failed. Never retried here.
    #[error("{service} error: {message}")]
    ExternalService { service: String, message: String },
    #[error("an API key is required to start a session")]
    MissingApiKey,
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn external(service: &str, message: impl Into<String>) -> Self {
        ChatError::ExternalService {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

impl From<SageError> for ChatError {
    fn from(err: SageError) -> Self {
        ChatError::Internal(err.to_string())
    }
}
