use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Terminal failure of a caption or question request.
///
/// The `Display` text of every variant is what the page shows to the user.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The hosting service rejected the request without saying the model is loading.
    #[error("{0}")]
    Request(String),

    /// Every attempt saw the model still loading.
    #[error("Model took too long to load. Please try again.")]
    ModelLoadTimeout,

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Body was not JSON, or a success body lacked the expected field.
    #[error("unexpected response from model: {0}")]
    UnexpectedResponse(String),

    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("invalid image: {0}")]
    InvalidImage(String),
}

impl InferenceError {
    /// Whether the retry loop may swallow this error on a non-final attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InferenceError::Transport(_) | InferenceError::UnexpectedResponse(_)
        )
    }
}

/// A request that never produced an HTTP response.
///
/// Displays the underlying error's message and keeps it as the source.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl PartialEq for TransportError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl Eq for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::with_source(err)
    }
}
