use std::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum LoopEngineError {
    #[error("Transport failure: {0}")]
    Transport(#[source] Box<dyn Error + Send + Sync + 'static>),
    #[error("Failed to sign request: {0}")]
    Signing(String),
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid feedback payload: {0}")]
    InvalidPayload(String),
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for LoopEngineError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(Box::new(error))
    }
}

impl LoopEngineError {
    /// Whether the failure happened on the wire rather than while building the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T, E = LoopEngineError> = std::result::Result<T, E>;
