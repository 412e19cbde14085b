//! Error types for agent operations.

use thiserror::Error;

/// Boxed source error from a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while running agents or managing sessions.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The addressed session does not exist.
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// The session backend failed. Never retried here.
    #[error("storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// The model backend failed or returned something unusable.
    #[error("model error: {0}")]
    Model(String),

    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A stored JSON payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Wrap a backend error with the operation that failed.
    pub fn storage(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            operation,
            source: source.into(),
        }
    }
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
