//! Error types for runtime operations.

use agent_core::AgentError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while resolving configuration or serving agents.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The datastore failed. Never retried here.
    #[error("storage error during {operation} for {entity}: {source}")]
    Storage {
        operation: &'static str,
        entity: String,
        #[source]
        source: DatabaseError,
    },

    /// Agent construction or execution failed.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RuntimeError {
    /// Build a mapper that wraps a [`DatabaseError`] with its context.
    pub(crate) fn storage(operation: &'static str, entity: &str) -> impl FnOnce(DatabaseError) -> Self {
        let entity = entity.to_string();
        move |source| Self::Storage {
            operation,
            entity,
            source,
        }
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
