//! The model backend trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::UsageMetadata;

/// Speaker of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of the transcript sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMessage {
    pub role: Role,
    pub content: String,
}

impl ModelMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single generation request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model: String,
    /// System instruction.
    pub instruction: String,
    /// Transcript, oldest first, ending with the new user message.
    pub messages: Vec<ModelMessage>,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl ModelRequest {
    /// The most recent user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// The model's reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Option<UsageMetadata>,
}

/// A trait for turning an instruction plus transcript into a reply.
///
/// This trait is object-safe and can be used with `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate the next assistant message.
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;
}
