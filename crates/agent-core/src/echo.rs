//! Echo model - replies with the last user message.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{ChatModel, ModelRequest, ModelResponse};

/// A model that echoes the user's last message back.
///
/// Useful for testing the turn flow, and as the fallback backend when no
/// API key is configured.
#[derive(Debug, Clone, Default)]
pub struct EchoModel {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoModel {
    /// Create a new EchoModel with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoModel with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use agent_core::EchoModel;
    ///
    /// let model = EchoModel::with_prefix("Echo: ");
    /// // Will respond with "Echo: <last user message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl ChatModel for EchoModel {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse> {
        let message = request.last_user_message().unwrap_or_default();
        let text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, message),
            None => message.to_string(),
        };

        Ok(ModelResponse {
            text,
            finish_reason: Some("STOP".to_string()),
            usage: None,
        })
    }

    fn name(&self) -> &str {
        "EchoModel"
    }
}
