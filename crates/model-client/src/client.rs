//! Chat-completions client implementing [`ChatModel`].

use agent_core::{
    async_trait, AgentError, ChatModel, ModelRequest, ModelResponse, UsageMetadata,
};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole,
};
use crate::config::ModelClientConfig;

/// A [`ChatModel`] backed by an OpenAI-compatible HTTP API.
pub struct OpenAiChatModel {
    client: Client,
    config: ModelClientConfig,
}

impl OpenAiChatModel {
    /// Create a new client with the given configuration.
    pub fn new(config: ModelClientConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!("Model client initialized for {}", config.api_url);

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`ModelClientConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::new(ModelClientConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ModelClientConfig {
        &self.config
    }

    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AgentError> {
        let url = self.config.completions_url();
        debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::Model(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::Model(describe_api_error(status.as_u16(), &error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::Model(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, AgentError> {
        let completion = self.chat_completion(&build_request(&request)).await?;
        let response = into_model_response(completion);

        if let Some(usage) = &response.usage {
            debug!(
                "Token usage - prompt: {:?}, completion: {:?}, total: {:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        Ok(response)
    }

    fn name(&self) -> &str {
        "OpenAiChatModel"
    }
}

/// System instruction first, then the transcript.
fn build_request(request: &ModelRequest) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if !request.instruction.is_empty() {
        messages.push(ChatMessage::new(ChatRole::System, &request.instruction));
    }
    messages.extend(
        request
            .messages
            .iter()
            .map(|m| ChatMessage::new(m.role.into(), &m.content)),
    );

    ChatCompletionRequest {
        model: request.model.clone(),
        messages,
        max_tokens: Some(request.max_output_tokens),
        temperature: Some(request.temperature),
    }
}

fn into_model_response(completion: ChatCompletionResponse) -> ModelResponse {
    let choice = completion.choices.into_iter().next();
    let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
    let text = choice.and_then(|c| c.message.content).unwrap_or_else(|| {
        warn!("No content in model response");
        String::new()
    });

    ModelResponse {
        text,
        finish_reason,
        usage: completion.usage.map(|usage| UsageMetadata {
            prompt_token_count: Some(usage.prompt_tokens),
            candidates_token_count: Some(usage.completion_tokens),
            total_token_count: Some(usage.total_tokens),
        }),
    }
}

fn describe_api_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiError>(body) {
        Ok(api_error) => format!("API error ({}): {}", status, api_error.error.message),
        Err(_) => format!("API error ({}): {}", status, body),
    }
}
