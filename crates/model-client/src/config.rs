//! Configuration for the chat-completions client.

use std::env;
use std::time::Duration;

use agent_core::AgentError;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for [`OpenAiChatModel`](crate::OpenAiChatModel).
#[derive(Debug, Clone)]
pub struct ModelClientConfig {
    /// Base URL; `/chat/completions` is appended.
    pub api_url: String,

    /// API key sent as a bearer token.
    pub api_key: String,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ModelClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ModelClientConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `LLM_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `LLM_API_URL` - Base URL (default: Gemini's OpenAI-compatible endpoint)
    /// - `LLM_REQUEST_TIMEOUT_SECS` - Request timeout (default: 60)
    pub fn from_env() -> Result<Self, AgentError> {
        let api_key = env::var("LLM_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AgentError::Configuration("LLM_API_KEY not set".to_string()))?;

        let api_url = env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let request_timeout = env::var("LLM_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            api_url,
            api_key,
            request_timeout,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> ModelClientConfigBuilder {
        ModelClientConfigBuilder::default()
    }

    /// Full chat-completions URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Builder for ModelClientConfig.
#[derive(Debug, Default)]
pub struct ModelClientConfigBuilder {
    config: ModelClientConfig,
}

impl ModelClientConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ModelClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModelClientConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_key.is_empty());
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_completions_url_trims_slash() {
        let config = ModelClientConfig::builder()
            .api_url("http://localhost:8080/v1/")
            .build();
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        fn clear_all_llm_vars() {
            env::remove_var("LLM_API_KEY");
            env::remove_var("LLM_API_URL");
            env::remove_var("LLM_REQUEST_TIMEOUT_SECS");
        }

        // Missing key is a configuration error
        clear_all_llm_vars();
        match ModelClientConfig::from_env() {
            Err(AgentError::Configuration(msg)) => assert!(msg.contains("LLM_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        // Blank key counts as missing
        env::set_var("LLM_API_KEY", "  ");
        assert!(ModelClientConfig::from_env().is_err());

        // Key only, defaults used
        clear_all_llm_vars();
        env::set_var("LLM_API_KEY", "test-key");
        let config = ModelClientConfig::from_env().unwrap();
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));

        // Everything set
        env::set_var("LLM_API_URL", "http://localhost:11434/v1");
        env::set_var("LLM_REQUEST_TIMEOUT_SECS", "5");
        let config = ModelClientConfig::from_env().unwrap();
        assert_eq!(config.api_url, "http://localhost:11434/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        clear_all_llm_vars();
    }
}
