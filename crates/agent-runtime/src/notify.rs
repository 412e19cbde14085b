//! Best-effort reload notifications to the agent server.

use std::env;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, warn};

use crate::error::{Result, RuntimeError};

/// Default agent server base URL.
pub const DEFAULT_AGENT_SERVER_URL: &str = "http://localhost:3001";

/// Header carrying the shared internal token.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Tells the agent server to drop cached state for a chatbot after the
/// dashboard changes it. Failures are logged and never returned.
#[derive(Clone)]
pub struct ReloadNotifier {
    http: Client,
    server_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ReloadNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadNotifier")
            .field("server_url", &self.server_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ReloadNotifier {
    pub fn new(server_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RuntimeError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            server_url: server_url.into(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Load from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AGENT_SERVER_URL` | `http://localhost:3001` |
    /// | `INTERNAL_API_TOKEN` | unset (notifications skipped) |
    pub fn from_env() -> Result<Self> {
        let server_url =
            env::var("AGENT_SERVER_URL").unwrap_or_else(|_| DEFAULT_AGENT_SERVER_URL.to_string());
        Self::new(server_url, env::var("INTERNAL_API_TOKEN").ok())
    }

    pub fn reload_url(&self, chatbot_id: &str) -> String {
        format!(
            "{}/api/internal/reload/{}",
            self.server_url.trim_end_matches('/'),
            chatbot_id
        )
    }

    /// Ask the server to reload `chatbot_id`. Returns whether the server
    /// acknowledged the request.
    pub async fn notify(&self, chatbot_id: &str) -> bool {
        let Some(token) = &self.token else {
            warn!(chatbot_id, "INTERNAL_API_TOKEN not set, skipping agent reload");
            return false;
        };

        let url = self.reload_url(chatbot_id);
        let response = match self
            .http
            .post(&url)
            .header(INTERNAL_TOKEN_HEADER, token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(chatbot_id, "Failed to notify agent server: {}", e);
                return false;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(chatbot_id, %status, "Agent server rejected reload: {}", body);
            return false;
        }

        debug!(chatbot_id, "Agent server reloaded chatbot");
        true
    }
}
