//! Database models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A tenant (customer account) owning chatbots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// URL-safe unique handle.
    pub slug: String,
    /// Billing plan name (informational only).
    pub plan: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a tenant.
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl NewTenant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
        }
    }
}

/// A stored chatbot configuration.
///
/// Optional columns are left `NULL` when the dashboard never set them; the
/// serving path fills in defaults when it resolves the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Chatbot {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    /// Model identifier or alias (e.g. "gemini-2.0-flash").
    pub model: Option<String>,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: Option<f64>,
    /// Maximum output tokens.
    pub max_tokens: Option<i64>,
    pub is_active: Option<bool>,
    /// Free-form settings object, stored as JSON text.
    pub settings: Option<String>,
    pub created_at: String,
    /// Refreshed on every update; used as the cache invalidation signal.
    pub updated_at: String,
}

/// Input for creating a chatbot.
#[derive(Debug, Clone, Default)]
pub struct NewChatbot {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub is_active: Option<bool>,
    pub settings: Option<serde_json::Value>,
}

impl NewChatbot {
    /// A chatbot with only the required fields set.
    pub fn new(id: impl Into<String>, tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Partial chatbot update. `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct ChatbotUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub is_active: Option<bool>,
    pub settings: Option<serde_json::Value>,
}

/// Stored widget appearance for a chatbot. One row per chatbot at most.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WidgetConfig {
    pub id: String,
    pub chatbot_id: String,
    pub position: Option<String>,
    pub primary_color: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub border_radius: Option<i64>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub welcome_message: Option<String>,
    pub placeholder: Option<String>,
    pub launcher_icon: Option<String>,
    pub launcher_icon_url: Option<String>,
    pub auto_open: Option<bool>,
    /// Delay before auto-opening, in milliseconds.
    pub auto_open_delay: Option<i64>,
    pub show_branding: Option<bool>,
    /// JSON list of domains allowed to embed the widget.
    pub allowed_domains: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating or replacing a widget configuration.
#[derive(Debug, Clone, Default)]
pub struct WidgetConfigInput {
    pub position: Option<String>,
    pub primary_color: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub border_radius: Option<i64>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub welcome_message: Option<String>,
    pub placeholder: Option<String>,
    pub launcher_icon: Option<String>,
    pub launcher_icon_url: Option<String>,
    pub auto_open: Option<bool>,
    pub auto_open_delay: Option<i64>,
    pub show_branding: Option<bool>,
    pub allowed_domains: Option<Vec<String>>,
}

/// Kind of knowledge source.
///
/// Only [`KnowledgeKind::Text`] is consumed when building agents. File, URL
/// and sitemap sources are accepted for storage but have no ingestion
/// pipeline; they never reach an agent instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeKind {
    File,
    Url,
    Text,
    Sitemap,
}

impl KnowledgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Url => "url",
            Self::Text => "text",
            Self::Sitemap => "sitemap",
        }
    }

    /// Whether sources of this kind are injected into agent instructions.
    pub fn feeds_agents(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl fmt::Display for KnowledgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "url" => Ok(Self::Url),
            "text" => Ok(Self::Text),
            "sitemap" => Ok(Self::Sitemap),
            other => Err(format!("unknown knowledge kind: {}", other)),
        }
    }
}

/// Processing status of a knowledge source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown processing status: {}", other)),
        }
    }
}

/// A stored knowledge source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct KnowledgeSource {
    pub id: String,
    pub chatbot_id: String,
    /// Raw kind column; see [`KnowledgeSource::kind`].
    pub kind: String,
    pub name: String,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub source_url: Option<String>,
    pub text_content: Option<String>,
    /// Raw status column; see [`KnowledgeSource::status`].
    pub status: String,
    pub error_message: Option<String>,
    pub chunks_count: i64,
    pub last_processed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl KnowledgeSource {
    /// Parsed kind, or `None` for values written by something else.
    pub fn kind(&self) -> Option<KnowledgeKind> {
        self.kind.parse().ok()
    }

    /// Parsed status, or `None` for values written by something else.
    pub fn status(&self) -> Option<ProcessingStatus> {
        self.status.parse().ok()
    }
}

/// Input for creating a knowledge source, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewKnowledgeSource {
    /// Inline text, usable by agents immediately.
    Text { name: String, content: String },
    /// Uploaded file. Not ingested.
    File {
        name: String,
        file_url: String,
        file_name: String,
        mime_type: String,
        size: i64,
    },
    /// Single web page. Not ingested.
    Url { name: String, source_url: String },
    /// Sitemap to crawl. Not ingested.
    Sitemap { name: String, source_url: String },
}

impl NewKnowledgeSource {
    /// Convenience constructor for the common text case.
    pub fn text(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn kind(&self) -> KnowledgeKind {
        match self {
            Self::Text { .. } => KnowledgeKind::Text,
            Self::File { .. } => KnowledgeKind::File,
            Self::Url { .. } => KnowledgeKind::Url,
            Self::Sitemap { .. } => KnowledgeKind::Sitemap,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. }
            | Self::File { name, .. }
            | Self::Url { name, .. }
            | Self::Sitemap { name, .. } => name,
        }
    }

    /// Text needs no processing; everything else waits for a pipeline.
    pub fn initial_status(&self) -> ProcessingStatus {
        match self {
            Self::Text { .. } => ProcessingStatus::Completed,
            _ => ProcessingStatus::Pending,
        }
    }
}

/// A stored conversation session row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub chatbot_id: Option<String>,
    /// Session state object, stored as JSON text.
    pub state: String,
    /// Unix milliseconds of the last append.
    pub last_update_time: i64,
    pub created_at: String,
    pub visitor_id: Option<String>,
    pub visitor_name: Option<String>,
    pub visitor_email: Option<String>,
    pub page_url: Option<String>,
    pub user_agent: Option<String>,
}

/// Input for inserting a session row.
#[derive(Debug, Clone, Default)]
pub struct NewSessionRecord {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub chatbot_id: Option<String>,
    /// JSON text of the initial state.
    pub state: String,
    pub last_update_time: i64,
    pub visitor_id: Option<String>,
    pub visitor_name: Option<String>,
    pub visitor_email: Option<String>,
    pub page_url: Option<String>,
    pub user_agent: Option<String>,
}

/// A stored session event. JSON payloads are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EventRecord {
    pub id: String,
    pub session_id: String,
    pub invocation_id: String,
    pub author: Option<String>,
    pub content: Option<String>,
    pub actions: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub branch: Option<String>,
    pub long_running_tool_ids: Option<String>,
    pub grounding_metadata: Option<String>,
    pub partial: bool,
    pub turn_complete: Option<bool>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub custom_metadata: Option<String>,
    pub usage_metadata: Option<String>,
    pub finish_reason: Option<String>,
}
