//! Sessions and the session service trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::event::{now_millis, Event};

/// State keys with this prefix live for one invocation and are never stored.
pub const TEMP_STATE_PREFIX: &str = "temp:";

/// Visitor details captured when a session is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chatbot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// One visitor conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    #[serde(default)]
    pub state: Map<String, Value>,
    /// Ordered by timestamp ascending. Empty in session listings.
    #[serde(default)]
    pub events: Vec<Event>,
    /// Unix milliseconds.
    pub last_update_time: i64,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

impl Session {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.app_name, &self.user_id, &self.id)
    }
}

/// The `(app_name, user_id, session_id)` triple addressing a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// Input for [`SessionService::create_session`].
#[derive(Debug, Clone, Default)]
pub struct CreateSessionRequest {
    pub app_name: String,
    pub user_id: String,
    /// Generated when absent.
    pub session_id: Option<String>,
    pub state: Map<String, Value>,
    pub metadata: SessionMetadata,
}

impl CreateSessionRequest {
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

/// Event filters for [`SessionService::get_session`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetSessionOptions {
    /// Only events strictly after this Unix-millisecond instant.
    pub after_timestamp: Option<i64>,
    /// Keep only the most recent N events, applied after the timestamp
    /// filter. `Some(0)` keeps everything, like `None`.
    pub num_recent_events: Option<usize>,
}

impl GetSessionOptions {
    /// Filter then trim an ordered event list.
    pub fn apply(&self, mut events: Vec<Event>) -> Vec<Event> {
        if let Some(after) = self.after_timestamp {
            events.retain(|event| event.timestamp > after);
        }
        if let Some(keep) = self.num_recent_events.filter(|&n| n > 0) {
            let excess = events.len().saturating_sub(keep);
            events.drain(..excess);
        }
        events
    }
}

/// Durable storage for sessions and their transcripts.
///
/// Implementations must scope every lookup by the full [`SessionKey`].
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Persist a new session and return it with no events.
    async fn create_session(&self, request: CreateSessionRequest) -> Result<Session>;

    /// Load a session and its (filtered) events. `None` when absent.
    async fn get_session(
        &self,
        key: &SessionKey,
        options: GetSessionOptions,
    ) -> Result<Option<Session>>;

    /// Whether the session exists, without loading its transcript.
    async fn session_exists(&self, key: &SessionKey) -> Result<bool> {
        Ok(self
            .get_session(key, GetSessionOptions::default())
            .await?
            .is_some())
    }

    /// List a user's sessions for an app without events, newest first.
    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>>;

    /// Delete a session and its events. Deleting a missing session succeeds.
    async fn delete_session(&self, key: &SessionKey) -> Result<()>;

    /// Record an event, merging its state delta into `session`.
    ///
    /// Returns the event as stored, with id and timestamp assigned.
    async fn append_event(&self, session: &mut Session, event: Event) -> Result<Event>;
}

/// Generate a new session id.
pub fn generate_session_id() -> String {
    format!("session_{}", uuid::Uuid::new_v4())
}

/// Assign an id and the current timestamp when the event has none.
pub fn ensure_event_identity(event: &mut Event) {
    if event.id.is_empty() {
        event.id = uuid::Uuid::new_v4().to_string();
    }
    if event.timestamp == 0 {
        event.timestamp = now_millis();
    }
}

/// Apply an identified event to the in-memory session.
///
/// The state delta is merged (last write wins, `temp:` keys dropped) and
/// `last_update_time` is set to the time of the append, not the event's
/// own timestamp.
pub fn apply_event(session: &mut Session, event: &Event) {
    for (key, value) in &event.actions.state_delta {
        if key.starts_with(TEMP_STATE_PREFIX) {
            continue;
        }
        session.state.insert(key.clone(), value.clone());
    }
    session.last_update_time = now_millis();
    session.events.push(event.clone());
}
