//! Durable session storage on SQLite.

use agent_core::{
    apply_event, ensure_event_identity, generate_session_id, now_millis, AgentError,
    CreateSessionRequest, Event, GetSessionOptions, Result, Session, SessionKey, SessionMetadata,
    SessionService,
};
use async_trait::async_trait;
use database::{event, session, Database, EventRecord, NewSessionRecord, SessionRecord};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// [`SessionService`] backed by the `sessions` and `events` tables.
///
/// Events are appended before the session row is touched. If the state
/// update then fails the event stays stored and the failure is logged.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    database: Database,
}

impl SqliteSessionStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn to_optional_json<T: serde::Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(to_json).transpose()
}

fn from_optional_json<T: serde::de::DeserializeOwned>(raw: Option<&str>) -> Result<Option<T>> {
    Ok(raw.map(serde_json::from_str).transpose()?)
}

fn parse_state(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn session_from_record(record: SessionRecord, events: Vec<Event>) -> Result<Session> {
    Ok(Session {
        state: parse_state(&record.state)?,
        id: record.id,
        app_name: record.app_name,
        user_id: record.user_id,
        events,
        last_update_time: record.last_update_time,
        metadata: SessionMetadata {
            chatbot_id: record.chatbot_id,
            visitor_id: record.visitor_id,
            visitor_name: record.visitor_name,
            visitor_email: record.visitor_email,
            page_url: record.page_url,
            user_agent: record.user_agent,
        },
    })
}

fn event_to_record(session_id: &str, event: &Event) -> Result<EventRecord> {
    Ok(EventRecord {
        id: event.id.clone(),
        session_id: session_id.to_string(),
        invocation_id: event.invocation_id.clone(),
        author: event.author.clone(),
        content: to_optional_json(event.content.as_ref())?,
        actions: to_json(&event.actions)?,
        timestamp: event.timestamp,
        branch: event.branch.clone(),
        long_running_tool_ids: to_optional_json(event.long_running_tool_ids.as_ref())?,
        grounding_metadata: to_optional_json(event.grounding_metadata.as_ref())?,
        partial: event.partial,
        turn_complete: event.turn_complete,
        error_code: event.error_code.clone(),
        error_message: event.error_message.clone(),
        custom_metadata: to_optional_json(event.custom_metadata.as_ref())?,
        usage_metadata: to_optional_json(event.usage_metadata.as_ref())?,
        finish_reason: event.finish_reason.clone(),
    })
}

fn event_from_record(record: EventRecord) -> Result<Event> {
    Ok(Event {
        content: from_optional_json(record.content.as_deref())?,
        actions: serde_json::from_str(&record.actions)?,
        long_running_tool_ids: from_optional_json(record.long_running_tool_ids.as_deref())?,
        grounding_metadata: from_optional_json(record.grounding_metadata.as_deref())?,
        custom_metadata: from_optional_json(record.custom_metadata.as_deref())?,
        usage_metadata: from_optional_json(record.usage_metadata.as_deref())?,
        id: record.id,
        invocation_id: record.invocation_id,
        author: record.author,
        timestamp: record.timestamp,
        branch: record.branch,
        partial: record.partial,
        turn_complete: record.turn_complete,
        error_code: record.error_code,
        error_message: record.error_message,
        finish_reason: record.finish_reason,
    })
}

#[async_trait]
impl SessionService for SqliteSessionStore {
    async fn create_session(&self, request: CreateSessionRequest) -> Result<Session> {
        let session = Session {
            id: request.session_id.unwrap_or_else(generate_session_id),
            app_name: request.app_name,
            user_id: request.user_id,
            state: request.state,
            events: Vec::new(),
            last_update_time: now_millis(),
            metadata: request.metadata,
        };

        let record = NewSessionRecord {
            id: session.id.clone(),
            app_name: session.app_name.clone(),
            user_id: session.user_id.clone(),
            chatbot_id: session.metadata.chatbot_id.clone(),
            state: to_json(&session.state)?,
            last_update_time: session.last_update_time,
            visitor_id: session.metadata.visitor_id.clone(),
            visitor_name: session.metadata.visitor_name.clone(),
            visitor_email: session.metadata.visitor_email.clone(),
            page_url: session.metadata.page_url.clone(),
            user_agent: session.metadata.user_agent.clone(),
        };
        session::insert_session(self.database.pool(), &record)
            .await
            .map_err(|e| AgentError::storage("create_session", e))?;

        debug!(
            session_id = %session.id,
            app_name = %session.app_name,
            user_id = %session.user_id,
            "Created session"
        );
        Ok(session)
    }

    async fn get_session(
        &self,
        key: &SessionKey,
        options: GetSessionOptions,
    ) -> Result<Option<Session>> {
        let pool = self.database.pool();
        let Some(record) = session::get_session(pool, &key.app_name, &key.user_id, &key.session_id)
            .await
            .map_err(|e| AgentError::storage("get_session", e))?
        else {
            return Ok(None);
        };

        let events = event::list_events(pool, &record.id, options.after_timestamp)
            .await
            .map_err(|e| AgentError::storage("get_session", e))?
            .into_iter()
            .map(event_from_record)
            .collect::<Result<Vec<_>>>()?;

        session_from_record(record, options.apply(events)).map(Some)
    }

    async fn session_exists(&self, key: &SessionKey) -> Result<bool> {
        let record = session::get_session(
            self.database.pool(),
            &key.app_name,
            &key.user_id,
            &key.session_id,
        )
        .await
        .map_err(|e| AgentError::storage("get_session", e))?;
        Ok(record.is_some())
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        session::list_sessions(self.database.pool(), app_name, user_id)
            .await
            .map_err(|e| AgentError::storage("list_sessions", e))?
            .into_iter()
            .map(|record| session_from_record(record, Vec::new()))
            .collect()
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        let deleted = session::delete_session(
            self.database.pool(),
            &key.app_name,
            &key.user_id,
            &key.session_id,
        )
        .await
        .map_err(|e| AgentError::storage("delete_session", e))?;
        debug!(session_id = %key.session_id, deleted, "Deleted session");
        Ok(())
    }

    async fn append_event(&self, session: &mut Session, mut event: Event) -> Result<Event> {
        if event.partial {
            return Ok(event);
        }
        ensure_event_identity(&mut event);

        let pool = self.database.pool();
        let record = event_to_record(&session.id, &event)?;
        event::insert_event(pool, &record)
            .await
            .map_err(|e| AgentError::storage("append_event", e))?;

        apply_event(session, &event);

        let state = to_json(&session.state)?;
        if let Err(e) = session::update_session_state(
            pool,
            &session.app_name,
            &session.user_id,
            &session.id,
            &state,
            session.last_update_time,
        )
        .await
        {
            warn!(
                session_id = %session.id,
                event_id = %event.id,
                error = %e,
                "Event stored but session state update failed"
            );
        }

        Ok(event)
    }
}
