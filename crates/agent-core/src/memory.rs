//! In-process session service.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AgentError, Result};
use crate::event::{now_millis, Event};
use crate::session::{
    apply_event, ensure_event_identity, generate_session_id, CreateSessionRequest,
    GetSessionOptions, Session, SessionKey, SessionService,
};

/// A [`SessionService`] that keeps everything in memory.
///
/// Nothing survives a restart; use it for tests and local experiments.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
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

        let mut sessions = self.sessions.write().await;
        let key = session.key();
        if sessions.contains_key(&key) {
            return Err(AgentError::storage(
                "create_session",
                format!("session already exists: {}", key.session_id),
            ));
        }
        sessions.insert(key, session.clone());
        Ok(session)
    }

    async fn get_session(
        &self,
        key: &SessionKey,
        options: GetSessionOptions,
    ) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(key).cloned().map(|mut session| {
            session.events = options.apply(std::mem::take(&mut session.events));
            session
        }))
    }

    async fn session_exists(&self, key: &SessionKey) -> Result<bool> {
        Ok(self.sessions.read().await.contains_key(key))
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut listed: Vec<Session> = sessions
            .values()
            .filter(|s| s.app_name == app_name && s.user_id == user_id)
            .map(|s| Session {
                events: Vec::new(),
                ..s.clone()
            })
            .collect();
        listed.sort_by(|a, b| b.last_update_time.cmp(&a.last_update_time));
        Ok(listed)
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn append_event(&self, session: &mut Session, mut event: Event) -> Result<Event> {
        if event.partial {
            return Ok(event);
        }
        ensure_event_identity(&mut event);

        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&session.key())
            .ok_or_else(|| AgentError::SessionNotFound {
                session_id: session.id.clone(),
            })?;
        apply_event(stored, &event);
        apply_event(session, &event);
        session.last_update_time = stored.last_update_time;
        Ok(event)
    }
}
