//! Runner: drives one agent through turns against a session store.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::AgentDefinition;
use crate::error::{AgentError, Result};
use crate::event::{Content, Event};
use crate::model::{ChatModel, ModelMessage, ModelRequest};
use crate::session::{GetSessionOptions, SessionKey, SessionService};

/// Author recorded on user events.
const USER_AUTHOR: &str = "user";

/// Error code recorded when the model call fails.
const MODEL_ERROR_CODE: &str = "MODEL_ERROR";

/// A long-lived runner bound to one agent definition.
///
/// Cheap to share behind an `Arc`; holds no per-request state.
pub struct Runner {
    app_name: String,
    agent: Arc<AgentDefinition>,
    sessions: Arc<dyn SessionService>,
    model: Arc<dyn ChatModel>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("app_name", &self.app_name)
            .field("agent", &self.agent.name)
            .field("model", &self.model.name())
            .finish()
    }
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<AgentDefinition>,
        sessions: Arc<dyn SessionService>,
        model: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            sessions,
            model,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// The agent this runner was built for.
    pub fn agent(&self) -> &Arc<AgentDefinition> {
        &self.agent
    }

    /// Run one turn: record the user message, ask the model, record the reply.
    ///
    /// Returns the response events produced by the agent. A model failure is
    /// recorded in the transcript as an error event and then returned.
    pub async fn run(&self, user_id: &str, session_id: &str, message: &str) -> Result<Vec<Event>> {
        let key = SessionKey::new(&self.app_name, user_id, session_id);
        let mut session = self
            .sessions
            .get_session(&key, GetSessionOptions::default())
            .await?
            .ok_or_else(|| AgentError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let invocation_id = format!("e-{}", uuid::Uuid::new_v4());
        let user_event = Event::new(&invocation_id, USER_AUTHOR).with_content(Content::user(message));
        self.sessions.append_event(&mut session, user_event).await?;

        let request = ModelRequest {
            model: self.agent.model.clone(),
            instruction: self.agent.instruction.clone(),
            messages: transcript(&session.events),
            temperature: self.agent.generation.temperature,
            max_output_tokens: self.agent.generation.max_output_tokens,
        };

        debug!(
            app_name = %self.app_name,
            session_id,
            model = %self.agent.model,
            messages = request.messages.len(),
            "Running agent turn"
        );

        match self.model.generate(request).await {
            Ok(response) => {
                let mut reply =
                    Event::new(&invocation_id, &self.agent.name).with_content(Content::model(response.text));
                reply.usage_metadata = response.usage;
                reply.finish_reason = response.finish_reason;
                reply.turn_complete = Some(true);
                let reply = self.sessions.append_event(&mut session, reply).await?;
                Ok(vec![reply])
            }
            Err(err) => {
                let mut failure = Event::new(&invocation_id, &self.agent.name);
                failure.error_code = Some(MODEL_ERROR_CODE.to_string());
                failure.error_message = Some(err.to_string());
                failure.turn_complete = Some(true);
                if let Err(record_err) = self.sessions.append_event(&mut session, failure).await {
                    warn!(session_id, "Failed to record model error event: {}", record_err);
                }
                Err(err)
            }
        }
    }
}

/// Conversation messages for the model, skipping error and empty events.
fn transcript(events: &[Event]) -> Vec<ModelMessage> {
    events
        .iter()
        .filter(|event| !event.is_error() && !event.partial)
        .filter_map(|event| {
            let text = event.text();
            if text.trim().is_empty() {
                return None;
            }
            Some(match event.author.as_deref() {
                Some(USER_AUTHOR) => ModelMessage::user(text),
                _ => ModelMessage::assistant(text),
            })
        })
        .collect()
}

/// Concatenate the text parts of response events into the reply.
pub fn collect_text(events: &[Event]) -> String {
    events.iter().map(Event::text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::GenerationConfig;
    use crate::echo::EchoModel;
    use crate::memory::InMemorySessionService;
    use crate::model::{ModelResponse, Role};
    use crate::session::CreateSessionRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn generate(&self, _request: ModelRequest) -> Result<ModelResponse> {
            Err(AgentError::Model("upstream unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "FailingModel"
        }
    }

    #[derive(Default)]
    struct RecordingModel {
        requests: Mutex<Vec<ModelRequest>>,
    }

    #[async_trait]
    impl ChatModel for RecordingModel {
        async fn generate(&self, request: ModelRequest) -> Result<ModelResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(ModelResponse {
                text: "ok".to_string(),
                ..Default::default()
            })
        }

        fn name(&self) -> &str {
            "RecordingModel"
        }
    }

    fn agent() -> Arc<AgentDefinition> {
        Arc::new(AgentDefinition::new(
            "bot-1",
            "test-model",
            "Test",
            "Be terse.",
            GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 64,
            },
        ))
    }

    async fn setup() -> (Arc<InMemorySessionService>, String) {
        let sessions = Arc::new(InMemorySessionService::new());
        let session = sessions
            .create_session(CreateSessionRequest::new("chatbot_bot-1", "alice"))
            .await
            .unwrap();
        (sessions, session.id)
    }

    #[tokio::test]
    async fn test_turn_is_recorded() {
        let (sessions, session_id) = setup().await;
        let runner = Runner::new("chatbot_bot-1", agent(), sessions.clone(), Arc::new(EchoModel::new()));

        let events = runner.run("alice", &session_id, "Hello!").await.unwrap();
        assert_eq!(collect_text(&events), "Hello!");
        assert_eq!(events[0].author.as_deref(), Some("chatbot_bot_1"));

        let session = sessions
            .get_session(
                &SessionKey::new("chatbot_bot-1", "alice", &session_id),
                GetSessionOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.events.len(), 2);
        assert_eq!(session.events[0].author.as_deref(), Some("user"));
        assert_eq!(session.events[0].invocation_id, session.events[1].invocation_id);
        assert!(session.events[0].timestamp <= session.events[1].timestamp);
    }

    #[tokio::test]
    async fn test_model_sees_instruction_and_history() {
        let (sessions, session_id) = setup().await;
        let model = Arc::new(RecordingModel::default());
        let runner = Runner::new("chatbot_bot-1", agent(), sessions, model.clone());

        runner.run("alice", &session_id, "one").await.unwrap();
        runner.run("alice", &session_id, "two").await.unwrap();

        let requests = model.requests.lock().unwrap();
        let last = &requests[1];
        assert_eq!(last.instruction, "Be terse.");
        assert_eq!(last.model, "test-model");
        assert_eq!(last.temperature, 0.2);
        assert_eq!(last.max_output_tokens, 64);
        let roles: Vec<Role> = last.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(last.messages[2].content, "two");
    }

    #[tokio::test]
    async fn test_model_failure_records_error_event() {
        let (sessions, session_id) = setup().await;
        let runner = Runner::new("chatbot_bot-1", agent(), sessions.clone(), Arc::new(FailingModel));

        let err = runner.run("alice", &session_id, "Hello?").await.unwrap_err();
        assert!(matches!(err, AgentError::Model(_)));

        let session = sessions
            .get_session(
                &SessionKey::new("chatbot_bot-1", "alice", &session_id),
                GetSessionOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.events.len(), 2);
        assert_eq!(session.events[1].error_code.as_deref(), Some("MODEL_ERROR"));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (sessions, _) = setup().await;
        let runner = Runner::new("chatbot_bot-1", agent(), sessions, Arc::new(EchoModel::new()));
        let err = runner.run("alice", "missing", "Hi").await.unwrap_err();
        assert!(matches!(err, AgentError::SessionNotFound { .. }));
    }
}
