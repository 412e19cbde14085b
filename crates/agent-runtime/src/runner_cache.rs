//! One long-lived runner per chatbot.

use std::collections::HashMap;
use std::sync::Arc;

use agent_core::{AgentDefinition, ChatModel, Runner, SessionService};
use tokio::sync::RwLock;
use tracing::info;

use crate::runtime::app_name_for;

/// Holds a [`Runner`] per chatbot, replacing it when the agent changes.
pub struct RunnerCache {
    runners: RwLock<HashMap<String, Arc<Runner>>>,
    sessions: Arc<dyn SessionService>,
    model: Arc<dyn ChatModel>,
}

impl RunnerCache {
    pub fn new(sessions: Arc<dyn SessionService>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            runners: RwLock::new(HashMap::new()),
            sessions,
            model,
        }
    }

    /// The runner for `chatbot_id`, created or replaced when it is not
    /// bound to `agent`.
    pub async fn get_or_create(&self, chatbot_id: &str, agent: Arc<AgentDefinition>) -> Arc<Runner> {
        if let Some(runner) = self.runners.read().await.get(chatbot_id) {
            if Arc::ptr_eq(runner.agent(), &agent) {
                return Arc::clone(runner);
            }
        }

        let mut runners = self.runners.write().await;
        if let Some(runner) = runners.get(chatbot_id) {
            if Arc::ptr_eq(runner.agent(), &agent) {
                return Arc::clone(runner);
            }
        }

        let runner = Arc::new(Runner::new(
            app_name_for(chatbot_id),
            agent,
            Arc::clone(&self.sessions),
            Arc::clone(&self.model),
        ));
        let replaced = runners.insert(chatbot_id.to_string(), Arc::clone(&runner)).is_some();
        info!(chatbot_id, replaced, "Created runner");
        runner
    }

    /// Drop the runner so the next request creates a fresh one.
    pub async fn invalidate(&self, chatbot_id: &str) -> bool {
        self.runners.write().await.remove(chatbot_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.runners.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.runners.read().await.is_empty()
    }
}
