//! Application state shared across handlers.

use std::sync::Arc;

use agent_runtime::AgentRuntime;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Config caches, agent factory, sessions and runners.
    pub runtime: Arc<AgentRuntime>,
    /// Secret expected in `x-internal-token` on reload requests.
    pub internal_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(runtime: AgentRuntime, internal_token: Option<String>) -> Self {
        Self {
            runtime: Arc::new(runtime),
            internal_token: internal_token.map(Arc::from),
        }
    }
}
