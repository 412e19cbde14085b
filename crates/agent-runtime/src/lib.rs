//! Chatbot serving runtime.
//!
//! Turns stored chatbot configuration into runnable agents and persists
//! conversations:
//!
//! - [`ConfigCache`] - Time-boxed, per-chatbot cache of resolved configuration
//! - [`ConfigLoader`] - Resolves configuration and knowledge through the cache
//! - [`AgentFactory`] - Builds agents, reusing them while their inputs are unchanged
//! - [`SqliteSessionStore`] - Durable [`SessionService`](agent_core::SessionService)
//! - [`RunnerCache`] - One long-lived runner per chatbot
//! - [`AgentRuntime`] - The injectable bundle of all of the above
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use agent_core::EchoModel;
//! use agent_runtime::{AgentRuntime, RuntimeSettings};
//! use database::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:agent_chat.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let runtime = AgentRuntime::with_database(db, Arc::new(EchoModel::new()), &RuntimeSettings::default());
//!     if let Some(runner) = runtime.runner_for("bot-1").await? {
//!         println!("Serving {}", runner.agent().name);
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod factory;
mod loader;
mod notify;
mod runner_cache;
mod runtime;
mod session_store;
mod settings;

pub use cache::{CacheNamespace, ConfigCache, TtlCache};
pub use config::{
    resolve_chatbot, resolve_widget, ResolvedChatbotConfig, ResolvedWidgetConfig,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE,
};
pub use error::{Result, RuntimeError};
pub use factory::{agent_fingerprint, build_agent, resolve_model_name, AgentFactory};
pub use loader::{ConfigLoader, ConfigSource, SqliteConfigSource};
pub use notify::{ReloadNotifier, DEFAULT_AGENT_SERVER_URL, INTERNAL_TOKEN_HEADER};
pub use runner_cache::RunnerCache;
pub use runtime::{app_name_for, chatbot_id_from_app_name, AgentRuntime};
pub use session_store::SqliteSessionStore;
pub use settings::RuntimeSettings;
