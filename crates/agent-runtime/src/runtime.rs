//! The injectable runtime bundle handed to request handlers.

use std::sync::Arc;

use agent_core::{ChatModel, Runner, SessionService};
use database::Database;
use tracing::info;

use crate::cache::ConfigCache;
use crate::config::ResolvedChatbotConfig;
use crate::error::Result;
use crate::factory::AgentFactory;
use crate::loader::{ConfigLoader, ConfigSource, SqliteConfigSource};
use crate::runner_cache::RunnerCache;
use crate::session_store::SqliteSessionStore;
use crate::settings::RuntimeSettings;

const APP_NAME_PREFIX: &str = "chatbot_";

/// Session app name for a chatbot.
pub fn app_name_for(chatbot_id: &str) -> String {
    format!("{}{}", APP_NAME_PREFIX, chatbot_id)
}

/// Chatbot id encoded in a session app name, if it has the expected prefix.
pub fn chatbot_id_from_app_name(app_name: &str) -> Option<&str> {
    app_name
        .strip_prefix(APP_NAME_PREFIX)
        .filter(|id| !id.is_empty())
}

/// Config cache, loader, agent factory, session store and runner cache,
/// owned together so each test or server gets an isolated instance.
pub struct AgentRuntime {
    cache: Arc<ConfigCache>,
    loader: Arc<ConfigLoader>,
    factory: AgentFactory,
    sessions: Arc<dyn SessionService>,
    runners: RunnerCache,
}

impl AgentRuntime {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        sessions: Arc<dyn SessionService>,
        model: Arc<dyn ChatModel>,
        settings: &RuntimeSettings,
    ) -> Self {
        let cache = Arc::new(ConfigCache::new(settings.config_cache_ttl));
        let loader = Arc::new(ConfigLoader::new(source, Arc::clone(&cache)));
        Self {
            factory: AgentFactory::new(Arc::clone(&loader)),
            runners: RunnerCache::new(Arc::clone(&sessions), model),
            cache,
            loader,
            sessions,
        }
    }

    /// Runtime reading configuration from and storing sessions in `database`.
    pub fn with_database(
        database: Database,
        model: Arc<dyn ChatModel>,
        settings: &RuntimeSettings,
    ) -> Self {
        Self::new(
            Arc::new(SqliteConfigSource::new(database.clone())),
            Arc::new(SqliteSessionStore::new(database)),
            model,
            settings,
        )
    }

    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    pub fn loader(&self) -> &Arc<ConfigLoader> {
        &self.loader
    }

    pub fn factory(&self) -> &AgentFactory {
        &self.factory
    }

    pub fn sessions(&self) -> &Arc<dyn SessionService> {
        &self.sessions
    }

    pub fn runners(&self) -> &RunnerCache {
        &self.runners
    }

    /// Runner for an already resolved configuration.
    pub async fn runner_for_config(&self, config: &ResolvedChatbotConfig) -> Result<Arc<Runner>> {
        let agent = self.factory.get_or_build_agent(config).await?;
        Ok(self.runners.get_or_create(&config.id, agent).await)
    }

    /// Runner for a chatbot. `None` when the chatbot is unknown or inactive.
    pub async fn runner_for(&self, chatbot_id: &str) -> Result<Option<Arc<Runner>>> {
        match self.loader.load_chatbot_config(chatbot_id).await? {
            Some(config) if config.is_active => self.runner_for_config(&config).await.map(Some),
            _ => Ok(None),
        }
    }

    /// Drop everything derived from a chatbot and load its configuration
    /// again. Safe to call repeatedly and for unknown chatbots.
    pub async fn reload(&self, chatbot_id: &str) -> Result<Option<Arc<ResolvedChatbotConfig>>> {
        self.factory.invalidate_agent(chatbot_id).await;
        self.runners.invalidate(chatbot_id).await;
        let config = self.loader.reload_chatbot_config(chatbot_id).await?;
        info!(chatbot_id, found = config.is_some(), "Reloaded chatbot configuration");
        Ok(config)
    }
}
