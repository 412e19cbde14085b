//! Configuration loading through the cache.

use std::sync::Arc;

use agent_core::KnowledgeEntry;
use async_trait::async_trait;
use database::{chatbot, knowledge_source, widget_config};
use database::{Chatbot, Database, KnowledgeKind, KnowledgeSource, ProcessingStatus, WidgetConfig};
use tracing::{debug, warn};

use crate::cache::ConfigCache;
use crate::config::{resolve_chatbot, resolve_widget, ResolvedChatbotConfig, ResolvedWidgetConfig};
use crate::error::{Result, RuntimeError};

/// Where raw configuration rows come from.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Point lookup of a chatbot row.
    async fn fetch_chatbot(&self, chatbot_id: &str) -> Result<Option<Chatbot>>;

    /// Point lookup of a chatbot's widget row.
    async fn fetch_widget_config(&self, chatbot_id: &str) -> Result<Option<WidgetConfig>>;

    /// Knowledge candidates for a chatbot, oldest first. The loader still
    /// filters on kind, status and content.
    async fn fetch_knowledge(&self, chatbot_id: &str) -> Result<Vec<KnowledgeSource>>;
}

/// [`ConfigSource`] reading from the SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteConfigSource {
    database: Database,
}

impl SqliteConfigSource {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl ConfigSource for SqliteConfigSource {
    async fn fetch_chatbot(&self, chatbot_id: &str) -> Result<Option<Chatbot>> {
        chatbot::get_chatbot(self.database.pool(), chatbot_id)
            .await
            .map_err(RuntimeError::storage("load chatbot", chatbot_id))
    }

    async fn fetch_widget_config(&self, chatbot_id: &str) -> Result<Option<WidgetConfig>> {
        widget_config::get_widget_config(self.database.pool(), chatbot_id)
            .await
            .map_err(RuntimeError::storage("load widget config", chatbot_id))
    }

    async fn fetch_knowledge(&self, chatbot_id: &str) -> Result<Vec<KnowledgeSource>> {
        knowledge_source::list_agent_knowledge(self.database.pool(), chatbot_id)
            .await
            .map_err(RuntimeError::storage("load knowledge", chatbot_id))
    }
}

/// Resolves chatbot configuration, widget configuration and knowledge,
/// consulting the [`ConfigCache`] first.
///
/// Not-found is `Ok(None)`; storage failures propagate unretried.
pub struct ConfigLoader {
    source: Arc<dyn ConfigSource>,
    cache: Arc<ConfigCache>,
}

impl ConfigLoader {
    pub fn new(source: Arc<dyn ConfigSource>, cache: Arc<ConfigCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    /// Load a chatbot with defaults applied.
    pub async fn load_chatbot_config(
        &self,
        chatbot_id: &str,
    ) -> Result<Option<Arc<ResolvedChatbotConfig>>> {
        if let Some(cached) = self.cache.chatbots().get(chatbot_id).await {
            return Ok(Some(cached));
        }

        let Some(row) = self.source.fetch_chatbot(chatbot_id).await? else {
            warn!(chatbot_id, "Chatbot not found");
            return Ok(None);
        };

        debug!(chatbot_id, "Loaded chatbot config from storage");
        let resolved = self.cache.chatbots().set(chatbot_id, resolve_chatbot(row)).await;
        Ok(Some(resolved))
    }

    /// Load a chatbot's widget appearance with defaults applied.
    pub async fn load_widget_config(
        &self,
        chatbot_id: &str,
    ) -> Result<Option<Arc<ResolvedWidgetConfig>>> {
        if let Some(cached) = self.cache.widgets().get(chatbot_id).await {
            return Ok(Some(cached));
        }

        let Some(row) = self.source.fetch_widget_config(chatbot_id).await? else {
            debug!(chatbot_id, "No widget config stored");
            return Ok(None);
        };

        let resolved = self.cache.widgets().set(chatbot_id, resolve_widget(row)).await;
        Ok(Some(resolved))
    }

    /// Load the knowledge entries that feed a chatbot's agent: completed
    /// text sources with non-empty content, oldest first. Empty when there
    /// are none.
    pub async fn load_knowledge_for_chatbot(
        &self,
        chatbot_id: &str,
    ) -> Result<Arc<Vec<KnowledgeEntry>>> {
        if let Some(cached) = self.cache.knowledge().get(chatbot_id).await {
            return Ok(cached);
        }

        let entries: Vec<KnowledgeEntry> = self
            .source
            .fetch_knowledge(chatbot_id)
            .await?
            .into_iter()
            .filter(|source| {
                source.kind().is_some_and(|kind| kind == KnowledgeKind::Text)
                    && source.status() == Some(ProcessingStatus::Completed)
            })
            .filter_map(|source| {
                let content = source.text_content.filter(|text| !text.is_empty())?;
                Some(KnowledgeEntry {
                    id: source.id,
                    name: source.name,
                    content,
                })
            })
            .collect();

        debug!(chatbot_id, entries = entries.len(), "Loaded knowledge from storage");
        Ok(self.cache.knowledge().set(chatbot_id, entries).await)
    }

    /// Drop every cached namespace for the chatbot and read it again.
    pub async fn reload_chatbot_config(
        &self,
        chatbot_id: &str,
    ) -> Result<Option<Arc<ResolvedChatbotConfig>>> {
        self.cache.invalidate_all(chatbot_id).await;
        self.load_chatbot_config(chatbot_id).await
    }

    /// Whether the chatbot exists and is active. Unknown chatbots are inactive.
    pub async fn is_chatbot_active(&self, chatbot_id: &str) -> Result<bool> {
        Ok(self
            .load_chatbot_config(chatbot_id)
            .await?
            .is_some_and(|config| config.is_active))
    }
}
