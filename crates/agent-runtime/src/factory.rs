//! Agent construction with fingerprint-based reuse.

use std::collections::HashMap;
use std::sync::Arc;

use agent_core::{build_instruction, AgentDefinition, Fingerprint, GenerationConfig, KnowledgeEntry};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::ResolvedChatbotConfig;
use crate::error::Result;
use crate::loader::ConfigLoader;

/// Model aliases stored by the dashboard mapped to backend model names.
const MODEL_ALIASES: [(&str, &str); 3] = [
    ("gemini-2.0-flash", "gemini-2.0-flash-exp"),
    ("gemini-1.5-flash", "gemini-1.5-flash"),
    ("gemini-1.5-pro", "gemini-1.5-pro"),
];

/// Map a stored model name to the backend name. Unknown names pass through.
pub fn resolve_model_name(model: &str) -> String {
    MODEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == model)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| model.to_string())
}

/// Fingerprint of everything an agent is built from.
pub fn agent_fingerprint(config: &ResolvedChatbotConfig, knowledge: &[KnowledgeEntry]) -> String {
    let mut fingerprint = Fingerprint::new()
        .field("id", &config.id)
        .field("system_prompt", &config.system_prompt)
        .field("model", &config.model)
        .field("temperature", config.temperature.to_bits().to_le_bytes())
        .field("max_tokens", config.max_tokens.to_le_bytes())
        .field("updated_at", &config.updated_at)
        .field("knowledge_count", (knowledge.len() as u64).to_le_bytes());
    for entry in knowledge {
        fingerprint = fingerprint
            .field("knowledge_id", &entry.id)
            .field("knowledge_name", &entry.name)
            .field("knowledge_content", &entry.content);
    }
    fingerprint.finish()
}

/// Build an agent definition from resolved configuration and knowledge.
pub fn build_agent(config: &ResolvedChatbotConfig, knowledge: &[KnowledgeEntry]) -> AgentDefinition {
    let description = config
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("AI Assistant - {}", config.name));

    AgentDefinition::new(
        &config.id,
        resolve_model_name(&config.model),
        description,
        build_instruction(&config.system_prompt, knowledge),
        GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
        },
    )
}

struct CachedAgent {
    fingerprint: String,
    agent: Arc<AgentDefinition>,
}

/// Builds agents and reuses them while their fingerprint is unchanged.
pub struct AgentFactory {
    loader: Arc<ConfigLoader>,
    agents: RwLock<HashMap<String, CachedAgent>>,
}

impl AgentFactory {
    pub fn new(loader: Arc<ConfigLoader>) -> Self {
        Self {
            loader,
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached agent when config and knowledge are unchanged,
    /// otherwise build, cache and return a new one.
    ///
    /// The compare-and-replace runs under one write lock with no await
    /// inside, so concurrent rebuilds for the same chatbot resolve to
    /// last writer wins.
    pub async fn get_or_build_agent(
        &self,
        config: &ResolvedChatbotConfig,
    ) -> Result<Arc<AgentDefinition>> {
        let knowledge = self.loader.load_knowledge_for_chatbot(&config.id).await?;
        let fingerprint = agent_fingerprint(config, &knowledge);

        if let Some(cached) = self.agents.read().await.get(&config.id) {
            if cached.fingerprint == fingerprint {
                debug!(chatbot_id = %config.id, "Reusing cached agent");
                return Ok(Arc::clone(&cached.agent));
            }
        }

        let agent = Arc::new(build_agent(config, &knowledge));

        let mut agents = self.agents.write().await;
        if let Some(cached) = agents.get(&config.id) {
            if cached.fingerprint == fingerprint {
                return Ok(Arc::clone(&cached.agent));
            }
        }
        agents.insert(
            config.id.clone(),
            CachedAgent {
                fingerprint: fingerprint.clone(),
                agent: Arc::clone(&agent),
            },
        );

        info!(
            chatbot_id = %config.id,
            model = %agent.model,
            knowledge_entries = knowledge.len(),
            "Built agent (fingerprint: {})",
            fingerprint
        );
        Ok(agent)
    }

    /// Forget the cached agent so the next call rebuilds unconditionally.
    pub async fn invalidate_agent(&self, chatbot_id: &str) -> bool {
        self.agents.write().await.remove(chatbot_id).is_some()
    }

    /// Number of cached agents.
    pub async fn len(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.agents.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::BASE_INSTRUCTIONS;
    use serde_json::Map;

    fn config() -> ResolvedChatbotConfig {
        ResolvedChatbotConfig {
            id: "3f2b8c1e-9d4a".to_string(),
            tenant_id: "tenant-1".to_string(),
            name: "Support".to_string(),
            description: None,
            system_prompt: "Be terse.".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            is_active: true,
            settings: Map::new(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn knowledge() -> Vec<KnowledgeEntry> {
        vec![KnowledgeEntry {
            id: "k1".to_string(),
            name: "Return Policy".to_string(),
            content: "Refunds within 30 days.".to_string(),
        }]
    }

    #[test]
    fn test_model_aliases() {
        assert_eq!(resolve_model_name("gemini-2.0-flash"), "gemini-2.0-flash-exp");
        assert_eq!(resolve_model_name("gemini-1.5-pro"), "gemini-1.5-pro");
        assert_eq!(resolve_model_name("llama-3.1-8b"), "llama-3.1-8b");
    }

    #[test]
    fn test_build_agent() {
        let agent = build_agent(&config(), &knowledge());
        assert_eq!(agent.name, "chatbot_3f2b8c1e_9d4a");
        assert_eq!(agent.model, "gemini-2.0-flash-exp");
        assert_eq!(agent.description, "AI Assistant - Support");
        assert!(agent.instruction.starts_with(BASE_INSTRUCTIONS));
        assert!(agent.instruction.contains("Be terse.\n\n## Knowledge Base"));
        assert!(agent.instruction.contains("### Return Policy"));
        assert_eq!(agent.generation.max_output_tokens, 2048);
    }

    #[test]
    fn test_description_prefers_stored_value() {
        let mut config = config();
        config.description = Some("Billing help".to_string());
        assert_eq!(build_agent(&config, &[]).description, "Billing help");
        config.description = Some(String::new());
        assert_eq!(build_agent(&config, &[]).description, "AI Assistant - Support");
    }

    #[test]
    fn test_fingerprint_tracks_every_input() {
        let base = agent_fingerprint(&config(), &knowledge());
        assert_eq!(base, agent_fingerprint(&config(), &knowledge()));

        let mut changed = config();
        changed.temperature = 0.8;
        assert_ne!(base, agent_fingerprint(&changed, &knowledge()));

        let mut changed = config();
        changed.updated_at = "2026-01-02T00:00:00.000Z".to_string();
        assert_ne!(base, agent_fingerprint(&changed, &knowledge()));

        let mut edited = knowledge();
        edited[0].content = "Refunds within 14 days.".to_string();
        assert_ne!(base, agent_fingerprint(&config(), &edited));

        assert_ne!(base, agent_fingerprint(&config(), &[]));
    }

    #[test]
    fn test_fingerprint_ignores_untracked_fields() {
        let mut changed = config();
        changed.name = "Renamed".to_string();
        changed.is_active = false;
        assert_eq!(
            agent_fingerprint(&config(), &knowledge()),
            agent_fingerprint(&changed, &knowledge())
        );
    }
}
