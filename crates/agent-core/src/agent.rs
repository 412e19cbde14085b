//! Agent definitions.

use serde::Serialize;

/// Sampling parameters forwarded to the model on every turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// An immutable, ready-to-run agent. Agents carry no tools.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDefinition {
    /// Identifier-safe name (`chatbot_<normalized id>`).
    pub name: String,
    /// Resolved model name sent to the backend.
    pub model: String,
    pub description: String,
    /// Full instruction: base guidelines, tenant prompt, knowledge block.
    pub instruction: String,
    pub generation: GenerationConfig,
}

impl AgentDefinition {
    /// Build a definition for a chatbot id, normalizing it into the agent name.
    pub fn new(
        chatbot_id: &str,
        model: impl Into<String>,
        description: impl Into<String>,
        instruction: impl Into<String>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            name: format!("chatbot_{}", normalize_identifier(chatbot_id)),
            model: model.into(),
            description: description.into(),
            instruction: instruction.into(),
            generation,
        }
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn normalize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_uuid() {
        assert_eq!(
            normalize_identifier("3f2b8c1e-9d4a-4b7e-a1c2-0e5f6a7b8c9d"),
            "3f2b8c1e_9d4a_4b7e_a1c2_0e5f6a7b8c9d"
        );
        assert_eq!(normalize_identifier("bot.v2 (beta)"), "bot_v2__beta_");
        assert_eq!(normalize_identifier("café"), "caf_");
    }

    #[test]
    fn test_agent_name_prefix() {
        let agent = AgentDefinition::new("a-b", "m", "d", "i", GenerationConfig::default());
        assert_eq!(agent.name, "chatbot_a_b");
    }
}
