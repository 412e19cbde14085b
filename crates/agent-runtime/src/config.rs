//! Resolved configuration: stored rows with every default applied.

use database::{Chatbot, WidgetConfig};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// System prompt used when a chatbot has none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful AI assistant. Be warm, approachable, and genuinely eager to help users. Only provide information you're certain about, and honestly acknowledge when you don't have specific information available.";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

const DEFAULT_POSITION: &str = "bottom-right";
const DEFAULT_PRIMARY_COLOR: &str = "#6366f1";
const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
const DEFAULT_TEXT_COLOR: &str = "#1f2937";
const DEFAULT_FONT_FAMILY: &str = "Inter, system-ui, sans-serif";
const DEFAULT_BORDER_RADIUS: i64 = 12;
const DEFAULT_TITLE: &str = "Chat with us";
const DEFAULT_WELCOME_MESSAGE: &str = "Hi! How can I help you today?";
const DEFAULT_PLACEHOLDER: &str = "Type your message...";
const DEFAULT_LAUNCHER_ICON: &str = "chat";
const DEFAULT_AUTO_OPEN_DELAY_MS: i64 = 3000;

/// A chatbot with all nullable fields defaulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedChatbotConfig {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub system_prompt: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub is_active: bool,
    pub settings: Map<String, Value>,
    pub created_at: String,
    pub updated_at: String,
}

/// Apply chatbot defaults. Only absent values are defaulted; an empty
/// system prompt stays empty.
pub fn resolve_chatbot(chatbot: Chatbot) -> ResolvedChatbotConfig {
    let max_tokens = match chatbot.max_tokens {
        Some(tokens) if tokens > 0 => u32::try_from(tokens).unwrap_or(u32::MAX),
        Some(tokens) => {
            warn!(chatbot_id = %chatbot.id, "Ignoring non-positive max_tokens {}", tokens);
            DEFAULT_MAX_TOKENS
        }
        None => DEFAULT_MAX_TOKENS,
    };

    let settings = match chatbot.settings.as_deref() {
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(chatbot_id = %chatbot.id, "Chatbot settings are not a JSON object, using {{}}");
                Map::new()
            }
        },
        None => Map::new(),
    };

    ResolvedChatbotConfig {
        system_prompt: chatbot
            .system_prompt
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        model: chatbot.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature: chatbot.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens,
        is_active: chatbot.is_active.unwrap_or(true),
        settings,
        id: chatbot.id,
        tenant_id: chatbot.tenant_id,
        name: chatbot.name,
        description: chatbot.description,
        created_at: chatbot.created_at,
        updated_at: chatbot.updated_at,
    }
}

/// Widget appearance with all nullable fields defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedWidgetConfig {
    pub chatbot_id: String,
    pub position: String,
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    pub border_radius: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub welcome_message: String,
    pub placeholder: String,
    pub launcher_icon: String,
    pub launcher_icon_url: Option<String>,
    pub auto_open: bool,
    /// Milliseconds.
    pub auto_open_delay: i64,
    pub show_branding: bool,
    pub allowed_domains: Vec<String>,
}

impl ResolvedWidgetConfig {
    /// Defaults for a chatbot that never saved a widget, titled with its name.
    pub fn fallback(chatbot_id: &str, chatbot_name: &str) -> Self {
        Self {
            chatbot_id: chatbot_id.to_string(),
            position: DEFAULT_POSITION.to_string(),
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            border_radius: DEFAULT_BORDER_RADIUS,
            title: chatbot_name.to_string(),
            subtitle: None,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            launcher_icon: DEFAULT_LAUNCHER_ICON.to_string(),
            launcher_icon_url: None,
            auto_open: false,
            auto_open_delay: DEFAULT_AUTO_OPEN_DELAY_MS,
            show_branding: true,
            allowed_domains: Vec::new(),
        }
    }
}

/// Apply widget defaults.
pub fn resolve_widget(widget: WidgetConfig) -> ResolvedWidgetConfig {
    let allowed_domains = match widget.allowed_domains.as_deref() {
        Some(raw) => serde_json::from_str::<Vec<String>>(raw).unwrap_or_else(|err| {
            warn!(chatbot_id = %widget.chatbot_id, "Invalid allowed_domains: {}", err);
            Vec::new()
        }),
        None => Vec::new(),
    };

    ResolvedWidgetConfig {
        position: widget.position.unwrap_or_else(|| DEFAULT_POSITION.to_string()),
        primary_color: widget
            .primary_color
            .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
        background_color: widget
            .background_color
            .unwrap_or_else(|| DEFAULT_BACKGROUND_COLOR.to_string()),
        text_color: widget.text_color.unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
        font_family: widget
            .font_family
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        border_radius: widget.border_radius.unwrap_or(DEFAULT_BORDER_RADIUS),
        title: widget.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        subtitle: widget.subtitle,
        welcome_message: widget
            .welcome_message
            .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string()),
        placeholder: widget
            .placeholder
            .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
        launcher_icon: widget
            .launcher_icon
            .unwrap_or_else(|| DEFAULT_LAUNCHER_ICON.to_string()),
        launcher_icon_url: widget.launcher_icon_url,
        auto_open: widget.auto_open.unwrap_or(false),
        auto_open_delay: widget.auto_open_delay.unwrap_or(DEFAULT_AUTO_OPEN_DELAY_MS),
        show_branding: widget.show_branding.unwrap_or(true),
        allowed_domains,
        chatbot_id: widget.chatbot_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_chatbot() -> Chatbot {
        Chatbot {
            id: "bot-1".to_string(),
            tenant_id: "tenant-1".to_string(),
            name: "Support".to_string(),
            description: None,
            system_prompt: None,
            model: None,
            temperature: None,
            max_tokens: None,
            is_active: None,
            settings: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn raw_widget() -> WidgetConfig {
        WidgetConfig {
            id: "w-1".to_string(),
            chatbot_id: "bot-1".to_string(),
            position: None,
            primary_color: None,
            background_color: None,
            text_color: None,
            font_family: None,
            border_radius: None,
            title: None,
            subtitle: None,
            welcome_message: None,
            placeholder: None,
            launcher_icon: None,
            launcher_icon_url: None,
            auto_open: None,
            auto_open_delay: None,
            show_branding: None,
            allowed_domains: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_chatbot_defaults() {
        let resolved = resolve_chatbot(raw_chatbot());
        assert_eq!(resolved.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(resolved.model, "gemini-2.0-flash");
        assert_eq!(resolved.temperature, 0.7);
        assert_eq!(resolved.max_tokens, 2048);
        assert!(resolved.is_active);
        assert!(resolved.settings.is_empty());
    }

    #[test]
    fn test_chatbot_stored_values_win() {
        let resolved = resolve_chatbot(Chatbot {
            system_prompt: Some(String::new()),
            model: Some("gemini-1.5-pro".to_string()),
            temperature: Some(0.0),
            max_tokens: Some(512),
            is_active: Some(false),
            settings: Some(r#"{"tone":"formal"}"#.to_string()),
            ..raw_chatbot()
        });
        assert_eq!(resolved.system_prompt, "");
        assert_eq!(resolved.model, "gemini-1.5-pro");
        assert_eq!(resolved.temperature, 0.0);
        assert_eq!(resolved.max_tokens, 512);
        assert!(!resolved.is_active);
        assert_eq!(resolved.settings["tone"], "formal");
    }

    #[test]
    fn test_bad_settings_become_empty() {
        let resolved = resolve_chatbot(Chatbot {
            settings: Some("[1, 2]".to_string()),
            max_tokens: Some(0),
            ..raw_chatbot()
        });
        assert!(resolved.settings.is_empty());
        assert_eq!(resolved.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_widget_defaults() {
        let resolved = resolve_widget(raw_widget());
        assert_eq!(resolved.position, "bottom-right");
        assert_eq!(resolved.primary_color, "#6366f1");
        assert_eq!(resolved.title, "Chat with us");
        assert_eq!(resolved.auto_open_delay, 3000);
        assert!(resolved.show_branding);
        assert!(resolved.allowed_domains.is_empty());
    }

    #[test]
    fn test_widget_allowed_domains_parsed() {
        let resolved = resolve_widget(WidgetConfig {
            allowed_domains: Some(r#"["example.com","shop.example.com"]"#.to_string()),
            title: Some("Help".to_string()),
            ..raw_widget()
        });
        assert_eq!(resolved.allowed_domains, vec!["example.com", "shop.example.com"]);
        assert_eq!(resolved.title, "Help");
    }

    #[test]
    fn test_fallback_uses_chatbot_name() {
        let fallback = ResolvedWidgetConfig::fallback("bot-1", "Support");
        assert_eq!(fallback.title, "Support");
        assert_eq!(fallback.welcome_message, "Hi! How can I help you today?");
        assert!(fallback.subtitle.is_none());
    }
}
