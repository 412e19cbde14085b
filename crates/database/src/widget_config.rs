//! Widget appearance storage. At most one row per chatbot.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{WidgetConfig, WidgetConfigInput};
use crate::validation::{
    validate_auto_open_delay, validate_border_radius, validate_hex_color, validate_position,
};

fn validate_input(input: &WidgetConfigInput) -> Result<()> {
    if let Some(position) = &input.position {
        validate_position(position)?;
    }
    for (field, color) in [
        ("primary_color", &input.primary_color),
        ("background_color", &input.background_color),
        ("text_color", &input.text_color),
    ] {
        if let Some(color) = color {
            validate_hex_color(field, color)?;
        }
    }
    if let Some(radius) = input.border_radius {
        validate_border_radius(radius)?;
    }
    if let Some(delay) = input.auto_open_delay {
        validate_auto_open_delay(delay)?;
    }
    Ok(())
}

/// Create or replace the widget configuration for a chatbot.
pub async fn upsert_widget_config(
    pool: &SqlitePool,
    chatbot_id: &str,
    input: &WidgetConfigInput,
) -> Result<()> {
    validate_input(input)?;
    let allowed_domains = input
        .allowed_domains
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO widget_configs (
            id, chatbot_id, position, primary_color, background_color, text_color,
            font_family, border_radius, title, subtitle, welcome_message, placeholder,
            launcher_icon, launcher_icon_url, auto_open, auto_open_delay, show_branding,
            allowed_domains
        )
        VALUES (lower(hex(randomblob(16))), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(chatbot_id) DO UPDATE SET
            position = excluded.position,
            primary_color = excluded.primary_color,
            background_color = excluded.background_color,
            text_color = excluded.text_color,
            font_family = excluded.font_family,
            border_radius = excluded.border_radius,
            title = excluded.title,
            subtitle = excluded.subtitle,
            welcome_message = excluded.welcome_message,
            placeholder = excluded.placeholder,
            launcher_icon = excluded.launcher_icon,
            launcher_icon_url = excluded.launcher_icon_url,
            auto_open = excluded.auto_open,
            auto_open_delay = excluded.auto_open_delay,
            show_branding = excluded.show_branding,
            allowed_domains = excluded.allowed_domains,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        "#,
    )
    .bind(chatbot_id)
    .bind(&input.position)
    .bind(&input.primary_color)
    .bind(&input.background_color)
    .bind(&input.text_color)
    .bind(&input.font_family)
    .bind(input.border_radius)
    .bind(&input.title)
    .bind(&input.subtitle)
    .bind(&input.welcome_message)
    .bind(&input.placeholder)
    .bind(&input.launcher_icon)
    .bind(&input.launcher_icon_url)
    .bind(input.auto_open)
    .bind(input.auto_open_delay)
    .bind(input.show_branding)
    .bind(allowed_domains)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the widget configuration for a chatbot, if one was saved.
pub async fn get_widget_config(pool: &SqlitePool, chatbot_id: &str) -> Result<Option<WidgetConfig>> {
    let config = sqlx::query_as::<_, WidgetConfig>(
        r#"
        SELECT id, chatbot_id, position, primary_color, background_color, text_color,
               font_family, border_radius, title, subtitle, welcome_message, placeholder,
               launcher_icon, launcher_icon_url, auto_open, auto_open_delay, show_branding,
               allowed_domains, created_at, updated_at
        FROM widget_configs
        WHERE chatbot_id = ?
        "#,
    )
    .bind(chatbot_id)
    .fetch_optional(pool)
    .await?;
    Ok(config)
}

/// Delete a chatbot's widget configuration.
pub async fn delete_widget_config(pool: &SqlitePool, chatbot_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM widget_configs WHERE chatbot_id = ?")
        .bind(chatbot_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "WidgetConfig",
            id: chatbot_id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_db;

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let db = seeded_db().await;
        let first = WidgetConfigInput {
            title: Some("Help".to_string()),
            primary_color: Some("#123456".to_string()),
            allowed_domains: Some(vec!["example.com".to_string()]),
            ..Default::default()
        };
        upsert_widget_config(db.pool(), "bot-1", &first).await.unwrap();
        let created = get_widget_config(db.pool(), "bot-1").await.unwrap().unwrap();
        assert_eq!(created.allowed_domains.as_deref(), Some(r#"["example.com"]"#));

        let second = WidgetConfigInput {
            title: Some("Support".to_string()),
            ..Default::default()
        };
        upsert_widget_config(db.pool(), "bot-1", &second).await.unwrap();

        let replaced = get_widget_config(db.pool(), "bot-1").await.unwrap().unwrap();
        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.title.as_deref(), Some("Support"));
        assert!(replaced.primary_color.is_none());
    }

    #[tokio::test]
    async fn test_invalid_color_rejected() {
        let db = seeded_db().await;
        let input = WidgetConfigInput {
            text_color: Some("blue".to_string()),
            ..Default::default()
        };
        let err = upsert_widget_config(db.pool(), "bot-1", &input).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Invalid(_)));
        assert!(get_widget_config(db.pool(), "bot-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cascade_on_chatbot_delete() {
        let db = seeded_db().await;
        upsert_widget_config(db.pool(), "bot-1", &WidgetConfigInput::default())
            .await
            .unwrap();
        crate::chatbot::delete_chatbot(db.pool(), "bot-1").await.unwrap();
        assert!(get_widget_config(db.pool(), "bot-1").await.unwrap().is_none());
    }
}
