//! Chatbot CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Chatbot, ChatbotUpdate, NewChatbot};
use crate::validation::{validate_chatbot_name, validate_max_tokens, validate_temperature};

const CHATBOT_COLUMNS: &str = "id, tenant_id, name, description, system_prompt, model, \
     temperature, max_tokens, is_active, settings, created_at, updated_at";

fn validate_fields(
    name: Option<&str>,
    temperature: Option<f64>,
    max_tokens: Option<i64>,
) -> Result<()> {
    if let Some(name) = name {
        validate_chatbot_name(name)?;
    }
    if let Some(temperature) = temperature {
        validate_temperature(temperature)?;
    }
    if let Some(max_tokens) = max_tokens {
        validate_max_tokens(max_tokens)?;
    }
    Ok(())
}

/// Create a new chatbot.
pub async fn create_chatbot(pool: &SqlitePool, chatbot: &NewChatbot) -> Result<()> {
    validate_fields(Some(&chatbot.name), chatbot.temperature, chatbot.max_tokens)?;
    let settings = chatbot
        .settings
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r#"
        INSERT INTO chatbots (
            id, tenant_id, name, description, system_prompt, model,
            temperature, max_tokens, is_active, settings
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&chatbot.id)
    .bind(&chatbot.tenant_id)
    .bind(&chatbot.name)
    .bind(&chatbot.description)
    .bind(&chatbot.system_prompt)
    .bind(&chatbot.model)
    .bind(chatbot.temperature)
    .bind(chatbot.max_tokens)
    .bind(chatbot.is_active)
    .bind(settings)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "Chatbot", &chatbot.id))?;

    tracing::debug!(chatbot_id = %chatbot.id, tenant_id = %chatbot.tenant_id, "Created chatbot");
    Ok(())
}

/// Get a chatbot by ID. Returns `None` when no row matches.
pub async fn get_chatbot(pool: &SqlitePool, id: &str) -> Result<Option<Chatbot>> {
    let sql = format!("SELECT {} FROM chatbots WHERE id = ?", CHATBOT_COLUMNS);
    let chatbot = sqlx::query_as::<_, Chatbot>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(chatbot)
}

/// List a tenant's chatbots, oldest first.
pub async fn list_chatbots(pool: &SqlitePool, tenant_id: &str) -> Result<Vec<Chatbot>> {
    let sql = format!(
        "SELECT {} FROM chatbots WHERE tenant_id = ? ORDER BY created_at ASC, rowid ASC",
        CHATBOT_COLUMNS
    );
    let chatbots = sqlx::query_as::<_, Chatbot>(&sql)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;
    Ok(chatbots)
}

/// Apply a partial update and refresh `updated_at`.
pub async fn update_chatbot(pool: &SqlitePool, id: &str, update: &ChatbotUpdate) -> Result<()> {
    validate_fields(update.name.as_deref(), update.temperature, update.max_tokens)?;
    let settings = update
        .settings
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let result = sqlx::query(
        r#"
        UPDATE chatbots
        SET name = COALESCE(?, name),
            description = COALESCE(?, description),
            system_prompt = COALESCE(?, system_prompt),
            model = COALESCE(?, model),
            temperature = COALESCE(?, temperature),
            max_tokens = COALESCE(?, max_tokens),
            is_active = COALESCE(?, is_active),
            settings = COALESCE(?, settings),
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(&update.name)
    .bind(&update.description)
    .bind(&update.system_prompt)
    .bind(&update.model)
    .bind(update.temperature)
    .bind(update.max_tokens)
    .bind(update.is_active)
    .bind(settings)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Chatbot",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete a chatbot. Widget config, knowledge and sessions cascade.
pub async fn delete_chatbot(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM chatbots WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Chatbot",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_db;
    use crate::validation::ValidationError;

    #[tokio::test]
    async fn test_unknown_chatbot_is_none() {
        let db = seeded_db().await;
        assert!(get_chatbot(db.pool(), "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_with_all_fields() {
        let db = seeded_db().await;
        let chatbot = NewChatbot {
            description: Some("Answers billing questions".to_string()),
            system_prompt: Some("Be terse.".to_string()),
            model: Some("gemini-2.5-pro".to_string()),
            temperature: Some(1.1),
            max_tokens: Some(2048),
            is_active: Some(false),
            settings: Some(serde_json::json!({ "tone": "formal" })),
            ..NewChatbot::new("bot-2", "tenant-1", "Billing")
        };
        create_chatbot(db.pool(), &chatbot).await.unwrap();

        let fetched = get_chatbot(db.pool(), "bot-2").await.unwrap().unwrap();
        assert_eq!(fetched.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(fetched.max_tokens, Some(2048));
        assert_eq!(fetched.is_active, Some(false));
        assert_eq!(fetched.settings.as_deref(), Some(r#"{"tone":"formal"}"#));
    }

    #[tokio::test]
    async fn test_invalid_temperature_rejected() {
        let db = seeded_db().await;
        let update = ChatbotUpdate {
            temperature: Some(4.0),
            ..Default::default()
        };
        let err = update_chatbot(db.pool(), "bot-1", &update).await.unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Invalid(ValidationError::OutOfRange { field: "temperature", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let db = seeded_db().await;
        let before = get_chatbot(db.pool(), "bot-1").await.unwrap().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let update = ChatbotUpdate {
            name: Some("Helpdesk".to_string()),
            ..Default::default()
        };
        update_chatbot(db.pool(), "bot-1", &update).await.unwrap();

        let after = get_chatbot(db.pool(), "bot-1").await.unwrap().unwrap();
        assert_eq!(after.name, "Helpdesk");
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_chatbot() {
        let db = seeded_db().await;
        let err = update_chatbot(db.pool(), "missing", &ChatbotUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { entity: "Chatbot", .. }));
    }
}
