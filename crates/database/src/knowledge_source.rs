//! Knowledge source storage.
//!
//! Agents only ever see text sources whose processing completed; see
//! [`list_agent_knowledge`].

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{KnowledgeKind, KnowledgeSource, NewKnowledgeSource, ProcessingStatus};
use crate::validation::{validate_knowledge_name, ValidationError};

const KNOWLEDGE_COLUMNS: &str = "id, chatbot_id, type AS kind, name, file_url, file_name, \
     file_mime_type, file_size, source_url, text_content, status, error_message, chunks_count, \
     last_processed_at, created_at, updated_at";

/// Create a knowledge source and return its generated ID.
///
/// Text sources are stored as `completed` since they need no processing;
/// every other kind starts `pending`.
pub async fn create_knowledge_source(
    pool: &SqlitePool,
    chatbot_id: &str,
    source: &NewKnowledgeSource,
) -> Result<String> {
    validate_knowledge_name(source.name())?;

    let (mut file_url, mut file_name, mut mime_type, mut size) = (None, None, None, None);
    let (mut source_url, mut text_content) = (None, None);
    match source {
        NewKnowledgeSource::Text { content, .. } => {
            if content.trim().is_empty() {
                return Err(ValidationError::Empty("text content").into());
            }
            text_content = Some(content.as_str());
        }
        NewKnowledgeSource::File {
            file_url: url,
            file_name: name,
            mime_type: mime,
            size: bytes,
            ..
        } => {
            file_url = Some(url.as_str());
            file_name = Some(name.as_str());
            mime_type = Some(mime.as_str());
            size = Some(*bytes);
        }
        NewKnowledgeSource::Url { source_url: url, .. }
        | NewKnowledgeSource::Sitemap { source_url: url, .. } => {
            source_url = Some(url.as_str());
        }
    }

    let id: String = sqlx::query_scalar(
        r#"
        INSERT INTO knowledge_sources (
            id, chatbot_id, type, name, file_url, file_name, file_mime_type, file_size,
            source_url, text_content, status
        )
        VALUES (lower(hex(randomblob(16))), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(chatbot_id)
    .bind(source.kind().as_str())
    .bind(source.name())
    .bind(file_url)
    .bind(file_name)
    .bind(mime_type)
    .bind(size)
    .bind(source_url)
    .bind(text_content)
    .bind(source.initial_status().as_str())
    .fetch_one(pool)
    .await?;

    tracing::debug!(chatbot_id, knowledge_id = %id, kind = %source.kind(), "Created knowledge source");
    Ok(id)
}

/// Get a knowledge source by ID.
pub async fn get_knowledge_source(pool: &SqlitePool, id: &str) -> Result<KnowledgeSource> {
    let sql = format!("SELECT {} FROM knowledge_sources WHERE id = ?", KNOWLEDGE_COLUMNS);
    sqlx::query_as::<_, KnowledgeSource>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "KnowledgeSource",
            id: id.to_string(),
        })
}

/// List every knowledge source of a chatbot, oldest first.
pub async fn list_knowledge_sources(
    pool: &SqlitePool,
    chatbot_id: &str,
) -> Result<Vec<KnowledgeSource>> {
    let sql = format!(
        "SELECT {} FROM knowledge_sources WHERE chatbot_id = ? ORDER BY created_at ASC, rowid ASC",
        KNOWLEDGE_COLUMNS
    );
    let sources = sqlx::query_as::<_, KnowledgeSource>(&sql)
        .bind(chatbot_id)
        .fetch_all(pool)
        .await?;
    Ok(sources)
}

/// List the sources that feed a chatbot's agent: completed text sources,
/// in creation order.
pub async fn list_agent_knowledge(
    pool: &SqlitePool,
    chatbot_id: &str,
) -> Result<Vec<KnowledgeSource>> {
    let sql = format!(
        "SELECT {} FROM knowledge_sources \
         WHERE chatbot_id = ? AND type = ? AND status = ? \
         ORDER BY created_at ASC, rowid ASC",
        KNOWLEDGE_COLUMNS
    );
    let sources = sqlx::query_as::<_, KnowledgeSource>(&sql)
        .bind(chatbot_id)
        .bind(KnowledgeKind::Text.as_str())
        .bind(ProcessingStatus::Completed.as_str())
        .fetch_all(pool)
        .await?;
    Ok(sources)
}

/// Replace the content of a text source.
pub async fn update_text_content(
    pool: &SqlitePool,
    id: &str,
    name: Option<&str>,
    content: &str,
) -> Result<()> {
    if let Some(name) = name {
        validate_knowledge_name(name)?;
    }
    if content.trim().is_empty() {
        return Err(ValidationError::Empty("text content").into());
    }

    let result = sqlx::query(
        r#"
        UPDATE knowledge_sources
        SET name = COALESCE(?, name),
            text_content = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND type = 'text'
        "#,
    )
    .bind(name)
    .bind(content)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "KnowledgeSource",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Record a processing status change.
///
/// `error_message` is stored only for [`ProcessingStatus::Failed`];
/// `last_processed_at` is stamped when processing finishes either way.
pub async fn set_status(
    pool: &SqlitePool,
    id: &str,
    status: ProcessingStatus,
    error_message: Option<&str>,
) -> Result<()> {
    let finished = matches!(status, ProcessingStatus::Completed | ProcessingStatus::Failed);
    let error_message = if status == ProcessingStatus::Failed {
        error_message
    } else {
        None
    };

    let result = sqlx::query(
        r#"
        UPDATE knowledge_sources
        SET status = ?,
            error_message = ?,
            last_processed_at = CASE WHEN ? THEN strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                                     ELSE last_processed_at END,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(error_message)
    .bind(finished)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "KnowledgeSource",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Delete a knowledge source.
pub async fn delete_knowledge_source(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM knowledge_sources WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "KnowledgeSource",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_db;

    #[tokio::test]
    async fn test_text_source_is_completed() {
        let db = seeded_db().await;
        let id = create_knowledge_source(
            db.pool(),
            "bot-1",
            &NewKnowledgeSource::text("Return Policy", "Refunds within 30 days."),
        )
        .await
        .unwrap();

        let source = get_knowledge_source(db.pool(), &id).await.unwrap();
        assert_eq!(source.kind(), Some(KnowledgeKind::Text));
        assert_eq!(source.status(), Some(ProcessingStatus::Completed));
        assert_eq!(source.text_content.as_deref(), Some("Refunds within 30 days."));
    }

    #[tokio::test]
    async fn test_agent_knowledge_filters_and_orders() {
        let db = seeded_db().await;
        let pool = db.pool();

        let first = create_knowledge_source(pool, "bot-1", &NewKnowledgeSource::text("A", "alpha"))
            .await
            .unwrap();
        create_knowledge_source(
            pool,
            "bot-1",
            &NewKnowledgeSource::Url {
                name: "Docs".to_string(),
                source_url: "https://example.com/docs".to_string(),
            },
        )
        .await
        .unwrap();
        let failed = create_knowledge_source(pool, "bot-1", &NewKnowledgeSource::text("B", "beta"))
            .await
            .unwrap();
        set_status(pool, &failed, ProcessingStatus::Failed, Some("boom"))
            .await
            .unwrap();
        let third = create_knowledge_source(pool, "bot-1", &NewKnowledgeSource::text("C", "gamma"))
            .await
            .unwrap();

        let all = list_knowledge_sources(pool, "bot-1").await.unwrap();
        assert_eq!(all.len(), 4);

        let agent: Vec<String> = list_agent_knowledge(pool, "bot-1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(agent, vec![first, third]);

        let failed = get_knowledge_source(pool, &failed).await.unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("boom"));
        assert!(failed.last_processed_at.is_some());
    }

    #[tokio::test]
    async fn test_update_text_content() {
        let db = seeded_db().await;
        let id = create_knowledge_source(db.pool(), "bot-1", &NewKnowledgeSource::text("FAQ", "v1"))
            .await
            .unwrap();

        update_text_content(db.pool(), &id, None, "v2").await.unwrap();
        let source = get_knowledge_source(db.pool(), &id).await.unwrap();
        assert_eq!(source.name, "FAQ");
        assert_eq!(source.text_content.as_deref(), Some("v2"));

        let err = update_text_content(db.pool(), &id, None, "  ").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Invalid(ValidationError::Empty(_))));
    }

    #[tokio::test]
    async fn test_delete_knowledge_source() {
        let db = seeded_db().await;
        let id = create_knowledge_source(db.pool(), "bot-1", &NewKnowledgeSource::text("FAQ", "x"))
            .await
            .unwrap();
        delete_knowledge_source(db.pool(), &id).await.unwrap();
        assert!(matches!(
            get_knowledge_source(db.pool(), &id).await.unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }
}
