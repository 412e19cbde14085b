//! Session event storage. Events are append-only.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::EventRecord;

/// Append an event row.
pub async fn insert_event(pool: &SqlitePool, event: &EventRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO events (
            id, session_id, invocation_id, author, content, actions, timestamp, branch,
            long_running_tool_ids, grounding_metadata, partial, turn_complete,
            error_code, error_message, custom_metadata, usage_metadata, finish_reason
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event.id)
    .bind(&event.session_id)
    .bind(&event.invocation_id)
    .bind(&event.author)
    .bind(&event.content)
    .bind(&event.actions)
    .bind(event.timestamp)
    .bind(&event.branch)
    .bind(&event.long_running_tool_ids)
    .bind(&event.grounding_metadata)
    .bind(event.partial)
    .bind(event.turn_complete)
    .bind(&event.error_code)
    .bind(&event.error_message)
    .bind(&event.custom_metadata)
    .bind(&event.usage_metadata)
    .bind(&event.finish_reason)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "Event", &event.id))?;

    Ok(())
}

/// List a session's events in chronological order.
///
/// With `after_timestamp`, only events strictly after that Unix-millisecond
/// instant are returned.
pub async fn list_events(
    pool: &SqlitePool,
    session_id: &str,
    after_timestamp: Option<i64>,
) -> Result<Vec<EventRecord>> {
    let events = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, session_id, invocation_id, author, content, actions, timestamp, branch,
               long_running_tool_ids, grounding_metadata, partial, turn_complete,
               error_code, error_message, custom_metadata, usage_metadata, finish_reason
        FROM events
        WHERE session_id = ? AND (? IS NULL OR timestamp > ?)
        ORDER BY timestamp ASC, rowid ASC
        "#,
    )
    .bind(session_id)
    .bind(after_timestamp)
    .bind(after_timestamp)
    .fetch_all(pool)
    .await?;
    Ok(events)
}

/// Count a session's events.
pub async fn count_events(pool: &SqlitePool, session_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewSessionRecord;
    use crate::session::{delete_session, insert_session};
    use crate::test_support::seeded_db;

    fn event(id: &str, timestamp: i64) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            session_id: "s-1".to_string(),
            invocation_id: "inv-1".to_string(),
            author: Some("user".to_string()),
            content: Some(r#"{"role":"user","parts":[{"text":"hi"}]}"#.to_string()),
            actions: "{}".to_string(),
            timestamp,
            branch: None,
            long_running_tool_ids: None,
            grounding_metadata: None,
            partial: false,
            turn_complete: None,
            error_code: None,
            error_message: None,
            custom_metadata: None,
            usage_metadata: None,
            finish_reason: None,
        }
    }

    async fn db_with_session() -> crate::Database {
        let db = seeded_db().await;
        let session = NewSessionRecord {
            id: "s-1".to_string(),
            app_name: "chatbot_bot-1".to_string(),
            user_id: "alice".to_string(),
            chatbot_id: Some("bot-1".to_string()),
            state: "{}".to_string(),
            last_update_time: 0,
            ..Default::default()
        };
        insert_session(db.pool(), &session).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_events_ordered_and_filtered() {
        let db = db_with_session().await;
        insert_event(db.pool(), &event("e-3", 300)).await.unwrap();
        insert_event(db.pool(), &event("e-1", 100)).await.unwrap();
        insert_event(db.pool(), &event("e-2", 200)).await.unwrap();

        let ids: Vec<String> = list_events(db.pool(), "s-1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["e-1", "e-2", "e-3"]);

        let ids: Vec<String> = list_events(db.pool(), "s-1", Some(200))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["e-3"]);
    }

    #[tokio::test]
    async fn test_duplicate_event_id() {
        let db = db_with_session().await;
        insert_event(db.pool(), &event("e-1", 100)).await.unwrap();
        let err = insert_event(db.pool(), &event("e-1", 200)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::AlreadyExists { entity: "Event", .. }));
    }

    #[tokio::test]
    async fn test_events_removed_with_session() {
        let db = db_with_session().await;
        insert_event(db.pool(), &event("e-1", 100)).await.unwrap();
        assert_eq!(count_events(db.pool(), "s-1").await.unwrap(), 1);

        delete_session(db.pool(), "chatbot_bot-1", "alice", "s-1").await.unwrap();
        assert_eq!(count_events(db.pool(), "s-1").await.unwrap(), 0);
    }
}
