//! Session row storage.
//!
//! Sessions are always addressed by the full `(app_name, user_id, id)`
//! triple so one tenant's app can never read another's conversation.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{NewSessionRecord, SessionRecord};

const SESSION_COLUMNS: &str = "id, app_name, user_id, chatbot_id, state, last_update_time, \
     created_at, visitor_id, visitor_name, visitor_email, page_url, user_agent";

/// Insert a new session row.
pub async fn insert_session(pool: &SqlitePool, session: &NewSessionRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions (
            id, app_name, user_id, chatbot_id, state, last_update_time,
            visitor_id, visitor_name, visitor_email, page_url, user_agent
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.app_name)
    .bind(&session.user_id)
    .bind(&session.chatbot_id)
    .bind(&session.state)
    .bind(session.last_update_time)
    .bind(&session.visitor_id)
    .bind(&session.visitor_name)
    .bind(&session.visitor_email)
    .bind(&session.page_url)
    .bind(&session.user_agent)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::on_insert(e, "Session", &session.id))?;

    Ok(())
}

/// Fetch one session row.
pub async fn get_session(
    pool: &SqlitePool,
    app_name: &str,
    user_id: &str,
    session_id: &str,
) -> Result<Option<SessionRecord>> {
    let sql = format!(
        "SELECT {} FROM sessions WHERE app_name = ? AND user_id = ? AND id = ?",
        SESSION_COLUMNS
    );
    let session = sqlx::query_as::<_, SessionRecord>(&sql)
        .bind(app_name)
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(pool)
        .await?;
    Ok(session)
}

/// List a user's sessions for an app, most recently updated first.
pub async fn list_sessions(
    pool: &SqlitePool,
    app_name: &str,
    user_id: &str,
) -> Result<Vec<SessionRecord>> {
    let sql = format!(
        "SELECT {} FROM sessions WHERE app_name = ? AND user_id = ? \
         ORDER BY last_update_time DESC, rowid DESC",
        SESSION_COLUMNS
    );
    let sessions = sqlx::query_as::<_, SessionRecord>(&sql)
        .bind(app_name)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(sessions)
}

/// Delete a session and its events. Returns the number of rows removed
/// (0 when the session did not exist).
pub async fn delete_session(
    pool: &SqlitePool,
    app_name: &str,
    user_id: &str,
    session_id: &str,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE app_name = ? AND user_id = ? AND id = ?")
        .bind(app_name)
        .bind(user_id)
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Overwrite the session state and bump `last_update_time`.
pub async fn update_session_state(
    pool: &SqlitePool,
    app_name: &str,
    user_id: &str,
    session_id: &str,
    state: &str,
    last_update_time: i64,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE sessions
        SET state = ?, last_update_time = ?
        WHERE app_name = ? AND user_id = ? AND id = ?
        "#,
    )
    .bind(state)
    .bind(last_update_time)
    .bind(app_name)
    .bind(user_id)
    .bind(session_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Session",
            id: session_id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::seeded_db;

    fn record(id: &str, user_id: &str, last_update_time: i64) -> NewSessionRecord {
        NewSessionRecord {
            id: id.to_string(),
            app_name: "chatbot_bot-1".to_string(),
            user_id: user_id.to_string(),
            chatbot_id: Some("bot-1".to_string()),
            state: "{}".to_string(),
            last_update_time,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_is_scoped_by_user() {
        let db = seeded_db().await;
        insert_session(db.pool(), &record("s-1", "alice", 10)).await.unwrap();

        assert!(get_session(db.pool(), "chatbot_bot-1", "alice", "s-1")
            .await
            .unwrap()
            .is_some());
        assert!(get_session(db.pool(), "chatbot_bot-1", "mallory", "s-1")
            .await
            .unwrap()
            .is_none());
        assert!(get_session(db.pool(), "chatbot_other", "alice", "s-1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_last_update() {
        let db = seeded_db().await;
        insert_session(db.pool(), &record("old", "alice", 10)).await.unwrap();
        insert_session(db.pool(), &record("new", "alice", 30)).await.unwrap();
        insert_session(db.pool(), &record("mid", "alice", 20)).await.unwrap();
        insert_session(db.pool(), &record("bob", "bob", 40)).await.unwrap();

        let ids: Vec<String> = list_sessions(db.pool(), "chatbot_bot-1", "alice")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = seeded_db().await;
        insert_session(db.pool(), &record("s-1", "alice", 10)).await.unwrap();

        assert_eq!(delete_session(db.pool(), "chatbot_bot-1", "alice", "s-1").await.unwrap(), 1);
        assert_eq!(delete_session(db.pool(), "chatbot_bot-1", "alice", "s-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_state() {
        let db = seeded_db().await;
        insert_session(db.pool(), &record("s-1", "alice", 10)).await.unwrap();
        update_session_state(db.pool(), "chatbot_bot-1", "alice", "s-1", r#"{"k":1}"#, 99)
            .await
            .unwrap();

        let session = get_session(db.pool(), "chatbot_bot-1", "alice", "s-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.state, r#"{"k":1}"#);
        assert_eq!(session.last_update_time, 99);

        let err = update_session_state(db.pool(), "chatbot_bot-1", "bob", "s-1", "{}", 100)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
