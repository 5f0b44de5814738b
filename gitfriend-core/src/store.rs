//! Chat session store.
//!
//! CRUD over the `chat_sessions` table. Each session is one row with its full
//! message list embedded as a JSONB array, so every mutation is a single
//! statement and the row is the unit of atomicity (last write wins; there is
//! no optimistic concurrency). Ordering within the array is insertion order
//! and is preserved verbatim on the way back out.
//!
//! All functions borrow the pool; `main` creates it once at startup and
//! closes it on shutdown.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChatSession, Message, NewSession, SessionSummary, SessionUpdate};

/// Sessions returned per list call, most recently updated first.
const LIST_PAGE_SIZE: i64 = 50;

/// Characters of the first message kept when deriving a title.
const TITLE_MAX_CHARS: usize = 30;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("chat session {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create the schema if it does not exist yet. Runs once at startup; every
/// statement is idempotent.
pub async fn init_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_sessions (
            id          UUID PRIMARY KEY,
            user_id     TEXT,
            title       TEXT NOT NULL,
            messages    JSONB NOT NULL DEFAULT '[]'::jsonb,
            created_at  TIMESTAMPTZ NOT NULL,
            updated_at  TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS chat_sessions_user_id_idx ON chat_sessions (user_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS chat_sessions_updated_at_idx ON chat_sessions (updated_at DESC)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Chat session schema ready");
    Ok(())
}

/// Derive a session title: the explicit one when present and non-blank,
/// otherwise the head of the first message (with an ellipsis when truncated),
/// otherwise a placeholder.
pub fn derive_title(title: Option<&str>, messages: &[Message]) -> String {
    if let Some(t) = title {
        let t = t.trim();
        if !t.is_empty() {
            return t.to_string();
        }
    }

    match messages.first() {
        Some(first) if !first.content.trim().is_empty() => {
            let head: String = first.content.chars().take(TITLE_MAX_CHARS).collect();
            if first.content.chars().count() > TITLE_MAX_CHARS {
                format!("{}...", head)
            } else {
                head
            }
        }
        _ => "New chat".to_string(),
    }
}

/// Insert a new session and return it as stored.
pub async fn create_session(pool: &PgPool, new: NewSession) -> Result<ChatSession, StoreError> {
    let now = Utc::now();
    let session = ChatSession {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        title: derive_title(new.title.as_deref(), &new.messages),
        messages: new.messages,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO chat_sessions (id, user_id, title, messages, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(session.id)
    .bind(&session.user_id)
    .bind(&session.title)
    .bind(Json(&session.messages))
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(pool)
    .await?;

    tracing::info!(session_id = %session.id, title = %session.title, "Created chat session");
    Ok(session)
}

/// Fetch one session with its full message history.
pub async fn get_session(pool: &PgPool, id: Uuid) -> Result<ChatSession, StoreError> {
    sqlx::query_as::<_, ChatSession>(
        r#"
        SELECT id, user_id, title, messages, created_at, updated_at
        FROM chat_sessions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound(id))
}

/// List session summaries, newest activity first. `user_id` of `None` lists
/// across all users; message bodies are never loaded here.
pub async fn list_sessions(
    pool: &PgPool,
    user_id: Option<&str>,
) -> Result<Vec<SessionSummary>, StoreError> {
    let summaries = sqlx::query_as::<_, SessionSummary>(
        r#"
        SELECT id, user_id, title,
               jsonb_array_length(messages) AS message_count,
               created_at, updated_at
        FROM chat_sessions
        WHERE $1::text IS NULL OR user_id = $1
        ORDER BY updated_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(LIST_PAGE_SIZE)
    .fetch_all(pool)
    .await?;

    Ok(summaries)
}

/// Overwrite the title and/or the whole message list. Fields left `None`
/// keep their stored value; `updated_at` is bumped either way.
pub async fn update_session(
    pool: &PgPool,
    id: Uuid,
    update: SessionUpdate,
) -> Result<ChatSession, StoreError> {
    sqlx::query_as::<_, ChatSession>(
        r#"
        UPDATE chat_sessions
        SET title      = COALESCE($2, title),
            messages   = COALESCE($3, messages),
            updated_at = $4
        WHERE id = $1
        RETURNING id, user_id, title, messages, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(update.title)
    .bind(update.messages.as_ref().map(Json))
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound(id))
}

/// Append one message to the end of a session's history.
pub async fn append_message(
    pool: &PgPool,
    id: Uuid,
    message: Message,
) -> Result<ChatSession, StoreError> {
    sqlx::query_as::<_, ChatSession>(
        r#"
        UPDATE chat_sessions
        SET messages   = messages || $2,
            updated_at = $3
        WHERE id = $1
        RETURNING id, user_id, title, messages, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(Json([message]))
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound(id))
}

/// Delete a session. Deleting an id that does not exist is `NotFound`, so a
/// second delete of the same id fails rather than silently succeeding.
pub async fn delete_session(pool: &PgPool, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM chat_sessions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id));
    }

    tracing::info!(session_id = %id, "Deleted chat session");
    Ok(())
}
