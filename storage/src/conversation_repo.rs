//! Conversation repository: threads and their messages.
//!
//! Messages live with their conversation so cascading deletes stay in one
//! place: deleting a conversation removes its messages first.

use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::{ConversationKind, ConversationRecord, MessageRecord, MessageRole};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct ConversationRepository {
    pool_manager: SqlitePoolManager,
}

impl ConversationRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::with_pool_manager(pool_manager).await
    }

    pub async fn with_pool_manager(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                replica_id TEXT,
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                started_at TEXT NOT NULL,
                last_message_at TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                content TEXT NOT NULL,
                role TEXT NOT NULL,
                tokens_used INTEGER,
                model_used TEXT,
                confidence REAL,
                relevant_memory_ids TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        for stmt in [
            "CREATE INDEX IF NOT EXISTS idx_conversations_user_id ON conversations(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_conversations_replica_id ON conversations(replica_id)",
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON messages(conversation_id)",
            "CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at)",
        ] {
            sqlx::query(stmt).execute(pool).await?;
        }

        debug!("conversations and messages tables ready");
        Ok(())
    }

    pub async fn save(&self, conversation: &ConversationRecord) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO conversations
                (id, user_id, replica_id, title, kind, started_at, last_message_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conversation.id)
        .bind(&conversation.user_id)
        .bind(&conversation.replica_id)
        .bind(&conversation.title)
        .bind(conversation.kind.as_str())
        .bind(conversation.started_at)
        .bind(conversation.last_message_at)
        .execute(pool)
        .await?;

        info!(id = %conversation.id, kind = conversation.kind.as_str(), "conversation saved");
        Ok(())
    }

    pub async fn find_for_user(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<ConversationRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let row = sqlx::query("SELECT * FROM conversations WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Self::row_to_conversation))
    }

    /// Scoped lookup for replica chat: the conversation must belong to
    /// both the user and the replica.
    pub async fn find_for_user_and_replica(
        &self,
        user_id: &str,
        id: &str,
        replica_id: &str,
    ) -> Result<Option<ConversationRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let row = sqlx::query(
            "SELECT * FROM conversations WHERE id = ? AND user_id = ? AND replica_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .bind(replica_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Self::row_to_conversation))
    }

    /// Lists a user's conversations by last activity, most recent first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ConversationRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows = sqlx::query(
            r#"
            SELECT * FROM conversations WHERE user_id = ?
            ORDER BY COALESCE(last_message_at, started_at) DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_conversation).collect())
    }

    /// Updates the last-activity timestamp. Concurrent turns against the
    /// same conversation are not coordinated; last write wins.
    pub async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("UPDATE conversations SET last_message_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Deletes a conversation and its messages.
    pub async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every conversation (and message) belonging to a replica.
    /// Used when the replica itself is deleted.
    pub async fn delete_by_replica(&self, replica_id: &str) -> Result<u64, StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            DELETE FROM messages WHERE conversation_id IN
                (SELECT id FROM conversations WHERE replica_id = ?)
            "#,
        )
        .bind(replica_id)
        .execute(pool)
        .await?;

        let result = sqlx::query("DELETE FROM conversations WHERE replica_id = ?")
            .bind(replica_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn save_message(&self, message: &MessageRecord) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        let memory_ids = serde_json::to_string(&message.relevant_memory_ids)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO messages
                (id, conversation_id, content, role, tokens_used, model_used,
                 confidence, relevant_memory_ids, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.content)
        .bind(message.role.as_str())
        .bind(message.tokens_used)
        .bind(&message.model_used)
        .bind(message.confidence)
        .bind(&memory_ids)
        .bind(message.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Returns the last `limit` messages, most recent first. Callers
    /// reverse for oldest-first prompt assembly.
    pub async fn recent_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows = sqlx::query(
            r#"
            SELECT * FROM messages WHERE conversation_id = ?
            ORDER BY created_at DESC LIMIT ?
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_message).collect())
    }

    /// Full history of a conversation, oldest first.
    pub async fn messages(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_message).collect())
    }

    pub async fn count_messages(&self, conversation_id: &str) -> Result<i64, StorageError> {
        let pool = self.pool_manager.pool();

        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(pool)
                .await?;

        Ok(row.0)
    }

    pub async fn count_by_user(&self, user_id: &str) -> Result<i64, StorageError> {
        let pool = self.pool_manager.pool();

        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(row.0)
    }

    fn row_to_conversation(row: sqlx::sqlite::SqliteRow) -> ConversationRecord {
        let kind: String = row.get("kind");
        ConversationRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            replica_id: row.get("replica_id"),
            title: row.get("title"),
            kind: ConversationKind::parse(&kind),
            started_at: row.get("started_at"),
            last_message_at: row.get::<Option<DateTime<Utc>>, _>("last_message_at"),
        }
    }

    fn row_to_message(row: sqlx::sqlite::SqliteRow) -> MessageRecord {
        let role: String = row.get("role");
        let memory_ids: String = row.get("relevant_memory_ids");
        MessageRecord {
            id: row.get("id"),
            conversation_id: row.get("conversation_id"),
            content: row.get("content"),
            role: MessageRole::parse(&role),
            tokens_used: row.get("tokens_used"),
            model_used: row.get("model_used"),
            confidence: row.get("confidence"),
            relevant_memory_ids: serde_json::from_str(&memory_ids).unwrap_or_default(),
            created_at: row.get("created_at"),
        }
    }
}
