//! Memory repository: persistence and queries for memory records.

use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::{ContentKind, MemoryAnnotations, MemoryRecord};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct MemoryRepository {
    pool_manager: SqlitePoolManager,
}

impl MemoryRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::with_pool_manager(pool_manager).await
    }

    /// Builds a repository over a shared pool (so all repos can live in
    /// one database file).
    pub async fn with_pool_manager(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT,
                content TEXT NOT NULL,
                content_kind TEXT NOT NULL,
                original_filename TEXT,
                file_path TEXT,
                source TEXT,
                occurred_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT,
                embedding_id TEXT,
                processed INTEGER NOT NULL DEFAULT 0,
                emotions TEXT NOT NULL DEFAULT '{}',
                people TEXT NOT NULL DEFAULT '[]',
                locations TEXT NOT NULL DEFAULT '[]',
                topics TEXT NOT NULL DEFAULT '[]',
                is_private INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(pool)
        .await?;

        for stmt in [
            "CREATE INDEX IF NOT EXISTS idx_memories_user_id ON memories(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_memories_created_at ON memories(created_at)",
        ] {
            sqlx::query(stmt).execute(pool).await?;
        }

        debug!("memories table ready");
        Ok(())
    }

    pub async fn save(&self, memory: &MemoryRecord) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        let emotions = serde_json::to_string(&memory.annotations.emotions)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let people = serde_json::to_string(&memory.annotations.people)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let locations = serde_json::to_string(&memory.annotations.locations)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let topics = serde_json::to_string(&memory.annotations.topics)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO memories
                (id, user_id, title, content, content_kind, original_filename, file_path,
                 source, occurred_at, created_at, updated_at, embedding_id, processed,
                 emotions, people, locations, topics, is_private)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&memory.id)
        .bind(&memory.user_id)
        .bind(&memory.title)
        .bind(&memory.content)
        .bind(memory.content_kind.as_str())
        .bind(&memory.original_filename)
        .bind(&memory.file_path)
        .bind(&memory.source)
        .bind(memory.occurred_at)
        .bind(memory.created_at)
        .bind(memory.updated_at)
        .bind(&memory.embedding_id)
        .bind(memory.processed as i64)
        .bind(&emotions)
        .bind(&people)
        .bind(&locations)
        .bind(&topics)
        .bind(memory.is_private as i64)
        .execute(pool)
        .await?;

        info!(id = %memory.id, kind = memory.content_kind.as_str(), "memory saved");
        Ok(())
    }

    pub async fn find_by_id(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<MemoryRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let row = sqlx::query("SELECT * FROM memories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    /// Lists a user's memories, newest first.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<MemoryRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows =
            sqlx::query("SELECT * FROM memories WHERE user_id = ? ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    /// Marks a memory processed once its vector-index entry exists.
    pub async fn mark_processed(&self, id: &str, embedding_id: &str) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            "UPDATE memories SET processed = 1, embedding_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(embedding_id)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Stores the annotation pass results.
    pub async fn set_annotations(
        &self,
        id: &str,
        annotations: &MemoryAnnotations,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        let emotions = serde_json::to_string(&annotations.emotions)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let people = serde_json::to_string(&annotations.people)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let locations = serde_json::to_string(&annotations.locations)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let topics = serde_json::to_string(&annotations.topics)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE memories
            SET emotions = ?, people = ?, locations = ?, topics = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&emotions)
        .bind(&people)
        .bind(&locations)
        .bind(&topics)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Deletes a memory row. Returns `false` when no row existed.
    pub async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query("DELETE FROM memories WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_user(&self, user_id: &str) -> Result<i64, StorageError> {
        let pool = self.pool_manager.pool();

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memories WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(row.0)
    }

    fn row_to_record(row: sqlx::sqlite::SqliteRow) -> Result<MemoryRecord, StorageError> {
        let content_kind: String = row.get("content_kind");
        let emotions: String = row.get("emotions");
        let people: String = row.get("people");
        let locations: String = row.get("locations");
        let topics: String = row.get("topics");
        let processed: i64 = row.get("processed");
        let is_private: i64 = row.get("is_private");

        Ok(MemoryRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            content: row.get("content"),
            content_kind: ContentKind::parse(&content_kind),
            original_filename: row.get("original_filename"),
            file_path: row.get("file_path"),
            source: row.get("source"),
            occurred_at: row.get::<Option<DateTime<Utc>>, _>("occurred_at"),
            created_at: row.get("created_at"),
            updated_at: row.get::<Option<DateTime<Utc>>, _>("updated_at"),
            embedding_id: row.get("embedding_id"),
            processed: processed != 0,
            annotations: MemoryAnnotations {
                emotions: serde_json::from_str(&emotions).unwrap_or_default(),
                people: serde_json::from_str(&people).unwrap_or_default(),
                locations: serde_json::from_str(&locations).unwrap_or_default(),
                topics: serde_json::from_str(&topics).unwrap_or_default(),
            },
            is_private: is_private != 0,
        })
    }
}
