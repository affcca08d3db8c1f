//! Replica repository: persistence and queries for replica personas.

use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::{ReplicaRecord, ReplicaStatus, TrainingStatus};
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct ReplicaRepository {
    pool_manager: SqlitePoolManager,
}

impl ReplicaRepository {
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
            CREATE TABLE IF NOT EXISTS replicas (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                relationship TEXT,
                description TEXT,
                status TEXT NOT NULL,
                personality_traits TEXT NOT NULL DEFAULT '{}',
                speaking_style TEXT NOT NULL DEFAULT '{}',
                training_status TEXT NOT NULL,
                memory_namespace TEXT,
                total_memories INTEGER NOT NULL DEFAULT 0,
                last_trained_at TEXT,
                interaction_count INTEGER NOT NULL DEFAULT 0,
                last_interaction_at TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_replicas_user_id ON replicas(user_id)")
            .execute(pool)
            .await?;

        debug!("replicas table ready");
        Ok(())
    }

    pub async fn save(&self, replica: &ReplicaRecord) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        let traits = serde_json::to_string(&replica.personality_traits)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let style = serde_json::to_string(&replica.speaking_style)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO replicas
                (id, user_id, name, relationship, description, status,
                 personality_traits, speaking_style, training_status, memory_namespace,
                 total_memories, last_trained_at, interaction_count, last_interaction_at,
                 is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&replica.id)
        .bind(&replica.user_id)
        .bind(&replica.name)
        .bind(&replica.relationship)
        .bind(&replica.description)
        .bind(replica.status.as_str())
        .bind(&traits)
        .bind(&style)
        .bind(replica.training_status.as_str())
        .bind(&replica.memory_namespace)
        .bind(replica.total_memories)
        .bind(replica.last_trained_at)
        .bind(replica.interaction_count)
        .bind(replica.last_interaction_at)
        .bind(replica.is_active as i64)
        .bind(replica.created_at)
        .execute(pool)
        .await?;

        info!(id = %replica.id, name = %replica.name, "replica saved");
        Ok(())
    }

    pub async fn find_for_user(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<Option<ReplicaRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let row = sqlx::query("SELECT * FROM replicas WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<ReplicaRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows =
            sqlx::query("SELECT * FROM replicas WHERE user_id = ? ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }

    /// Records a training outcome: status, derived namespace, membership
    /// count, and timestamp in one write.
    pub async fn update_training(
        &self,
        id: &str,
        status: TrainingStatus,
        memory_namespace: Option<&str>,
        total_memories: i64,
        trained_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            UPDATE replicas
            SET training_status = ?, memory_namespace = ?, total_memories = ?, last_trained_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(memory_namespace)
        .bind(total_memories)
        .bind(trained_at)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Bumps the interaction counter and last-interaction timestamp.
    pub async fn record_interaction(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            UPDATE replicas
            SET interaction_count = interaction_count + 1, last_interaction_at = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Deletes a replica row. Conversations are cascaded by the caller
    /// via `ConversationRepository::delete_by_replica`.
    pub async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query("DELETE FROM replicas WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_record(row: sqlx::sqlite::SqliteRow) -> Result<ReplicaRecord, StorageError> {
        let status: String = row.get("status");
        let training_status: String = row.get("training_status");
        let traits: String = row.get("personality_traits");
        let style: String = row.get("speaking_style");
        let is_active: i64 = row.get("is_active");

        Ok(ReplicaRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            relationship: row.get("relationship"),
            description: row.get("description"),
            status: ReplicaStatus::parse(&status),
            personality_traits: serde_json::from_str(&traits).unwrap_or_default(),
            speaking_style: serde_json::from_str(&style).unwrap_or_default(),
            training_status: TrainingStatus::parse(&training_status),
            memory_namespace: row.get("memory_namespace"),
            total_memories: row.get("total_memories"),
            last_trained_at: row.get::<Option<DateTime<Utc>>, _>("last_trained_at"),
            interaction_count: row.get("interaction_count"),
            last_interaction_at: row.get::<Option<DateTime<Utc>>, _>("last_interaction_at"),
            is_active: is_active != 0,
            created_at: row.get("created_at"),
        })
    }
}
