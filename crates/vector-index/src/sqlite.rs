//! SQLite-backed vector index.
//!
//! Entries live in a single `vector_entries` table keyed by
//! (namespace, id); embeddings are stored as little-endian f32 BLOBs and
//! ranked by cosine similarity in Rust. Brute-force ranking is fine at
//! the scale of one user's personal archive.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use tracing::{debug, info};

use crate::{rank_entries, EntryMetadata, IndexEntry, ScoredEntry, VectorIndex};

/// Persistent vector index over SQLite.
#[derive(Clone)]
pub struct SqliteVectorIndex {
    pool: SqlitePool,
}

impl SqliteVectorIndex {
    /// Opens (or creates) the index database and ensures the schema.
    pub async fn new(database_url: &str) -> Result<Self, anyhow::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;

        let index = Self { pool };
        index.init_schema().await?;

        Ok(index)
    }

    /// Wraps an existing pool (e.g. shared with the storage crate).
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, anyhow::Error> {
        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    async fn init_schema(&self) -> Result<(), anyhow::Error> {
        // One statement per query; sqlx prepares each.
        for stmt in [
            r#"
            CREATE TABLE IF NOT EXISTS vector_entries (
                namespace TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT NOT NULL,
                vector BLOB NOT NULL,
                metadata TEXT NOT NULL,
                PRIMARY KEY (namespace, id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_vector_entries_namespace \
             ON vector_entries(namespace)",
        ] {
            sqlx::query(stmt).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Serializes an embedding to a little-endian f32 BLOB.
    fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
        let mut blob = Vec::with_capacity(vector.len() * 4);
        for value in vector {
            blob.extend_from_slice(&value.to_le_bytes());
        }
        blob
    }

    /// Deserializes a little-endian f32 BLOB back into an embedding.
    fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn upsert(&self, namespace: &str, entry: IndexEntry) -> Result<(), anyhow::Error> {
        let metadata = serde_json::to_string(&entry.metadata)?;
        let blob = Self::vector_to_blob(&entry.vector);

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO vector_entries (namespace, id, document, vector, metadata)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(namespace)
        .bind(&entry.id)
        .bind(&entry.document)
        .bind(&blob)
        .bind(&metadata)
        .execute(&self.pool)
        .await?;

        debug!(namespace, id = %entry.id, dimension = entry.vector.len(), "vector entry upserted");
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEntry>, anyhow::Error> {
        let rows = sqlx::query(
            "SELECT id, document, vector, metadata FROM vector_entries WHERE namespace = ?",
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows.into_iter().map(|row| {
            let blob: Vec<u8> = row.get("vector");
            let metadata: String = row.get("metadata");
            IndexEntry {
                id: row.get("id"),
                document: row.get("document"),
                vector: Self::blob_to_vector(&blob),
                metadata: serde_json::from_str::<EntryMetadata>(&metadata).unwrap_or_default(),
            }
        });

        let hits = rank_entries(entries, vector, k);
        debug!(namespace, hits = hits.len(), "vector query ranked");
        Ok(hits)
    }

    async fn delete(&self, namespace: &str, id: &str) -> Result<(), anyhow::Error> {
        let result = sqlx::query("DELETE FROM vector_entries WHERE namespace = ? AND id = ?")
            .bind(namespace)
            .bind(id)
            .execute(&self.pool)
            .await?;

        // Absent id is a no-op, not an error.
        debug!(namespace, id, removed = result.rows_affected(), "vector entry delete");
        Ok(())
    }

    async fn drop_namespace(&self, namespace: &str) -> Result<(), anyhow::Error> {
        let result = sqlx::query("DELETE FROM vector_entries WHERE namespace = ?")
            .bind(namespace)
            .execute(&self.pool)
            .await?;

        info!(namespace, removed = result.rows_affected(), "namespace dropped");
        Ok(())
    }

    async fn count(&self, namespace: &str) -> Result<usize, anyhow::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM vector_entries WHERE namespace = ?")
                .bind(namespace)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0 as usize)
    }
}
