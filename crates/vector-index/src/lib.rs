//! # Vector Index
//!
//! Namespace-scoped storage for (vector, document, metadata) triples with
//! nearest-neighbor query. One namespace per user, plus optional derived
//! namespaces per replica; a namespace is created lazily on first write
//! and never implicitly shared across users.
//!
//! ## Modules
//!
//! - [`namespace`] – deterministic namespace keys
//! - [`sqlite`] – persistent SQLite-backed index
//! - [`inmemory`] – in-memory index for tests and prototyping
//!
//! Query results are ordered ascending by distance (nearest first);
//! `similarity = 1 - distance` is the score exposed upward.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod inmemory;
mod namespace;
mod sqlite;

pub use inmemory::InMemoryVectorIndex;
pub use namespace::NamespaceKey;
pub use sqlite::SqliteVectorIndex;

/// Provenance metadata stored alongside each index entry.
///
/// At minimum carries back-references to the owning memory and user so a
/// query hit can be traced to its row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EntryMetadata {
    pub memory_id: Option<String>,
    pub user_id: Option<String>,
    pub content_kind: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub title: Option<String>,
}

/// One entry in a namespace: synthetic id, document text, embedding
/// vector, and provenance metadata.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub document: String,
    pub vector: Vec<f32>,
    pub metadata: EntryMetadata,
}

/// A query hit: the stored document plus its distance from the query
/// vector (`1 - cosine similarity`).
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub id: String,
    pub document: String,
    pub metadata: EntryMetadata,
    pub distance: f32,
}

impl ScoredEntry {
    /// Similarity score exposed to retrieval: `1 - distance`.
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Namespace-scoped vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or replaces an entry; idempotent on `entry.id` within the
    /// namespace.
    async fn upsert(&self, namespace: &str, entry: IndexEntry) -> Result<(), anyhow::Error>;

    /// Returns the `k` nearest entries, ordered ascending by distance.
    /// An unknown namespace yields an empty result, not an error.
    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEntry>, anyhow::Error>;

    /// Removes an entry. Deleting a nonexistent id is a no-op.
    async fn delete(&self, namespace: &str, id: &str) -> Result<(), anyhow::Error>;

    /// Removes every entry in a namespace. Used by replica training,
    /// which rebuilds the derived namespace wholesale.
    async fn drop_namespace(&self, namespace: &str) -> Result<(), anyhow::Error>;

    /// Number of entries currently in a namespace.
    async fn count(&self, namespace: &str) -> Result<usize, anyhow::Error>;
}

/// Calculates cosine similarity between two vectors.
///
/// Empty or zero vectors yield 0.0 so callers never divide by zero.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Ranks entries against a query vector: ascending distance, truncated to `k`.
pub(crate) fn rank_entries(
    entries: impl IntoIterator<Item = IndexEntry>,
    query: &[f32],
    k: usize,
) -> Vec<ScoredEntry> {
    let mut scored: Vec<ScoredEntry> = entries
        .into_iter()
        .map(|entry| {
            let distance = 1.0 - cosine_similarity(&entry.vector, query);
            ScoredEntry {
                id: entry.id,
                document: entry.document,
                metadata: entry.metadata,
                distance,
            }
        })
        .collect();
    scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}
