//! In-memory vector index for tests and prototyping.
//!
//! Data is lost on restart. Thread safety via `Arc<RwLock<...>>`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{rank_entries, IndexEntry, ScoredEntry, VectorIndex};

/// In-memory vector index: namespace -> id -> entry.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorIndex {
    namespaces: Arc<RwLock<HashMap<String, HashMap<String, IndexEntry>>>>,
}

impl InMemoryVectorIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists the namespaces that have received at least one write.
    pub async fn namespace_names(&self) -> Vec<String> {
        let namespaces = self.namespaces.read().await;
        namespaces.keys().cloned().collect()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, namespace: &str, entry: IndexEntry) -> Result<(), anyhow::Error> {
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEntry>, anyhow::Error> {
        let namespaces = self.namespaces.read().await;
        let entries = match namespaces.get(namespace) {
            Some(entries) => entries.values().cloned().collect::<Vec<_>>(),
            None => return Ok(vec![]),
        };
        Ok(rank_entries(entries, vector, k))
    }

    async fn delete(&self, namespace: &str, id: &str) -> Result<(), anyhow::Error> {
        let mut namespaces = self.namespaces.write().await;
        if let Some(entries) = namespaces.get_mut(namespace) {
            entries.remove(id);
        }
        Ok(())
    }

    async fn drop_namespace(&self, namespace: &str) -> Result<(), anyhow::Error> {
        let mut namespaces = self.namespaces.write().await;
        namespaces.remove(namespace);
        Ok(())
    }

    async fn count(&self, namespace: &str) -> Result<usize, anyhow::Error> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.get(namespace).map(|e| e.len()).unwrap_or(0))
    }
}
