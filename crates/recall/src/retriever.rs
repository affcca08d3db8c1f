//! Retrieval and context assembly.

use std::sync::Arc;

use embedding::EmbeddingService;
use tracing::{debug, info, instrument, warn};
use vector_index::{EntryMetadata, NamespaceKey, VectorIndex};

use crate::{CONTEXT_THRESHOLD, REPLICA_CONTEXT_THRESHOLD};

const CONTEXT_LIMIT: usize = 5;
const REPLICA_NAME_SEARCH_LIMIT: usize = 5;
const REPLICA_GENERAL_SEARCH_LIMIT: usize = 3;

/// One retrieved memory, ordered by similarity (descending) in results.
#[derive(Debug, Clone)]
pub struct RetrievedMemory {
    /// Database row id from the index entry's metadata.
    pub memory_id: Option<String>,
    pub content: String,
    pub similarity: f32,
    pub metadata: EntryMetadata,
}

/// A rendered context block plus the ids of the memories inside it, so
/// assistant turns can record their grounding.
#[derive(Debug, Clone)]
pub struct ContextBlock {
    pub text: String,
    pub memory_ids: Vec<String>,
}

impl ContextBlock {
    fn sentinel(text: String) -> Self {
        Self {
            text,
            memory_ids: Vec::new(),
        }
    }
}

/// Embeds queries and searches per-user namespaces.
#[derive(Clone)]
pub struct MemoryRetriever {
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
}

fn format_timestamp(metadata: &EntryMetadata) -> String {
    metadata
        .occurred_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "Unknown time".to_string())
}

impl MemoryRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingService>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Searches the user's namespace for the `k` nearest memories.
    #[instrument(skip(self, query), fields(user_id = %user_id, k = k))]
    pub async fn retrieve(
        &self,
        query: &str,
        user_id: &str,
        k: usize,
    ) -> Result<Vec<RetrievedMemory>, anyhow::Error> {
        let vector = self.embedder.embed(query).await?;
        let namespace = NamespaceKey::for_user(user_id);
        let scored = self.index.query(&namespace, &vector, k).await?;

        debug!(hits = scored.len(), "retrieval done");
        Ok(scored
            .into_iter()
            .map(|entry| RetrievedMemory {
                memory_id: entry.metadata.memory_id.clone(),
                content: entry.document.clone(),
                similarity: entry.similarity(),
                metadata: entry.metadata,
            })
            .collect())
    }

    /// Like `retrieve`, but a failed embedding or index call degrades to
    /// an empty result instead of failing the chat turn. The caller ends
    /// up rendering the sentinel line.
    async fn retrieve_or_empty(
        &self,
        query: &str,
        user_id: &str,
        k: usize,
    ) -> Vec<RetrievedMemory> {
        match self.retrieve(query, user_id, k).await {
            Ok(memories) => memories,
            Err(e) => {
                warn!(error = %e, "retrieval failed, degrading to empty context");
                Vec::new()
            }
        }
    }

    /// Context for self chat: the most relevant memories above the bar,
    /// rendered `[{time}] ({source}): {content}`. Nothing above the bar
    /// yields the sentinel line.
    #[instrument(skip(self, query), fields(user_id = %user_id))]
    pub async fn context_for(
        &self,
        query: &str,
        user_id: &str,
    ) -> Result<ContextBlock, anyhow::Error> {
        let memories = self.retrieve_or_empty(query, user_id, CONTEXT_LIMIT).await;

        let relevant: Vec<&RetrievedMemory> = memories
            .iter()
            .filter(|m| m.similarity > CONTEXT_THRESHOLD)
            .collect();
        if relevant.is_empty() {
            info!("no memories above context threshold");
            return Ok(ContextBlock::sentinel(
                "No directly relevant memories found.".to_string(),
            ));
        }

        let parts: Vec<String> = relevant
            .iter()
            .map(|m| {
                let source = m
                    .metadata
                    .source
                    .clone()
                    .unwrap_or_else(|| "Unknown source".to_string());
                format!("[{}] ({}): {}", format_timestamp(&m.metadata), source, m.content)
            })
            .collect();
        let memory_ids = relevant.iter().filter_map(|m| m.memory_id.clone()).collect();

        Ok(ContextBlock {
            text: format!("Relevant memories:\n{}", parts.join("\n\n")),
            memory_ids,
        })
    }

    /// Context for replica chat: one search biased by the replica's name
    /// and one general search, deduplicated by memory id (the name-biased
    /// hit wins), with a looser similarity bar.
    #[instrument(skip(self, query), fields(user_id = %user_id, replica = %replica_name))]
    pub async fn replica_context_for(
        &self,
        replica_name: &str,
        query: &str,
        user_id: &str,
    ) -> Result<ContextBlock, anyhow::Error> {
        let person_memories = self
            .retrieve_or_empty(
                &format!("{replica_name} {query}"),
                user_id,
                REPLICA_NAME_SEARCH_LIMIT,
            )
            .await;
        let general_memories = self
            .retrieve_or_empty(query, user_id, REPLICA_GENERAL_SEARCH_LIMIT)
            .await;

        let mut seen = Vec::new();
        let mut relevant = Vec::new();
        for memory in person_memories.into_iter().chain(general_memories) {
            let key = memory
                .memory_id
                .clone()
                .unwrap_or_else(|| memory.content.clone());
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            if memory.similarity > REPLICA_CONTEXT_THRESHOLD {
                relevant.push(memory);
            }
        }

        if relevant.is_empty() {
            info!("no memories above replica context threshold");
            return Ok(ContextBlock::sentinel(format!(
                "No specific memories found involving {replica_name} for this topic."
            )));
        }

        let parts: Vec<String> = relevant
            .iter()
            .map(|m| format!("[{}]: {}", format_timestamp(&m.metadata), m.content))
            .collect();
        let memory_ids = relevant.iter().filter_map(|m| m.memory_id.clone()).collect();

        Ok(ContextBlock {
            text: format!(
                "Memories involving {replica_name} or related to the current conversation:\n\n{}",
                parts.join("\n\n")
            ),
            memory_ids,
        })
    }
}
