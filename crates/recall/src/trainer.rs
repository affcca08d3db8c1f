//! Replica training: building a replica's derived namespace from the
//! memories that involve them.
//!
//! Training is a wholesale replace: the derived namespace is dropped and
//! rebuilt, so retraining over an unchanged memory set lands on the same
//! membership. In-flight replica conversations during a retrain read
//! whatever state the rebuild has reached; that race is accepted.

use std::sync::Arc;

use chrono::Utc;
use embedding::EmbeddingService;
use storage::{ReplicaRepository, TrainingStatus};
use tracing::{info, instrument, warn};
use vector_index::{IndexEntry, NamespaceKey, VectorIndex};

use crate::{MemoryRetriever, TRAINING_THRESHOLD};

const TRAINING_SEARCH_LIMIT: usize = 100;

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub replica_id: String,
    pub memory_namespace: String,
    pub total_memories: usize,
}

pub struct ReplicaTrainer {
    retriever: MemoryRetriever,
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    replicas: ReplicaRepository,
}

impl ReplicaTrainer {
    pub fn new(
        retriever: MemoryRetriever,
        embedder: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        replicas: ReplicaRepository,
    ) -> Self {
        Self {
            retriever,
            embedder,
            index,
            replicas,
        }
    }

    /// Trains a replica: finds the user's memories that involve the
    /// replica by name, rebuilds the derived namespace from them, and
    /// records the outcome. On failure the status reverts to untrained.
    #[instrument(skip(self), fields(user_id = %user_id, replica_id = %replica_id))]
    pub async fn train(
        &self,
        user_id: &str,
        replica_id: &str,
    ) -> Result<TrainingOutcome, anyhow::Error> {
        let replica = self
            .replicas
            .find_for_user(user_id, replica_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("replica {replica_id} not found"))?;

        let namespace = NamespaceKey::for_replica(user_id, replica_id);
        self.replicas
            .update_training(replica_id, TrainingStatus::Training, Some(&namespace), 0, None)
            .await?;

        match self.rebuild(user_id, replica_id, &replica.name, &namespace).await {
            Ok(total) => {
                self.replicas
                    .update_training(
                        replica_id,
                        TrainingStatus::Trained,
                        Some(&namespace),
                        total as i64,
                        Some(Utc::now()),
                    )
                    .await?;
                info!(total, "replica trained");
                Ok(TrainingOutcome {
                    replica_id: replica_id.to_string(),
                    memory_namespace: namespace,
                    total_memories: total,
                })
            }
            Err(e) => {
                warn!(error = %e, "training failed, reverting to untrained");
                self.replicas
                    .update_training(replica_id, TrainingStatus::Untrained, None, 0, None)
                    .await?;
                Err(e)
            }
        }
    }

    async fn rebuild(
        &self,
        user_id: &str,
        replica_id: &str,
        replica_name: &str,
        namespace: &str,
    ) -> Result<usize, anyhow::Error> {
        let candidates = self
            .retriever
            .retrieve(replica_name, user_id, TRAINING_SEARCH_LIMIT)
            .await?;
        let members: Vec<_> = candidates
            .into_iter()
            .filter(|m| m.similarity > TRAINING_THRESHOLD)
            .collect();

        self.index.drop_namespace(namespace).await?;

        if members.is_empty() {
            return Ok(0);
        }

        let documents: Vec<String> = members.iter().map(|m| m.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&documents).await?;

        for (i, (member, vector)) in members.iter().zip(vectors).enumerate() {
            let entry = IndexEntry {
                id: format!("replica_{replica_id}_memory_{i}"),
                document: member.content.clone(),
                vector,
                metadata: member.metadata.clone(),
            };
            self.index.upsert(namespace, entry).await?;
        }

        Ok(members.len())
    }
}
