//! Replica training tests: namespace rebuild, idempotence, and failure
//! reverting the training status.

mod common;

use std::sync::Arc;

use common::{seed_memory, BagOfWords, BatchFailingEmbedder};
use recall::{MemoryRetriever, ReplicaTrainer};
use storage::{ReplicaRecord, ReplicaRepository, TrainingStatus};
use tempfile::TempDir;
use vector_index::{InMemoryVectorIndex, NamespaceKey, VectorIndex};

struct Fixture {
    _dir: TempDir,
    embedder: Arc<BagOfWords>,
    index: Arc<InMemoryVectorIndex>,
    replicas: ReplicaRepository,
    replica: ReplicaRecord,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("test.db").to_string_lossy().into_owned();
    let replicas = ReplicaRepository::new(&db).await.unwrap();
    let replica = ReplicaRecord::new("user-1", "Rose");
    replicas.save(&replica).await.unwrap();

    let embedder = BagOfWords::new();
    let index = Arc::new(InMemoryVectorIndex::new());
    let ns = NamespaceKey::for_user("user-1");
    seed_memory(index.as_ref(), &embedder, &ns, "m1", "Rose baked bread every Sunday", "journal").await;
    seed_memory(index.as_ref(), &embedder, &ns, "m2", "Went to the gym alone", "journal").await;

    Fixture {
        _dir: dir,
        embedder,
        index,
        replicas,
        replica,
    }
}

fn trainer(fx: &Fixture) -> ReplicaTrainer {
    ReplicaTrainer::new(
        MemoryRetriever::new(fx.embedder.clone(), fx.index.clone()),
        fx.embedder.clone(),
        fx.index.clone(),
        fx.replicas.clone(),
    )
}

/// **Setup**: two memories, one mentioning the replica by name.
/// **Action**: train.
/// **Expected**: the derived namespace holds only the involving memory;
/// the replica record is trained with count, namespace, and timestamp.
#[tokio::test]
async fn test_training_builds_derived_namespace() {
    let fx = fixture().await;

    let outcome = trainer(&fx).train("user-1", &fx.replica.id).await.unwrap();

    let ns = NamespaceKey::for_replica("user-1", &fx.replica.id);
    assert_eq!(outcome.memory_namespace, ns);
    assert_eq!(outcome.total_memories, 1);
    assert_eq!(fx.index.count(&ns).await.unwrap(), 1);

    let stored = fx
        .replicas
        .find_for_user("user-1", &fx.replica.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.training_status, TrainingStatus::Trained);
    assert_eq!(stored.memory_namespace.as_deref(), Some(ns.as_str()));
    assert_eq!(stored.total_memories, 1);
    assert!(stored.last_trained_at.is_some());
}

/// **Setup**: a trained replica over an unchanged memory set.
/// **Action**: train again.
/// **Expected**: same membership count; the namespace is rebuilt, not
/// accumulated.
#[tokio::test]
async fn test_retraining_is_idempotent() {
    let fx = fixture().await;
    let t = trainer(&fx);

    let first = t.train("user-1", &fx.replica.id).await.unwrap();
    let second = t.train("user-1", &fx.replica.id).await.unwrap();

    assert_eq!(first.total_memories, second.total_memories);
    let ns = NamespaceKey::for_replica("user-1", &fx.replica.id);
    assert_eq!(fx.index.count(&ns).await.unwrap(), 1);
}

/// **Setup**: an embedder whose batch path fails mid-training.
/// **Action**: train.
/// **Expected**: the call errors and the replica reverts to untrained
/// with no namespace recorded.
#[tokio::test]
async fn test_training_failure_reverts_status() {
    let fx = fixture().await;
    let t = ReplicaTrainer::new(
        MemoryRetriever::new(fx.embedder.clone(), fx.index.clone()),
        BatchFailingEmbedder::new(fx.embedder.clone()),
        fx.index.clone(),
        fx.replicas.clone(),
    );

    assert!(t.train("user-1", &fx.replica.id).await.is_err());

    let stored = fx
        .replicas
        .find_for_user("user-1", &fx.replica.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.training_status, TrainingStatus::Untrained);
    assert!(stored.memory_namespace.is_none());
}

/// **Setup**: an unknown replica id.
/// **Action**: train.
/// **Expected**: an error, and nothing written.
#[tokio::test]
async fn test_training_unknown_replica_errors() {
    let fx = fixture().await;
    assert!(trainer(&fx).train("user-1", "nope").await.is_err());
}
