//! Retrieval and context assembly tests over real cosine geometry.
//!
//! External interactions: none (bag-of-words embedder, in-memory index).

mod common;

use std::sync::Arc;

use common::{seed_memory, BagOfWords, BrokenEmbedder};
use recall::MemoryRetriever;
use vector_index::{InMemoryVectorIndex, NamespaceKey};

fn retriever(embedder: &Arc<BagOfWords>, index: &Arc<InMemoryVectorIndex>) -> MemoryRetriever {
    MemoryRetriever::new(embedder.clone(), index.clone())
}

/// **Setup**: two memories with no word overlap.
/// **Action**: retrieve with the query "coffee".
/// **Expected**: the coffee memory ranks first with strictly higher
/// similarity than the unrelated one.
#[tokio::test]
async fn test_query_ranks_matching_memory_first() {
    let embedder = BagOfWords::new();
    let index = Arc::new(InMemoryVectorIndex::new());
    let ns = NamespaceKey::for_user("user-1");
    seed_memory(index.as_ref(), &embedder, &ns, "m1", "Had coffee with Mom, she seemed happy", "journal").await;
    seed_memory(index.as_ref(), &embedder, &ns, "m2", "Rainy day, stayed inside reading", "journal").await;

    let results = retriever(&embedder, &index)
        .retrieve("coffee", "user-1", 5)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].memory_id.as_deref(), Some("m1"));
    assert!(results[0].similarity > results[1].similarity);
    assert!(results[0].similarity > 0.3);
}

/// **Setup**: one memory.
/// **Action**: build context with a near-verbatim query, then with a
/// disjoint one.
/// **Expected**: the first context carries the rendered memory and its
/// id; the second is the sentinel with no ids.
#[tokio::test]
async fn test_context_threshold_and_sentinel() {
    let embedder = BagOfWords::new();
    let index = Arc::new(InMemoryVectorIndex::new());
    let ns = NamespaceKey::for_user("user-1");
    seed_memory(index.as_ref(), &embedder, &ns, "m1", "Had coffee with Mom", "journal").await;

    let r = retriever(&embedder, &index);

    let hit = r.context_for("Had coffee with Mom", "user-1").await.unwrap();
    assert!(hit.text.starts_with("Relevant memories:"));
    assert!(hit.text.contains("(journal): Had coffee with Mom"));
    assert!(hit.text.contains("[Unknown time]"));
    assert_eq!(hit.memory_ids, vec!["m1"]);

    let miss = r.context_for("quarterly budget meeting", "user-1").await.unwrap();
    assert_eq!(miss.text, "No directly relevant memories found.");
    assert!(miss.memory_ids.is_empty());
}

/// **Setup**: an indexed memory, but the embedding service is down.
/// **Action**: build self and replica context.
/// **Expected**: both calls succeed with the sentinel block and no ids;
/// an embedding outage degrades the context instead of failing the turn.
#[tokio::test]
async fn test_context_degrades_when_embedding_service_is_down() {
    let healthy = BagOfWords::new();
    let index = Arc::new(InMemoryVectorIndex::new());
    let ns = NamespaceKey::for_user("user-1");
    seed_memory(index.as_ref(), &healthy, &ns, "m1", "Had coffee with Mom", "journal").await;

    let r = MemoryRetriever::new(BrokenEmbedder::new(), index.clone());

    let block = r.context_for("Had coffee with Mom", "user-1").await.unwrap();
    assert_eq!(block.text, "No directly relevant memories found.");
    assert!(block.memory_ids.is_empty());

    let block = r
        .replica_context_for("Rose", "baked bread", "user-1")
        .await
        .unwrap();
    assert_eq!(
        block.text,
        "No specific memories found involving Rose for this topic."
    );
    assert!(block.memory_ids.is_empty());
}

/// **Setup**: a memory indexed for another user.
/// **Action**: query as user-1.
/// **Expected**: nothing comes back; namespaces are never shared.
#[tokio::test]
async fn test_namespaces_isolate_users() {
    let embedder = BagOfWords::new();
    let index = Arc::new(InMemoryVectorIndex::new());
    seed_memory(
        index.as_ref(),
        &embedder,
        &NamespaceKey::for_user("user-2"),
        "m1",
        "Had coffee with Mom",
        "journal",
    )
    .await;

    let results = retriever(&embedder, &index)
        .retrieve("Had coffee with Mom", "user-1", 5)
        .await
        .unwrap();
    assert!(results.is_empty());
}

/// **Setup**: one memory that both the name-biased and the general
/// search will hit.
/// **Action**: build replica context.
/// **Expected**: the memory appears exactly once (dedup, first
/// occurrence wins) under the replica-named header.
#[tokio::test]
async fn test_replica_context_dedups_dual_search() {
    let embedder = BagOfWords::new();
    let index = Arc::new(InMemoryVectorIndex::new());
    let ns = NamespaceKey::for_user("user-1");
    seed_memory(index.as_ref(), &embedder, &ns, "m1", "Rose baked bread", "journal").await;

    let block = retriever(&embedder, &index)
        .replica_context_for("Rose", "baked bread", "user-1")
        .await
        .unwrap();

    assert!(block
        .text
        .starts_with("Memories involving Rose or related to the current conversation:"));
    assert_eq!(block.text.matches("Rose baked bread").count(), 1);
    assert_eq!(block.memory_ids, vec!["m1"]);
}

/// **Setup**: memories unrelated to the topic.
/// **Action**: build replica context for an off-topic query.
/// **Expected**: the replica-specific sentinel names the replica.
#[tokio::test]
async fn test_replica_context_sentinel() {
    let embedder = BagOfWords::new();
    let index = Arc::new(InMemoryVectorIndex::new());
    let ns = NamespaceKey::for_user("user-1");
    seed_memory(index.as_ref(), &embedder, &ns, "m1", "Went hiking alone", "journal").await;

    let block = retriever(&embedder, &index)
        .replica_context_for("Rose", "quarterly budget", "user-1")
        .await
        .unwrap();

    assert_eq!(
        block.text,
        "No specific memories found involving Rose for this topic."
    );
    assert!(block.memory_ids.is_empty());
}
