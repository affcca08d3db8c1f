//! Test support: a deterministic bag-of-words embedder so retrieval
//! geometry is real (cosine over word overlap) without any network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use embedding::EmbeddingService;
use vector_index::{EntryMetadata, IndexEntry, VectorIndex};

const DIM: usize = 128;

/// Embeds text as word counts over a vocabulary assigned on first sight.
/// Shared-word texts get proportionally similar vectors.
pub struct BagOfWords {
    vocab: Mutex<HashMap<String, usize>>,
}

impl BagOfWords {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            vocab: Mutex::new(HashMap::new()),
        })
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; DIM];
        let mut vocab = self.vocab.lock().unwrap();
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocab.len();
            let idx = *vocab.entry(word.to_string()).or_insert(next);
            assert!(idx < DIM, "test vocabulary overflow");
            vector[idx] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingService for BagOfWords {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

/// Embedder that is fully down; every call fails.
pub struct BrokenEmbedder;

impl BrokenEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl EmbeddingService for BrokenEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        anyhow::bail!("embedding service unavailable")
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        anyhow::bail!("embedding service unavailable")
    }
}

/// Embedder whose batch path fails; single embeds still work. Used to
/// force a training failure after retrieval succeeded.
pub struct BatchFailingEmbedder {
    inner: Arc<BagOfWords>,
}

impl BatchFailingEmbedder {
    pub fn new(inner: Arc<BagOfWords>) -> Arc<Self> {
        Arc::new(Self { inner })
    }
}

#[async_trait]
impl EmbeddingService for BatchFailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        anyhow::bail!("batch embedding unavailable")
    }
}

/// Seeds one indexed memory the way ingestion would.
pub async fn seed_memory(
    index: &dyn VectorIndex,
    embedder: &Arc<BagOfWords>,
    namespace: &str,
    memory_id: &str,
    content: &str,
    source: &str,
) {
    let vector = embedder.embed(content).await.unwrap();
    index
        .upsert(
            namespace,
            IndexEntry {
                id: format!("memory_{memory_id}_testsuff"),
                document: content.to_string(),
                vector,
                metadata: EntryMetadata {
                    memory_id: Some(memory_id.to_string()),
                    user_id: None,
                    content_kind: Some("text".to_string()),
                    occurred_at: None,
                    source: Some(source.to_string()),
                    title: None,
                },
            },
        )
        .await
        .unwrap();
}
