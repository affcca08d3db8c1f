//! Test support: a deterministic word-count embedder, a scripted
//! generation backend, and a fixture wiring the orchestrator over a
//! temporary database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use echo_chat::ChatService;
use embedding::EmbeddingService;
use generation::{
    EnvGenerationConfig, FallbackRouter, GenerationBackend, GenerationError, GenerationOutput,
    GenerationRequest, ProviderId, ProviderTable,
};
use recall::MemoryRetriever;
use storage::{ConversationRepository, ReplicaRepository};
use tempfile::TempDir;
use vector_index::{EntryMetadata, IndexEntry, InMemoryVectorIndex, NamespaceKey, VectorIndex};

const DIM: usize = 128;

/// Embeds text as word counts over a vocabulary assigned on first sight.
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

/// Backend that answers with a fixed reply, or always fails when none is
/// given. Counts calls.
pub struct ScriptedBackend {
    id: ProviderId,
    reply: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn answering(id: ProviderId, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            id,
            reply: Some(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(id: ProviderId) -> Arc<Self> {
        Arc::new(Self {
            id,
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(text) => Ok(GenerationOutput {
                text: text.clone(),
                tokens_used: Some(42),
            }),
            None => Err(GenerationError::Upstream {
                provider: self.id,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

pub struct Fixture {
    pub _dir: TempDir,
    pub conversations: ConversationRepository,
    pub replicas: ReplicaRepository,
    pub index: Arc<InMemoryVectorIndex>,
    pub embedder: Arc<BagOfWords>,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("test.db").to_string_lossy().into_owned();
        Self {
            conversations: ConversationRepository::new(&db).await.unwrap(),
            replicas: ReplicaRepository::new(&db).await.unwrap(),
            index: Arc::new(InMemoryVectorIndex::new()),
            embedder: BagOfWords::new(),
            _dir: dir,
        }
    }

    /// Wires a chat service around the given backends. Availability covers
    /// every provider so registration alone decides the chain.
    pub fn service(&self, backends: Vec<Arc<dyn GenerationBackend>>) -> ChatService {
        self.service_with_embedder(self.embedder.clone(), backends)
    }

    /// Same wiring with a substitute embedder, e.g. a failing one.
    pub fn service_with_embedder(
        &self,
        embedder: Arc<dyn EmbeddingService>,
        backends: Vec<Arc<dyn GenerationBackend>>,
    ) -> ChatService {
        let config = EnvGenerationConfig {
            openai_api_key: Some("k".to_string()),
            gemini_api_key: Some("k".to_string()),
            groq_api_key: Some("k".to_string()),
            huggingface_api_key: Some("k".to_string()),
            ..EnvGenerationConfig::default()
        };
        let mut router = FallbackRouter::new(ProviderTable::from_config(&config));
        for backend in backends {
            router = router.register(backend);
        }
        ChatService::new(
            self.conversations.clone(),
            self.replicas.clone(),
            MemoryRetriever::new(embedder, self.index.clone()),
            Arc::new(router),
        )
    }

    pub async fn seed_memory(&self, user_id: &str, memory_id: &str, content: &str) {
        let vector = self.embedder.embed(content).await.unwrap();
        self.index
            .upsert(
                &NamespaceKey::for_user(user_id),
                IndexEntry {
                    id: format!("memory_{memory_id}_testsuff"),
                    document: content.to_string(),
                    vector,
                    metadata: EntryMetadata {
                        memory_id: Some(memory_id.to_string()),
                        user_id: Some(user_id.to_string()),
                        content_kind: Some("text".to_string()),
                        occurred_at: None,
                        source: Some("journal".to_string()),
                        title: None,
                    },
                },
            )
            .await
            .unwrap();
    }
}
