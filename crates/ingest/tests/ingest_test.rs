//! Ingestion pipeline tests with in-process fakes.
//!
//! External interactions: none (fake embedder, speech, OCR, and backend;
//! in-memory vector index; temp-file SQLite and upload directory).

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use embedding::EmbeddingService;
use generation::{
    GenerationBackend, GenerationError, GenerationOutput, GenerationRequest, ProviderId,
};
use ingest::{Annotator, LocalFileStore, MemoryIngestor, OcrEngine, SpeechToText, TextMemoryInput};
use storage::MemoryRepository;
use tempfile::TempDir;
use vector_index::{InMemoryVectorIndex, NamespaceKey, VectorIndex};

struct FakeEmbedder {
    fail: bool,
}

#[async_trait]
impl EmbeddingService for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        if self.fail {
            anyhow::bail!("embedding unavailable");
        }
        Ok(vec![1.0, 0.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error> {
        if self.fail {
            anyhow::bail!("embedding unavailable");
        }
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}

struct FakeSpeech {
    transcript: Option<String>,
}

#[async_trait]
impl SpeechToText for FakeSpeech {
    async fn transcribe(&self, _audio: &[u8], _filename: &str) -> Result<String, anyhow::Error> {
        self.transcript
            .clone()
            .ok_or_else(|| anyhow::anyhow!("transcription service down"))
    }
}

struct FakeOcr {
    text: Option<String>,
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn extract_text(&self, _image_path: &Path) -> Result<String, anyhow::Error> {
        self.text
            .clone()
            .ok_or_else(|| anyhow::anyhow!("ocr unavailable"))
    }
}

/// Backend that replays scripted replies in order.
struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
        })
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        Ok(GenerationOutput {
            text,
            tokens_used: None,
        })
    }
}

struct Fixture {
    _dir: TempDir,
    ingestor: MemoryIngestor,
    memories: MemoryRepository,
    index: Arc<InMemoryVectorIndex>,
}

async fn fixture(embed_fails: bool) -> Fixture {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("test.db").to_string_lossy().into_owned();
    let memories = MemoryRepository::new(&db).await.unwrap();
    let index = Arc::new(InMemoryVectorIndex::new());
    let files = Arc::new(LocalFileStore::new(dir.path().join("uploads")));
    let ingestor = MemoryIngestor::new(
        memories.clone(),
        index.clone(),
        Arc::new(FakeEmbedder { fail: embed_fails }),
        files,
    );
    Fixture {
        _dir: dir,
        ingestor,
        memories,
        index,
    }
}

/// **Setup**: working embedder.
/// **Action**: ingest a long text with no title.
/// **Expected**: title defaults to the first 50 chars + ellipsis, the row
/// is processed, and the index holds one entry with the row id in its
/// metadata and an id of the form `memory_{row_id}_{suffix}`.
#[tokio::test]
async fn test_text_ingestion_indexes_and_marks_processed() {
    let fx = fixture(false).await;
    let content = "a".repeat(60);

    let record = fx
        .ingestor
        .ingest_text("user-1", &content, TextMemoryInput::default())
        .await
        .unwrap();

    assert!(record.processed);
    assert_eq!(record.title.as_deref().unwrap().len(), 53);
    assert_eq!(record.source.as_deref(), Some("manual"));
    let embedding_id = record.embedding_id.clone().unwrap();
    assert!(embedding_id.starts_with(&format!("memory_{}_", record.id)));

    let namespace = NamespaceKey::for_user("user-1");
    assert_eq!(fx.index.count(&namespace).await.unwrap(), 1);

    let stored = fx
        .memories
        .find_by_id("user-1", &record.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.processed);
    assert_eq!(stored.embedding_id, Some(embedding_id));
}

/// **Setup**: embedder that always fails.
/// **Action**: ingest a text memory.
/// **Expected**: the write succeeds but the row stays unprocessed and the
/// index stays empty.
#[tokio::test]
async fn test_embedding_failure_degrades_to_unprocessed() {
    let fx = fixture(true).await;

    let record = fx
        .ingestor
        .ingest_text("user-1", "note", TextMemoryInput::default())
        .await
        .unwrap();

    assert!(!record.processed);
    assert!(record.embedding_id.is_none());
    assert_eq!(
        fx.index.count(&NamespaceKey::for_user("user-1")).await.unwrap(),
        0
    );
}

/// **Setup**: working speech-to-text.
/// **Action**: ingest a voice memory.
/// **Expected**: content is the transcript, title derives from its first
/// 30 chars, and the recording is in the file store.
#[tokio::test]
async fn test_voice_ingestion_uses_transcript() {
    let fx = fixture(false).await;
    let ingestor = fx.ingestor.clone().with_speech(Arc::new(FakeSpeech {
        transcript: Some("We sang by the fire all night long at the lake house".to_string()),
    }));

    let record = ingestor
        .ingest_voice("user-1", b"riff", "memo.ogg", None)
        .await
        .unwrap();

    assert!(record.content.starts_with("We sang by the fire"));
    assert_eq!(
        record.title.as_deref(),
        Some("Voice memo: We sang by the fire all night ...")
    );
    assert_eq!(record.original_filename.as_deref(), Some("memo.ogg"));
    assert!(record.file_path.is_some());
}

/// **Setup**: speech-to-text that fails.
/// **Action**: ingest a voice memory.
/// **Expected**: the write still succeeds with a placeholder naming the
/// original file.
#[tokio::test]
async fn test_voice_ingestion_degrades_on_transcription_failure() {
    let fx = fixture(false).await;
    let ingestor = fx
        .ingestor
        .clone()
        .with_speech(Arc::new(FakeSpeech { transcript: None }));

    let record = ingestor
        .ingest_voice("user-1", b"riff", "memo.ogg", None)
        .await
        .unwrap();

    assert_eq!(
        record.content,
        "Voice recording 'memo.ogg' could not be transcribed."
    );
    assert_eq!(record.title.as_deref(), Some("Voice memo"));
}

/// **Setup**: OCR that extracts text.
/// **Action**: ingest an image with title and description.
/// **Expected**: content carries the image line, the extracted text, and
/// the description.
#[tokio::test]
async fn test_image_ingestion_assembles_content() {
    let fx = fixture(false).await;
    let ingestor = fx.ingestor.clone().with_ocr(Arc::new(FakeOcr {
        text: Some("Happy Birthday!".to_string()),
    }));

    let record = ingestor
        .ingest_image(
            "user-1",
            b"png",
            "card.png",
            Some("Birthday card".to_string()),
            Some("From grandma".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(
        record.content,
        "Image: Birthday card\nText in image: Happy Birthday!\nDescription: From grandma"
    );
    assert_eq!(record.title.as_deref(), Some("Birthday card"));
}

/// **Setup**: OCR that fails.
/// **Action**: ingest an image.
/// **Expected**: only the extracted-text line is dropped.
#[tokio::test]
async fn test_image_ingestion_drops_only_ocr_line_on_failure() {
    let fx = fixture(false).await;
    let ingestor = fx
        .ingestor
        .clone()
        .with_ocr(Arc::new(FakeOcr { text: None }));

    let record = ingestor
        .ingest_image("user-1", b"png", "card.png", None, Some("a card".to_string()))
        .await
        .unwrap();

    assert_eq!(record.content, "Image: Untitled image\nDescription: a card");
    assert_eq!(record.title.as_deref(), Some("Image memory"));
}

/// **Setup**: an ingested, indexed voice memory.
/// **Action**: delete it twice.
/// **Expected**: first delete removes the row, the index entry, and the
/// file, and returns true; the second is a no-op returning false.
#[tokio::test]
async fn test_delete_memory_is_idempotent() {
    let fx = fixture(false).await;
    let ingestor = fx.ingestor.clone().with_speech(Arc::new(FakeSpeech {
        transcript: Some("delete me".to_string()),
    }));

    let record = ingestor
        .ingest_voice("user-1", b"riff", "memo.ogg", None)
        .await
        .unwrap();
    let file_path = record.file_path.clone().unwrap();
    assert!(std::path::Path::new(&file_path).exists());

    assert!(ingestor.delete_memory("user-1", &record.id).await.unwrap());
    assert_eq!(
        fx.index.count(&NamespaceKey::for_user("user-1")).await.unwrap(),
        0
    );
    assert!(!std::path::Path::new(&file_path).exists());
    assert!(fx
        .memories
        .find_by_id("user-1", &record.id)
        .await
        .unwrap()
        .is_none());

    assert!(!ingestor.delete_memory("user-1", &record.id).await.unwrap());
}

/// **Setup**: annotator backend scripted with valid JSON, one score out
/// of range.
/// **Action**: ingest a text memory.
/// **Expected**: emotions clamped into [0, 1], entities stored.
#[tokio::test]
async fn test_annotation_pass_clamps_and_stores() {
    let fx = fixture(false).await;
    let backend = ScriptedBackend::new(&[
        r#"{"joy": 1.4, "sadness": 0.2, "euphoria": 0.9}"#,
        r#"{"people": ["Mom"], "locations": ["Paris"], "topics": ["travel"]}"#,
    ]);
    let ingestor = fx.ingestor.clone().with_annotator(Annotator::new(backend));

    let record = ingestor
        .ingest_text("user-1", "Trip to Paris with Mom", TextMemoryInput::default())
        .await
        .unwrap();

    assert_eq!(record.annotations.emotions.get("joy"), Some(&1.0));
    assert_eq!(record.annotations.emotions.get("sadness"), Some(&0.2));
    // Outside the fixed vocabulary.
    assert!(!record.annotations.emotions.contains_key("euphoria"));
    assert_eq!(record.annotations.people, vec!["Mom"]);
    assert_eq!(record.annotations.locations, vec!["Paris"]);
    assert_eq!(record.annotations.topics, vec!["travel"]);
}

/// **Setup**: annotator backend that replies with prose, not JSON.
/// **Action**: ingest a text memory.
/// **Expected**: annotations default to empty; ingestion still succeeds.
#[tokio::test]
async fn test_annotation_parse_failure_defaults_to_empty() {
    let fx = fixture(false).await;
    let backend = ScriptedBackend::new(&["I sense joy here.", "people: Mom"]);
    let ingestor = fx.ingestor.clone().with_annotator(Annotator::new(backend));

    let record = ingestor
        .ingest_text("user-1", "note", TextMemoryInput::default())
        .await
        .unwrap();

    assert!(record.annotations.emotions.is_empty());
    assert!(record.annotations.people.is_empty());
    assert!(record.annotations.locations.is_empty());
    assert!(record.annotations.topics.is_empty());
}
