//! The ingestion service: capture to stored, indexed memory.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use embedding::EmbeddingService;
use storage::{ContentKind, MemoryRecord, MemoryRepository};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use vector_index::{EntryMetadata, IndexEntry, NamespaceKey, VectorIndex};

use crate::{Annotator, FileStore, OcrEngine, SpeechToText};

const TEXT_TITLE_CHARS: usize = 50;
const VOICE_TITLE_CHARS: usize = 30;

/// Inputs for a text memory beyond the content itself.
#[derive(Debug, Clone, Default)]
pub struct TextMemoryInput {
    pub title: Option<String>,
    pub source: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Orchestrates the ingestion pipeline. Speech, OCR, and annotation are
/// optional capabilities; a missing one degrades the enrichment, never
/// the capture.
#[derive(Clone)]
pub struct MemoryIngestor {
    memories: MemoryRepository,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingService>,
    files: Arc<dyn FileStore>,
    speech: Option<Arc<dyn SpeechToText>>,
    ocr: Option<Arc<dyn OcrEngine>>,
    annotator: Option<Annotator>,
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let prefix: String = text.chars().take(max).collect();
        format!("{prefix}...")
    } else {
        text.to_string()
    }
}

impl MemoryIngestor {
    pub fn new(
        memories: MemoryRepository,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingService>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            memories,
            index,
            embedder,
            files,
            speech: None,
            ocr: None,
            annotator: None,
        }
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechToText>) -> Self {
        self.speech = Some(speech);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = Some(annotator);
        self
    }

    /// Stores a text memory verbatim.
    #[instrument(skip(self, content, input), fields(user_id = %user_id))]
    pub async fn ingest_text(
        &self,
        user_id: &str,
        content: &str,
        input: TextMemoryInput,
    ) -> Result<MemoryRecord, anyhow::Error> {
        let title = input
            .title
            .unwrap_or_else(|| truncate_chars(content, TEXT_TITLE_CHARS));
        let mut record = MemoryRecord::new(user_id, content, ContentKind::Text)
            .with_title(title)
            .with_source(input.source.unwrap_or_else(|| "manual".to_string()));
        record.occurred_at = input.occurred_at;

        self.store_and_index(record).await
    }

    /// Stores a voice memory: the recording goes to the file store, the
    /// transcript becomes the content. A failed transcription stores a
    /// placeholder naming the original file instead of failing the write.
    #[instrument(skip(self, audio), fields(user_id = %user_id, filename = %filename))]
    pub async fn ingest_voice(
        &self,
        user_id: &str,
        audio: &[u8],
        filename: &str,
        title: Option<String>,
    ) -> Result<MemoryRecord, anyhow::Error> {
        let locator = self.files.put(audio, filename).await?;

        let transcript = match &self.speech {
            Some(speech) => match speech.transcribe(audio, filename).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(error = %e, "transcription failed, storing placeholder");
                    None
                }
            },
            None => {
                warn!("no speech-to-text configured, storing placeholder");
                None
            }
        };

        let (content, default_title) = match transcript {
            Some(text) => {
                let title = format!("Voice memo: {}", truncate_chars(&text, VOICE_TITLE_CHARS));
                (text, title)
            }
            None => (
                format!("Voice recording '{filename}' could not be transcribed."),
                "Voice memo".to_string(),
            ),
        };

        let record = MemoryRecord::new(user_id, content, ContentKind::Voice)
            .with_title(title.unwrap_or(default_title))
            .with_source("upload")
            .with_file(&locator, Some(filename.to_string()));

        self.store_and_index(record).await
    }

    /// Stores an image memory. Content is assembled from the title, any
    /// OCR-extracted text, and an optional description; OCR failure drops
    /// only the extracted-text line.
    #[instrument(skip(self, image), fields(user_id = %user_id, filename = %filename))]
    pub async fn ingest_image(
        &self,
        user_id: &str,
        image: &[u8],
        filename: &str,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<MemoryRecord, anyhow::Error> {
        let locator = self.files.put(image, filename).await?;

        let extracted = match &self.ocr {
            Some(ocr) => match ocr.extract_text(std::path::Path::new(&locator)).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "ocr failed, skipping extracted text");
                    String::new()
                }
            },
            None => String::new(),
        };

        let mut content = format!(
            "Image: {}\n",
            title.as_deref().unwrap_or("Untitled image")
        );
        if !extracted.trim().is_empty() {
            content.push_str(&format!("Text in image: {}\n", extracted.trim()));
        }
        if let Some(description) = &description {
            content.push_str(&format!("Description: {description}"));
        }

        let record = MemoryRecord::new(user_id, content, ContentKind::Image)
            .with_title(title.unwrap_or_else(|| "Image memory".to_string()))
            .with_source("upload")
            .with_file(&locator, Some(filename.to_string()));

        self.store_and_index(record).await
    }

    /// Removes a memory, its vector-index entry, and its backing file.
    /// Returns `false` (a no-op) when the memory does not exist, so a
    /// second delete is harmless.
    #[instrument(skip(self), fields(user_id = %user_id, memory_id = %memory_id))]
    pub async fn delete_memory(
        &self,
        user_id: &str,
        memory_id: &str,
    ) -> Result<bool, anyhow::Error> {
        let Some(record) = self.memories.find_by_id(user_id, memory_id).await? else {
            return Ok(false);
        };

        if let Some(embedding_id) = &record.embedding_id {
            self.index
                .delete(&NamespaceKey::for_user(user_id), embedding_id)
                .await?;
        }
        if let Some(file_path) = &record.file_path {
            self.files.remove(file_path).await?;
        }
        self.memories.delete(memory_id).await?;

        info!("memory deleted");
        Ok(true)
    }

    /// Inserts the row, then the index entry, then marks processed. An
    /// embedding or index failure leaves the row unprocessed for a later
    /// re-index rather than failing the capture.
    async fn store_and_index(
        &self,
        mut record: MemoryRecord,
    ) -> Result<MemoryRecord, anyhow::Error> {
        self.memories.save(&record).await?;

        match self.index_memory(&record).await {
            Ok(embedding_id) => {
                self.memories
                    .mark_processed(&record.id, &embedding_id)
                    .await?;
                record.processed = true;
                record.embedding_id = Some(embedding_id);
            }
            Err(e) => {
                warn!(error = %e, "indexing failed, memory left unprocessed");
            }
        }

        if let Some(annotator) = &self.annotator {
            let annotations = annotator.annotate(&record.content).await;
            self.memories
                .set_annotations(&record.id, &annotations)
                .await?;
            record.annotations = annotations;
        }

        Ok(record)
    }

    async fn index_memory(&self, record: &MemoryRecord) -> Result<String, anyhow::Error> {
        let vector = self.embedder.embed(&record.content).await?;
        let embedding_id = format!(
            "memory_{}_{}",
            record.id,
            &Uuid::new_v4().simple().to_string()[..8]
        );

        let entry = IndexEntry {
            id: embedding_id.clone(),
            document: record.content.clone(),
            vector,
            metadata: EntryMetadata {
                memory_id: Some(record.id.clone()),
                user_id: Some(record.user_id.clone()),
                content_kind: Some(record.content_kind.as_str().to_string()),
                occurred_at: record.occurred_at,
                source: record.source.clone(),
                title: record.title.clone(),
            },
        };
        self.index
            .upsert(&NamespaceKey::for_user(&record.user_id), entry)
            .await?;

        Ok(embedding_id)
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_chars;

    #[test]
    fn truncate_keeps_short_text_intact() {
        assert_eq!(truncate_chars("short", 50), "short");
    }

    #[test]
    fn truncate_appends_ellipsis_past_the_limit() {
        let long = "x".repeat(60);
        let out = truncate_chars(&long, 50);
        assert_eq!(out.len(), 53);
        assert!(out.ends_with("..."));
    }
}
