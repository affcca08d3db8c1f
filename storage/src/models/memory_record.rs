//! Memory record model: one ingested fact.
//!
//! Maps to the `memories` table and is used by MemoryRepository. JSON
//! columns hold the derived annotations (emotion scores, mentioned
//! people/locations/topics).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of content a memory was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Text,
    Voice,
    Image,
    Document,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Voice => "voice",
            ContentKind::Image => "image",
            ContentKind::Document => "document",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "voice" => ContentKind::Voice,
            "image" => ContentKind::Image,
            "document" => ContentKind::Document,
            _ => ContentKind::Text,
        }
    }
}

/// Derived annotations computed after ingestion.
///
/// Emotion scores use a fixed affect vocabulary (joy, sadness, anger,
/// fear, surprise, disgust, trust, anticipation), each in [0.0, 1.0].
/// Defaults to empty/neutral when the annotation pass fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryAnnotations {
    pub emotions: BTreeMap<String, f32>,
    pub people: Vec<String>,
    pub locations: Vec<String>,
    pub topics: Vec<String>,
}

/// One ingested fact: content, provenance, and processing state.
///
/// Invariant: when embeddings are enabled, a processed memory has exactly
/// one vector-index entry, recorded in `embedding_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub content: String,
    pub content_kind: ContentKind,
    pub original_filename: Option<String>,
    /// File-store locator for voice/image payloads.
    pub file_path: Option<String>,
    /// Where the memory came from: manual, upload, journal, ...
    pub source: Option<String>,
    /// When the memory actually occurred (as opposed to when it was stored).
    pub occurred_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Vector-index entry id; set once the embedding has been inserted.
    pub embedding_id: Option<String>,
    pub processed: bool,
    pub annotations: MemoryAnnotations,
    pub is_private: bool,
}

impl MemoryRecord {
    /// Creates a new record with a generated UUID and current timestamp.
    pub fn new(user_id: impl Into<String>, content: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: None,
            content: content.into(),
            content_kind: kind,
            original_filename: None,
            file_path: None,
            source: None,
            occurred_at: None,
            created_at: Utc::now(),
            updated_at: None,
            embedding_id: None,
            processed: false,
            annotations: MemoryAnnotations::default(),
            is_private: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    pub fn with_file(
        mut self,
        file_path: impl Into<String>,
        original_filename: Option<String>,
    ) -> Self {
        self.file_path = Some(file_path.into());
        self.original_filename = original_filename;
        self
    }
}
