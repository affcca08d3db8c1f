//! # Ingest
//!
//! Turns raw captures (text, voice recordings, images) into stored,
//! indexed memories.
//!
//! ## Pipeline
//!
//! 1. Derive text content (verbatim, transcription, or OCR + description)
//! 2. Insert the database row
//! 3. Embed the content and upsert the vector-index entry
//! 4. Mark the row processed
//! 5. Optional annotation pass (emotions + entities)
//!
//! Transcription, OCR, embedding, and annotation all degrade gracefully:
//! a failed enrichment never loses the capture itself.
//!
//! ## External interactions
//!
//! - **OpenAI Whisper API**: voice transcription
//! - **tesseract**: OCR subprocess
//! - **LLM APIs**: annotation pass via a generation backend

mod annotate;
mod file_store;
mod ingestor;
mod ocr;
mod speech;

pub use annotate::Annotator;
pub use file_store::{FileStore, LocalFileStore};
pub use ingestor::{MemoryIngestor, TextMemoryInput};
pub use ocr::{OcrEngine, TesseractOcr};
pub use speech::{SpeechToText, WhisperTranscriber};
