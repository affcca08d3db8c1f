//! # Text Embeddings
//!
//! Defines the embedding service interface used by the vector index and
//! the retrieval layer. Implementations must surface failures as errors;
//! a silent zero vector would poison similarity search downstream.

use async_trait::async_trait;

mod config;
pub use config::{EmbeddingConfig, EnvEmbeddingConfig};

/// Service for generating text embeddings.
///
/// Deterministic for a given model version: the same text embeds to the
/// same vector, which is what makes re-querying a namespace after a
/// restart meaningful.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding vector for a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error>;

    /// Generates embedding vectors for multiple texts in a single API call.
    /// More efficient than calling `embed` in a loop; used by replica
    /// training when rebuilding a derived namespace.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, anyhow::Error>;
}
