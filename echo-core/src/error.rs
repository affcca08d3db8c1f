//! Error taxonomy for the echo backend.
//!
//! Only two variants are meant to reach a caller-facing boundary:
//! `NotFound` and `ExhaustedFallback`. Everything upstream-shaped is
//! recovered close to where it happens by degrading output.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchoError {
    /// An external service (embedding, transcription, OCR, generation)
    /// is down or misconfigured. Recoverable by degrading.
    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    /// A referenced memory, replica, or conversation does not exist or
    /// is not owned by the caller.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Every generation provider in the fallback chain failed; carries
    /// the last underlying error for diagnostics.
    #[error("All generation providers failed: {0}")]
    ExhaustedFallback(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EchoError>;
