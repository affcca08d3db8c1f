//! OCR for image memories.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Extracts text from an image file.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image_path: &Path) -> Result<String, anyhow::Error>;
}

/// OCR via the `tesseract` binary, reading its stdout.
#[derive(Debug, Clone, Default)]
pub struct TesseractOcr;

impl TesseractOcr {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    #[instrument(skip(self), fields(path = %image_path.display()))]
    async fn extract_text(&self, image_path: &Path) -> Result<String, anyhow::Error> {
        info!("step: ocr subprocess");

        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = ?output.status.code(), stderr = %stderr, "tesseract failed");
            anyhow::bail!("tesseract exited with {}: {}", output.status, stderr);
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(text_len = text.len(), "step: ocr done");
        Ok(text)
    }
}
