//! PDF text extraction.

use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts the text of every page, in page order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract_path(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(path).await?;
        self.extract_bytes(bytes).await
    }

    /// Parsing runs on the blocking pool. A parser panic surfaces as
    /// [`ExtractError::Malformed`] instead of taking down the worker.
    pub async fn extract_bytes(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        if !is_pdf(&bytes) {
            return Err(ExtractError::NotPdf);
        }

        let size = bytes.len();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| ExtractError::Malformed(format!("parser aborted: {e}")))?
            .map_err(|e| ExtractError::Malformed(e.to_string()))?;

        debug!(bytes = size, characters = text.chars().count(), "Extracted PDF text");
        Ok(text)
    }
}

pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}
