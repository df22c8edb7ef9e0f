//! Fixed-window text chunking with overlap.

use crate::error::ConfigError;
use crate::models::{ChunkingConfig, TextChunk};

/// Splits text into fixed-size, overlapping character windows.
///
/// Every chunk except the last is exactly `chunk_size` characters long and
/// starts `chunk_size - overlap` characters after its predecessor, so the
/// chunks cover the input without gaps.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker, rejecting windows that could not advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk size must be at least 1".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Create a chunker with default settings (1000 characters, 200 overlap).
    pub fn with_defaults() -> Self {
        Self {
            chunk_size: crate::models::DEFAULT_CHUNK_SIZE,
            overlap: crate::models::DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Number of chunks `split` produces for a text of `len` characters.
    pub fn expected_chunks(&self, len: usize) -> usize {
        match len {
            0 => 0,
            n if n <= self.chunk_size => 1,
            n => (n - self.overlap).div_ceil(self.step()),
        }
    }

    /// Split `text` into overlapping chunks.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        // Byte offset of every char boundary, plus the end of the string.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = boundaries.len() - 1;

        let mut chunks = Vec::with_capacity(self.expected_chunks(total));
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            chunks.push(TextChunk {
                index: chunks.len(),
                start,
                end,
                content: text[boundaries[start]..boundaries[end]].to_string(),
            });

            if end == total {
                break;
            }
            start += self.step();
        }

        chunks
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::with_defaults()
    }
}
