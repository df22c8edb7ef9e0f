use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted upload: the object-storage reference plus the extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub storage_url: String,
    pub storage_id: String,
    pub text: String,
}

/// Location of an uploaded binary in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub public_id: String,
}

/// Outcome of writing a document keyed by filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Replaced,
}

/// A character window over a document's text.
///
/// `start` and `end` are character offsets, so `content` always equals the
/// characters `[start, end)` of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub content: String,
}

impl StoredDocument {
    pub fn new(filename: impl Into<String>, object: StoredObject, text: String) -> Self {
        Self {
            filename: filename.into(),
            upload_date: Utc::now(),
            storage_url: object.url,
            storage_id: object.public_id,
            text,
        }
    }
}

impl TextChunk {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
