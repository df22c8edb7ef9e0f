//! Request and response shapes shared by the HTTP API and the CLI.

use serde::{Deserialize, Serialize};

use crate::services::MetricsSummary;

/// Body of `POST /ask_question/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskQuestionRequest {
    pub filename: String,
    pub question: String,
}

impl AskQuestionRequest {
    pub fn new(filename: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            question: question.into(),
        }
    }
}

/// Answer returned to the caller; the question is echoed verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub answer: String,
}

/// Body of a successful `POST /upload_pdf/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
}

impl UploadResponse {
    pub fn for_file(filename: &str) -> Self {
        Self {
            message: format!("File '{filename}' uploaded successfully to Cloudinary."),
        }
    }
}

/// What the upload service did with one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub storage_url: String,
    pub storage_id: String,
    /// Characters of extracted text.
    pub characters: usize,
    /// An earlier document with the same filename was overwritten.
    pub replaced: bool,
}

/// Body of every HTTP error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Snapshot of the collaborators behind the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub document_store: ComponentStatus,
    pub object_storage: ComponentStatus,
    pub embedding: ComponentStatus,
    pub generation: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub driver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
