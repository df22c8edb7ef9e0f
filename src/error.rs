//! Error types for the PDF question-answering service.

use thiserror::Error;

use crate::services::QaStage;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("missing setting: {0}")]
    MissingSetting(String),
}

/// Errors related to PDF text extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file is not a PDF")]
    NotPdf,

    #[error("malformed PDF: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors related to object storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to object storage: {0}")]
    ConnectionError(String),

    #[error("object storage error: {0}")]
    ServerError(String),

    #[error("invalid object storage response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors related to the document database.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("failed to connect to document store: {0}")]
    ConnectionError(String),

    #[error("document query error: {0}")]
    QueryError(String),

    #[error("document write error: {0}")]
    WriteError(String),

    #[error("corrupt document record: {0}")]
    CorruptRecord(String),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding provider: {0}")]
    ConnectionError(String),

    #[error("embedding provider error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to text generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to connect to generation provider: {0}")]
    ConnectionError(String),

    #[error("generation provider returned status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation timeout")]
    Timeout,
}

/// Errors raised while building or querying the in-memory vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{chunks} chunks but {vectors} vectors")]
    LengthMismatch { chunks: usize, vectors: usize },

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index shape error: {0}")]
    ShapeError(String),
}

/// Errors produced by the question-answering pipeline.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl QaError {
    /// The pipeline stage at which the request failed.
    pub fn failed_at(&self) -> QaStage {
        match self {
            QaError::InvalidRequest(_) => QaStage::Received,
            QaError::DocumentNotFound(_) | QaError::DocumentStore(_) => QaStage::Lookup,
            QaError::Embedding(_) => QaStage::Embed,
            QaError::Index(_) => QaStage::Index,
            QaError::Generation(_) => QaStage::Synthesize,
        }
    }

    /// True when the failure came from an external provider.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            QaError::Embedding(_) | QaError::Index(_) | QaError::Generation(_)
        )
    }
}

/// Errors produced while handling an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload: {0}")]
    InvalidRequest(String),

    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("question answering error: {0}")]
    Qa(#[from] QaError),

    #[error("upload error: {0}")]
    Upload(#[from] UploadError),
}
