mod config;
mod document;
mod format;
mod qa;

pub use config::{
    ChunkingConfig, Config, DEFAULT_ADDRESS, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_MAX_LENGTH, DEFAULT_TOP_K, DocumentDriver, DocumentStoreConfig, EmbeddingConfig,
    EmbeddingDriver, GenerationConfig, GenerationDriver, MetricsConfig, ResolvedConfig,
    RetrievalConfig, ServerConfig, StorageConfig, StorageDriver,
};
pub use document::{InsertOutcome, StoredDocument, StoredObject, TextChunk};
pub use format::OutputFormat;
pub use qa::{
    AskQuestionRequest, ComponentStatus, ErrorBody, HealthResponse, QueryResult, StatusResponse,
    UploadReceipt, UploadResponse,
};
