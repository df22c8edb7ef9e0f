mod chunker;
pub mod document_store;
pub mod embedding;
mod extractor;
pub mod generation;
mod index;
mod metrics;
pub mod object_storage;
mod qa;
mod synthesizer;
mod upload;

pub use chunker::TextChunker;
pub use document_store::{DocumentStore, create_document_store};
pub use embedding::{EmbeddingProvider, create_embedding_provider};
pub use extractor::{PdfExtractor, is_pdf};
pub use generation::{TextGenerator, create_text_generator};
pub use index::{ScoredChunk, VectorIndex};
pub use metrics::{MetricsStore, MetricsSummary};
pub use object_storage::{ObjectStorage, create_object_storage};
pub use qa::{QaAnswer, QaPipeline, QaStage};
pub use synthesizer::{AnswerSynthesizer, build_prompt, clean_answer};
pub use upload::UploadService;
