use std::path::Path;
use std::sync::Arc;

use super::mock::MockUpstream;
use crate::context::AppContext;
use crate::models::{
    Config, EmbeddingConfig, EmbeddingDriver, GenerationConfig, StorageDriver,
};
use crate::services::MetricsStore;
use crate::services::document_store::SqliteDocumentStore;
use crate::services::embedding::TeiEmbedder;
use crate::services::generation::HuggingFaceGenerator;
use crate::services::object_storage::LocalStorage;

/// A context with in-memory SQLite stores, local object storage under `dir`
/// and both providers pointed at `upstream`.
pub fn local_context(upstream: &MockUpstream, dir: &Path) -> AppContext {
    let mut config = Config::default();
    config.storage.driver = StorageDriver::Local;
    config.storage.local_dir = Some(dir.join("objects"));
    config.server.temp_dir = Some(dir.join("tmp"));
    config.embedding = EmbeddingConfig {
        driver: EmbeddingDriver::Tei,
        url: Some(upstream.url()),
        ..Default::default()
    };
    config.generation = GenerationConfig {
        url: Some(upstream.url()),
        api_key: Some("hf-test".to_string()),
        ..Default::default()
    };
    config.metrics.enabled = true;

    let documents = Arc::new(SqliteDocumentStore::in_memory().unwrap());
    let storage = Arc::new(LocalStorage::new(dir.join("objects")).unwrap());
    let embedder = Arc::new(TeiEmbedder::new(&config.embedding).unwrap());
    let generator = Arc::new(HuggingFaceGenerator::new(&config.generation).unwrap());
    let metrics = Arc::new(MetricsStore::in_memory().unwrap());

    AppContext::new(config, documents, storage, embedder, generator, Some(metrics)).unwrap()
}
