//! Shared application state, built once at startup.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{ComponentStatus, Config, StatusResponse};
use crate::services::{
    AnswerSynthesizer, DocumentStore, EmbeddingProvider, MetricsStore, ObjectStorage, QaPipeline,
    TextChunker, TextGenerator, UploadService, create_document_store, create_embedding_provider,
    create_object_storage, create_text_generator,
};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub documents: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub generator: Arc<dyn TextGenerator>,
    pub metrics: Option<Arc<MetricsStore>>,
    chunker: TextChunker,
}

impl AppContext {
    /// Validate `config` and connect every collaborator it selects.
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        config.validate()?;

        let documents = create_document_store(&config.document_store).await?;
        let storage = create_object_storage(&config.storage)?;
        let embedder = create_embedding_provider(&config.embedding)?;
        let generator = create_text_generator(&config.generation)?;
        let metrics = open_metrics(&config);

        info!(
            document_store = documents.driver(),
            object_storage = storage.name(),
            embedding = embedder.name(),
            generation = generator.name(),
            "Application context ready"
        );

        Self::new(config, documents, storage, embedder, generator, metrics)
    }

    /// Assemble a context from already-built collaborators.
    pub fn new(
        config: Config,
        documents: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStorage>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn TextGenerator>,
        metrics: Option<Arc<MetricsStore>>,
    ) -> Result<Self, AppError> {
        let chunker = TextChunker::from_config(&config.chunking)?;
        Ok(Self {
            config: Arc::new(config),
            documents,
            storage,
            embedder,
            generator,
            metrics,
            chunker,
        })
    }

    pub fn qa_pipeline(&self) -> QaPipeline {
        QaPipeline::new(
            self.documents.clone(),
            self.embedder.clone(),
            AnswerSynthesizer::new(self.generator.clone()),
            self.chunker.clone(),
            self.config.retrieval.top_k,
        )
    }

    pub fn upload_service(&self) -> UploadService {
        UploadService::new(
            self.storage.clone(),
            self.documents.clone(),
            self.config.server.temp_dir.clone(),
        )
    }

    pub fn record_request(&self, endpoint: &str, latency_ms: u64, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record(endpoint, latency_ms, success);
        }
    }

    /// Check every collaborator. Failures are reported, never returned.
    pub async fn status(&self) -> StatusResponse {
        let document_store = component(
            self.documents.driver(),
            None,
            self.documents.health_check().await.map_err(|e| e.to_string()),
        );
        let object_storage = component(
            self.storage.name(),
            None,
            self.storage.health_check().await.map_err(|e| e.to_string()),
        );
        let embedding = component(
            self.embedder.name(),
            Some(self.embedder.model()),
            self.embedder.health_check().await.map_err(|e| e.to_string()),
        );
        let generation = component(
            self.generator.name(),
            Some(self.generator.model()),
            self.generator.health_check().await.map_err(|e| e.to_string()),
        );

        let documents = self.documents.count().await.ok();
        let metrics = self
            .metrics
            .as_ref()
            .map(|m| m.get_summary(self.config.metrics.retention_days));

        StatusResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            document_store,
            object_storage,
            embedding,
            generation,
            documents,
            metrics,
        }
    }
}

fn component(driver: &str, model: Option<&str>, health: Result<bool, String>) -> ComponentStatus {
    let (healthy, error) = match health {
        Ok(healthy) => (healthy, None),
        Err(e) => (false, Some(e)),
    };
    ComponentStatus {
        driver: driver.to_string(),
        model: model.map(str::to_string),
        healthy,
        error,
    }
}

/// Metrics are best-effort: a store that cannot be opened disables them.
fn open_metrics(config: &Config) -> Option<Arc<MetricsStore>> {
    if !config.metrics.enabled {
        return None;
    }
    let path = Config::metrics_db_path()?;
    match MetricsStore::open(&path) {
        Ok(store) => {
            let purged = store.cleanup(config.metrics.retention_days);
            if purged > 0 {
                info!(purged, "Purged expired metrics");
            }
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!("Failed to open metrics store at {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context::local_context;
    use crate::testing::mock::MockUpstream;

    #[tokio::test]
    async fn test_status_reports_components() {
        let upstream = MockUpstream::start().await;
        let dir = tempfile::tempdir().unwrap();
        let ctx = local_context(&upstream, dir.path());

        let status = ctx.status().await;
        assert_eq!(status.document_store.driver, "sqlite");
        assert!(status.document_store.healthy);
        assert_eq!(status.object_storage.driver, "local");
        assert_eq!(status.embedding.driver, "tei");
        assert!(status.embedding.healthy);
        assert_eq!(status.generation.driver, "huggingface");
        assert_eq!(status.documents, Some(0));
        assert!(status.metrics.is_some());
    }

    #[tokio::test]
    async fn test_from_config_rejects_invalid() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(
            AppContext::from_config(config).await,
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_record_request_without_metrics_is_noop() {
        let upstream = MockUpstream::start().await;
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = local_context(&upstream, dir.path());
        ctx.metrics = None;
        ctx.record_request("/ask_question/", 5, true);
        assert!(ctx.status().await.metrics.is_none());
    }
}
