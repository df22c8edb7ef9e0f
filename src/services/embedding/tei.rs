//! Client for a self-hosted text-embeddings-inference server.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, build_client, check_count, ensure_success, map_send_error};
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

#[derive(Debug, Clone)]
pub struct TeiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    batch_size: usize,
}

impl TeiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.endpoint(),
            model: config.model_name(),
            batch_size: config.batch_size.max(1) as usize,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embed", self.base_url);
        let request = EmbedRequest {
            inputs: texts,
            truncate: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let EmbedResponse(vectors) = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        check_count(texts.len(), &vectors)?;
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for TeiEmbedder {
    fn name(&self) -> &str {
        "tei"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            all_embeddings.extend(self.embed_single_batch(batch).await?);
        }
        Ok(all_embeddings)
    }

    async fn health_check(&self) -> Result<bool, EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;
        Ok(response.status().is_success())
    }
}
