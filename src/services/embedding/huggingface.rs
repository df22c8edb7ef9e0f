//! Hugging Face Inference API feature-extraction backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, build_client, check_count, ensure_success, map_send_error};
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

#[derive(Debug, Serialize)]
struct FeatureRequest<'a> {
    inputs: &'a [String],
    options: FeatureOptions,
}

#[derive(Debug, Serialize)]
struct FeatureOptions {
    wait_for_model: bool,
}

/// The API answers in one of several shapes depending on the model.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureResponse {
    /// One pooled vector per input.
    Batch(Vec<Vec<f32>>),
    /// Token-level vectors per input; the first row is used.
    Nested(Vec<Vec<Vec<f32>>>),
    /// A single vector for a single input.
    Direct(Vec<f32>),
}

impl FeatureResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            FeatureResponse::Batch(vectors) => vectors,
            FeatureResponse::Nested(nested) => nested
                .into_iter()
                .filter_map(|rows| rows.into_iter().next())
                .collect(),
            FeatureResponse::Direct(vector) => vec![vector],
        }
    }
}

#[derive(Debug, Clone)]
pub struct HuggingFaceEmbedder {
    client: Client,
    base_url: String,
    model: String,
    token: Option<String>,
    batch_size: usize,
}

impl HuggingFaceEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.endpoint(),
            model: config.model_name(),
            token: config.api_key.clone(),
            batch_size: config.batch_size.max(1) as usize,
        })
    }

    fn pipeline_url(&self) -> String {
        format!(
            "{}/models/{}/pipeline/feature-extraction",
            self.base_url, self.model
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = FeatureRequest {
            inputs: texts,
            options: FeatureOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .authorize(self.client.post(self.pipeline_url()))
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let body: FeatureResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let vectors = body.into_vectors();
        check_count(texts.len(), &vectors)?;
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    fn name(&self) -> &str {
        "huggingface"
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

    /// Checking the hosted API would spend rate-limit quota, so only the
    /// token is checked.
    async fn health_check(&self) -> Result<bool, EmbeddingError> {
        Ok(self.token.as_deref().is_some_and(|t| !t.is_empty()))
    }
}
