//! OpenAI-compatible `/embeddings` backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, build_client, check_count, ensure_success, map_send_error};
use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    batch_size: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.endpoint(),
            model: config.model_name(),
            api_key: config.api_key.clone(),
            batch_size: config.batch_size.max(1) as usize,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(map_send_error)?;

        let body: EmbeddingsResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let vectors = into_ordered(body.data);
        check_count(texts.len(), &vectors)?;
        Ok(vectors)
    }
}

/// Order entries by their `index` field; the API does not promise input order.
fn into_ordered(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
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
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmbeddingDriver;
    use crate::testing::mock::{MockUpstream, embed_vectors};

    fn config(url: &str, batch_size: u32) -> EmbeddingConfig {
        EmbeddingConfig {
            driver: EmbeddingDriver::OpenAI,
            url: Some(url.to_string()),
            api_key: Some("sk-test".to_string()),
            batch_size,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_embed_documents_in_input_order() {
        let upstream = MockUpstream::start().await;
        let embedder = OpenAiEmbedder::new(&config(&upstream.url(), 2)).unwrap();

        let texts: Vec<String> = ["The sky is blue.", "Grass is green.", "Snow is white."]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let vectors = embedder.embed_documents(&texts).await.unwrap();

        assert_eq!(vectors, embed_vectors(&texts));
        assert_eq!(upstream.embed_calls(), 2);
        assert_eq!(upstream.last_authorization().as_deref(), Some("Bearer sk-test"));
    }

    #[tokio::test]
    async fn test_rejected_key_is_server_error() {
        let upstream = MockUpstream::start().await;
        upstream.fail_embeddings(true);
        let embedder = OpenAiEmbedder::new(&config(&upstream.url(), 8)).unwrap();

        let err = embedder.embed_query("What color?").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ServerError(ref s) if s.contains("401")));
    }

    #[test]
    fn test_response_reordered_by_index() {
        let body: EmbeddingsResponse = serde_json::from_str(
            r#"{"object": "list", "data": [
                {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
            ], "model": "text-embedding-ada-002"}"#,
        )
        .unwrap();

        let vectors = into_ordered(body.data);
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_request_shape() {
        let input = vec!["The sky is blue.".to_string()];
        let request = EmbeddingsRequest {
            model: "text-embedding-ada-002",
            input: &input,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "text-embedding-ada-002");
        assert_eq!(json["input"][0], "The sky is blue.");
    }
}
