//! Embedding provider abstraction.
//!
//! Backends turn chunk text and questions into fixed-dimension vectors. The
//! active backend is chosen by `embedding.driver`.

mod huggingface;
mod openai;
mod tei;

pub use huggingface::HuggingFaceEmbedder;
pub use openai::OpenAiEmbedder;
pub use tei::TeiEmbedder;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::error::EmbeddingError;
use crate::models::{EmbeddingConfig, EmbeddingDriver};

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Backend name as it appears in configuration.
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Embed `texts`, returning one vector per input in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        match vectors.pop() {
            Some(vector) if vectors.is_empty() => Ok(vector),
            _ => Err(EmbeddingError::InvalidResponse(
                "expected exactly one query embedding".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> Result<bool, EmbeddingError>;
}

/// Create the embedding backend selected by configuration.
pub fn create_embedding_provider(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    Ok(match config.driver {
        EmbeddingDriver::OpenAI => Arc::new(OpenAiEmbedder::new(config)?),
        EmbeddingDriver::HuggingFace => Arc::new(HuggingFaceEmbedder::new(config)?),
        EmbeddingDriver::Tei => Arc::new(TeiEmbedder::new(config)?),
    })
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, EmbeddingError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))
}

pub(crate) fn map_send_error(e: reqwest::Error) -> EmbeddingError {
    if e.is_timeout() {
        EmbeddingError::Timeout
    } else if e.is_connect() {
        EmbeddingError::ConnectionError(e.to_string())
    } else {
        EmbeddingError::RequestError(e)
    }
}

/// Turn a non-2xx response into a `ServerError` carrying status and body.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, EmbeddingError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(EmbeddingError::ServerError(format!("status {status}: {body}")))
}

pub(crate) fn check_count(expected: usize, vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
    if vectors.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {expected} embeddings, got {}",
            vectors.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_driver() {
        let config = EmbeddingConfig {
            driver: EmbeddingDriver::Tei,
            ..Default::default()
        };
        let provider = create_embedding_provider(&config).unwrap();
        assert_eq!(provider.name(), "tei");

        let config = EmbeddingConfig {
            driver: EmbeddingDriver::OpenAI,
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let provider = create_embedding_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "text-embedding-ada-002");
    }

    #[test]
    fn test_check_count() {
        assert!(check_count(2, &[vec![1.0], vec![2.0]]).is_ok());
        assert!(matches!(
            check_count(2, &[vec![1.0]]),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }
}
