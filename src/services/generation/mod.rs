//! Hosted text generation backends.

mod huggingface;
mod openai;

pub use huggingface::HuggingFaceGenerator;
pub use openai::OpenAiGenerator;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::error::GenerationError;
use crate::models::{GenerationConfig, GenerationDriver};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Run one completion for `prompt` and return the raw generated text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    async fn health_check(&self) -> Result<bool, GenerationError>;
}

pub fn create_text_generator(
    config: &GenerationConfig,
) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    Ok(match config.driver {
        GenerationDriver::HuggingFace => Arc::new(HuggingFaceGenerator::new(config)?),
        GenerationDriver::OpenAI => Arc::new(OpenAiGenerator::new(config)?),
    })
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, GenerationError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GenerationError::ConnectionError(e.to_string()))
}

pub(crate) fn map_send_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout
    } else if e.is_connect() {
        GenerationError::ConnectionError(e.to_string())
    } else {
        GenerationError::RequestError(e)
    }
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response, GenerationError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(GenerationError::ServerError { status, body })
}
