//! Hugging Face Inference API text-generation backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{TextGenerator, build_client, ensure_success, map_send_error};
use crate::error::GenerationError;
use crate::models::GenerationConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_length: u32,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Clone)]
pub struct HuggingFaceGenerator {
    client: Client,
    base_url: String,
    model: String,
    token: Option<String>,
    max_length: u32,
}

impl HuggingFaceGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.endpoint(),
            model: config.model_name(),
            token: config.api_key.clone(),
            max_length: config.max_length,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_length: self.max_length,
            },
        };

        let mut builder = self.client.post(self.model_url()).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await.map_err(map_send_error)?;

        let generated: Vec<GeneratedText> = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        generated
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| GenerationError::InvalidResponse("empty generation response".into()))
    }

    async fn health_check(&self) -> Result<bool, GenerationError> {
        Ok(self.token.as_deref().is_some_and(|t| !t.is_empty()))
    }
}
