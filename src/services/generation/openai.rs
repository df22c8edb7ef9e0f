//! OpenAI-compatible chat completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{TextGenerator, build_client, ensure_success, map_send_error};
use crate::error::GenerationError;
use crate::models::GenerationConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.endpoint(),
            model: config.model_name(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_length,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await.map_err(map_send_error)?;

        let body: ChatResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::InvalidResponse("no completion returned".into()))
    }

    async fn health_check(&self) -> Result<bool, GenerationError> {
        let url = format!("{}/models", self.base_url);
        let mut builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| GenerationError::ConnectionError(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationDriver;
    use crate::testing::mock::MockUpstream;

    fn config(url: &str) -> GenerationConfig {
        GenerationConfig {
            driver: GenerationDriver::OpenAI,
            url: Some(url.to_string()),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_returns_reply() {
        let upstream = MockUpstream::start().await;
        let generator = OpenAiGenerator::new(&config(&upstream.url())).unwrap();

        let text = generator.generate("Question: sky?\nHelpful Answer:").await.unwrap();
        assert_eq!(text, "The sky is blue.");
        assert_eq!(
            upstream.last_prompt().as_deref(),
            Some("Question: sky?\nHelpful Answer:")
        );
        assert_eq!(upstream.last_authorization().as_deref(), Some("Bearer sk-test"));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let upstream = MockUpstream::start().await;
        upstream.fail_generation(true);
        let generator = OpenAiGenerator::new(&config(&upstream.url())).unwrap();

        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::ServerError { status: 503, .. }));
    }

    #[test]
    fn test_parse_chat_response() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"id": "chatcmpl-1", "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Blue."}, "finish_reason": "stop"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("Blue."));
    }

    #[test]
    fn test_request_uses_max_tokens() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 150,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
