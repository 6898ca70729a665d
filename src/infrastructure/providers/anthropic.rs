//! Anthropic Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::HttpTransport;
use crate::domain::ports::{GenerationError, GenerationProvider, GenerationRequest};

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    transport: HttpTransport,
    base_url: String,
    api_key: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(
        transport: HttpTransport,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl GenerationProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: self.max_tokens,
            system: &request.system,
            temperature: request.temperature,
            messages: [Message {
                role: "user",
                content: &request.input,
            }],
        };

        let http = self
            .transport
            .client()
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let response: MessagesResponse = self.transport.send_json(http).await?;
        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(GenerationError::InvalidResponse(
                "response contained no text content".to_string(),
            ));
        }
        Ok(text)
    }
}
