//! Local Ollama chat endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::HttpTransport;
use crate::domain::ports::{GenerationError, GenerationProvider, GenerationRequest};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: [ChatMessage<'a>; 2],
    options: Options,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// No API key; the base URL usually points at localhost.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    transport: HttpTransport,
    base_url: String,
    max_tokens: u32,
}

impl OllamaProvider {
    pub fn new(transport: HttpTransport, base_url: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_tokens,
        }
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &request.model,
            stream: false,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.input,
                },
            ],
            options: Options {
                temperature: request.temperature,
                num_predict: self.max_tokens,
            },
        };

        let http = self
            .transport
            .client()
            .post(format!("{}/api/chat", self.base_url))
            .json(&body);

        let response: ChatResponse = self.transport.send_json(http).await?;
        response
            .message
            .map(|m| m.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| GenerationError::InvalidResponse("response contained no message".to_string()))
    }
}
