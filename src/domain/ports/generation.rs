//! Generation provider port.
//!
//! A provider turns a system prompt plus one assembled user input into answer
//! text. Adapters map their transport failures onto [`GenerationError`] so the
//! retry controller can tell a rate-limit signal from everything else.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::AgentDefinition;

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Role instructions for the agent.
    pub system: String,
    /// Transcript, evidence and question, already assembled.
    pub input: String,
    pub model: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn for_agent(agent: &AgentDefinition, input: impl Into<String>) -> Self {
        Self {
            system: agent.role_instructions.clone(),
            input: input.into(),
            model: agent.provider_config.model.clone(),
            temperature: agent.provider_config.temperature,
        }
    }
}

/// Failures reported by a generation provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// The distinguished throttling condition; everything else is a plain failure.
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Port for language-generation backends.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name used in logs (e.g. "anthropic").
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limited_is_rate_limit() {
        let limited = GenerationError::RateLimited {
            message: "slow down".to_string(),
            retry_after_secs: Some(30),
        };
        assert!(limited.is_rate_limit());
        assert!(!GenerationError::Timeout.is_rate_limit());
        assert!(!GenerationError::Api {
            status: 500,
            body: "oops".to_string()
        }
        .is_rate_limit());
    }
}
