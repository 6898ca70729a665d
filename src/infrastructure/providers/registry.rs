//! Builds one generation provider per backend the roster actually uses.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::anthropic::AnthropicProvider;
use super::http::HttpTransport;
use super::ollama::OllamaProvider;
use super::openai::OpenAiProvider;
use crate::domain::errors::ConfigurationError;
use crate::domain::models::{Config, ProviderEndpoint, ProviderKind};
use crate::domain::ports::GenerationProvider;

pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

pub type ProviderSet = Vec<(ProviderKind, Arc<dyn GenerationProvider>)>;

pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Keys come from config first, then the provider's environment variable.
    pub fn build(kinds: &BTreeSet<ProviderKind>, config: &Config) -> Result<ProviderSet, ConfigurationError> {
        Self::build_with_env(kinds, config, |name| std::env::var(name).ok())
    }

    pub fn build_with_env<F>(
        kinds: &BTreeSet<ProviderKind>,
        config: &Config,
        env: F,
    ) -> Result<ProviderSet, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = Duration::from_secs(config.providers.timeout_secs);
        let mut providers: ProviderSet = Vec::with_capacity(kinds.len());

        for kind in kinds {
            let transport = HttpTransport::new(kind.as_str(), timeout, &config.rate_limit)?;
            let provider: Arc<dyn GenerationProvider> = match kind {
                ProviderKind::Anthropic => {
                    let endpoint = &config.providers.anthropic;
                    let key = api_key(*kind, endpoint, ANTHROPIC_KEY_VAR, &env)?;
                    Arc::new(AnthropicProvider::new(
                        transport,
                        &endpoint.base_url,
                        key,
                        endpoint.max_tokens,
                    ))
                }
                ProviderKind::OpenAi => {
                    let endpoint = &config.providers.openai;
                    let key = api_key(*kind, endpoint, OPENAI_KEY_VAR, &env)?;
                    Arc::new(OpenAiProvider::new(
                        transport,
                        &endpoint.base_url,
                        key,
                        endpoint.max_tokens,
                    ))
                }
                ProviderKind::Ollama => {
                    let endpoint = &config.providers.ollama;
                    Arc::new(OllamaProvider::new(
                        transport,
                        &endpoint.base_url,
                        endpoint.max_tokens,
                    ))
                }
            };
            info!(provider = %kind, "generation provider ready");
            providers.push((*kind, provider));
        }

        Ok(providers)
    }
}

fn api_key<F>(
    kind: ProviderKind,
    endpoint: &ProviderEndpoint,
    env_var: &'static str,
    env: &F,
) -> Result<String, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    endpoint
        .api_key
        .clone()
        .or_else(|| env(env_var))
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ConfigurationError::MissingApiKey {
            provider: kind.to_string(),
            env_var,
        })
}
