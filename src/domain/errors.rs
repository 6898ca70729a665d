//! Domain errors for catalog processing.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems, surfaced before any document is processed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Agent configuration file not found: {}", .0.display())]
    AgentsFileMissing(PathBuf),

    #[error("Malformed agent configuration in {}: {reason}", .path.display())]
    MalformedAgentsFile { path: PathBuf, reason: String },

    #[error("No agents are defined")]
    NoAgents,

    #[error("Default agent '{0}' is not defined")]
    UnknownDefaultAgent(String),

    #[error("Alias '{alias}' is claimed by both '{first}' and '{second}'")]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Agent '{agent}' has an empty alias")]
    EmptyAlias { agent: String },

    #[error("Agent '{agent}' uses unsupported provider '{provider}'. Supported providers: anthropic, openai, ollama")]
    UnknownProvider { agent: String, provider: String },

    #[error("Agent '{agent}' has invalid temperature {value}. Must be between 0.0 and 2.0")]
    InvalidTemperature { agent: String, value: f32 },

    #[error("Agent '{agent}' has invalid max_iterations 0. Must be at least 1")]
    InvalidMaxIterations { agent: String },

    #[error("Role file for agent '{agent}' not found: {}", .path.display())]
    MissingRoleFile { agent: String, path: PathBuf },

    #[error("Role instructions for agent '{agent}' are empty")]
    EmptyRoleInstructions { agent: String },

    #[error("Provider '{provider}' requires an API key (set {env_var} or providers.{provider}.api_key)")]
    MissingApiKey {
        provider: String,
        env_var: &'static str,
    },

    #[error("Provider '{provider}' could not be initialised: {reason}")]
    ProviderInit { provider: String, reason: String },

    #[error("Evidence store could not be initialised: {0}")]
    EvidenceStoreInit(String),
}

/// A document that cannot be processed at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("No questions found. Questions must be numbered list items (1. 2. 3.) with optional @agent mentions")]
    NoQuestions,
}

/// A mention token that matches no configured alias.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown agent '@{token}'")]
pub struct UnknownMentionError {
    pub token: String,
}

impl UnknownMentionError {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}
