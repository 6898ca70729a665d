use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for Docent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Path to the agent definitions file
    #[serde(default = "default_agents_file")]
    pub agents_file: PathBuf,

    /// Directory holding role instruction files
    #[serde(default = "default_roles_dir")]
    pub roles_dir: PathBuf,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Backoff schedule for upstream rate-limit signals
    #[serde(default)]
    pub retry: RetryConfig,

    /// Client-side throttling of outbound generation calls
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Generation provider endpoints and credentials
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Evidence store configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Transcript rendering
    #[serde(default)]
    pub context: ContextConfig,
}

fn default_agents_file() -> PathBuf {
    PathBuf::from("config/agents.yaml")
}

fn default_roles_dir() -> PathBuf {
    PathBuf::from("roles")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agents_file: default_agents_file(),
            roles_dir: default_roles_dir(),
            logging: LoggingConfig::default(),
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
            providers: ProvidersConfig::default(),
            retrieval: RetrievalConfig::default(),
            context: ContextConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling JSON log files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file logs: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Seconds to wait before each retry; its length is the retry budget
    #[serde(default = "default_schedule_secs")]
    pub schedule_secs: Vec<u64>,
}

fn default_schedule_secs() -> Vec<u64> {
    vec![60, 120, 240]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            schedule_secs: default_schedule_secs(),
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_minute() -> u32 {
    50
}

const fn default_burst_size() -> u32 {
    5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            burst_size: default_burst_size(),
        }
    }
}

/// Settings for one HTTP generation backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderEndpoint {
    pub base_url: String,

    /// Falls back to the provider's conventional environment variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_max_tokens() -> u32 {
    4096
}

impl ProviderEndpoint {
    fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
            max_tokens: default_max_tokens(),
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProvidersConfig {
    #[serde(default = "default_anthropic")]
    pub anthropic: ProviderEndpoint,

    #[serde(default = "default_openai")]
    pub openai: ProviderEndpoint,

    #[serde(default = "default_ollama")]
    pub ollama: ProviderEndpoint,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_anthropic() -> ProviderEndpoint {
    ProviderEndpoint::with_base_url("https://api.anthropic.com")
}

fn default_openai() -> ProviderEndpoint {
    ProviderEndpoint::with_base_url("https://api.openai.com")
}

fn default_ollama() -> ProviderEndpoint {
    ProviderEndpoint::with_base_url("http://localhost:11434")
}

const fn default_timeout_secs() -> u64 {
    300
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            anthropic: default_anthropic(),
            openai: default_openai(),
            ollama: default_ollama(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which evidence store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalBackend {
    Chroma,
    Disabled,
}

/// A named collection in the evidence store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CollectionConfig {
    pub collection: String,
}

/// Query embedding model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embedding_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "embeddinggemma".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    #[serde(default = "default_backend")]
    pub backend: RetrievalBackend,

    /// Chroma server URL
    #[serde(default = "default_retrieval_url")]
    pub url: String,

    #[serde(default = "default_project_store")]
    pub project_store: CollectionConfig,

    #[serde(default = "default_global_store")]
    pub global_store: CollectionConfig,

    /// Metadata field the project filter matches on
    #[serde(default = "default_project_filter_field")]
    pub project_filter_field: String,

    #[serde(default = "default_project_top_k")]
    pub project_top_k: usize,

    #[serde(default = "default_global_top_k")]
    pub global_top_k: usize,

    /// Chunks longer than this are truncated
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

const fn default_backend() -> RetrievalBackend {
    RetrievalBackend::Chroma
}

fn default_retrieval_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_project_store() -> CollectionConfig {
    CollectionConfig {
        collection: "rag_collection".to_string(),
    }
}

fn default_global_store() -> CollectionConfig {
    CollectionConfig {
        collection: "knowledge_base".to_string(),
    }
}

fn default_project_filter_field() -> String {
    "project_id".to_string()
}

const fn default_project_top_k() -> usize {
    5
}

const fn default_global_top_k() -> usize {
    3
}

const fn default_max_chunk_chars() -> usize {
    500
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_retrieval_url(),
            project_store: default_project_store(),
            global_store: default_global_store(),
            project_filter_field: default_project_filter_field(),
            project_top_k: default_project_top_k(),
            global_top_k: default_global_top_k(),
            max_chunk_chars: default_max_chunk_chars(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Transcript configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContextConfig {
    /// Keep only the most recent N exchanges in the rendered transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_exchanges: Option<usize>,
}
