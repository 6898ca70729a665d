pub mod agent_definition;
pub mod catalog;
pub mod config;
pub mod retrieval;

pub use agent_definition::{
    AgentDefinition, AgentRoster, CapabilitySet, ProviderConfig, ProviderKind, ToolCapability,
};
pub use catalog::{Answer, AnswerStatus, CatalogDocument, LineEnding, QuestionEntry, SourceSpan};
pub use config::{
    CollectionConfig, Config, ContextConfig, EmbeddingConfig, LoggingConfig, ProviderEndpoint,
    ProvidersConfig, RateLimitConfig, RetrievalBackend, RetrievalConfig, RetryConfig,
};
pub use retrieval::{RetrievalResult, SourceLabel};
