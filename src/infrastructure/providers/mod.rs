//! HTTP generation providers.

pub mod anthropic;
pub mod http;
pub mod ollama;
pub mod openai;
pub mod registry;

pub use anthropic::AnthropicProvider;
pub use http::{classify_status, HttpTransport};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use registry::{ProviderRegistry, ProviderSet, ANTHROPIC_KEY_VAR, OPENAI_KEY_VAR};
