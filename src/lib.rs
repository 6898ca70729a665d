//! Docent - catalog question answering with specialist agents
//!
//! Docent reads a document of numbered questions, routes each question to a
//! configured agent (by `@mention` or to the default), gathers supporting
//! evidence from semantic stores, and writes the answers back into the
//! document after every question. The same dispatch path powers one-off
//! questions and an interactive chat.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and ports
//! - **Service Layer** (`services`): parsing, routing, retries, context and processing
//! - **Infrastructure Layer** (`infrastructure`): config, logging, providers, stores, files
//! - **CLI Layer** (`cli`): command-line interface

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{ConfigurationError, ParseError, UnknownMentionError};
pub use domain::models::{
    AgentDefinition, AgentRoster, Answer, AnswerStatus, CatalogDocument, Config, QuestionEntry,
};
pub use domain::ports::{DocumentSink, EvidenceStore, GenerationError, GenerationProvider};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AgentDispatcher, AliasRegistry, CatalogParser, CatalogProcessor, CatalogWriter, ChatSession,
    ConversationContext, RetrievalCombiner, RetryController,
};
