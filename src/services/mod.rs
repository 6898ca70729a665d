pub mod agent_dispatcher;
pub mod alias_registry;
pub mod catalog_parser;
pub mod catalog_processor;
pub mod catalog_writer;
pub mod chat_session;
pub mod context_accumulator;
pub mod retrieval_combiner;
pub mod retry_controller;

pub use agent_dispatcher::{assemble_input, AgentDispatcher, DispatchError, Dispatched};
pub use alias_registry::AliasRegistry;
pub use catalog_parser::{extract_mention, CatalogParser};
pub use catalog_processor::{
    CatalogProcessor, EntryReport, EntryStatus, NoopObserver, ProcessError, ProcessObserver,
    ProcessOptions, ProcessOutcome, ProcessReport,
};
pub use catalog_writer::CatalogWriter;
pub use chat_session::{parse_chat_input, ChatCommand, ChatSession, CHAT_HELP};
pub use context_accumulator::{ConversationContext, Exchange};
pub use retrieval_combiner::{format_evidence, RetrievalCombiner, NO_EVIDENCE};
pub use retry_controller::{
    console_notifier, BackoffNotice, BackoffNotifier, RateLimitSignal, RetryController,
    RetryError, RetryState,
};
