//! Domain layer for Docent
//!
//! Catalog, agent and evidence models, the errors they raise, and the ports
//! infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ConfigurationError, ParseError, UnknownMentionError};
