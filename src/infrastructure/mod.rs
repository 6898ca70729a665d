//! Infrastructure layer module
//!
//! Adapters behind the domain ports and the startup plumbing:
//! - Configuration management (figment)
//! - Agent definitions and role files
//! - Logging infrastructure
//! - HTTP generation providers
//! - Evidence stores
//! - Catalog files on disk

pub mod agents;
pub mod config;
pub mod documents;
pub mod evidence;
pub mod logging;
pub mod providers;
