//! Agent configuration source: YAML definitions and role instruction files.

pub mod loader;

pub use loader::AgentRosterLoader;
