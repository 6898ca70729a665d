//! The configuration files shipped with the repository load cleanly.

use std::path::Path;

use docent::domain::models::{CapabilitySet, ProviderKind};
use docent::infrastructure::agents::AgentRosterLoader;
use docent::infrastructure::config::ConfigLoader;
use docent::services::AliasRegistry;

fn repo_path(relative: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[test]
fn test_shipped_agents_load() {
    let roster = AgentRosterLoader::new(repo_path("config/agents.yaml"), repo_path("roles"))
        .load()
        .unwrap();

    assert_eq!(roster.len(), 3);
    assert_eq!(roster.default_agent_id(), "research");
    assert_eq!(roster.get("architect").unwrap().tool_capabilities, CapabilitySet::All);
    assert!(roster.providers().contains(&ProviderKind::Anthropic));

    let aliases = AliasRegistry::from_roster(&roster).unwrap();
    for token in ["r", "res", "research", "RESEARCH"] {
        assert_eq!(aliases.resolve(token).unwrap(), "research");
    }
    assert_eq!(aliases.resolve("pm").unwrap(), "project_lead");
    assert_eq!(aliases.resolve("@arch").unwrap(), "architect");
    assert!(aliases.resolve("unknown").is_err());
}

#[test]
fn test_example_config_is_valid() {
    let config = temp_env::with_vars_unset(
        ["DOCENT_LOGGING__LEVEL", "DOCENT_RETRIEVAL__BACKEND"],
        || ConfigLoader::load_from_file(repo_path("config/docent.example.yaml")),
    )
    .unwrap();

    assert_eq!(config.retry.schedule_secs, vec![60, 120, 240]);
    assert_eq!(config.retrieval.global_store.collection, "knowledge_base");
    assert_eq!(config.context.max_exchanges, None);
}
