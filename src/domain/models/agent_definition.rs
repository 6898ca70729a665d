//! Agent definitions loaded from the agent configuration source.
//!
//! Definitions are immutable for the duration of a run. They are collected
//! into an [`AgentRoster`] which the alias registry and the dispatcher share.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigurationError;

/// Backend that serves generation calls for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(other.to_string()),
        }
    }
}

/// Model parameters for an agent's generation calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub temperature: f32,
    pub max_iterations: u32,
}

/// A capability an agent may use while answering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ToolCapability {
    /// Query the project and global evidence stores.
    KnowledgeBase,
    /// A configured tool the dispatcher does not drive itself.
    Named(String),
}

impl ToolCapability {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "query_knowledge_base" | "knowledge_base" => Self::KnowledgeBase,
            other => Self::Named(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::KnowledgeBase => "query_knowledge_base",
            Self::Named(name) => name,
        }
    }
}

/// The tools available to one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CapabilitySet {
    /// Wildcard: every capability.
    All,
    Only(BTreeSet<ToolCapability>),
}

impl CapabilitySet {
    /// Build a set from configured tool names; `all` anywhere makes it a wildcard.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tools = BTreeSet::new();
        for name in names {
            let name = name.as_ref();
            if name.trim().eq_ignore_ascii_case("all") {
                return Self::All;
            }
            if !name.trim().is_empty() {
                tools.insert(ToolCapability::parse(name));
            }
        }
        Self::Only(tools)
    }

    pub fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    pub fn allows(&self, capability: &ToolCapability) -> bool {
        match self {
            Self::All => true,
            Self::Only(tools) => tools.contains(capability),
        }
    }

    pub fn names(&self) -> Vec<String> {
        match self {
            Self::All => vec!["all".to_string()],
            Self::Only(tools) => tools.iter().map(|t| t.name().to_string()).collect(),
        }
    }
}

/// A configured specialist agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDefinition {
    pub id: String,
    pub display_name: String,
    /// Extra mention tokens, lowercased. The id is always an implicit alias.
    pub aliases: BTreeSet<String>,
    pub role_instructions: String,
    pub provider_config: ProviderConfig,
    pub tool_capabilities: CapabilitySet,
}

impl AgentDefinition {
    /// Every token that resolves to this agent, id first.
    pub fn mention_tokens(&self) -> Vec<String> {
        let id = self.id.to_lowercase();
        let mut tokens = vec![id.clone()];
        tokens.extend(self.aliases.iter().filter(|a| **a != id).cloned());
        tokens
    }

    pub fn can_query_knowledge_base(&self) -> bool {
        self.tool_capabilities
            .allows(&ToolCapability::KnowledgeBase)
    }
}

/// All configured agents plus the one used when a question names none.
#[derive(Debug, Clone)]
pub struct AgentRoster {
    agents: BTreeMap<String, AgentDefinition>,
    default_agent: String,
}

impl AgentRoster {
    pub fn new(
        agents: Vec<AgentDefinition>,
        default_agent: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        if agents.is_empty() {
            return Err(ConfigurationError::NoAgents);
        }

        let default_agent = default_agent.into();
        let agents: BTreeMap<_, _> = agents.into_iter().map(|a| (a.id.clone(), a)).collect();

        if !agents.contains_key(&default_agent) {
            return Err(ConfigurationError::UnknownDefaultAgent(default_agent));
        }

        Ok(Self {
            agents,
            default_agent,
        })
    }

    pub fn get(&self, id: &str) -> Option<&AgentDefinition> {
        self.agents.get(id)
    }

    pub fn default_agent(&self) -> &AgentDefinition {
        // Presence checked in `new`.
        &self.agents[&self.default_agent]
    }

    pub fn default_agent_id(&self) -> &str {
        &self.default_agent
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Distinct providers referenced by any agent.
    pub fn providers(&self) -> BTreeSet<ProviderKind> {
        self.agents
            .values()
            .map(|a| a.provider_config.provider)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str) -> AgentDefinition {
        AgentDefinition {
            id: id.to_string(),
            display_name: id.to_string(),
            aliases: BTreeSet::new(),
            role_instructions: "You answer questions.".to_string(),
            provider_config: ProviderConfig {
                provider: ProviderKind::Ollama,
                model: "llama3".to_string(),
                temperature: 0.7,
                max_iterations: 10,
            },
            tool_capabilities: CapabilitySet::none(),
        }
    }

    #[test]
    fn test_provider_kind_parses_claude_alias() {
        assert_eq!("claude".parse::<ProviderKind>(), Ok(ProviderKind::Anthropic));
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert!("bard".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_capability_wildcard() {
        let set = CapabilitySet::from_names(["web_search", "ALL"]);
        assert_eq!(set, CapabilitySet::All);
        assert!(set.allows(&ToolCapability::KnowledgeBase));
    }

    #[test]
    fn test_capability_named_set() {
        let set = CapabilitySet::from_names(["query_knowledge_base", "save_markdown"]);
        assert!(set.allows(&ToolCapability::KnowledgeBase));
        assert!(set.allows(&ToolCapability::Named("save_markdown".to_string())));
        assert!(!set.allows(&ToolCapability::Named("web_search".to_string())));
        assert_eq!(set.names(), vec!["query_knowledge_base", "save_markdown"]);
    }

    #[test]
    fn test_empty_capability_set_denies_retrieval() {
        assert!(!agent("pm").can_query_knowledge_base());
    }

    #[test]
    fn test_mention_tokens_start_with_id() {
        let mut a = agent("Research");
        a.aliases = ["r".to_string(), "res".to_string()].into_iter().collect();
        assert_eq!(a.mention_tokens(), vec!["research", "r", "res"]);
    }

    #[test]
    fn test_roster_rejects_unknown_default() {
        let err = AgentRoster::new(vec![agent("research")], "pm").unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownDefaultAgent("pm".to_string()));
    }

    #[test]
    fn test_roster_rejects_empty() {
        assert_eq!(
            AgentRoster::new(vec![], "research").unwrap_err(),
            ConfigurationError::NoAgents
        );
    }

    #[test]
    fn test_roster_providers_are_distinct() {
        let mut pm = agent("pm");
        pm.provider_config.provider = ProviderKind::Anthropic;
        let roster = AgentRoster::new(vec![agent("research"), pm, agent("arch")], "research")
            .unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(
            roster.providers().into_iter().collect::<Vec<_>>(),
            vec![ProviderKind::Anthropic, ProviderKind::Ollama]
        );
        assert_eq!(roster.default_agent().id, "research");
    }
}
