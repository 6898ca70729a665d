//! Loads the agent roster from YAML plus per-agent role files.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::ConfigurationError;
use crate::domain::models::{
    AgentDefinition, AgentRoster, CapabilitySet, Config, ProviderConfig, ProviderKind,
};

const DEFAULT_AGENT: &str = "research";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgentsFile {
    #[serde(default = "default_agent")]
    default_agent: String,
    #[serde(default)]
    agents: BTreeMap<String, RawAgent>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAgent {
    name: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    provider: String,
    model: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_max_iterations")]
    max_iterations: u32,
    #[serde(default)]
    tools: ToolList,
    role_file: Option<PathBuf>,
    instructions: Option<String>,
}

/// `tools: all` or `tools: [a, b]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ToolList {
    One(String),
    Many(Vec<String>),
}

impl Default for ToolList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl ToolList {
    fn into_capabilities(self) -> CapabilitySet {
        match self {
            Self::One(name) => CapabilitySet::from_names([name]),
            Self::Many(names) => CapabilitySet::from_names(names),
        }
    }
}

fn default_agent() -> String {
    DEFAULT_AGENT.to_string()
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_max_iterations() -> u32 {
    10
}

/// Reads agent definitions once at startup.
#[derive(Debug, Clone)]
pub struct AgentRosterLoader {
    agents_file: PathBuf,
    roles_dir: PathBuf,
}

impl AgentRosterLoader {
    pub fn new(agents_file: impl Into<PathBuf>, roles_dir: impl Into<PathBuf>) -> Self {
        Self {
            agents_file: agents_file.into(),
            roles_dir: roles_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.agents_file.clone(), config.roles_dir.clone())
    }

    pub fn agents_file(&self) -> &Path {
        &self.agents_file
    }

    pub fn load(&self) -> Result<AgentRoster, ConfigurationError> {
        if !self.agents_file.exists() {
            return Err(ConfigurationError::AgentsFileMissing(self.agents_file.clone()));
        }
        let yaml = fs::read_to_string(&self.agents_file).map_err(|e| {
            ConfigurationError::MalformedAgentsFile {
                path: self.agents_file.clone(),
                reason: e.to_string(),
            }
        })?;
        self.parse(&yaml)
    }

    /// Parse agent YAML; role files resolve against the roles directory.
    pub fn parse(&self, yaml: &str) -> Result<AgentRoster, ConfigurationError> {
        let file: AgentsFile =
            serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::MalformedAgentsFile {
                path: self.agents_file.clone(),
                reason: e.to_string(),
            })?;

        let agents = file
            .agents
            .into_iter()
            .map(|(id, raw)| self.build_agent(id, raw))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            agents = agents.len(),
            default_agent = %file.default_agent,
            "loaded agent definitions"
        );

        AgentRoster::new(agents, file.default_agent)
    }

    fn build_agent(&self, id: String, raw: RawAgent) -> Result<AgentDefinition, ConfigurationError> {
        let provider: ProviderKind =
            raw.provider
                .parse()
                .map_err(|provider| ConfigurationError::UnknownProvider {
                    agent: id.clone(),
                    provider,
                })?;

        if !(0.0..=2.0).contains(&raw.temperature) {
            return Err(ConfigurationError::InvalidTemperature {
                agent: id,
                value: raw.temperature,
            });
        }
        if raw.max_iterations == 0 {
            return Err(ConfigurationError::InvalidMaxIterations { agent: id });
        }

        let mut aliases = BTreeSet::new();
        for alias in &raw.aliases {
            let alias = alias.trim().trim_start_matches('@').to_lowercase();
            if alias.is_empty() {
                return Err(ConfigurationError::EmptyAlias { agent: id });
            }
            aliases.insert(alias);
        }

        let role_instructions = match raw.instructions {
            Some(text) => text,
            None => self.read_role_file(&id, raw.role_file.as_deref())?,
        };
        if role_instructions.trim().is_empty() {
            return Err(ConfigurationError::EmptyRoleInstructions { agent: id });
        }

        Ok(AgentDefinition {
            display_name: raw.name.unwrap_or_else(|| id.clone()),
            id,
            aliases,
            role_instructions: role_instructions.trim().to_string(),
            provider_config: ProviderConfig {
                provider,
                model: raw.model,
                temperature: raw.temperature,
                max_iterations: raw.max_iterations,
            },
            tool_capabilities: raw.tools.into_capabilities(),
        })
    }

    fn read_role_file(&self, id: &str, role_file: Option<&Path>) -> Result<String, ConfigurationError> {
        let path = match role_file {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.roles_dir.join(path),
            None => self.roles_dir.join(format!("{id}.md")),
        };

        fs::read_to_string(&path).map_err(|_| ConfigurationError::MissingRoleFile {
            agent: id.to_string(),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ToolCapability;
    use tempfile::TempDir;

    const AGENTS: &str = r#"
default_agent: research
agents:
  research:
    name: Research Agent
    aliases: [res, R]
    provider: ollama
    model: llama3
    tools: [query_knowledge_base]
  project_lead:
    name: Project Lead
    aliases: ["@pm", pl, project]
    provider: claude
    model: claude-sonnet-4-5
    temperature: 0.3
    max_iterations: 5
    tools: all
    role_file: lead.md
  architect:
    aliases: [arch, sa]
    provider: openai
    model: gpt-4o
    instructions: "You design solutions."
"#;

    fn roles_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("research.md"), "You research things.\n").unwrap();
        fs::write(dir.path().join("lead.md"), "You lead projects.").unwrap();
        dir
    }

    #[test]
    fn test_parse_full_roster() {
        let dir = roles_dir();
        let loader = AgentRosterLoader::new("agents.yaml", dir.path());

        let roster = loader.parse(AGENTS).unwrap();

        assert_eq!(roster.len(), 3);
        assert_eq!(roster.default_agent_id(), "research");

        let research = roster.get("research").unwrap();
        assert_eq!(research.display_name, "Research Agent");
        assert_eq!(research.role_instructions, "You research things.");
        assert!(research.aliases.contains("r"));
        assert!(research.can_query_knowledge_base());
        assert!((research.provider_config.temperature - 0.7).abs() < f32::EPSILON);

        let lead = roster.get("project_lead").unwrap();
        assert_eq!(lead.provider_config.provider, ProviderKind::Anthropic);
        assert_eq!(lead.tool_capabilities, CapabilitySet::All);
        assert!(lead.aliases.contains("pm"));
        assert_eq!(lead.role_instructions, "You lead projects.");

        let architect = roster.get("architect").unwrap();
        assert_eq!(architect.display_name, "architect");
        assert_eq!(architect.role_instructions, "You design solutions.");
        assert!(!architect.tool_capabilities.allows(&ToolCapability::KnowledgeBase));
    }

    #[test]
    fn test_missing_agents_file() {
        let loader = AgentRosterLoader::new("/no/such/agents.yaml", "roles");
        assert!(matches!(
            loader.load(),
            Err(ConfigurationError::AgentsFileMissing(_))
        ));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = roles_dir();
        let agents = dir.path().join("agents.yaml");
        fs::write(&agents, AGENTS).unwrap();

        let roster = AgentRosterLoader::new(&agents, dir.path()).load().unwrap();
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_malformed_yaml() {
        let loader = AgentRosterLoader::new("agents.yaml", "roles");
        assert!(matches!(
            loader.parse("agents: [not, a, map]"),
            Err(ConfigurationError::MalformedAgentsFile { .. })
        ));
    }

    #[test]
    fn test_missing_model_is_malformed() {
        let loader = AgentRosterLoader::new("agents.yaml", "roles");
        let yaml = "agents:\n  research:\n    provider: ollama\n    instructions: hi\n";
        assert!(matches!(
            loader.parse(yaml),
            Err(ConfigurationError::MalformedAgentsFile { .. })
        ));
    }

    #[test]
    fn test_missing_role_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AgentRosterLoader::new("agents.yaml", dir.path());
        let yaml = "agents:\n  research:\n    provider: ollama\n    model: llama3\n";
        match loader.parse(yaml) {
            Err(ConfigurationError::MissingRoleFile { agent, path }) => {
                assert_eq!(agent, "research");
                assert_eq!(path, dir.path().join("research.md"));
            }
            other => panic!("expected MissingRoleFile, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        let loader = AgentRosterLoader::new("agents.yaml", "roles");
        let yaml = "agents:\n  research:\n    provider: bard\n    model: x\n    instructions: hi\n";
        assert_eq!(
            loader.parse(yaml).unwrap_err(),
            ConfigurationError::UnknownProvider {
                agent: "research".to_string(),
                provider: "bard".to_string(),
            }
        );
    }

    #[test]
    fn test_temperature_out_of_range() {
        let loader = AgentRosterLoader::new("agents.yaml", "roles");
        let yaml = "agents:\n  research:\n    provider: ollama\n    model: x\n    temperature: 2.5\n    instructions: hi\n";
        assert!(matches!(
            loader.parse(yaml),
            Err(ConfigurationError::InvalidTemperature { .. })
        ));
    }

    #[test]
    fn test_zero_max_iterations() {
        let loader = AgentRosterLoader::new("agents.yaml", "roles");
        let yaml = "agents:\n  research:\n    provider: ollama\n    model: x\n    max_iterations: 0\n    instructions: hi\n";
        assert_eq!(
            loader.parse(yaml).unwrap_err(),
            ConfigurationError::InvalidMaxIterations {
                agent: "research".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_default_agent() {
        let loader = AgentRosterLoader::new("agents.yaml", "roles");
        let yaml = "default_agent: pm\nagents:\n  research:\n    provider: ollama\n    model: x\n    instructions: hi\n";
        assert_eq!(
            loader.parse(yaml).unwrap_err(),
            ConfigurationError::UnknownDefaultAgent("pm".to_string())
        );
    }

    #[test]
    fn test_no_agents() {
        let loader = AgentRosterLoader::new("agents.yaml", "roles");
        assert_eq!(
            loader.parse("agents: {}").unwrap_err(),
            ConfigurationError::NoAgents
        );
    }

    #[test]
    fn test_empty_inline_instructions() {
        let loader = AgentRosterLoader::new("agents.yaml", "roles");
        let yaml = "agents:\n  research:\n    provider: ollama\n    model: x\n    instructions: \"  \"\n";
        assert!(matches!(
            loader.parse(yaml),
            Err(ConfigurationError::EmptyRoleInstructions { .. })
        ));
    }
}
