//! `docent agents`

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{list_table, output, render_list, CommandOutput};
use crate::cli::GlobalOptions;
use crate::domain::models::AgentRoster;

#[derive(Args, Debug)]
pub struct AgentsArgs {}

#[derive(Debug, Serialize)]
pub struct AgentOutput {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    pub max_iterations: u32,
    pub tools: Vec<String>,
    pub mentions: Vec<String>,
    pub default: bool,
}

#[derive(Debug, Serialize)]
pub struct AgentListOutput {
    pub default_agent: String,
    pub agents: Vec<AgentOutput>,
}

impl AgentListOutput {
    pub fn from_roster(roster: &AgentRoster) -> Self {
        let default_agent = roster.default_agent_id().to_string();
        let agents = roster
            .iter()
            .map(|agent| AgentOutput {
                id: agent.id.clone(),
                name: agent.display_name.clone(),
                provider: agent.provider_config.provider.to_string(),
                model: agent.provider_config.model.clone(),
                temperature: agent.provider_config.temperature,
                max_iterations: agent.provider_config.max_iterations,
                tools: agent.tool_capabilities.names(),
                mentions: agent.mention_tokens().into_iter().map(|t| format!("@{t}")).collect(),
                default: agent.id == default_agent,
            })
            .collect();
        Self {
            default_agent,
            agents,
        }
    }
}

impl CommandOutput for AgentListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "provider/model", "tools", "mentions"]);
        for agent in &self.agents {
            let id = if agent.default {
                format!("{} (default)", agent.id)
            } else {
                agent.id.clone()
            };
            let tools = if agent.tools.is_empty() {
                "-".to_string()
            } else {
                agent.tools.join(", ")
            };
            table.add_row(vec![
                id,
                agent.name.clone(),
                format!("{}/{}", agent.provider, agent.model),
                tools,
                agent.mentions.join(" "),
            ]);
        }
        render_list("agent", &table, self.agents.len())
    }
}

pub fn execute(_args: AgentsArgs, global: &GlobalOptions) -> Result<()> {
    let app = AppContext::load(global)?;
    output(&AgentListOutput::from_roster(&app.roster), global.json);
    Ok(())
}
