//! Mention token resolution.

use std::collections::HashMap;

use crate::domain::errors::{ConfigurationError, UnknownMentionError};
use crate::domain::models::AgentRoster;

/// Maps mention tokens to agent ids. Immutable once built.
#[derive(Debug, Clone)]
pub struct AliasRegistry {
    aliases: HashMap<String, String>,
}

impl AliasRegistry {
    /// Build the table from every agent's id and aliases. Fails if two agents
    /// claim the same token.
    pub fn from_roster(roster: &AgentRoster) -> Result<Self, ConfigurationError> {
        let mut aliases: HashMap<String, String> = HashMap::new();

        for agent in roster.iter() {
            for token in agent.mention_tokens() {
                let token = normalize(&token);
                if token.is_empty() {
                    return Err(ConfigurationError::EmptyAlias {
                        agent: agent.id.clone(),
                    });
                }
                if let Some(existing) = aliases.get(&token) {
                    if *existing != agent.id {
                        return Err(ConfigurationError::AliasCollision {
                            alias: token,
                            first: existing.clone(),
                            second: agent.id.clone(),
                        });
                    }
                    continue;
                }
                aliases.insert(token, agent.id.clone());
            }
        }

        Ok(Self { aliases })
    }

    /// Case-insensitive exact lookup; a leading `@` is ignored.
    pub fn resolve(&self, token: &str) -> Result<&str, UnknownMentionError> {
        self.aliases
            .get(&normalize(token))
            .map(String::as_str)
            .ok_or_else(|| UnknownMentionError::new(token.trim().trim_start_matches('@')))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

fn normalize(token: &str) -> String {
    token.trim().trim_start_matches('@').to_lowercase()
}
