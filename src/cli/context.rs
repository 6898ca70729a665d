//! Startup wiring: config, logging, agents, providers, retrieval.
//!
//! Every configuration problem surfaces here, before any document is read.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use super::GlobalOptions;
use crate::domain::models::{AgentRoster, Config};
use crate::infrastructure::agents::AgentRosterLoader;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::evidence::build_retrieval;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::infrastructure::providers::ProviderRegistry;
use crate::services::{AgentDispatcher, AliasRegistry, RetryController};

pub struct AppContext {
    pub config: Config,
    pub roster: Arc<AgentRoster>,
    pub aliases: Arc<AliasRegistry>,
    _logger: LoggerImpl,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("agents", &self.roster.len())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Load config, start logging and load the agent roster.
    pub fn load(options: &GlobalOptions) -> Result<Self> {
        let config = ConfigLoader::load_with_override(options.config.as_deref())
            .context("Failed to load configuration")?;
        let logger = LoggerImpl::init(&LogConfig::from_settings(&config.logging, options.debug))?;

        let loader = AgentRosterLoader::from_config(&config);
        let roster = loader.load().with_context(|| {
            format!(
                "Failed to load agents from {}",
                loader.agents_file().display()
            )
        })?;
        let aliases = AliasRegistry::from_roster(&roster).context("Invalid agent aliases")?;
        info!(agents = roster.len(), aliases = aliases.len(), "agent roster loaded");

        Ok(Self {
            config,
            roster: Arc::new(roster),
            aliases: Arc::new(aliases),
            _logger: logger,
        })
    }

    /// Providers for every backend the roster uses, retrieval, and retries.
    pub fn dispatcher(&self) -> Result<Arc<AgentDispatcher>> {
        let providers = ProviderRegistry::build(&self.roster.providers(), &self.config)
            .context("Failed to initialise generation providers")?;
        let retrieval = build_retrieval(&self.config.retrieval)
            .context("Failed to initialise evidence stores")?;
        let retry = RetryController::from_secs(&self.config.retry.schedule_secs);

        Ok(Arc::new(
            AgentDispatcher::new(self.roster.clone(), self.aliases.clone(), retrieval, retry)
                .with_providers(providers),
        ))
    }

    pub const fn max_exchanges(&self) -> Option<usize> {
        self.config.context.max_exchanges
    }
}
