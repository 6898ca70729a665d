//! Resolves a question to an agent, assembles its input and calls its provider.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::errors::UnknownMentionError;
use crate::domain::models::{AgentDefinition, AgentRoster, ProviderKind, QuestionEntry};
use crate::domain::ports::{GenerationError, GenerationProvider, GenerationRequest};
use crate::services::alias_registry::AliasRegistry;
use crate::services::catalog_parser::extract_mention;
use crate::services::context_accumulator::ConversationContext;
use crate::services::retrieval_combiner::{format_evidence, RetrievalCombiner};
use crate::services::retry_controller::{RetryController, RetryError};

/// A per-question failure. In catalog mode it becomes the entry's failure
/// marker; interactively it is shown to the user.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    UnknownMention(#[from] UnknownMentionError),

    #[error("No generation provider is configured for '{provider}' (agent '{agent_id}')")]
    ProviderUnavailable {
        agent_id: String,
        provider: ProviderKind,
    },

    #[error("{source}")]
    Generation {
        agent_id: String,
        #[source]
        source: RetryError<GenerationError>,
    },
}

impl DispatchError {
    /// The agent the question was routed to, if resolution got that far.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            Self::UnknownMention(_) => None,
            Self::ProviderUnavailable { agent_id, .. } | Self::Generation { agent_id, .. } => {
                Some(agent_id)
            }
        }
    }

    pub const fn is_retries_exhausted(&self) -> bool {
        matches!(
            self,
            Self::Generation {
                source: RetryError::Exhausted { .. },
                ..
            }
        )
    }
}

/// Generated answer together with the agent that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub agent_id: String,
    pub text: String,
}

pub struct AgentDispatcher {
    roster: Arc<AgentRoster>,
    aliases: Arc<AliasRegistry>,
    retrieval: RetrievalCombiner,
    retry: RetryController,
    providers: HashMap<ProviderKind, Arc<dyn GenerationProvider>>,
}

impl std::fmt::Debug for AgentDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDispatcher")
            .field("agents", &self.roster.len())
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl AgentDispatcher {
    pub fn new(
        roster: Arc<AgentRoster>,
        aliases: Arc<AliasRegistry>,
        retrieval: RetrievalCombiner,
        retry: RetryController,
    ) -> Self {
        Self {
            roster,
            aliases,
            retrieval,
            retry,
            providers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_provider(mut self, kind: ProviderKind, provider: Arc<dyn GenerationProvider>) -> Self {
        self.providers.insert(kind, provider);
        self
    }

    #[must_use]
    pub fn with_providers(
        mut self,
        providers: impl IntoIterator<Item = (ProviderKind, Arc<dyn GenerationProvider>)>,
    ) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn roster(&self) -> &AgentRoster {
        &self.roster
    }

    /// Mention first, then the agent recorded for the entry, then the default.
    pub fn resolve(
        &self,
        mention: Option<&str>,
        recorded_agent: Option<&str>,
    ) -> Result<&AgentDefinition, UnknownMentionError> {
        if let Some(token) = mention {
            let id = self.aliases.resolve(token)?;
            return self
                .roster
                .get(id)
                .ok_or_else(|| UnknownMentionError::new(token));
        }

        if let Some(id) = recorded_agent {
            if let Some(agent) = self.roster.get(id) {
                return Ok(agent);
            }
            warn!(agent = id, "recorded agent is no longer configured, using default");
        }

        Ok(self.roster.default_agent())
    }

    /// Answer one catalog entry.
    pub async fn dispatch(
        &self,
        entry: &QuestionEntry,
        context: &ConversationContext,
        background: Option<&str>,
        project_filter: Option<&str>,
    ) -> Result<Dispatched, DispatchError> {
        let agent = self.resolve(
            entry.mention_token.as_deref(),
            entry.resolved_agent_id.as_deref(),
        )?;
        self.answer(agent, &entry.question_text, context, background, project_filter)
            .await
    }

    /// Answer a free-form query. A leading `@mention` wins over `agent_hint`.
    pub async fn ask(
        &self,
        query: &str,
        agent_hint: Option<&str>,
        context: &ConversationContext,
        project_filter: Option<&str>,
    ) -> Result<Dispatched, DispatchError> {
        let (mention, question) = extract_mention(query);
        let agent = self.resolve(mention.as_deref().or(agent_hint), None)?;
        self.answer(agent, question.trim(), context, None, project_filter)
            .await
    }

    async fn answer(
        &self,
        agent: &AgentDefinition,
        question: &str,
        context: &ConversationContext,
        background: Option<&str>,
        project_filter: Option<&str>,
    ) -> Result<Dispatched, DispatchError> {
        let provider = self
            .providers
            .get(&agent.provider_config.provider)
            .ok_or_else(|| DispatchError::ProviderUnavailable {
                agent_id: agent.id.clone(),
                provider: agent.provider_config.provider,
            })?;

        let evidence = if agent.can_query_knowledge_base() {
            let results = self.retrieval.retrieve(question, project_filter).await;
            Some(format_evidence(&results))
        } else {
            None
        };

        let input = assemble_input(&context.render(), background, evidence.as_deref(), question);
        debug!(agent = %agent.id, input = %input, "assembled generation input");

        let request = GenerationRequest::for_agent(agent, input);
        let request = &request;
        let provider = provider.as_ref();

        info!(
            agent = %agent.id,
            provider = provider.name(),
            model = %agent.provider_config.model,
            "generating answer"
        );

        let text = self
            .retry
            .invoke(move || provider.generate(request))
            .await
            .map_err(|source| DispatchError::Generation {
                agent_id: agent.id.clone(),
                source,
            })?;

        Ok(Dispatched {
            agent_id: agent.id.clone(),
            text,
        })
    }
}

/// Transcript, background, evidence, question; empty sections are left out.
pub fn assemble_input(
    transcript: &str,
    background: Option<&str>,
    evidence: Option<&str>,
    question: &str,
) -> String {
    let mut sections = Vec::new();

    if !transcript.trim().is_empty() {
        sections.push(transcript.trim_end().to_string());
    }
    if let Some(background) = background.map(str::trim).filter(|b| !b.is_empty()) {
        sections.push(format!("## Background\n{background}"));
    }
    if let Some(evidence) = evidence {
        sections.push(format!("## Evidence\n{evidence}"));
    }
    sections.push(format!("## Question\n{}", question.trim()));

    sections.join("\n\n")
}
