//! Shared test doubles for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docent::domain::models::{
    AgentDefinition, AgentRoster, CapabilitySet, ProviderConfig, ProviderKind,
};
use docent::domain::ports::{
    DocumentSink, EvidenceError, EvidenceFilter, EvidenceStore, GenerationError,
    GenerationProvider, GenerationRequest, SinkError, StoredChunk,
};
use docent::services::{AgentDispatcher, AliasRegistry, RetrievalCombiner, RetryController};

/// Replies from a script in call order; once the script runs out it answers
/// "Answer <n>".
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("Answer {call}")))
    }
}

/// Returns the same chunks for every query and records the filters it saw.
#[derive(Default)]
pub struct StaticEvidenceStore {
    name: String,
    chunks: Vec<StoredChunk>,
    filters: Mutex<Vec<Option<String>>>,
}

impl StaticEvidenceStore {
    pub fn new(name: &str, chunks: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            chunks: chunks
                .iter()
                .map(|(doc, text)| StoredChunk {
                    document_name: (*doc).to_string(),
                    text: (*text).to_string(),
                    score: 0.9,
                })
                .collect(),
            filters: Mutex::new(Vec::new()),
        }
    }

    pub fn filters(&self) -> Vec<Option<String>> {
        self.filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceStore for StaticEvidenceStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(
        &self,
        _text: &str,
        filter: Option<&EvidenceFilter>,
        top_k: usize,
    ) -> Result<Vec<StoredChunk>, EvidenceError> {
        self.filters
            .lock()
            .unwrap()
            .push(filter.map(|f| f.project_id.clone()));
        Ok(self.chunks.iter().take(top_k).cloned().collect())
    }
}

/// Keeps every written document; can be told to fail a given write. When
/// watching a provider it also records how many calls had been made at the
/// time of each write.
#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<String>>,
    fail_on_write: Option<usize>,
    watched: Option<Arc<ScriptedProvider>>,
    calls_at_write: Mutex<Vec<usize>>,
}

impl RecordingSink {
    /// Write number `n` (1-based) fails; earlier writes succeed.
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on_write: Some(n),
            ..Self::default()
        }
    }

    pub fn watching(provider: Arc<ScriptedProvider>) -> Self {
        Self {
            watched: Some(provider),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn calls_at_write(&self) -> Vec<usize> {
        self.calls_at_write.lock().unwrap().clone()
    }
}

impl DocumentSink for RecordingSink {
    fn target(&self) -> String {
        "recording".to_string()
    }

    fn write(&self, text: &str) -> Result<(), SinkError> {
        let mut writes = self.writes.lock().unwrap();
        if self.fail_on_write == Some(writes.len() + 1) {
            return Err(SinkError::Io {
                path: "recording".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        if let Some(provider) = &self.watched {
            self.calls_at_write.lock().unwrap().push(provider.calls());
        }
        writes.push(text.to_string());
        Ok(())
    }
}

pub fn agent(id: &str, aliases: &[&str], tools: CapabilitySet) -> AgentDefinition {
    AgentDefinition {
        id: id.to_string(),
        display_name: id.to_string(),
        aliases: aliases.iter().map(ToString::to_string).collect::<BTreeSet<_>>(),
        role_instructions: format!("You are the {id} agent."),
        provider_config: ProviderConfig {
            provider: ProviderKind::Ollama,
            model: "test-model".to_string(),
            temperature: 0.2,
            max_iterations: 10,
        },
        tool_capabilities: tools,
    }
}

/// research (default; @r, @res; knowledge base) and project_lead (@pm; no tools).
pub fn roster() -> AgentRoster {
    AgentRoster::new(
        vec![
            agent("research", &["r", "res"], CapabilitySet::All),
            agent("project_lead", &["pm"], CapabilitySet::none()),
        ],
        "research",
    )
    .unwrap()
}

pub fn dispatcher_with(
    provider: Arc<ScriptedProvider>,
    project_store: Arc<dyn EvidenceStore>,
    global_store: Arc<dyn EvidenceStore>,
) -> AgentDispatcher {
    let roster = roster();
    let aliases = AliasRegistry::from_roster(&roster).unwrap();
    AgentDispatcher::new(
        Arc::new(roster),
        Arc::new(aliases),
        RetrievalCombiner::new(project_store, global_store),
        RetryController::default().with_notifier(Arc::new(|_| {})),
    )
    .with_provider(ProviderKind::Ollama, provider)
}

pub fn dispatcher(provider: Arc<ScriptedProvider>) -> AgentDispatcher {
    dispatcher_with(
        provider,
        Arc::new(StaticEvidenceStore::new("project", &[("plan.md", "Go-live is in May.")])),
        Arc::new(StaticEvidenceStore::new("global", &[("erp.md", "D365 is an ERP suite.")])),
    )
}
