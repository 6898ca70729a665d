//! Sequential catalog processing with a write after every entry.
//!
//! Entries are answered one at a time in document order. Each answer is added
//! to the transcript before the next entry is dispatched, and the whole
//! document is persisted after every dispatched entry, so an interrupted run
//! leaves a valid, partially answered file behind.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::errors::ParseError;
use crate::domain::models::{Answer, CatalogDocument, QuestionEntry};
use crate::domain::ports::SinkError;
use crate::services::agent_dispatcher::AgentDispatcher;
use crate::services::catalog_parser::CatalogParser;
use crate::services::catalog_writer::CatalogWriter;
use crate::services::context_accumulator::{ConversationContext, Exchange};

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Narrows the project evidence store.
    pub project: Option<String>,
    /// Parse and generate, but never write.
    pub dry_run: bool,
    /// Regenerate entries that already have an answer.
    pub force: bool,
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Earlier writes are intact; the run stops here.
    #[error("Writing the catalog failed after {completed} successful writes: {source}")]
    Write {
        completed: usize,
        #[source]
        source: SinkError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Answered,
    Failed,
    /// Already answered by an earlier run.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub index: u64,
    pub agent_id: Option<String>,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub run_id: Uuid,
    pub target: Option<String>,
    pub dry_run: bool,
    pub total: usize,
    pub answered: usize,
    pub failed: usize,
    pub skipped: usize,
    pub writes: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<EntryReport>,
}

impl ProcessReport {
    fn count(&mut self, report: EntryReport) {
        match report.status {
            EntryStatus::Answered => self.answered += 1,
            EntryStatus::Failed => self.failed += 1,
            EntryStatus::Skipped => self.skipped += 1,
        }
        self.entries.push(report);
    }
}

/// The processed document and what happened to each entry.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub document: CatalogDocument,
    pub report: ProcessReport,
}

/// Hooks for progress display.
pub trait ProcessObserver: Send + Sync {
    fn entry_started(&self, _position: usize, _total: usize, _entry: &QuestionEntry) {}

    fn entry_finished(&self, _position: usize, _total: usize, _report: &EntryReport) {}
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl ProcessObserver for NoopObserver {}

pub struct CatalogProcessor {
    parser: CatalogParser,
    dispatcher: Arc<AgentDispatcher>,
    writer: CatalogWriter,
    max_exchanges: Option<usize>,
    observer: Arc<dyn ProcessObserver>,
}

impl std::fmt::Debug for CatalogProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogProcessor")
            .field("writer", &self.writer)
            .field("max_exchanges", &self.max_exchanges)
            .finish_non_exhaustive()
    }
}

impl CatalogProcessor {
    pub fn new(dispatcher: Arc<AgentDispatcher>, writer: CatalogWriter) -> Self {
        Self {
            parser: CatalogParser::new(),
            dispatcher,
            writer,
            max_exchanges: None,
            observer: Arc::new(NoopObserver),
        }
    }

    #[must_use]
    pub const fn with_max_exchanges(mut self, max_exchanges: Option<usize>) -> Self {
        self.max_exchanges = max_exchanges;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ProcessObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Parse `text` and answer every entry. A parse failure produces no output;
    /// a per-entry failure is recorded in the document and processing continues.
    pub async fn process(
        &self,
        text: &str,
        options: &ProcessOptions,
    ) -> Result<ProcessOutcome, ProcessError> {
        let run_id = Uuid::new_v4();
        let target = (!options.dry_run).then(|| self.writer.target());
        let span = info_span!(
            "catalog_run",
            %run_id,
            output = target.as_deref().unwrap_or("dry-run"),
        );

        self.run(text, options, run_id, target).instrument(span).await
    }

    async fn run(
        &self,
        text: &str,
        options: &ProcessOptions,
        run_id: Uuid,
        target: Option<String>,
    ) -> Result<ProcessOutcome, ProcessError> {
        let mut document = self.parser.parse(text)?;
        let background = document.context_text();
        let project = options.project.as_deref();
        let total = document.len();

        let mut context = ConversationContext::with_window(self.max_exchanges);
        let mut report = ProcessReport {
            run_id,
            target,
            dry_run: options.dry_run,
            total,
            answered: 0,
            failed: 0,
            skipped: 0,
            writes: 0,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            entries: Vec::with_capacity(total),
        };

        info!(entries = total, project = ?project, dry_run = options.dry_run, "processing catalog");

        for position in 0..total {
            let Some(entry) = document.entry(position).cloned() else {
                break;
            };

            if !options.force && entry.is_answered() {
                if let Some(answer) = &entry.answer {
                    context.append(Exchange::new(
                        entry.question_text.clone(),
                        answer.text.clone(),
                        answer.agent_id.clone(),
                    ));
                }
                let entry_report = EntryReport {
                    index: entry.index,
                    agent_id: entry.resolved_agent_id.clone(),
                    status: EntryStatus::Skipped,
                    error: None,
                };
                self.observer.entry_finished(position, total, &entry_report);
                report.count(entry_report);
                continue;
            }

            self.observer.entry_started(position, total, &entry);

            let entry_span = info_span!(
                "entry",
                index = entry.index,
                mention = entry.mention_token.as_deref().unwrap_or("")
            );
            let result = self
                .dispatcher
                .dispatch(&entry, &context, Some(&background), project)
                .instrument(entry_span)
                .await;

            let entry_report = match result {
                Ok(dispatched) => {
                    let answer = Answer::answered(dispatched.agent_id.clone(), dispatched.text);
                    context.append(Exchange::new(
                        entry.question_text.clone(),
                        answer.text.clone(),
                        dispatched.agent_id.clone(),
                    ));
                    document.set_answer(position, answer);
                    info!(index = entry.index, agent = %dispatched.agent_id, "entry answered");
                    EntryReport {
                        index: entry.index,
                        agent_id: Some(dispatched.agent_id),
                        status: EntryStatus::Answered,
                        error: None,
                    }
                }
                Err(err) => {
                    let reason = err.to_string();
                    let agent_id = err.agent_id().map(str::to_string);
                    warn!(index = entry.index, agent = ?agent_id, error = %reason, "entry failed");
                    document.set_answer(
                        position,
                        Answer::failed(agent_id.clone().unwrap_or_default(), &reason),
                    );
                    EntryReport {
                        index: entry.index,
                        agent_id,
                        status: EntryStatus::Failed,
                        error: Some(reason),
                    }
                }
            };

            if !options.dry_run {
                self.writer
                    .write(&document)
                    .map_err(|source| ProcessError::Write {
                        completed: report.writes,
                        source,
                    })?;
                report.writes += 1;
            }

            self.observer.entry_finished(position, total, &entry_report);
            report.count(entry_report);
        }

        report.finished_at = Utc::now();
        info!(
            answered = report.answered,
            failed = report.failed,
            skipped = report.skipped,
            writes = report.writes,
            "catalog processed"
        );

        Ok(ProcessOutcome { document, report })
    }
}
