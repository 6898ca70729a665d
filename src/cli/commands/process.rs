//! `docent process`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, truncate, CatalogProgress, CommandOutput};
use crate::cli::GlobalOptions;
use crate::infrastructure::documents::{read_document, FileDocumentSink};
use crate::services::{
    CatalogProcessor, CatalogWriter, EntryStatus, ProcessError, ProcessOptions, ProcessReport,
};

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Catalog file with numbered questions
    pub file: PathBuf,

    /// Project id used to narrow the project evidence store
    #[arg(short, long)]
    pub project: Option<String>,

    /// Print the processed document instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Write to this file instead of updating the input in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Regenerate entries that already have an answer
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct ProcessOutput {
    #[serde(flatten)]
    pub report: ProcessReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

impl CommandOutput for ProcessOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        let mut lines = Vec::new();

        if let Some(document) = &self.document {
            lines.push(document.clone());
            lines.push(String::new());
        }

        for entry in report.entries.iter().filter(|e| e.status == EntryStatus::Failed) {
            lines.push(format!(
                "{} {}. {}",
                style("✗").red(),
                entry.index,
                truncate(entry.error.as_deref().unwrap_or("failed"), 100)
            ));
        }

        let destination = report
            .target
            .as_deref()
            .map_or_else(|| "dry run, nothing written".to_string(), |t| format!("written to {t}"));
        lines.push(format!(
            "{} questions: {} answered, {} failed, {} already answered ({destination})",
            report.total,
            style(report.answered).green(),
            style(report.failed).red(),
            report.skipped,
        ));
        lines.join("\n")
    }
}

pub async fn execute(args: ProcessArgs, global: &GlobalOptions) -> Result<()> {
    let app = AppContext::load(global)?;
    let dispatcher = app.dispatcher()?;

    let text = read_document(&args.file)?;
    let target = args.output.clone().unwrap_or_else(|| args.file.clone());
    let writer = CatalogWriter::new(Arc::new(FileDocumentSink::new(&target)));

    let progress = Arc::new(if global.json {
        CatalogProgress::hidden()
    } else {
        CatalogProgress::new()
    });
    let processor = CatalogProcessor::new(dispatcher, writer)
        .with_max_exchanges(app.max_exchanges())
        .with_observer(progress.clone());

    let options = ProcessOptions {
        project: args.project,
        dry_run: args.dry_run,
        force: args.force,
    };

    let outcome = match processor.process(&text, &options).await {
        Ok(outcome) => outcome,
        Err(err) => {
            progress.abandon("processing stopped");
            return Err(match err {
                ProcessError::Parse(parse) => anyhow::Error::new(parse)
                    .context(format!("Cannot process {}", args.file.display())),
                other => anyhow::Error::new(other),
            });
        }
    };
    progress.finish("done");

    let document = options
        .dry_run
        .then(|| CatalogWriter::render(&outcome.document));
    output(
        &ProcessOutput {
            report: outcome.report,
            document,
        },
        global.json,
    );

    Ok(())
}
