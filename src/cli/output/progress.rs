//! Progress display using indicatif.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::truncate;
use crate::domain::models::QuestionEntry;
use crate::services::{EntryReport, EntryStatus, ProcessObserver};

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Spinner for a single indeterminate operation.
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub trait ProgressBarExt {
    fn finish_success(&self, message: impl Into<String>);

    fn finish_error(&self, message: impl Into<String>);
}

impl ProgressBarExt for ProgressBar {
    fn finish_success(&self, message: impl Into<String>) {
        self.finish_with_message(format!("{} {}", style("✓").green(), message.into()));
    }

    fn finish_error(&self, message: impl Into<String>) {
        self.finish_with_message(format!("{} {}", style("✗").red(), message.into()));
    }
}

/// Per-entry progress for a catalog run. The length is set from the first
/// observed entry.
#[derive(Debug)]
pub struct CatalogProgress {
    bar: ProgressBar,
}

impl CatalogProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars(PROGRESS_CHARS),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Draws nothing; used for JSON output.
    pub fn hidden() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
        Self { bar }
    }

    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_success(message);
    }

    pub fn abandon(&self, message: impl Into<String>) {
        self.bar.finish_error(message);
    }
}

impl Default for CatalogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessObserver for CatalogProgress {
    fn entry_started(&self, _position: usize, total: usize, entry: &QuestionEntry) {
        self.bar.set_length(total as u64);
        let mention = entry
            .mention_token
            .as_deref()
            .map(|m| format!("@{m} "))
            .unwrap_or_default();
        self.bar.set_message(format!(
            "{}. {mention}{}",
            entry.index,
            truncate(&entry.question_text, 50)
        ));
    }

    fn entry_finished(&self, _position: usize, total: usize, report: &EntryReport) {
        self.bar.set_length(total as u64);
        let agent = report.agent_id.as_deref().unwrap_or("-");
        let line = match report.status {
            EntryStatus::Answered => format!("{} {}. answered by {agent}", style("✓").green(), report.index),
            EntryStatus::Skipped => format!("{} {}. already answered", style("↷").dim(), report.index),
            EntryStatus::Failed => format!(
                "{} {}. failed: {}",
                style("✗").red(),
                report.index,
                truncate(report.error.as_deref().unwrap_or("unknown error"), 80)
            ),
        };
        self.bar.println(line);
        self.bar.inc(1);
    }
}
