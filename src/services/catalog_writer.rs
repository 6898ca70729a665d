//! Serializes a catalog with its answers in place.

use std::sync::Arc;

use tracing::debug;

use crate::domain::models::{Answer, AnswerStatus, CatalogDocument, QuestionEntry};
use crate::domain::ports::{DocumentSink, SinkError};
use crate::services::catalog_parser::{escape_answer_line, escape_question_line};

pub const ANSWER_CLOSE: &str = "<!-- /answer -->";

/// Renders documents and persists them through a [`DocumentSink`].
#[derive(Clone)]
pub struct CatalogWriter {
    sink: Arc<dyn DocumentSink>,
}

impl std::fmt::Debug for CatalogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogWriter")
            .field("target", &self.sink.target())
            .finish()
    }
}

impl CatalogWriter {
    pub fn new(sink: Arc<dyn DocumentSink>) -> Self {
        Self { sink }
    }

    pub fn target(&self) -> String {
        self.sink.target()
    }

    /// Write the full current state of the document.
    pub fn write(&self, document: &CatalogDocument) -> Result<(), SinkError> {
        let text = Self::render(document);
        self.sink.write(&text)?;
        debug!(output = %self.sink.target(), bytes = text.len(), "catalog written");
        Ok(())
    }

    /// Pure rendering: context verbatim, unanswered entries verbatim, answered
    /// entries as a heading plus an answer block.
    pub fn render(document: &CatalogDocument) -> String {
        let mut lines: Vec<String> = document.context_lines().to_vec();

        for entry in document.entries() {
            match &entry.answer {
                None => lines.extend(
                    document.raw_lines()[entry.source_span.lines()]
                        .iter()
                        .cloned(),
                ),
                Some(answer) => {
                    lines.extend(render_answered(entry, answer));
                    lines.extend(entry.trailing_lines.iter().cloned());
                }
            }
        }

        lines.join(document.line_ending().as_str())
    }
}

fn render_answered(entry: &QuestionEntry, answer: &Answer) -> Vec<String> {
    let mut question_lines = entry.question_text.lines();
    let first = question_lines.next().unwrap_or_default();

    let mut lines = Vec::new();
    if first.is_empty() {
        lines.push(format!("### {}.", entry.number));
    } else {
        lines.push(format!("### {}. {}", entry.number, first));
    }
    lines.extend(question_lines.map(|line| escape_question_line(line).into_owned()));
    lines.push(String::new());

    lines.push(answer_open_marker(entry, answer));
    lines.extend(
        answer
            .text
            .lines()
            .map(|line| escape_answer_line(line).into_owned()),
    );
    lines.push(ANSWER_CLOSE.to_string());
    lines
}

/// Failed entries keep their mention so a later run can re-resolve it.
fn answer_open_marker(entry: &QuestionEntry, answer: &Answer) -> String {
    let mut attributes = Vec::new();
    if !answer.agent_id.is_empty() {
        attributes.push(format!("agent=\"{}\"", answer.agent_id));
    }
    if answer.status == AnswerStatus::Failed {
        attributes.push("status=\"failed\"".to_string());
        if let Some(mention) = &entry.mention_token {
            attributes.push(format!("mention=\"{mention}\""));
        }
    }

    if attributes.is_empty() {
        "<!-- answer -->".to_string()
    } else {
        format!("<!-- answer {} -->", attributes.join(" "))
    }
}
