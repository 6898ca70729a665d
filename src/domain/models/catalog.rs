//! Catalog documents: free-form context followed by numbered questions.

use std::ops::Range;

use serde::Serialize;

/// Line range an entry occupied in the parsed text (end exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
}

impl SourceSpan {
    pub const fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    pub const fn lines(&self) -> Range<usize> {
        self.start_line..self.end_line
    }
}

/// Outcome recorded for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    /// The text is an explicit failure marker, not a generated answer.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub status: AnswerStatus,
    /// Agent that produced (or failed to produce) the text.
    pub agent_id: String,
}

impl Answer {
    pub fn answered(agent_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            status: AnswerStatus::Answered,
            agent_id: agent_id.into(),
        }
    }

    pub fn failed(agent_id: impl Into<String>, reason: impl AsRef<str>) -> Self {
        Self {
            text: format!("**Error:** {}", reason.as_ref().trim()),
            status: AnswerStatus::Failed,
            agent_id: agent_id.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == AnswerStatus::Failed
    }
}

/// One numbered question in a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionEntry {
    /// The catalog's own number for the question; not renumbered. Saturates
    /// at `u64::MAX` for numbers that do not fit.
    pub index: u64,
    /// The number exactly as written in the document.
    #[serde(skip)]
    pub number: String,
    /// Raw mention handle without the leading `@`.
    pub mention_token: Option<String>,
    /// Agent that answers the entry; filled on dispatch, or from an existing answer.
    pub resolved_agent_id: Option<String>,
    pub question_text: String,
    pub answer: Option<Answer>,
    pub source_span: SourceSpan,
    /// Lines after the question/answer body that belong to this entry's span.
    #[serde(skip)]
    pub trailing_lines: Vec<String>,
}

impl QuestionEntry {
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_ref().map(|a| a.text.as_str())
    }

    /// True only for a real generated answer; failure markers do not count.
    pub fn is_answered(&self) -> bool {
        self.answer
            .as_ref()
            .is_some_and(|a| a.status == AnswerStatus::Answered)
    }
}

/// Line terminator detected from the first line break of the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(pos) if text[..pos].ends_with('\r') => Self::CrLf,
            _ => Self::Lf,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// A parsed catalog. Entries keep their original document order.
///
/// Raw lines are stored without their terminator; [`LineEnding`] restores it
/// when the document is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDocument {
    raw_lines: Vec<String>,
    context_line_count: usize,
    entries: Vec<QuestionEntry>,
    line_ending: LineEnding,
}

impl CatalogDocument {
    pub(crate) const fn from_parts(
        raw_lines: Vec<String>,
        context_line_count: usize,
        entries: Vec<QuestionEntry>,
        line_ending: LineEnding,
    ) -> Self {
        Self {
            raw_lines,
            context_line_count,
            entries,
            line_ending,
        }
    }

    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Everything before the first question, trimmed.
    pub fn context_text(&self) -> String {
        self.context_lines().join("\n").trim().to_string()
    }

    pub fn context_lines(&self) -> &[String] {
        &self.raw_lines[..self.context_line_count]
    }

    pub fn raw_lines(&self) -> &[String] {
        &self.raw_lines
    }

    pub fn entries(&self) -> &[QuestionEntry] {
        &self.entries
    }

    pub fn entry(&self, position: usize) -> Option<&QuestionEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record the outcome for the entry at `position` (its place in document order).
    pub fn set_answer(&mut self, position: usize, answer: Answer) {
        if let Some(entry) = self.entries.get_mut(position) {
            entry.resolved_agent_id = Some(answer.agent_id.clone()).filter(|id| !id.is_empty());
            entry.answer = Some(answer);
        }
    }

    pub fn answered_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_answered()).count()
    }
}
