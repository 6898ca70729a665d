//! Splits a catalog into context and numbered question entries.
//!
//! The parser is a two-state machine. While seeking context every line is
//! context until the first entry start; after that each entry start opens a new
//! [`QuestionEntry`] and every other line extends the current one.
//!
//! Two kinds of line start an entry:
//! - a numbered-list marker (`1. text`, up to three spaces of indentation), and
//! - a level-three heading carrying a marker (`### 1. text`) that is followed by
//!   an answer block before the next entry candidate. This is how
//!   [`CatalogWriter`] renders answered entries, so re-parsing written output
//!   yields the same entries.
//!
//! Lines inside an answer block are never interpreted as markers. The writer
//! escapes body lines that would be mistaken for an entry heading or for the
//! end of an answer block with a leading backslash; the parser removes it.
//!
//! [`CatalogWriter`]: crate::services::CatalogWriter

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::errors::ParseError;
use crate::domain::models::{
    Answer, AnswerStatus, CatalogDocument, LineEnding, QuestionEntry, SourceSpan,
};

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(\d+)\.(?:\s+(.*))?$").expect("valid marker regex"));

static ANSWERED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^###[ \t]+(\d+)\.(?:\s+(.*))?$").expect("valid heading regex")
});

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([\w-]+)(?:\s+|$)").expect("valid mention regex"));

static ANSWER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--\s*answer\b(.*?)-->\s*$").expect("valid answer regex"));

static ANSWER_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--\s*/answer\s*-->\s*$").expect("valid answer regex"));

static ESCAPED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\\*)###[ \t]+\d+\.(?:\s|$)").expect("valid escaped heading regex")
});

static ESCAPED_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\\*)<!--\s*/answer\s*-->\s*$").expect("valid escaped close regex")
});

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid attribute regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    SeekContext,
    InQuestions,
}

enum LineKind<'a> {
    Marker { number: &'a str, rest: &'a str },
    Heading { number: &'a str, rest: &'a str },
    Other,
}

fn classify(line: &str) -> LineKind<'_> {
    let numbered = |re: &Regex| {
        re.captures(line).and_then(|caps| {
            let number = caps.get(1)?.as_str();
            let rest = caps.get(2).map_or("", |m| m.as_str());
            Some((number, rest))
        })
    };

    if let Some((number, rest)) = numbered(&MARKER) {
        LineKind::Marker { number, rest }
    } else if let Some((number, rest)) = numbered(&ANSWERED_HEADING) {
        LineKind::Heading { number, rest }
    } else {
        LineKind::Other
    }
}

/// Marker digits as an index; numbers too large for `u64` saturate.
fn parse_index(number: &str) -> u64 {
    number.parse().unwrap_or(u64::MAX)
}

fn escape_with<'a>(re: &Regex, line: &'a str) -> Cow<'a, str> {
    if re.is_match(line) {
        Cow::Owned(format!("\\{line}"))
    } else {
        Cow::Borrowed(line)
    }
}

fn unescape_with<'a>(re: &Regex, line: &'a str) -> &'a str {
    match re.captures(line) {
        Some(caps) if caps.get(1).is_some_and(|m| !m.is_empty()) => &line[1..],
        _ => line,
    }
}

/// Escape a question line of an answered entry that reads as an entry heading.
pub(crate) fn escape_question_line(line: &str) -> Cow<'_, str> {
    escape_with(&ESCAPED_HEADING, line)
}

/// Escape an answer line that reads as the end of the answer block.
pub(crate) fn escape_answer_line(line: &str) -> Cow<'_, str> {
    escape_with(&ESCAPED_CLOSE, line)
}

/// Split a leading `@handle` off the question text.
pub fn extract_mention(text: &str) -> (Option<String>, &str) {
    let trimmed = text.trim_start();
    match MENTION.captures(trimmed) {
        Some(caps) => {
            let token = caps[1].to_string();
            let consumed = caps.get(0).map_or(0, |m| m.end());
            (Some(token), &trimmed[consumed..])
        }
        None => (None, trimmed),
    }
}

#[derive(Debug, Default)]
struct AnswerAttributes {
    agent: Option<String>,
    mention: Option<String>,
    failed: bool,
}

fn parse_answer_attributes(attrs: &str) -> AnswerAttributes {
    let mut parsed = AnswerAttributes::default();
    for caps in ATTRIBUTE.captures_iter(attrs) {
        let value = caps[2].trim();
        match &caps[1] {
            "agent" if !value.is_empty() => parsed.agent = Some(value.to_string()),
            "mention" if !value.is_empty() => parsed.mention = Some(value.to_string()),
            "status" => parsed.failed = value.eq_ignore_ascii_case("failed"),
            _ => {}
        }
    }
    parsed
}

/// Parser for catalog documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogParser;

impl CatalogParser {
    pub const fn new() -> Self {
        Self
    }

    /// Parse raw document text. Fails with [`ParseError::NoQuestions`] when no
    /// line starts an entry.
    pub fn parse(&self, text: &str) -> Result<CatalogDocument, ParseError> {
        let line_ending = LineEnding::detect(text);
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| match line_ending {
                LineEnding::CrLf => line.strip_suffix('\r').unwrap_or(line).to_string(),
                LineEnding::Lf => line.to_string(),
            })
            .collect();
        let mut state = State::SeekContext;
        let mut context_line_count = lines.len();
        let mut entries = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            match state {
                State::SeekContext => {
                    if starts_entry(&lines, i) {
                        context_line_count = i;
                        state = State::InQuestions;
                    } else {
                        i += 1;
                    }
                }
                State::InQuestions => {
                    let (entry, next) = parse_entry(&lines, i);
                    entries.push(entry);
                    i = next;
                }
            }
        }

        if entries.is_empty() {
            return Err(ParseError::NoQuestions);
        }

        tracing::debug!(
            entries = entries.len(),
            context_lines = context_line_count,
            "parsed catalog"
        );

        Ok(CatalogDocument::from_parts(
            lines,
            context_line_count,
            entries,
            line_ending,
        ))
    }
}

fn starts_entry(lines: &[String], i: usize) -> bool {
    match classify(&lines[i]) {
        LineKind::Marker { .. } => true,
        LineKind::Heading { .. } => heading_has_answer(lines, i),
        LineKind::Other => false,
    }
}

/// A heading only starts an entry when an answer block follows it before the
/// next entry candidate; otherwise it is ordinary text. The nearest heading
/// owns the block.
fn heading_has_answer(lines: &[String], i: usize) -> bool {
    for line in &lines[i + 1..] {
        if ANSWER_OPEN.is_match(line) {
            return true;
        }
        if !matches!(classify(line), LineKind::Other) {
            return false;
        }
    }
    false
}

/// Parse the entry starting at `start`; returns it with the index of the next
/// unconsumed line.
fn parse_entry(lines: &[String], start: usize) -> (QuestionEntry, usize) {
    let (number, mut mention_token, first_line, from_heading) = match classify(&lines[start]) {
        LineKind::Marker { number, rest } => {
            let (mention, question) = extract_mention(rest);
            (number, mention, question.to_string(), false)
        }
        LineKind::Heading { number, rest } => (number, None, rest.to_string(), true),
        LineKind::Other => ("0", None, lines[start].clone(), false),
    };
    let index = parse_index(number);

    let mut body = vec![first_line];
    let mut answer = None;
    let mut resolved_agent_id = None;
    let mut j = start + 1;

    while j < lines.len() {
        if let Some(caps) = ANSWER_OPEN.captures(&lines[j]) {
            let attributes = parse_answer_attributes(caps.get(1).map_or("", |m| m.as_str()));
            j += 1;
            let mut answer_lines = Vec::new();
            while j < lines.len() && !ANSWER_CLOSE.is_match(&lines[j]) {
                answer_lines.push(unescape_with(&ESCAPED_CLOSE, &lines[j]));
                j += 1;
            }
            if j < lines.len() {
                j += 1;
            } else {
                tracing::warn!(index, "answer block is not closed; it runs to the end of the document");
            }
            if mention_token.is_none() {
                mention_token = attributes.mention;
            }
            resolved_agent_id.clone_from(&attributes.agent);
            answer = Some(Answer {
                text: answer_lines.join("\n").trim().to_string(),
                status: if attributes.failed {
                    AnswerStatus::Failed
                } else {
                    AnswerStatus::Answered
                },
                agent_id: attributes.agent.unwrap_or_default(),
            });
            break;
        }
        if starts_entry(lines, j) {
            break;
        }
        if from_heading {
            body.push(unescape_with(&ESCAPED_HEADING, &lines[j]).to_string());
        } else {
            body.push(lines[j].clone());
        }
        j += 1;
    }

    let mut trailing_lines = Vec::new();
    if answer.is_some() {
        while j < lines.len() && !starts_entry(lines, j) {
            trailing_lines.push(lines[j].clone());
            j += 1;
        }
    } else {
        while body.len() > 1 && body.last().is_some_and(|l| l.trim().is_empty()) {
            if let Some(line) = body.pop() {
                trailing_lines.insert(0, line);
            }
        }
    }

    let question_text = body
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    let entry = QuestionEntry {
        index,
        number: number.to_string(),
        mention_token,
        resolved_agent_id,
        question_text,
        answer,
        source_span: SourceSpan::new(start, j),
        trailing_lines,
    };

    (entry, j)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> CatalogDocument {
        CatalogParser::new().parse(text).expect("document should parse")
    }

    #[test]
    fn test_context_and_entries() {
        let doc = parse("# Project\n\nSome context.\n\n1. @research What is D365?\n2. Second question\n");

        assert_eq!(doc.context_text(), "# Project\n\nSome context.");
        assert_eq!(doc.len(), 2);

        let first = doc.entry(0).unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first.mention_token.as_deref(), Some("research"));
        assert_eq!(first.question_text, "What is D365?");
        assert!(first.answer.is_none());

        let second = doc.entry(1).unwrap();
        assert_eq!(second.mention_token, None);
        assert_eq!(second.question_text, "Second question");
    }

    #[test]
    fn test_duplicate_and_non_monotonic_numbering() {
        let doc = parse("1. a\n1. b\n2. c\n7. d\n3. e");
        let indices: Vec<u64> = doc.entries().iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 1, 2, 7, 3]);
        let texts: Vec<&str> = doc.entries().iter().map(|e| e.question_text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_multi_line_question() {
        let doc = parse("Context\n\n1. @pm Plan the rollout\n   covering finance\n   and logistics\n\n2. Next");
        let entry = doc.entry(0).unwrap();
        assert_eq!(
            entry.question_text,
            "Plan the rollout\n   covering finance\n   and logistics"
        );
        assert_eq!(entry.trailing_lines, vec![String::new()]);
        assert_eq!(entry.source_span, SourceSpan::new(2, 6));
    }

    #[test]
    fn test_oversized_number_still_starts_entry() {
        let doc = parse("Intro\n1. First\n99999999999999999999999. Huge\n3. Last");
        assert_eq!(doc.len(), 3);
        let huge = doc.entry(1).unwrap();
        assert_eq!(huge.index, u64::MAX);
        assert_eq!(huge.number, "99999999999999999999999");
        assert_eq!(huge.question_text, "Huge");
        assert_eq!(doc.entry(0).unwrap().question_text, "First");
    }

    #[test]
    fn test_crlf_lines_are_stored_without_carriage_returns() {
        let doc = parse("Intro\r\n1. @pm First?\r\n   more\r\n");
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
        assert_eq!(doc.context_text(), "Intro");
        assert_eq!(doc.entry(0).unwrap().question_text, "First?\n   more");
        assert!(doc.raw_lines().iter().all(|line| !line.ends_with('\r')));
    }

    #[test]
    fn test_bulleted_list_yields_no_questions() {
        let result = CatalogParser::new().parse("Context\n\n- @research What?\n* Another?\n");
        assert_eq!(result.unwrap_err(), ParseError::NoQuestions);
    }

    #[test]
    fn test_empty_document_yields_no_questions() {
        assert_eq!(
            CatalogParser::new().parse("").unwrap_err(),
            ParseError::NoQuestions
        );
    }

    #[test]
    fn test_decimal_numbers_are_not_markers() {
        let doc = parse("Revenue grew 1.5 million.\n1. Why?");
        assert_eq!(doc.context_text(), "Revenue grew 1.5 million.");
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_bullets_inside_question_body_are_kept() {
        let doc = parse("1. Compare:\n- option A\n- option B");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.entry(0).unwrap().question_text, "Compare:\n- option A\n- option B");
    }

    #[test]
    fn test_mention_without_whitespace_after() {
        let (mention, rest) = extract_mention("@arch");
        assert_eq!(mention.as_deref(), Some("arch"));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_mention_must_lead_the_question() {
        let doc = parse("1. Ask @pm about it");
        let entry = doc.entry(0).unwrap();
        assert_eq!(entry.mention_token, None);
        assert_eq!(entry.question_text, "Ask @pm about it");
    }

    #[test]
    fn test_answered_entry_is_recognised() {
        let text = "Context\n\n### 1. What is D365?\n\n<!-- answer agent=\"research\" -->\nAn ERP.\n\n1. Finance\n2. Supply chain\n<!-- /answer -->\n2. @pm Next?";
        let doc = parse(text);

        assert_eq!(doc.context_text(), "Context");
        assert_eq!(doc.len(), 2);

        let first = doc.entry(0).unwrap();
        assert_eq!(first.question_text, "What is D365?");
        assert!(first.is_answered());
        assert_eq!(first.resolved_agent_id.as_deref(), Some("research"));
        assert_eq!(
            first.answer_text(),
            Some("An ERP.\n\n1. Finance\n2. Supply chain")
        );

        let second = doc.entry(1).unwrap();
        assert_eq!(second.mention_token.as_deref(), Some("pm"));
        assert!(second.answer.is_none());
    }

    #[test]
    fn test_failed_answer_status() {
        let doc = parse("### 4. Why?\n\n<!-- answer agent=\"pm\" status=\"failed\" -->\n**Error:** boom\n<!-- /answer -->\n");
        let entry = doc.entry(0).unwrap();
        assert_eq!(entry.index, 4);
        assert!(!entry.is_answered());
        assert!(entry.answer.as_ref().unwrap().is_failure());
        assert_eq!(entry.trailing_lines, vec![String::new()]);
    }

    #[test]
    fn test_heading_without_answer_is_context() {
        let doc = parse("## 1. Introduction\nText\n\n1. Real question?");
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.context_text(), "## 1. Introduction\nText");
    }
}
