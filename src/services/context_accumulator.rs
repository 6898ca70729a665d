//! Ordered transcript of answered questions, fed into every later call.

use std::fmt::Write as _;

use serde::Serialize;

/// One resolved question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub agent_id: String,
}

impl Exchange {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            agent_id: agent_id.into(),
        }
    }
}

/// Append-only transcript scoped to one catalog run or one chat session.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    exchanges: Vec<Exchange>,
    max_exchanges: Option<usize>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render only the most recent `max_exchanges` pairs. `None` keeps everything.
    pub fn with_window(max_exchanges: Option<usize>) -> Self {
        Self {
            exchanges: Vec::new(),
            max_exchanges,
        }
    }

    pub fn append(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Serialize the transcript in insertion order. Empty when nothing was answered yet.
    pub fn render(&self) -> String {
        if self.exchanges.is_empty() {
            return String::new();
        }

        let skip = self
            .max_exchanges
            .map_or(0, |max| self.exchanges.len().saturating_sub(max));

        let mut out = String::from("## Previous questions and answers\n");
        for (number, exchange) in self.exchanges.iter().enumerate().skip(skip) {
            let _ = write!(
                out,
                "\n**Question {}** (answered by {}): {}\n\n{}\n",
                number + 1,
                exchange.agent_id,
                exchange.question.trim(),
                exchange.answer.trim()
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_renders_nothing() {
        assert_eq!(ConversationContext::new().render(), "");
    }

    #[test]
    fn test_render_keeps_insertion_order() {
        let mut context = ConversationContext::new();
        context.append(Exchange::new("What is A?", "A is first.", "research"));
        context.append(Exchange::new("What is B?", "B is second.", "project_lead"));

        let rendered = context.render();
        let a = rendered.find("What is A?").unwrap();
        let b = rendered.find("What is B?").unwrap();
        assert!(a < b);
        assert!(rendered.starts_with("## Previous questions and answers\n"));
        assert!(rendered.contains("**Question 2** (answered by project_lead): What is B?\n\nB is second."));
    }

    #[test]
    fn test_clear_empties_transcript() {
        let mut context = ConversationContext::new();
        context.append(Exchange::new("Q", "A", "research"));
        context.clear();
        assert!(context.is_empty());
        assert_eq!(context.render(), "");
    }

    #[test]
    fn test_window_renders_most_recent_only() {
        let mut context = ConversationContext::with_window(Some(2));
        for n in 1..=4 {
            context.append(Exchange::new(format!("Q{n}"), format!("A{n}"), "research"));
        }

        let rendered = context.render();
        assert_eq!(context.len(), 4);
        assert!(!rendered.contains("Q1"));
        assert!(!rendered.contains("Q2"));
        assert!(rendered.contains("**Question 3**"));
        assert!(rendered.contains("**Question 4**"));
    }

    #[test]
    fn test_no_deduplication() {
        let mut context = ConversationContext::new();
        context.append(Exchange::new("Same?", "Yes.", "research"));
        context.append(Exchange::new("Same?", "Yes.", "research"));
        assert_eq!(context.render().matches("Same?").count(), 2);
    }
}
