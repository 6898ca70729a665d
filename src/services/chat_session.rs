//! Interactive question/answer session with a persistent transcript.

use std::sync::Arc;

use tracing::debug;

use crate::services::agent_dispatcher::{AgentDispatcher, DispatchError, Dispatched};
use crate::services::catalog_parser::extract_mention;
use crate::services::context_accumulator::{ConversationContext, Exchange};

/// One line of chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand<'a> {
    Exit,
    Clear,
    Help,
    Empty,
    Question(&'a str),
}

pub fn parse_chat_input(line: &str) -> ChatCommand<'_> {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => ChatCommand::Empty,
        "exit" | "quit" | "q" => ChatCommand::Exit,
        "clear" => ChatCommand::Clear,
        "help" | "?" => ChatCommand::Help,
        _ => ChatCommand::Question(trimmed),
    }
}

pub const CHAT_HELP: &str = "\
Commands:
  exit     leave the session
  clear    forget the conversation so far
  help     show this message

Start a question with @agent (e.g. @pm, @arch) to pick a specialist.";

#[derive(Debug)]
pub struct ChatSession {
    dispatcher: Arc<AgentDispatcher>,
    context: ConversationContext,
    project: Option<String>,
}

impl ChatSession {
    pub fn new(
        dispatcher: Arc<AgentDispatcher>,
        project: Option<String>,
        max_exchanges: Option<usize>,
    ) -> Self {
        Self {
            dispatcher,
            context: ConversationContext::with_window(max_exchanges),
            project,
        }
    }

    /// Answer a question; only successful answers join the transcript.
    pub async fn ask(&mut self, question: &str) -> Result<Dispatched, DispatchError> {
        let dispatched = self
            .dispatcher
            .ask(question, None, &self.context, self.project.as_deref())
            .await?;

        let (_, stripped) = extract_mention(question);
        self.context.append(Exchange::new(
            stripped.trim(),
            dispatched.text.trim(),
            dispatched.agent_id.clone(),
        ));
        debug!(exchanges = self.context.len(), "chat transcript extended");

        Ok(dispatched)
    }

    pub fn clear(&mut self) {
        self.context.clear();
    }

    pub const fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }
}
