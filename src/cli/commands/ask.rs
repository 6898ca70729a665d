//! `docent ask`

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{create_spinner, output, CommandOutput, ProgressBarExt};
use crate::cli::GlobalOptions;
use crate::services::ConversationContext;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question; start it with @agent to pick a specialist
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Project id used to narrow the project evidence store
    #[arg(short, long)]
    pub project: Option<String>,

    /// Agent id or alias to use when the question has no @mention
    #[arg(short, long)]
    pub agent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskOutput {
    pub agent_id: String,
    pub answer: String,
}

impl CommandOutput for AskOutput {
    fn to_human(&self) -> String {
        format!("{}\n\n{}", style(format!("[{}]", self.agent_id)).cyan().bold(), self.answer)
    }
}

pub async fn execute(args: AskArgs, global: &GlobalOptions) -> Result<()> {
    let app = AppContext::load(global)?;
    let dispatcher = app.dispatcher()?;
    let query = args.query.join(" ");

    let spinner = (!global.json).then(|| create_spinner("Thinking..."));
    let result = dispatcher
        .ask(
            &query,
            args.agent.as_deref(),
            &ConversationContext::new(),
            args.project.as_deref(),
        )
        .await;

    match result {
        Ok(dispatched) => {
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            output(
                &AskOutput {
                    agent_id: dispatched.agent_id,
                    answer: dispatched.text,
                },
                global.json,
            );
            Ok(())
        }
        Err(err) => {
            if let Some(spinner) = &spinner {
                spinner.finish_error("no answer");
            }
            Err(err.into())
        }
    }
}
