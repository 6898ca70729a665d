//! `docent chat`

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::cli::context::AppContext;
use crate::cli::output::create_spinner;
use crate::cli::GlobalOptions;
use crate::services::{parse_chat_input, ChatCommand, ChatSession, CHAT_HELP};

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Project id used to narrow the project evidence store
    #[arg(short, long)]
    pub project: Option<String>,
}

const PROMPT: &str = "you> ";

pub async fn execute(args: ChatArgs, global: &GlobalOptions) -> Result<()> {
    let app = AppContext::load(global)?;
    let dispatcher = app.dispatcher()?;
    let mut session = ChatSession::new(dispatcher, args.project, app.max_exchanges());
    let mut editor = DefaultEditor::new().context("Failed to initialise line editor")?;

    let agents: Vec<String> = app.roster.iter().map(|a| format!("@{}", a.id)).collect();
    println!(
        "{} Agents: {}. Type 'help' for commands, 'exit' to quit.",
        style("docent chat").bold(),
        agents.join(", ")
    );
    if let Some(project) = session.project() {
        println!("Project filter: {project}");
    }

    loop {
        let line = match tokio::task::block_in_place(|| editor.readline(PROMPT)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("Failed to read input"),
        };

        match parse_chat_input(&line) {
            ChatCommand::Empty => {}
            ChatCommand::Exit => break,
            ChatCommand::Help => println!("{CHAT_HELP}"),
            ChatCommand::Clear => {
                session.clear();
                println!("{}", style("Conversation cleared.").dim());
            }
            ChatCommand::Question(question) => {
                let _ = editor.add_history_entry(question);
                let spinner = create_spinner("Thinking...");
                let result = session.ask(question).await;
                spinner.finish_and_clear();

                match result {
                    Ok(dispatched) => println!(
                        "\n{}\n{}\n",
                        style(format!("[{}]", dispatched.agent_id)).cyan().bold(),
                        dispatched.text
                    ),
                    Err(err) => eprintln!("{} {err}", style("Error:").red().bold()),
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
