//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use commands::{agents::AgentsArgs, ask::AskArgs, chat::ChatArgs, process::ProcessArgs};

#[derive(Parser, Debug)]
#[command(name = "docent")]
#[command(about = "Answer question catalogs with retrieval-backed specialist agents", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (replaces .docent/config.yaml and .docent/local.yaml)
    #[arg(short, long, global = true, env = "DOCENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging, including the assembled generation input
    #[arg(long, global = true)]
    pub debug: bool,
}

impl Cli {
    pub fn global(&self) -> GlobalOptions {
        GlobalOptions {
            json: self.json,
            config: self.config.clone(),
            debug: self.debug,
        }
    }
}

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer every numbered question in a catalog file, in place
    Process(ProcessArgs),

    /// Ask a single question
    Ask(AskArgs),

    /// Interactive question/answer session
    Chat(ChatArgs),

    /// List configured agents and their mentions
    Agents(AgentsArgs),
}

/// Print the error chain and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let payload = serde_json::json!({
            "error": format!("{err:#}"),
        });
        eprintln!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("Error:").red().bold());
    }
    std::process::exit(1);
}
