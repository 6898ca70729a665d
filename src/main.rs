//! Docent CLI entry point.

use clap::Parser;

use docent::cli::{commands, handle_error, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let global = cli.global();

    let result = match cli.command {
        Commands::Process(args) => commands::process::execute(args, &global).await,
        Commands::Ask(args) => commands::ask::execute(args, &global).await,
        Commands::Chat(args) => commands::chat::execute(args, &global).await,
        Commands::Agents(args) => commands::agents::execute(args, &global),
    };

    if let Err(err) = result {
        handle_error(err, global.json);
    }
}
