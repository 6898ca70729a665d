use std::path::PathBuf;

use clap::Parser;
use docent::cli::{Cli, Commands};

#[test]
fn test_parse_process_defaults() {
    let cli = Cli::try_parse_from(["docent", "process", "questions.md"]).unwrap();

    match cli.command {
        Commands::Process(args) => {
            assert_eq!(args.file, PathBuf::from("questions.md"));
            assert_eq!(args.project, None);
            assert_eq!(args.output, None);
            assert!(!args.dry_run);
            assert!(!args.force);
        }
        _ => panic!("Wrong top-level command"),
    }
    assert!(!cli.json);
    assert!(!cli.debug);
}

#[test]
fn test_parse_process_with_options() {
    let cli = Cli::try_parse_from([
        "docent",
        "process",
        "questions.md",
        "-p",
        "99",
        "--dry-run",
        "--output",
        "answers.md",
        "--force",
    ])
    .unwrap();

    match cli.command {
        Commands::Process(args) => {
            assert_eq!(args.project.as_deref(), Some("99"));
            assert_eq!(args.output, Some(PathBuf::from("answers.md")));
            assert!(args.dry_run);
            assert!(args.force);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_ask_joins_words() {
    let cli = Cli::try_parse_from([
        "docent", "ask", "@pm", "When", "is", "go-live?", "--agent", "research",
    ])
    .unwrap();

    match cli.command {
        Commands::Ask(args) => {
            assert_eq!(args.query.join(" "), "@pm When is go-live?");
            assert_eq!(args.agent.as_deref(), Some("research"));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_ask_requires_a_question() {
    assert!(Cli::try_parse_from(["docent", "ask"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "docent",
        "agents",
        "--json",
        "--debug",
        "--config",
        "team.yaml",
    ])
    .unwrap();

    assert!(matches!(cli.command, Commands::Agents(_)));
    assert!(cli.json);
    assert!(cli.debug);
    assert_eq!(cli.config, Some(PathBuf::from("team.yaml")));

    let global = cli.global();
    assert!(global.json);
    assert_eq!(global.config, Some(PathBuf::from("team.yaml")));
}

#[test]
fn test_parse_chat_with_project() {
    let cli = Cli::try_parse_from(["docent", "chat", "--project", "7"]).unwrap();
    match cli.command {
        Commands::Chat(args) => assert_eq!(args.project.as_deref(), Some("7")),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["docent", "serve"]).is_err());
}
