pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "telcobot",
    about = "Telcobot operator CLI",
    long_about = "Inspect configuration, exercise the billing tools, render UI markup, and chat with the billing agent.",
    after_help = "Examples:\n  telcobot doctor --json\n  telcobot invoke get_outstanding_invoices --args '{\"user_id\":\"+14155550123\"}'\n  telcobot render screen.jsx\n  telcobot chat"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LLM client setup, tool registry and welcome markup")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the billing tools offered to the model, with their argument schemas")]
    Tools,
    #[command(about = "Run one billing tool against a freshly seeded mock store")]
    Invoke {
        #[arg(help = "Tool name, e.g. make_payment")]
        tool: String,
        #[arg(long, default_value = "{}", help = "Tool arguments as a JSON object")]
        args: String,
    },
    #[command(about = "Convert JSX-like UI markup into the component tree JSON")]
    Render {
        #[arg(default_value = "-", help = "Markup file, or `-` for stdin")]
        path: String,
    },
    #[command(about = "Chat with the billing agent in the terminal")]
    Chat {
        #[arg(long, help = "Resume a session id instead of starting a new one")]
        session: Option<String>,
        #[arg(long, help = "Print each reply as the rendered component tree")]
        render: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Tools => commands::tools::run(),
        Command::Invoke { tool, args } => commands::invoke::run(&tool, &args),
        Command::Render { path } => commands::render::run(&path),
        Command::Chat { session, render } => commands::chat::run(session, render),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
