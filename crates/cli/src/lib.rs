pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "leadflow",
    about = "Leadflow operator CLI",
    long_about = "Inspect configuration, check readiness, apply migrations, and talk to the lead qualification dialogue locally.",
    after_help = "Examples:\n  leadflow doctor --json\n  leadflow config\n  leadflow chat --message \"Hi, I'm John\"\n  leadflow chat --thread-id demo"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, collaborator settings, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run dialogue turns against in-memory stores")]
    Chat {
        #[arg(long, default_value = "local", help = "Conversation thread to use")]
        thread_id: String,
        #[arg(long, help = "Run a single turn and print the reply as JSON")]
        message: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Chat { thread_id, message: Some(message) } => {
            commands::chat::run_once(&thread_id, &message)
        }
        Command::Chat { thread_id, message: None } => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            commands::chat::run_interactive(&thread_id, stdin.lock(), stdout.lock())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
