pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "cotiza",
    about = "Cotiza operator CLI",
    long_about = "Operate the quotation generator: migrations, fixtures, readiness checks, \
                  quotation generation and lifecycle management.",
    after_help = "Examples:\n  cotiza migrate\n  cotiza seed\n  cotiza generate --input request.toml\n  cotiza status COT-2026-08-00001 sent"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic catalog fixtures (standards, advisors, banks, steps)")]
    Seed,
    #[command(about = "Validate config, database connectivity, and PDF converter availability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values")]
    Config,
    #[command(about = "Create a quotation from a request file and export its PDF")]
    Generate {
        #[arg(long, help = "Path to the quotation request TOML file")]
        input: PathBuf,
        #[arg(long, help = "Directory the generated PDF is written to (default: pdf.output_dir)")]
        output_dir: Option<PathBuf>,
        #[arg(long, help = "Compute and persist only; skip PDF rendering")]
        no_pdf: bool,
    },
    #[command(about = "List persisted quotations, newest first")]
    List,
    #[command(about = "Move a quotation through its lifecycle (draft -> sent -> approved|rejected)")]
    Status {
        #[arg(help = "Quotation code, e.g. COT-2026-08-00001")]
        code: String,
        #[arg(help = "Target status: sent, approved or rejected")]
        status: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Generate { input, output_dir, no_pdf } => {
            commands::generate::run(&input, output_dir, no_pdf)
        }
        Command::List => commands::list::run(),
        Command::Status { code, status } => commands::status::run(&code, &status),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
