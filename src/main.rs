//! list-dependents - npm dependents discovery CLI tool
//!
//! Looks up the modules depending on an npm module and keeps NDJSON lists
//! of them up to date.

use clap::Parser;
use colored::Colorize;
use env_logger::{Builder, Env};
use list_dependents::cli::CliArgs;
use list_dependents::commands;
use list_dependents::error::{AppError, EXIT_CODE_UNEXPECTED_ERROR};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_logging(args.debug);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            exit_code(&e)
        }
    }
}

/// Main application logic
async fn run(args: &CliArgs) -> anyhow::Result<()> {
    commands::run(args).await?;
    Ok(())
}

/// Typed errors carry their own exit code; anything else is unexpected
fn exit_code(error: &anyhow::Error) -> ExitCode {
    match error.downcast_ref::<AppError>() {
        Some(app_error) => app_error.exit_code(),
        None => ExitCode::from(EXIT_CODE_UNEXPECTED_ERROR),
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    Builder::from_env(Env::default().filter_or("RUST_LOG", default_level))
        .format_timestamp(None)
        .format_module_path(false)
        .init();
}
