//! Subcommand implementations
//!
//! This module provides:
//! - File flag resolution shared by all subcommands
//! - `list`: discover dependents and reconcile them with a prior collection
//! - `filter`: narrow down an existing collection
//! - `refresh`: look up every record of an existing collection again
//!
//! Each command returns its final summary line. A spinner shows progress
//! while the command runs when output goes to a file.

mod files;
mod filter;
mod list;
mod refresh;

pub use files::{
    open_file, open_required_input, resolve_files, FileFlags, InputFile, InputOrigin,
    ResolvedFiles,
};
pub use filter::{run_filter, FilterTally};
pub use list::run_list;
pub use refresh::{run_refresh, REFRESH_CONCURRENCY};

use crate::cli::{CliArgs, Command};
use crate::error::AppError;
use crate::progress::Progress;
use crate::registry::{HttpClient, Transport};
use std::sync::Arc;

const LOG_TARGET: &str = "list_dependents::commands";

/// Run the selected subcommand
pub async fn run(args: &CliArgs) -> Result<String, AppError> {
    match &args.command {
        Command::List(list) => run_list(list, args).await,
        Command::Filter(filter) => run_filter(filter, args),
        Command::Refresh(refresh) => run_refresh(refresh, args).await,
    }
}

/// Progress reporter for a command writing to `files.output`
fn progress_for(args: &CliArgs, files: &ResolvedFiles) -> Progress {
    Progress::new(args.shows_progress() && !files.output.is_stdout())
}

/// Leave the spinner with the outcome of a command
fn settle(progress: &mut Progress, result: Result<String, AppError>) -> Result<String, AppError> {
    match &result {
        Ok(summary) => {
            log::info!(target: LOG_TARGET, "{}", summary);
            progress.finish(summary);
        }
        Err(_) => progress.abandon(),
    }
    result
}

fn http_transport(retries: u32) -> Result<Arc<dyn Transport>, AppError> {
    Ok(Arc::new(HttpClient::new()?.with_max_retries(retries)))
}
