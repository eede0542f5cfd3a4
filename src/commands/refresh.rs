//! The `refresh` command

use super::{
    http_transport, open_required_input, progress_for, resolve_files, settle, FileFlags,
    ResolvedFiles,
};
use crate::cli::{CliArgs, RefreshArgs};
use crate::concurrency::{bounded_map, MapOrder};
use crate::discovery::Discovery;
use crate::domain::{DependentRecord, PackageLookup, SummaryMode, ALL_UP_TO_DATE};
use crate::error::{AppError, ResultError};
use crate::ndjson;
use crate::output::{write_collection, FormatOptions};
use crate::progress::Progress;
use crate::reconcile::{refresh_record, RefreshTally};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;

/// Concurrent lookups while refreshing
pub const REFRESH_CONCURRENCY: usize = 4;

/// A prior record paired with the result of looking it up again
pub(crate) type LookupStream =
    BoxStream<'static, (DependentRecord, PackageLookup<DependentRecord>)>;

/// Look up every record of an existing collection again
pub async fn run_refresh(args: &RefreshArgs, cli: &CliArgs) -> Result<String, AppError> {
    let files = resolve_files(
        &FileFlags {
            target_file: args.target_file.clone(),
            input: args.files.input.clone(),
            output: args.files.output.clone(),
            named: false,
        },
        None,
    )?;

    let mut progress = progress_for(cli, &files);
    progress.spinner("Processing data");

    let result = refresh(args, &files, &progress).await;
    settle(&mut progress, result)
}

async fn refresh(
    args: &RefreshArgs,
    files: &ResolvedFiles,
    progress: &Progress,
) -> Result<String, AppError> {
    let prior = ndjson::read_collection(open_required_input(files.input.as_ref())?)?;
    let discovery = Arc::new(Discovery::new(http_transport(args.network.retries)?)?);
    let concurrency = args.network.concurrency().unwrap_or(REFRESH_CONCURRENCY);
    let mode = if args.check {
        SummaryMode::Check
    } else {
        SummaryMode::Write
    };

    let lookups = lookup_all(
        discovery,
        prior.into_records(),
        args.format.skip_pkg(),
        concurrency,
    );
    let (records, tally) =
        refresh_all(lookups, &args.format.format_options(), mode, progress).await;

    if !args.check {
        write_collection(&files.output, &records)?;
    }

    if !tally.is_outdated() {
        return Ok(ALL_UP_TO_DATE.to_string());
    }

    let summary = tally.describe(mode);
    if args.check {
        progress.set_message(&summary);
        return Err(ResultError::Outdated.into());
    }
    Ok(summary)
}

/// Look up each record in input order; the target module is unknown here
fn lookup_all(
    discovery: Arc<Discovery>,
    records: Vec<DependentRecord>,
    skip_pkg: bool,
    concurrency: usize,
) -> LookupStream {
    bounded_map(
        stream::iter(records),
        concurrency,
        MapOrder::Ordered,
        move |record: DependentRecord| {
            let discovery = Arc::clone(&discovery);
            async move {
                let lookup = discovery.lookup_dependent("", &record.name, skip_pkg).await;
                Some((record, lookup))
            }
        },
    )
}

/// Merge each lookup into its prior record, keeping input order
pub(crate) async fn refresh_all(
    mut lookups: LookupStream,
    format: &FormatOptions,
    mode: SummaryMode,
    progress: &Progress,
) -> (Vec<DependentRecord>, RefreshTally) {
    let mut tally = RefreshTally::default();
    let mut records = Vec::new();

    while let Some((prior, lookup)) = lookups.next().await {
        let lookup = lookup.map(|fresh| format.apply(fresh));
        let (kept, outcome) = refresh_record(prior, lookup);

        tally.record(outcome);
        records.extend(kept);
        progress.set_message(&tally.describe(mode));
    }

    (records, tally)
}
