//! The `filter` command

use super::{open_required_input, progress_for, resolve_files, settle, FileFlags};
use crate::cli::{CliArgs, FilterArgs};
use crate::domain::DependentRecord;
use crate::error::{AppError, NdjsonError};
use crate::filter::{DependentFilter, SortOrder};
use crate::ndjson::NdjsonReader;
use crate::output::NdjsonSink;
use crate::progress::Progress;
use std::io::BufRead;

/// Counts of a filter run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterTally {
    pub processed: usize,
    pub included: usize,
    pub filtered: usize,
}

impl FilterTally {
    pub fn describe(&self) -> String {
        format!(
            "Processed {} items, included {} items, filtered {} items",
            self.processed, self.included, self.filtered
        )
    }
}

/// Filter an existing collection
pub fn run_filter(args: &FilterArgs, cli: &CliArgs) -> Result<String, AppError> {
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

    let result = open_required_input(files.input.as_ref()).and_then(|reader| {
        let filter = DependentFilter::new()
            .with_max_age_days(args.max_age)
            .with_min_downloads(Some(args.min_downloads))
            .with_repository_prefixes(args.repository_prefix.clone())
            .with_target_version(args.target_version.clone());

        let mut sink = NdjsonSink::open(&files.output)?;
        let tally = filter_records(
            reader,
            &filter,
            args.sort.order(),
            args.max_count,
            &progress,
            |record| sink.write(record),
        )?;
        sink.commit()?;

        Ok(tally.describe())
    });

    settle(&mut progress, result)
}

/// Run every record of `reader` through `filter`, passing kept records to `emit`.
///
/// Without sorting, records stream straight through and reading stops once
/// `max_count` records were kept. With sorting, the kept records are
/// collected, sorted and then cut to `max_count`.
pub(crate) fn filter_records<R, F>(
    reader: R,
    filter: &DependentFilter,
    order: SortOrder,
    max_count: Option<usize>,
    progress: &Progress,
    mut emit: F,
) -> Result<FilterTally, NdjsonError>
where
    R: BufRead,
    F: FnMut(&DependentRecord) -> Result<(), NdjsonError>,
{
    let mut tally = FilterTally::default();
    let mut kept = Vec::new();

    for record in NdjsonReader::new(reader).records() {
        if !order.is_active() && max_count.is_some_and(|max| tally.included >= max) {
            break;
        }

        let record = record?;
        tally.processed += 1;

        if filter.matches(&record) {
            tally.included += 1;
            if order.is_active() {
                kept.push(record);
            } else {
                emit(&record)?;
            }
        } else {
            tally.filtered += 1;
        }

        progress.set_message(&tally.describe());
    }

    if order.is_active() {
        order.apply(&mut kept);
        if let Some(max) = max_count {
            kept.truncate(max);
        }
        tally.included = kept.len();
        for record in &kept {
            emit(record)?;
        }
    }

    Ok(tally)
}
