//! The `list` command

use super::{
    http_transport, open_file, progress_for, resolve_files, settle, FileFlags, InputFile,
    InputOrigin,
};
use crate::cli::{CliArgs, ListArgs};
use crate::discovery::{
    DependentStream, DependentsOptions, Discovery, DownloadThreshold, ECOSYSTEMS_PER_PAGE,
};
use crate::domain::{DependentsCollection, SummaryMode, ALL_UP_TO_DATE};
use crate::error::{AppError, InputError, ResultError};
use crate::ndjson;
use crate::output::{write_collection, FormatOptions, OutputTarget};
use crate::progress::Progress;
use crate::reconcile::Reconciler;
use futures::StreamExt;

/// Discover the dependents of a module and reconcile them with the prior list
pub async fn run_list(args: &ListArgs, cli: &CliArgs) -> Result<String, AppError> {
    if args.module.trim().is_empty() {
        return Err(InputError::EmptyModuleName.into());
    }

    let files = resolve_files(
        &FileFlags {
            target_file: args.target_file.clone(),
            input: args.files.input.clone(),
            output: args.files.output.clone(),
            named: args.named,
        },
        Some(&args.module),
    )?;

    if args.check && files.input.is_none() {
        return Err(InputError::missing_input("--check requires an input").into());
    }

    let mut progress = progress_for(cli, &files);

    let prior = match &files.input {
        Some(input) => {
            progress.spinner(&format!("Reading existing dependents data for {}", args.module));
            let prior = read_prior(input);
            progress.finish_and_clear();
            prior?
        }
        None => DependentsCollection::new(),
    };

    progress.spinner(&format!("Looking up dependents data for {}", args.module));
    let result = update(args, prior, &files.output, &progress).await;
    settle(&mut progress, result)
}

/// The prior collection, empty when an implicitly chosen file does not exist yet
fn read_prior(input: &InputFile) -> Result<DependentsCollection, AppError> {
    let required = input.origin == InputOrigin::InputFlag;
    match open_file(&input.path, required)? {
        Some(reader) => Ok(ndjson::read_collection(reader)?),
        None => Ok(DependentsCollection::new()),
    }
}

fn discovery_options(args: &ListArgs) -> DependentsOptions {
    let mut options = DependentsOptions::new()
        .with_max_pages(args.max_pages)
        .with_min_downloads(DownloadThreshold::last_week(args.min_downloads))
        .with_max_age_days(args.max_age)
        .with_skip_pkg(args.format.skip_pkg())
        .with_per_page(ECOSYSTEMS_PER_PAGE)
        .with_include_historic(args.include_historic);

    if let Some(concurrency) = args.network.concurrency() {
        options = options.with_concurrency(concurrency);
    }
    options
}

async fn update(
    args: &ListArgs,
    prior: DependentsCollection,
    output: &OutputTarget,
    progress: &Progress,
) -> Result<String, AppError> {
    let discovery = Discovery::new(http_transport(args.network.retries)?)?;
    let stream = discovery.dependents(args.source.into(), &args.module, &discovery_options(args))?;

    let mode = if args.check {
        SummaryMode::Check
    } else {
        SummaryMode::Write
    };

    let result = reconcile_stream(
        stream,
        prior,
        &args.format.format_options(),
        mode,
        progress,
    )
    .await?;
    let counts = result.counts;

    if !args.check {
        let mut records = result.collection.into_records();
        args.sort.order().apply(&mut records);
        write_collection(output, &records)?;
    }

    if !counts.has_changes() {
        return Ok(ALL_UP_TO_DATE.to_string());
    }

    let summary = counts.describe(mode);
    if args.check {
        progress.set_message(&summary);
        return Err(ResultError::Outdated.into());
    }
    Ok(summary)
}

/// Feed a discovery stream through a reconciler.
///
/// A failing stream fails the run before anything is written.
pub(crate) async fn reconcile_stream(
    mut stream: DependentStream,
    prior: DependentsCollection,
    format: &FormatOptions,
    mode: SummaryMode,
    progress: &Progress,
) -> Result<crate::reconcile::ReconciliationResult, AppError> {
    let mut reconciler = Reconciler::new(prior);

    while let Some(record) = stream.next().await {
        reconciler.observe(format.apply(record?));
        progress.set_message(&reconciler.counts().describe(mode));
    }

    Ok(reconciler.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependentRecord;
    use crate::error::RegistryError;
    use futures::stream;

    fn records(names: &[(&str, u64)]) -> Vec<DependentRecord> {
        names
            .iter()
            .map(|(name, downloads)| DependentRecord::new(*name, *downloads))
            .collect()
    }

    fn fresh(items: Vec<Result<DependentRecord, RegistryError>>) -> DependentStream {
        stream::iter(items).boxed()
    }

    #[tokio::test]
    async fn test_reconcile_stream_merges() {
        let prior: DependentsCollection = records(&[("a", 10), ("b", 5)]).into_iter().collect();
        let stream = fresh(records(&[("b", 6), ("c", 20)]).into_iter().map(Ok).collect());

        let result = reconcile_stream(
            stream,
            prior,
            &FormatOptions::new(),
            SummaryMode::Write,
            &Progress::disabled(),
        )
        .await
        .unwrap();

        assert_eq!(result.counts.describe(SummaryMode::Write), "Added 1, updated 1, removed 1");
        assert_eq!(result.collection.names().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_reconcile_stream_formats_before_comparing() {
        let prior: DependentsCollection = records(&[("a", 1200)]).into_iter().collect();
        let stream = fresh(vec![Ok(DependentRecord::new("a", 1234))]);
        let format = FormatOptions::new().with_download_precision(Some(2));

        let result = reconcile_stream(
            stream,
            prior,
            &format,
            SummaryMode::Check,
            &Progress::disabled(),
        )
        .await
        .unwrap();

        assert!(!result.is_outdated());
    }

    #[tokio::test]
    async fn test_reconcile_stream_keeps_fetched_manifest() {
        let mut pkg = serde_json::Map::new();
        pkg.insert("version".to_string(), serde_json::json!("1.0.0"));
        let stream = fresh(vec![Ok(DependentRecord::new("a", 10).with_pkg(pkg.clone()))]);

        let result = reconcile_stream(
            stream,
            DependentsCollection::new(),
            &FormatOptions::new(),
            SummaryMode::Write,
            &Progress::disabled(),
        )
        .await
        .unwrap();

        let record = result.collection.get("a").unwrap();
        assert_eq!(record.pkg, Some(pkg));
    }

    #[tokio::test]
    async fn test_reconcile_stream_counts_prior_with_mistyped_fields_as_removed() {
        let input = "{\"name\":\"a\"}\n{\"name\":\"b\",\"dependentCount\":2.5}\n";
        let prior = ndjson::read_collection(std::io::Cursor::new(input)).unwrap();
        let stream = fresh(vec![Ok(DependentRecord::new("c", 1))]);

        let result = reconcile_stream(
            stream,
            prior,
            &FormatOptions::new(),
            SummaryMode::Write,
            &Progress::disabled(),
        )
        .await
        .unwrap();

        assert_eq!(result.counts.removed, 2);
    }

    #[tokio::test]
    async fn test_reconcile_stream_fails_on_stream_error() {
        let stream = fresh(vec![
            Ok(DependentRecord::new("a", 1)),
            Err(RegistryError::network_error("https://example.com", "reset")),
        ]);

        let err = reconcile_stream(
            stream,
            DependentsCollection::new(),
            &FormatOptions::new(),
            SummaryMode::Write,
            &Progress::disabled(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Registry(_)));
    }

    #[tokio::test]
    async fn test_reconcile_stream_without_data() {
        let err = reconcile_stream(
            fresh(Vec::new()),
            DependentsCollection::new(),
            &FormatOptions::new(),
            SummaryMode::Write,
            &Progress::disabled(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Result(ResultError::NoNewData)));
    }

    #[test]
    fn test_missing_implicit_input_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let input = InputFile {
            path: dir.path().join("x.ndjson"),
            origin: InputOrigin::Named,
        };
        assert!(read_prior(&input).unwrap().is_empty());

        let input = InputFile {
            origin: InputOrigin::InputFlag,
            ..input
        };
        assert!(matches!(read_prior(&input), Err(AppError::Input(_))));
    }
}
