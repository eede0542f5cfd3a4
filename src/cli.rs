//! CLI argument parsing module for list-dependents

use crate::discovery::Source;
use crate::filter::SortOrder;
use crate::output::FormatOptions;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Default weekly downloads a dependent needs to be listed or kept
pub const DEFAULT_MIN_DOWNLOADS: u64 = 100;

/// Lists and maintains collections of npm module dependents
#[derive(Parser, Debug, Clone)]
#[command(
    name = "list-dependents",
    version,
    about = "Lists and maintains collections of npm module dependents"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Output debug data
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Disable progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl CliArgs {
    /// Whether a spinner may be drawn for a run writing to a file
    pub fn shows_progress(&self) -> bool {
        !self.quiet && !self.debug
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Look up the dependents of a module
    List(ListArgs),
    /// Filter a list of dependents
    Filter(FilterArgs),
    /// Refresh the data of a list of dependents
    Refresh(RefreshArgs),
}

/// Where dependents are looked up
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceArg {
    /// packages.ecosyste.ms dependents listing
    #[default]
    Ecosystems,
    /// npmjs.com "depended" pages
    Npm,
}

impl From<SourceArg> for Source {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Ecosystems => Source::Ecosystems,
            SourceArg::Npm => Source::Npm,
        }
    }
}

/// Shared file options
#[derive(Args, Debug, Clone, Default)]
pub struct FileArgs {
    /// Read data from the specified file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output data to the specified file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Options controlling how fresh records are shaped
#[derive(Args, Debug, Clone, Default)]
pub struct FormatArgs {
    /// Narrow down the package.json fields to include (can be specified multiple times)
    #[arg(long = "field", action = ArgAction::Append)]
    pub fields: Vec<String>,

    /// Include the module's package.json file in the result
    #[arg(long)]
    pub include_pkg: bool,

    /// Round download counts to the nearest 10^N
    #[arg(long, value_name = "N")]
    pub download_precision: Option<u32>,
}

impl FormatArgs {
    /// Manifests are fetched only when they end up in the output
    pub fn skip_pkg(&self) -> bool {
        !(self.include_pkg || !self.fields.is_empty())
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions::new()
            .with_pkg_fields(self.fields.clone())
            .with_download_precision(self.download_precision)
    }
}

/// Sort options
#[derive(Args, Debug, Clone, Default)]
pub struct SortArgs {
    /// Sort by name
    #[arg(long)]
    pub sort: bool,

    /// Sort by dependents
    #[arg(long)]
    pub sort_dependent: bool,

    /// Sort by downloads
    #[arg(long)]
    pub sort_download: bool,
}

impl SortArgs {
    pub fn order(&self) -> SortOrder {
        SortOrder {
            by_name: self.sort,
            by_dependents: self.sort_dependent,
            by_downloads: self.sort_download,
        }
    }
}

/// Network options
#[derive(Args, Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Retries for rate limited requests
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Concurrent package lookups
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,
}

impl NetworkArgs {
    pub fn concurrency(&self) -> Option<usize> {
        self.concurrency
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Name of the npm module to look up dependents of
    pub module: String,

    /// File to read and write the list from
    pub target_file: Option<PathBuf>,

    #[command(flatten)]
    pub files: FileArgs,

    /// Read and write data to a file with the module name (<module>.ndjson)
    #[arg(short, long)]
    pub named: bool,

    /// Check if the list is outdated
    #[arg(long)]
    pub check: bool,

    /// Include dependents whose latest release no longer depends on the module
    #[arg(long)]
    pub include_historic: bool,

    /// Where to look up dependents
    #[arg(long, value_enum, default_value_t = SourceArg::Ecosystems)]
    pub source: SourceArg,

    /// Max age in days of the latest release, 0 disables the check
    #[arg(long, value_name = "DAYS")]
    pub max_age: Option<u32>,

    /// Max amount of pages to iterate through
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Min amount of weekly downloads needed to be included
    #[arg(long, default_value_t = DEFAULT_MIN_DOWNLOADS)]
    pub min_downloads: u64,

    #[command(flatten)]
    pub format: FormatArgs,

    #[command(flatten)]
    pub sort: SortArgs,

    #[command(flatten)]
    pub network: NetworkArgs,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// File to read and write the list from
    pub target_file: Option<PathBuf>,

    #[command(flatten)]
    pub files: FileArgs,

    /// Max age in days of the latest release, 0 disables the check
    #[arg(long, value_name = "DAYS")]
    pub max_age: Option<u32>,

    /// Min amount of downloads needed to be included, 0 disables the check
    #[arg(long, default_value_t = DEFAULT_MIN_DOWNLOADS)]
    pub min_downloads: u64,

    /// Maximum amount of items to include
    #[arg(long)]
    pub max_count: Option<usize>,

    /// Required repository prefix (can be specified multiple times)
    #[arg(long, action = ArgAction::Append)]
    pub repository_prefix: Vec<String>,

    /// Require that the target version is of this semantic version range
    #[arg(long)]
    pub target_version: Option<String>,

    #[command(flatten)]
    pub sort: SortArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RefreshArgs {
    /// File to read and write the list from
    pub target_file: Option<PathBuf>,

    #[command(flatten)]
    pub files: FileArgs,

    /// Check if the data is outdated
    #[arg(long)]
    pub check: bool,

    #[command(flatten)]
    pub format: FormatArgs,

    #[command(flatten)]
    pub network: NetworkArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_list_defaults() {
        let args = parse(&["list-dependents", "list", "installed-check"]);
        let Command::List(list) = args.command else {
            panic!("expected list");
        };

        assert_eq!(list.module, "installed-check");
        assert_eq!(list.min_downloads, 100);
        assert_eq!(list.source, SourceArg::Ecosystems);
        assert_eq!(list.network.retries, 0);
        assert!(list.target_file.is_none());
        assert!(list.format.skip_pkg());
        assert!(!list.sort.order().is_active());
        assert!(!args.debug);
    }

    #[test]
    fn test_list_flags() {
        let args = parse(&[
            "list-dependents",
            "list",
            "-n",
            "--check",
            "--source",
            "npm",
            "--field",
            "engines",
            "--field",
            "version",
            "--max-pages",
            "2",
            "--min-downloads",
            "0",
            "--sort-download",
            "installed-check",
            "-q",
        ]);
        let Command::List(list) = args.command else {
            panic!("expected list");
        };

        assert!(list.named);
        assert!(list.check);
        assert_eq!(list.source, SourceArg::Npm);
        assert_eq!(list.format.fields, vec!["engines", "version"]);
        assert!(!list.format.skip_pkg());
        assert_eq!(list.max_pages, Some(2));
        assert_eq!(list.min_downloads, 0);
        assert!(list.sort.order().by_downloads);
        assert!(args.quiet);
    }

    #[test]
    fn test_filter_flags() {
        let args = parse(&[
            "list-dependents",
            "filter",
            "list.ndjson",
            "--repository-prefix",
            "https://github.com/a/",
            "--repository-prefix",
            "https://github.com/b/",
            "--target-version",
            "^2.0.0",
            "--max-count",
            "5",
        ]);
        let Command::Filter(filter) = args.command else {
            panic!("expected filter");
        };

        assert_eq!(filter.target_file, Some(PathBuf::from("list.ndjson")));
        assert_eq!(filter.repository_prefix.len(), 2);
        assert_eq!(filter.target_version.as_deref(), Some("^2.0.0"));
        assert_eq!(filter.max_count, Some(5));
    }

    #[test]
    fn test_refresh_flags() {
        let args = parse(&[
            "list-dependents",
            "-d",
            "refresh",
            "-i",
            "in.ndjson",
            "-o",
            "out.ndjson",
            "--include-pkg",
            "--retries",
            "3",
        ]);
        let Command::Refresh(refresh) = &args.command else {
            panic!("expected refresh");
        };

        assert_eq!(refresh.files.input, Some(PathBuf::from("in.ndjson")));
        assert_eq!(refresh.files.output, Some(PathBuf::from("out.ndjson")));
        assert!(!refresh.format.skip_pkg());
        assert_eq!(refresh.network.retries, 3);
        assert!(args.debug);
        assert!(!args.shows_progress());
    }

    #[test]
    fn test_numeric_flags_are_validated() {
        assert!(
            CliArgs::try_parse_from(["list-dependents", "list", "x", "--max-age", "soon"]).is_err()
        );
        assert!(
            CliArgs::try_parse_from(["list-dependents", "list", "x", "--concurrency", "0"]).is_err()
        );
        assert!(CliArgs::try_parse_from(["list-dependents", "list"]).is_err());
    }

    #[test]
    fn test_source_conversion() {
        assert_eq!(Source::from(SourceArg::Npm), Source::Npm);
        assert_eq!(Source::from(SourceArg::default()), Source::Ecosystems);
    }
}
