//! Dependent discovery
//!
//! This module provides:
//! - Discovery options, including download thresholds with an explicit window
//! - Candidate streams from the two sources (ecosyste.ms and the npm website)
//! - The per-candidate enricher that gates and completes each record
//! - Single-package lookups used when refreshing a collection

mod enricher;
mod sources;

pub use enricher::Enricher;
pub use sources::{ecosystem_candidates, npm_dependent_names, Candidate};

use crate::concurrency::{bounded_map, MapOrder};
use crate::domain::{DependentRecord, PackageLookup};
use crate::error::{AppError, InputError, RegistryError};
use crate::registry::{EcosystemsApi, NpmRegistry, Transport};
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

/// Weeks counted per month when converting download thresholds
pub const WEEKS_PER_MONTH: u64 = 4;

/// Page size used against the ecosyste.ms listing
pub const ECOSYSTEMS_PER_PAGE: usize = 100;

/// Concurrent enrichments of ecosyste.ms candidates
pub const ECOSYSTEMS_CONCURRENCY: usize = 2;

/// Concurrent enrichments of npm website candidates
pub const NPM_CONCURRENCY: usize = 12;

const LOG_TARGET: &str = "list_dependents::discovery";

/// Stream of discovered dependents
pub type DependentStream = BoxStream<'static, Result<DependentRecord, RegistryError>>;

/// Where dependents are discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    /// ecosyste.ms dependents listing, monthly downloads
    #[default]
    Ecosystems,
    /// npm website listing, weekly downloads looked up per package
    Npm,
}

impl Source {
    /// The download window figures from this source cover
    pub fn download_window(self) -> DownloadWindow {
        match self {
            Source::Ecosystems => DownloadWindow::LastMonth,
            Source::Npm => DownloadWindow::LastWeek,
        }
    }
}

/// Period a download figure covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadWindow {
    LastWeek,
    LastMonth,
}

/// Minimum downloads over a given window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadThreshold {
    pub count: u64,
    pub window: DownloadWindow,
}

impl DownloadThreshold {
    pub fn last_week(count: u64) -> Self {
        Self {
            count,
            window: DownloadWindow::LastWeek,
        }
    }

    pub fn last_month(count: u64) -> Self {
        Self {
            count,
            window: DownloadWindow::LastMonth,
        }
    }

    /// The same threshold expressed over another window.
    ///
    /// Approximates a month as `WEEKS_PER_MONTH` weeks; weekly figures derived
    /// from monthly ones round up.
    pub fn in_window(self, window: DownloadWindow) -> Self {
        let count = match (self.window, window) {
            (DownloadWindow::LastWeek, DownloadWindow::LastMonth) => {
                self.count.saturating_mul(WEEKS_PER_MONTH)
            }
            (DownloadWindow::LastMonth, DownloadWindow::LastWeek) => {
                self.count.div_ceil(WEEKS_PER_MONTH)
            }
            _ => self.count,
        };
        Self { count, window }
    }

    /// Returns true if `downloads` meets the threshold
    pub fn allows(&self, downloads: u64) -> bool {
        downloads >= self.count
    }
}

/// Options for a discovery run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependentsOptions {
    /// Maximum number of listing pages fetched
    pub max_pages: Option<u32>,
    /// Minimum downloads a dependent needs; no gate when unset
    pub min_downloads: Option<DownloadThreshold>,
    /// Maximum age in days of the latest release
    pub max_age_days: Option<u32>,
    /// Leave out the package manifest and skip fetching it
    pub skip_pkg: bool,
    /// Listing page size, defaulting per source
    pub per_page: Option<usize>,
    /// Include dependents whose latest release no longer depends on the package
    pub include_historic: bool,
    /// Concurrent enrichments, defaulting per source
    pub concurrency: Option<usize>,
}

impl DependentsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_min_downloads(mut self, threshold: DownloadThreshold) -> Self {
        self.min_downloads = Some(threshold);
        self
    }

    pub fn with_max_age_days(mut self, max_age_days: Option<u32>) -> Self {
        self.max_age_days = max_age_days;
        self
    }

    pub fn with_skip_pkg(mut self, skip_pkg: bool) -> Self {
        self.skip_pkg = skip_pkg;
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_include_historic(mut self, include_historic: bool) -> Self {
        self.include_historic = include_historic;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }
}

/// Entry point for discovering and looking up dependents
#[derive(Clone)]
pub struct Discovery {
    npm: NpmRegistry,
    ecosystems: EcosystemsApi,
}

impl Discovery {
    /// Create a discovery against the public endpoints
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, RegistryError> {
        Ok(Self {
            npm: NpmRegistry::new(Arc::clone(&transport))?,
            ecosystems: EcosystemsApi::new(transport)?,
        })
    }

    /// Create a discovery from preconfigured adapters
    pub fn with_adapters(npm: NpmRegistry, ecosystems: EcosystemsApi) -> Self {
        Self { npm, ecosystems }
    }

    /// Discover the dependents of `name` from `source`
    pub fn dependents(
        &self,
        source: Source,
        name: &str,
        options: &DependentsOptions,
    ) -> Result<DependentStream, AppError> {
        match source {
            Source::Ecosystems => self.ecosystem_dependents(name, options),
            Source::Npm => self.npm_dependents(name, options),
        }
    }

    /// Discover dependents through the ecosyste.ms listing
    pub fn ecosystem_dependents(
        &self,
        name: &str,
        options: &DependentsOptions,
    ) -> Result<DependentStream, AppError> {
        validate_name(name)?;
        let candidates = ecosystem_candidates(&self.ecosystems, name, options)?;
        let concurrency = options.concurrency.unwrap_or(ECOSYSTEMS_CONCURRENCY);

        Ok(self.enrich(name, candidates, options, Source::Ecosystems, concurrency))
    }

    /// Discover dependents through the npm website listing
    pub fn npm_dependents(
        &self,
        name: &str,
        options: &DependentsOptions,
    ) -> Result<DependentStream, AppError> {
        validate_name(name)?;
        let candidates = npm_dependent_names(&self.npm, name, options.max_pages)?
            .map(|result| result.map(Candidate::Named))
            .boxed();
        let concurrency = options.concurrency.unwrap_or(NPM_CONCURRENCY);

        Ok(self.enrich(name, candidates, options, Source::Npm, concurrency))
    }

    /// Look up the current data of a single dependent of `target`.
    ///
    /// No download or age gates apply; the record is rebuilt as discovery
    /// would have built it. An empty `target` derives no target range.
    pub async fn lookup_dependent(
        &self,
        target: &str,
        name: &str,
        skip_pkg: bool,
    ) -> PackageLookup<DependentRecord> {
        let enricher = Enricher::new(
            target,
            self.npm.clone(),
            DependentsOptions::new().with_skip_pkg(skip_pkg),
            Source::Ecosystems,
        );

        match self.ecosystems.lookup_package(name).await {
            PackageLookup::Found(package) => match enricher.complete(package).await {
                Some(record) => PackageLookup::Found(record),
                None => PackageLookup::NotFound,
            },
            PackageLookup::NotFound => PackageLookup::NotFound,
            PackageLookup::Removed => PackageLookup::Removed,
        }
    }

    fn enrich(
        &self,
        target: &str,
        candidates: BoxStream<'static, Result<Candidate, RegistryError>>,
        options: &DependentsOptions,
        source: Source,
        concurrency: usize,
    ) -> DependentStream {
        let enricher = Arc::new(Enricher::new(
            target,
            self.npm.clone(),
            options.clone(),
            source,
        ));

        bounded_map(
            unseen(candidates, target),
            concurrency,
            MapOrder::Unordered,
            move |candidate| {
                let enricher = Arc::clone(&enricher);
                async move {
                    match candidate {
                        Ok(candidate) => enricher.enrich(candidate).await.map(Ok),
                        Err(e) => Some(Err(e)),
                    }
                }
            },
        )
    }
}

fn validate_name(name: &str) -> Result<(), InputError> {
    if name.trim().is_empty() {
        return Err(InputError::EmptyModuleName);
    }
    Ok(())
}

/// Drops candidates whose name was already seen during this run.
///
/// The target itself counts as seen from the start.
fn unseen(
    candidates: BoxStream<'static, Result<Candidate, RegistryError>>,
    target: &str,
) -> BoxStream<'static, Result<Candidate, RegistryError>> {
    let mut seen = HashSet::from([target.to_string()]);

    candidates
        .filter(move |candidate| {
            let keep = match candidate {
                Ok(candidate) => {
                    let first = seen.insert(candidate.name().to_string());
                    if !first {
                        log::trace!(target: LOG_TARGET, "Already seen \"{}\"", candidate.name());
                    }
                    first
                }
                Err(_) => true,
            };
            future::ready(keep)
        })
        .boxed()
}
