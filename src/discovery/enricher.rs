//! Per-candidate enrichment
//!
//! Turns a candidate into a finished record, or drops it:
//! 1. Resolve a download figure for the source's window
//! 2. Apply the minimum downloads gate
//! 3. Apply the maximum age gate
//! 4. Fetch the package manifest unless asked not to
//! 5. Derive the declared target range and repository URL
//!
//! Every drop is logged and never fails the run.

use super::{Candidate, DependentsOptions, Source};
use crate::domain::{age_in_days, DependentRecord, PackageManifest};
use crate::registry::{dependency_range, repository_url, EcosystemsPackage, NpmRegistry};
use chrono::{DateTime, Utc};
use serde_json::Map;

const LOG_TARGET: &str = "list_dependents::enricher";

/// Metadata gathered before the manifest is fetched
struct BaseFields {
    name: String,
    downloads: u64,
    dependent_count: Option<u64>,
    first_release: Option<String>,
    latest_release: Option<String>,
    repository_url: Option<String>,
}

/// Gates and completes the candidates of one discovery run
pub struct Enricher {
    target: String,
    npm: NpmRegistry,
    options: DependentsOptions,
    source: Source,
    now: DateTime<Utc>,
}

impl Enricher {
    pub fn new(
        target: impl Into<String>,
        npm: NpmRegistry,
        options: DependentsOptions,
        source: Source,
    ) -> Self {
        Self {
            target: target.into(),
            npm,
            options,
            source,
            now: Utc::now(),
        }
    }

    /// Fix the time release ages are measured against
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Enrich a candidate, or `None` when it is dropped
    pub async fn enrich(&self, candidate: Candidate) -> Option<DependentRecord> {
        let base = match candidate {
            Candidate::Listed(package) => listed_fields(package)?,
            Candidate::Named(name) => self.named_fields(name).await?,
        };

        if !self.meets_min_downloads(&base) || !self.meets_max_age(&base) {
            return None;
        }

        self.finish(base).await
    }

    /// Complete a listing item without applying any gates
    pub async fn complete(&self, package: EcosystemsPackage) -> Option<DependentRecord> {
        let base = listed_fields(package)?;
        self.finish(base).await
    }

    async fn named_fields(&self, name: String) -> Option<BaseFields> {
        let Some(downloads) = self.npm.fetch_weekly_downloads(&name).await else {
            log::warn!(target: LOG_TARGET, "Skipping \"{}\": Found no download count", name);
            return None;
        };

        Some(BaseFields {
            name,
            downloads,
            dependent_count: None,
            first_release: None,
            latest_release: None,
            repository_url: None,
        })
    }

    fn meets_min_downloads(&self, base: &BaseFields) -> bool {
        let Some(threshold) = self.options.min_downloads else {
            return true;
        };

        let threshold = threshold.in_window(self.source.download_window());
        if threshold.allows(base.downloads) {
            return true;
        }

        log::debug!(
            target: LOG_TARGET,
            "Skipping \"{}\", too few downloads: {}",
            base.name,
            base.downloads
        );
        false
    }

    fn meets_max_age(&self, base: &BaseFields) -> bool {
        let Some(max_age) = self.options.max_age_days.filter(|&days| days > 0) else {
            return true;
        };

        let age = base
            .latest_release
            .as_deref()
            .and_then(|timestamp| age_in_days(timestamp, self.now));

        match age {
            Some(days) if days <= i64::from(max_age) => true,
            Some(days) => {
                log::debug!(
                    target: LOG_TARGET,
                    "Skipping \"{}\", too old: {} days",
                    base.name,
                    days
                );
                false
            }
            None => {
                log::debug!(target: LOG_TARGET, "Skipping \"{}\": Unknown release age", base.name);
                false
            }
        }
    }

    async fn finish(&self, base: BaseFields) -> Option<DependentRecord> {
        let pkg = if self.options.skip_pkg {
            None
        } else {
            match self.npm.fetch_package(&base.name).await {
                Some(pkg) => Some(pkg),
                None => {
                    log::warn!(
                        target: LOG_TARGET,
                        "Skipping \"{}\": Could not fetch its package.json file",
                        base.name
                    );
                    return None;
                }
            }
        };

        Some(self.assemble(base, pkg))
    }

    fn assemble(&self, base: BaseFields, pkg: Option<PackageManifest>) -> DependentRecord {
        let target_version = pkg
            .as_ref()
            .filter(|_| !self.target.is_empty())
            .and_then(|pkg| dependency_range(pkg, &self.target));
        let repository_url = base
            .repository_url
            .or_else(|| pkg.as_ref().and_then(repository_url));

        DependentRecord {
            name: base.name,
            downloads: Some(base.downloads),
            dependent_count: base.dependent_count,
            first_release: base.first_release,
            latest_release: base.latest_release,
            repository_url,
            target_version,
            pkg,
            extra: Map::new(),
        }
    }
}

fn listed_fields(package: EcosystemsPackage) -> Option<BaseFields> {
    let Some(downloads) = package.monthly_downloads() else {
        log::warn!(
            target: LOG_TARGET,
            "Skipping \"{}\": Found no download count",
            package.name
        );
        return None;
    };

    let repository_url = package
        .repository_url
        .as_deref()
        .and_then(crate::registry::normalize_repository_url);

    Some(BaseFields {
        name: package.name,
        downloads,
        dependent_count: package.dependent_packages_count,
        first_release: package.first_release_published_at,
        latest_release: package.latest_release_published_at,
        repository_url,
    })
}
