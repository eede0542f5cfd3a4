//! Record filtering and sorting
//!
//! Each predicate is independent and passes when its option is unset. A
//! `DependentFilter` combines the active ones; a record is kept only when
//! all of them pass.

mod sort;

pub use sort::SortOrder;

use crate::domain::DependentRecord;
use chrono::{DateTime, Utc};
use node_semver::Range;

/// Keep records whose latest release is at most `max_age_days` whole days old;
/// zero disables the check
pub fn include_by_age(
    record: &DependentRecord,
    max_age_days: Option<u32>,
    now: DateTime<Utc>,
) -> bool {
    let Some(max_age) = max_age_days.filter(|&days| days > 0) else {
        return true;
    };

    record
        .release_age_days(now)
        .is_some_and(|days| days <= i64::from(max_age))
}

/// Keep records with at least `min_downloads` downloads; zero disables the check
pub fn include_by_downloads(record: &DependentRecord, min_downloads: Option<u64>) -> bool {
    match min_downloads {
        None | Some(0) => true,
        Some(min) => record.downloads.is_some_and(|downloads| downloads >= min),
    }
}

/// Keep records whose repository URL starts with any of `prefixes`
pub fn include_by_repository_prefix(record: &DependentRecord, prefixes: &[String]) -> bool {
    if prefixes.is_empty() {
        return true;
    }

    record
        .repository_url
        .as_deref()
        .is_some_and(|url| prefixes.iter().any(|prefix| url.starts_with(prefix.as_str())))
}

/// Keep records whose declared range overlaps `target_version`
pub fn include_by_target_version(record: &DependentRecord, target_version: Option<&str>) -> bool {
    let Some(wanted) = target_version else {
        return true;
    };

    record
        .target_version
        .as_deref()
        .is_some_and(|declared| ranges_intersect(declared, wanted))
}

/// True when two npm ranges share at least one version; invalid ranges never do
pub fn ranges_intersect(a: &str, b: &str) -> bool {
    match (a.parse::<Range>(), b.parse::<Range>()) {
        (Ok(a), Ok(b)) => a.intersect(&b).is_some(),
        _ => false,
    }
}

/// Combined record filter
#[derive(Debug, Clone)]
pub struct DependentFilter {
    /// Maximum age in days of the latest release
    pub max_age_days: Option<u32>,
    /// Minimum downloads, in the window the records were collected with
    pub min_downloads: Option<u64>,
    /// Accepted repository URL prefixes
    pub repository_prefixes: Vec<String>,
    /// Range the declared target range must overlap
    pub target_version: Option<String>,
    now: DateTime<Utc>,
}

impl Default for DependentFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DependentFilter {
    /// Create a filter that keeps everything
    pub fn new() -> Self {
        Self {
            max_age_days: None,
            min_downloads: None,
            repository_prefixes: Vec::new(),
            target_version: None,
            now: Utc::now(),
        }
    }

    pub fn with_max_age_days(mut self, max_age_days: Option<u32>) -> Self {
        self.max_age_days = max_age_days;
        self
    }

    pub fn with_min_downloads(mut self, min_downloads: Option<u64>) -> Self {
        self.min_downloads = min_downloads;
        self
    }

    pub fn with_repository_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.repository_prefixes = prefixes;
        self
    }

    pub fn with_target_version(mut self, target_version: Option<String>) -> Self {
        self.target_version = target_version;
        self
    }

    /// Fix the time release ages are measured against
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Returns true if the record passes every active predicate
    pub fn matches(&self, record: &DependentRecord) -> bool {
        include_by_age(record, self.max_age_days, self.now)
            && include_by_downloads(record, self.min_downloads)
            && include_by_repository_prefix(record, &self.repository_prefixes)
            && include_by_target_version(record, self.target_version.as_deref())
    }
}
