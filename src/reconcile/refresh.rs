//! Refreshing the records of an existing collection one by one

use crate::domain::{format_summary, DependentRecord, PackageLookup, SummaryMode};

/// What happened to one record during a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Unchanged,
    Updated,
    /// The lookup failed; the prior record is kept
    Failed,
    /// The package is gone upstream; the record is dropped
    Removed,
}

/// Merge a lookup result into a prior record.
///
/// Returns the record to keep, if any. A fresh record without a manifest or
/// declared target range inherits the prior ones.
pub fn refresh_record(
    prior: DependentRecord,
    lookup: PackageLookup<DependentRecord>,
) -> (Option<DependentRecord>, RefreshOutcome) {
    match lookup {
        PackageLookup::Found(mut fresh) => {
            if fresh.pkg.is_none() {
                fresh.pkg = prior.pkg.clone();
            }
            if fresh.target_version.is_none() {
                fresh.target_version = prior.target_version.clone();
            }
            let outcome = if fresh == prior {
                RefreshOutcome::Unchanged
            } else {
                RefreshOutcome::Updated
            };
            (Some(fresh), outcome)
        }
        PackageLookup::NotFound => (Some(prior), RefreshOutcome::Failed),
        PackageLookup::Removed => (None, RefreshOutcome::Removed),
    }
}

/// Running counts of a refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshTally {
    pub unchanged: usize,
    pub updated: usize,
    pub failed: usize,
    pub removed: usize,
}

impl RefreshTally {
    pub fn record(&mut self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Unchanged => self.unchanged += 1,
            RefreshOutcome::Updated => self.updated += 1,
            RefreshOutcome::Failed => self.failed += 1,
            RefreshOutcome::Removed => self.removed += 1,
        }
    }

    /// Returns true if anything could not be confirmed as up to date
    pub fn is_outdated(&self) -> bool {
        self.updated + self.failed + self.removed > 0
    }

    pub fn describe(&self, mode: SummaryMode) -> String {
        let (updated, failed) = match mode {
            SummaryMode::Write => ("updated", "failed to update"),
            SummaryMode::Check => ("outdated", "failed to check"),
        };

        format_summary(&[
            ("up to date", self.unchanged),
            (updated, self.updated),
            (failed, self.failed),
            ("removed", self.removed),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn pkg(version: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("version".into(), json!(version));
        map
    }

    #[test]
    fn test_found_and_equal_is_unchanged() {
        let prior = DependentRecord::new("a", 10);
        let (kept, outcome) =
            refresh_record(prior.clone(), PackageLookup::Found(DependentRecord::new("a", 10)));

        assert_eq!(outcome, RefreshOutcome::Unchanged);
        assert_eq!(kept, Some(prior));
    }

    #[test]
    fn test_found_without_pkg_keeps_prior_pkg() {
        let prior = DependentRecord::new("a", 10).with_pkg(pkg("1.0.0"));
        let (kept, outcome) =
            refresh_record(prior, PackageLookup::Found(DependentRecord::new("a", 12)));

        assert_eq!(outcome, RefreshOutcome::Updated);
        let kept = kept.unwrap();
        assert_eq!(kept.downloads, Some(12));
        assert_eq!(kept.pkg, Some(pkg("1.0.0")));
    }

    #[test]
    fn test_found_keeps_prior_target_version() {
        let prior = DependentRecord::new("a", 10).with_target_version("^1.0.0");
        let (kept, outcome) =
            refresh_record(prior.clone(), PackageLookup::Found(DependentRecord::new("a", 10)));

        assert_eq!(outcome, RefreshOutcome::Unchanged);
        assert_eq!(kept, Some(prior));
    }

    #[test]
    fn test_not_found_keeps_prior() {
        let prior = DependentRecord::new("a", 10);
        let (kept, outcome) = refresh_record(prior.clone(), PackageLookup::NotFound);

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert_eq!(kept, Some(prior));
    }

    #[test]
    fn test_removed_drops_record() {
        let (kept, outcome) = refresh_record(DependentRecord::new("a", 10), PackageLookup::Removed);

        assert_eq!(outcome, RefreshOutcome::Removed);
        assert!(kept.is_none());
    }

    #[test]
    fn test_tally_describe() {
        let mut tally = RefreshTally::default();
        tally.record(RefreshOutcome::Unchanged);
        tally.record(RefreshOutcome::Unchanged);
        tally.record(RefreshOutcome::Updated);
        tally.record(RefreshOutcome::Failed);

        assert_eq!(
            tally.describe(SummaryMode::Write),
            "Up to date 2, updated 1, failed to update 1"
        );
        assert_eq!(
            tally.describe(SummaryMode::Check),
            "Up to date 2, outdated 1, failed to check 1"
        );
        assert!(tally.is_outdated());
        assert!(!RefreshTally::default().is_outdated());
    }
}
