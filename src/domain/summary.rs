//! Change counts and their one-line summaries
//!
//! Provides the counters a reconciliation run produces and the wording used
//! when reporting them, both for writing runs and for `--check` runs.

use serde::Serialize;

/// Message shown when a run found nothing to change
pub const ALL_UP_TO_DATE: &str = "All up to date!";

/// How counts are worded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryMode {
    /// The collection is being rewritten
    #[default]
    Write,
    /// The collection is only being checked
    Check,
}

/// Classification counts of a reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl ChangeCounts {
    /// Returns true if anything was added, updated or removed
    pub fn has_changes(&self) -> bool {
        self.added + self.updated + self.removed > 0
    }

    /// Number of fresh records observed
    pub fn observed(&self) -> usize {
        self.added + self.updated + self.unchanged
    }

    /// One-line summary, omitting zero counts
    pub fn describe(&self, mode: SummaryMode) -> String {
        let labels = match mode {
            SummaryMode::Write => ["added", "updated", "unchanged", "removed"],
            SummaryMode::Check => ["missing", "outdated", "up to date", "extraneous"],
        };

        format_summary(&[
            (labels[0], self.added),
            (labels[1], self.updated),
            (labels[2], self.unchanged),
            (labels[3], self.removed),
        ])
    }
}

/// Joins non-zero `label count` pairs with commas and capitalizes the result
pub fn format_summary(parts: &[(&str, usize)]) -> String {
    let joined = parts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| format!("{} {}", label, count))
        .collect::<Vec<_>>()
        .join(", ");

    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
