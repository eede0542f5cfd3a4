//! Reconciliation of fresh discoveries against a prior collection
//!
//! Every prior name starts out "not yet rediscovered". Each fresh record is
//! classified against the prior value with the same name:
//! - absent: added
//! - present and equal: unchanged
//! - present and different: updated
//!
//! Prior names never rediscovered are removed once the fresh stream ends.

mod refresh;

pub use refresh::{refresh_record, RefreshOutcome, RefreshTally};

use crate::domain::{ChangeCounts, DependentRecord, DependentsCollection};
use crate::error::ResultError;
use std::collections::HashSet;

/// How a fresh record relates to the prior collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Added,
    Updated,
    Unchanged,
}

/// Merged collection and counts of a finished reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationResult {
    pub counts: ChangeCounts,
    pub collection: DependentsCollection,
}

impl ReconciliationResult {
    /// Returns true if the prior collection differed from the fresh data
    pub fn is_outdated(&self) -> bool {
        self.counts.has_changes()
    }
}

/// Incremental reconciliation state for one run
#[derive(Debug)]
pub struct Reconciler {
    collection: DependentsCollection,
    remaining: HashSet<String>,
    counts: ChangeCounts,
}

impl Reconciler {
    /// Start reconciling against `prior`; pass an empty collection when there is none
    pub fn new(prior: DependentsCollection) -> Self {
        let remaining = prior.names().map(str::to_string).collect();
        Self {
            collection: prior,
            remaining,
            counts: ChangeCounts::default(),
        }
    }

    /// Classify a fresh record and merge it in
    pub fn observe(&mut self, record: DependentRecord) -> Classification {
        self.remaining.remove(&record.name);

        let classification = match self.collection.get(&record.name) {
            None => Classification::Added,
            Some(prior) if *prior == record => Classification::Unchanged,
            Some(_) => Classification::Updated,
        };

        match classification {
            Classification::Added => {
                self.counts.added += 1;
                self.collection.insert(record);
            }
            Classification::Updated => {
                self.counts.updated += 1;
                self.collection.insert(record);
            }
            Classification::Unchanged => self.counts.unchanged += 1,
        }

        classification
    }

    /// Counts so far; nothing is counted as removed until `finish`
    pub fn counts(&self) -> ChangeCounts {
        self.counts
    }

    /// Remove every prior record that was not rediscovered.
    ///
    /// Fails with `NoNewData` when no fresh record was observed at all, so an
    /// empty discovery never wipes a collection.
    pub fn finish(self) -> Result<ReconciliationResult, ResultError> {
        let Self {
            mut collection,
            remaining,
            mut counts,
        } = self;

        if counts.observed() == 0 {
            return Err(ResultError::NoNewData);
        }

        counts.removed = remaining.len();
        collection.retain(|record| !remaining.contains(&record.name));

        Ok(ReconciliationResult { counts, collection })
    }
}

/// Reconcile a complete fresh set against `prior` in one call
pub fn reconcile(
    prior: DependentsCollection,
    fresh: impl IntoIterator<Item = DependentRecord>,
) -> Result<ReconciliationResult, ResultError> {
    let mut reconciler = Reconciler::new(prior);
    for record in fresh {
        reconciler.observe(record);
    }
    reconciler.finish()
}
