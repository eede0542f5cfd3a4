//! Record sorting

use crate::domain::DependentRecord;
use std::cmp::Reverse;

/// Which sorts to apply.
///
/// Active sorts run one after another as stable sorts: by name, then by
/// dependent count, then by downloads, so the last active one dominates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOrder {
    /// Name, ascending
    pub by_name: bool,
    /// Dependent count, descending
    pub by_dependents: bool,
    /// Downloads, descending
    pub by_downloads: bool,
}

impl SortOrder {
    /// Returns true if any sort is requested
    pub fn is_active(&self) -> bool {
        self.by_name || self.by_dependents || self.by_downloads
    }

    pub fn apply(&self, records: &mut [DependentRecord]) {
        if self.by_name {
            records.sort_by(|a, b| a.name.cmp(&b.name));
        }
        if self.by_dependents {
            records.sort_by_key(|r| Reverse(r.dependent_count.unwrap_or(0)));
        }
        if self.by_downloads {
            records.sort_by_key(|r| Reverse(r.downloads.unwrap_or(0)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[DependentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    fn sample() -> Vec<DependentRecord> {
        vec![
            DependentRecord::new("c", 10).with_dependent_count(1),
            DependentRecord::new("a", 30),
            DependentRecord::new("b", 10).with_dependent_count(5),
        ]
    }

    #[test]
    fn test_inactive_keeps_order() {
        let mut records = sample();
        SortOrder::default().apply(&mut records);
        assert_eq!(names(&records), vec!["c", "a", "b"]);
        assert!(!SortOrder::default().is_active());
    }

    #[test]
    fn test_sort_by_name() {
        let mut records = sample();
        let order = SortOrder {
            by_name: true,
            ..Default::default()
        };
        order.apply(&mut records);
        assert_eq!(names(&records), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_by_dependents_treats_missing_as_zero() {
        let mut records = sample();
        let order = SortOrder {
            by_dependents: true,
            ..Default::default()
        };
        order.apply(&mut records);
        assert_eq!(names(&records), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_later_sorts_dominate_and_are_stable() {
        let mut records = sample();
        let order = SortOrder {
            by_name: true,
            by_downloads: true,
            ..Default::default()
        };
        order.apply(&mut records);
        assert_eq!(names(&records), vec!["a", "b", "c"]);
    }
}
