//! In-memory collection of dependents keyed by name

use super::DependentRecord;
use std::collections::HashMap;

/// Records keyed by name, iterated in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependentsCollection {
    records: Vec<DependentRecord>,
    index: HashMap<String, usize>,
}

impl DependentsCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&DependentRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Inserts a record, replacing any record with the same name in place.
    ///
    /// Returns the replaced record.
    pub fn insert(&mut self, record: DependentRecord) -> Option<DependentRecord> {
        match self.index.get(&record.name) {
            Some(&i) => Some(std::mem::replace(&mut self.records[i], record)),
            None => {
                self.index.insert(record.name.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    /// Keeps only the records for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&DependentRecord) -> bool) {
        self.records.retain(|record| keep(record));
        self.reindex();
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependentRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<DependentRecord> {
        self.records
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
    }
}

impl FromIterator<DependentRecord> for DependentsCollection {
    /// Later records with a repeated name replace earlier ones
    fn from_iter<I: IntoIterator<Item = DependentRecord>>(iter: I) -> Self {
        let mut collection = Self::new();
        for record in iter {
            collection.insert(record);
        }
        collection
    }
}

impl IntoIterator for DependentsCollection {
    type Item = DependentRecord;
    type IntoIter = std::vec::IntoIter<DependentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
