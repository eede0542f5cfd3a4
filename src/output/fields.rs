//! Record formatting applied before records are compared or written

use crate::domain::{DependentRecord, PackageManifest};

/// Formatting of fresh records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Top-level manifest fields to keep; everything when unset
    pub pkg_fields: Option<Vec<String>>,
    /// Round downloads to the nearest 10^n
    pub download_precision: Option<u32>,
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pkg_fields(mut self, fields: Vec<String>) -> Self {
        self.pkg_fields = if fields.is_empty() { None } else { Some(fields) };
        self
    }

    pub fn with_download_precision(mut self, precision: Option<u32>) -> Self {
        self.download_precision = precision;
        self
    }

    pub fn apply(&self, mut record: DependentRecord) -> DependentRecord {
        if let Some(fields) = &self.pkg_fields {
            record.pkg = record.pkg.map(|pkg| pick(&pkg, fields));
        }
        if let (Some(precision), Some(downloads)) = (self.download_precision, record.downloads) {
            record.downloads = Some(round_to_precision(downloads, precision));
        }
        record
    }
}

/// The listed fields of a manifest, in list order
pub fn pick(pkg: &PackageManifest, fields: &[String]) -> PackageManifest {
    fields
        .iter()
        .filter_map(|field| pkg.get(field).map(|value| (field.clone(), value.clone())))
        .collect()
}

/// Round to the nearest multiple of 10^precision, halves rounding up
pub fn round_to_precision(value: u64, precision: u32) -> u64 {
    let Some(step) = 10u64.checked_pow(precision) else {
        return 0;
    };
    if step == 1 {
        return value;
    }

    let remainder = value % step;
    let down = value - remainder;
    if remainder * 2 >= step {
        down.saturating_add(step)
    } else {
        down
    }
}
