//! The dependent record stored one per line in a collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A package.json as published to the registry
pub type PackageManifest = Map<String, Value>;

/// A package that depends on the queried module
///
/// Field names are serialized in camelCase. Absent optional fields are left
/// out of the JSON entirely, and unknown fields read from a collection are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentRecord {
    /// npm package name, unique within a collection
    pub name: String,
    /// Downloads over the window of the source the record came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<u64>,
    /// Number of packages depending on this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_count: Option<u64>,
    /// ISO-8601 timestamp of the first release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_release: Option<String>,
    /// ISO-8601 timestamp of the latest release
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_release: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    /// Range this package declares against the queried module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkg: Option<PackageManifest>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DependentRecord {
    /// Creates a record with only a name and a download figure
    pub fn new(name: impl Into<String>, downloads: u64) -> Self {
        Self {
            name: name.into(),
            downloads: Some(downloads),
            dependent_count: None,
            first_release: None,
            latest_release: None,
            repository_url: None,
            target_version: None,
            pkg: None,
            extra: Map::new(),
        }
    }

    /// Sets the dependent count
    pub fn with_dependent_count(mut self, count: u64) -> Self {
        self.dependent_count = Some(count);
        self
    }

    /// Sets the latest release timestamp
    pub fn with_latest_release(mut self, timestamp: impl Into<String>) -> Self {
        self.latest_release = Some(timestamp.into());
        self
    }

    /// Sets the repository URL
    pub fn with_repository_url(mut self, url: impl Into<String>) -> Self {
        self.repository_url = Some(url.into());
        self
    }

    /// Sets the declared target range
    pub fn with_target_version(mut self, range: impl Into<String>) -> Self {
        self.target_version = Some(range.into());
        self
    }

    /// Sets the package manifest
    pub fn with_pkg(mut self, pkg: PackageManifest) -> Self {
        self.pkg = Some(pkg);
        self
    }

    /// Whole days since the latest release, if it is known and parseable
    pub fn release_age_days(&self, now: DateTime<Utc>) -> Option<i64> {
        self.latest_release
            .as_deref()
            .and_then(|timestamp| age_in_days(timestamp, now))
    }
}

/// Whole days elapsed between an RFC 3339 timestamp and `now`, truncated
pub fn age_in_days(timestamp: &str, now: DateTime<Utc>) -> Option<i64> {
    let released = DateTime::parse_from_rfc3339(timestamp).ok()?;
    Some((now - released.with_timezone(&Utc)).num_days())
}
