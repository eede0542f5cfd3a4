//! ecosyste.ms packages API adapter
//!
//! Dependents listing and single-package lookups against the npmjs.org
//! registry as aggregated by ecosyste.ms.
//! API endpoint: https://packages.ecosyste.ms/api/v1/registries/npmjs.org/packages/{package}

use crate::domain::PackageLookup;
use crate::error::RegistryError;
use crate::registry::{join_path, parse_base, Transport};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// ecosyste.ms packages API base URL
pub const ECOSYSTEMS_API_URL: &str = "https://packages.ecosyste.ms/api/v1";

/// Reporting period a download figure must carry to be trusted
const MONTHLY_PERIOD: &str = "last-month";

const LOG_TARGET: &str = "list_dependents::ecosystems";

/// A package as listed by ecosyste.ms
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EcosystemsPackage {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<u64>,
    #[serde(default)]
    pub downloads_period: Option<String>,
    #[serde(default)]
    pub dependent_packages_count: Option<u64>,
    #[serde(default)]
    pub first_release_published_at: Option<String>,
    #[serde(default)]
    pub latest_release_published_at: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
}

impl EcosystemsPackage {
    /// Validate a raw item, rejecting anything without a non-empty name
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value::<Self>(value)
            .ok()
            .filter(|package| !package.name.is_empty())
    }

    /// The download figure, only when it covers the last month
    pub fn monthly_downloads(&self) -> Option<u64> {
        match self.downloads_period.as_deref() {
            Some(MONTHLY_PERIOD) => self.downloads,
            _ => None,
        }
    }
}

/// ecosyste.ms API adapter
#[derive(Clone)]
pub struct EcosystemsApi {
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl EcosystemsApi {
    /// Create an adapter against the public API
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, RegistryError> {
        Self::with_base_url(transport, ECOSYSTEMS_API_URL)
    }

    /// Create an adapter against a custom API location
    pub fn with_base_url(
        transport: Arc<dyn Transport>,
        base_url: &str,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            transport,
            base_url: parse_base(base_url)?,
        })
    }

    /// The transport lookups go through
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// URL of a single package
    pub fn package_url(&self, name: &str) -> Result<Url, RegistryError> {
        join_path(
            &self.base_url,
            &format!("registries/npmjs.org/packages/{}", name),
        )
    }

    /// URL of the dependents listing of a package, without paging parameters.
    ///
    /// Only dependents whose latest release depends on the package are listed
    /// unless `include_historic` is set.
    pub fn dependents_url(&self, name: &str, include_historic: bool) -> Result<Url, RegistryError> {
        let mut url = join_path(
            &self.base_url,
            &format!("registries/npmjs.org/packages/{}/dependent_packages", name),
        )?;
        if !include_historic {
            url.query_pairs_mut().append_pair("latest", "true");
        }
        Ok(url)
    }

    /// Look up a single package
    pub async fn lookup_package(&self, name: &str) -> PackageLookup<EcosystemsPackage> {
        let url = match self.package_url(name) {
            Ok(url) => url,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Skipping lookup of \"{}\": {}", name, e);
                return PackageLookup::NotFound;
            }
        };

        match self.transport.get_json(&url).await {
            Ok(body) => match EcosystemsPackage::from_value(body) {
                Some(package) => PackageLookup::Found(package),
                None => {
                    log::warn!(target: LOG_TARGET, "Unexpected data for \"{}\"", name);
                    PackageLookup::NotFound
                }
            },
            Err(RegistryError::NotFound { .. }) => {
                log::debug!(target: LOG_TARGET, "\"{}\" no longer exists", name);
                PackageLookup::Removed
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Lookup of \"{}\" failed: {}", name, e);
                PackageLookup::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HttpClient;
    use serde_json::json;

    fn api() -> EcosystemsApi {
        EcosystemsApi::new(Arc::new(HttpClient::new().unwrap())).unwrap()
    }

    #[test]
    fn test_dependents_url_latest_only() {
        assert_eq!(
            api().dependents_url("c8", false).unwrap().as_str(),
            "https://packages.ecosyste.ms/api/v1/registries/npmjs.org/packages/c8/dependent_packages?latest=true"
        );
    }

    #[test]
    fn test_dependents_url_historic() {
        assert_eq!(
            api().dependents_url("c8", true).unwrap().as_str(),
            "https://packages.ecosyste.ms/api/v1/registries/npmjs.org/packages/c8/dependent_packages"
        );
    }

    #[test]
    fn test_package_url() {
        assert_eq!(
            api().package_url("@voxpelli/tsconfig").unwrap().as_str(),
            "https://packages.ecosyste.ms/api/v1/registries/npmjs.org/packages/@voxpelli/tsconfig"
        );
    }

    #[test]
    fn test_from_value_full_item() {
        let package = EcosystemsPackage::from_value(json!({
            "name": "foo",
            "downloads": 1200,
            "downloads_period": "last-month",
            "dependent_packages_count": 4,
            "first_release_published_at": "2020-01-01T00:00:00.000Z",
            "latest_release_published_at": "2024-01-01T00:00:00.000Z",
            "repository_url": "https://github.com/a/foo",
            "ignored": true
        }))
        .unwrap();

        assert_eq!(package.monthly_downloads(), Some(1200));
        assert_eq!(package.dependent_packages_count, Some(4));
    }

    #[test]
    fn test_from_value_rejects_shape_mismatch() {
        assert!(EcosystemsPackage::from_value(json!({"downloads": 3})).is_none());
        assert!(EcosystemsPackage::from_value(json!({"name": ""})).is_none());
        assert!(EcosystemsPackage::from_value(json!("foo")).is_none());
    }

    #[test]
    fn test_from_value_accepts_nulls() {
        let package = EcosystemsPackage::from_value(json!({
            "name": "foo",
            "downloads": null,
            "repository_url": null
        }))
        .unwrap();
        assert_eq!(package.downloads, None);
    }

    #[test]
    fn test_monthly_downloads_requires_last_month() {
        let weekly = EcosystemsPackage::from_value(json!({
            "name": "foo",
            "downloads": 50,
            "downloads_period": "last-week"
        }))
        .unwrap();
        assert_eq!(weekly.monthly_downloads(), None);

        let unlabeled = EcosystemsPackage::from_value(json!({"name": "foo", "downloads": 50}))
            .unwrap();
        assert_eq!(unlabeled.monthly_downloads(), None);
    }
}
