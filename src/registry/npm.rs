//! npm registry adapter
//!
//! Covers the three npm endpoints the pipeline reads from:
//! - Package manifests: https://registry.npmjs.org/{package}/latest
//! - Weekly downloads: https://api.npmjs.org/downloads/point/last-week/{package}
//! - Website dependents listing: https://www.npmjs.com/browse/depended/{package}

use crate::domain::PackageManifest;
use crate::error::RegistryError;
use crate::registry::{join_path, parse_base, Transport};
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;

/// npm registry base URL
pub const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npm downloads API base URL
pub const NPM_DOWNLOADS_URL: &str = "https://api.npmjs.org";

/// npm website base URL
pub const NPM_WEBSITE_URL: &str = "https://www.npmjs.com";

const LOG_TARGET: &str = "list_dependents::npm";

/// Dependency tables searched for the declared range, in order
const DEPENDENCY_KEYS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// npm registry adapter
#[derive(Clone)]
pub struct NpmRegistry {
    transport: Arc<dyn Transport>,
    registry_url: Url,
    downloads_url: Url,
    website_url: Url,
}

impl NpmRegistry {
    /// Create an adapter against the public npm endpoints
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, RegistryError> {
        Self::with_base_urls(transport, NPM_REGISTRY_URL, NPM_DOWNLOADS_URL, NPM_WEBSITE_URL)
    }

    /// Create an adapter against custom endpoints
    pub fn with_base_urls(
        transport: Arc<dyn Transport>,
        registry_url: &str,
        downloads_url: &str,
        website_url: &str,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            transport,
            registry_url: parse_base(registry_url)?,
            downloads_url: parse_base(downloads_url)?,
            website_url: parse_base(website_url)?,
        })
    }

    /// The transport lookups go through
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// URL of the latest published manifest of a package
    pub fn package_url(&self, name: &str) -> Result<Url, RegistryError> {
        join_path(&self.registry_url, &format!("{}/latest", name))
    }

    /// URL of the last-week download count of a package
    pub fn downloads_url(&self, name: &str) -> Result<Url, RegistryError> {
        join_path(
            &self.downloads_url,
            &format!("downloads/point/last-week/{}", name),
        )
    }

    /// URL of the first page of the website's dependents listing
    pub fn depended_url(&self, name: &str) -> Result<Url, RegistryError> {
        let mut url = join_path(&self.website_url, &format!("browse/depended/{}", name))?;
        url.query_pairs_mut().append_pair("offset", "0");
        Ok(url)
    }

    /// Href prefix of the "next page" links on the dependents listing
    pub fn depended_next_prefix(name: &str) -> String {
        format!("/browse/depended/{}?offset=", name)
    }

    /// Fetch the latest manifest of a package.
    ///
    /// Returns `None` when the package could not be fetched or the body is not
    /// a manifest (an object with string `_id` and `name`).
    pub async fn fetch_package(&self, name: &str) -> Option<PackageManifest> {
        let url = self.package_url(name).ok()?;

        match self.transport.get_json(&url).await {
            Ok(Value::Object(manifest)) if is_manifest(&manifest) => Some(manifest),
            Ok(_) => {
                log::debug!(target: LOG_TARGET, "Invalid manifest for {}", name);
                None
            }
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Manifest lookup for {} failed: {}", name, e);
                None
            }
        }
    }

    /// Fetch the last-week download count of a package
    pub async fn fetch_weekly_downloads(&self, name: &str) -> Option<u64> {
        let url = self.downloads_url(name).ok()?;

        match self.transport.get_json(&url).await {
            Ok(body) => {
                let downloads = body.get("downloads").and_then(Value::as_u64);
                if downloads.is_none() {
                    log::debug!(target: LOG_TARGET, "No download count for {}", name);
                }
                downloads
            }
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Download lookup for {} failed: {}", name, e);
                None
            }
        }
    }
}

fn is_manifest(manifest: &PackageManifest) -> bool {
    matches!(manifest.get("_id"), Some(Value::String(_)))
        && matches!(manifest.get("name"), Some(Value::String(_)))
}

/// The range a manifest declares against `target`, from any dependency table
pub fn dependency_range(manifest: &PackageManifest, target: &str) -> Option<String> {
    DEPENDENCY_KEYS.iter().find_map(|key| {
        manifest
            .get(*key)
            .and_then(|table| table.get(target))
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

/// The repository URL a manifest declares, either as a string or as `{ url }`
pub fn repository_url(manifest: &PackageManifest) -> Option<String> {
    let raw = match manifest.get("repository")? {
        Value::String(url) => url.as_str(),
        Value::Object(repository) => repository.get("url")?.as_str()?,
        _ => return None,
    };

    normalize_repository_url(raw)
}

/// Strip `git+` and a trailing `.git` from a repository URL
pub(crate) fn normalize_repository_url(raw: &str) -> Option<String> {
    let url = raw.trim();
    let url = url.strip_prefix("git+").unwrap_or(url);
    let url = url.strip_suffix(".git").unwrap_or(url);

    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}
