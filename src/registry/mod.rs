//! Registry adapters for the data sources dependents are discovered from
//!
//! This module provides:
//! - The `Transport` seam every remote lookup goes through
//! - HTTP client implementation of that seam
//! - npm registry, downloads API and website lookups
//! - ecosyste.ms package aggregation lookups

mod client;
mod ecosystems;
mod npm;
#[cfg(test)]
pub(crate) mod testing;

pub use client::HttpClient;
pub use ecosystems::{EcosystemsApi, EcosystemsPackage, ECOSYSTEMS_API_URL};
pub use npm::{
    dependency_range, repository_url, NpmRegistry, NPM_DOWNLOADS_URL, NPM_REGISTRY_URL,
    NPM_WEBSITE_URL,
};
pub(crate) use npm::normalize_repository_url;

use crate::error::RegistryError;
use async_trait::async_trait;
use reqwest::Url;

/// Fetch capability used by every adapter
///
/// Implementations do not retry on their own unless configured to; callers
/// decide how to treat each error kind.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a URL and parse its body as JSON
    async fn get_json(&self, url: &Url) -> Result<serde_json::Value, RegistryError>;

    /// Fetch a URL and return its body as text
    async fn get_text(&self, url: &Url) -> Result<String, RegistryError>;
}

/// Append a path to a base URL, keeping any path the base already has
pub(crate) fn join_path(base: &Url, path: &str) -> Result<Url, RegistryError> {
    let raw = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|e| RegistryError::InvalidUrl {
        url: raw,
        message: e.to_string(),
    })
}

/// Parse a base URL constant or override
pub(crate) fn parse_base(raw: &str) -> Result<Url, RegistryError> {
    Url::parse(raw).map_err(|e| RegistryError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}
