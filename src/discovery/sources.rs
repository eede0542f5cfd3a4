//! Candidate streams from the two discovery sources

use super::{DependentsOptions, ECOSYSTEMS_PER_PAGE};
use crate::concurrency::{bounded_map, MapOrder};
use crate::error::RegistryError;
use crate::pagination::{fetch_html_pages, fetch_json_items, JsonPageOptions};
use crate::registry::{EcosystemsApi, EcosystemsPackage, NpmRegistry};
use futures::stream::{BoxStream, StreamExt};

/// Href prefix of package links on the npm website
const PACKAGE_LINK_PREFIX: &str = "/package/";

/// Listing pages processed at once when extracting names
const PAGE_CONCURRENCY: usize = 2;

const LOG_TARGET: &str = "list_dependents::sources";

/// A possible dependent, as produced by a source
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// A listing item carrying its own metadata
    Listed(EcosystemsPackage),
    /// A bare name, metadata to be looked up
    Named(String),
}

impl Candidate {
    pub fn name(&self) -> &str {
        match self {
            Candidate::Listed(package) => &package.name,
            Candidate::Named(name) => name,
        }
    }
}

/// Candidates from the ecosyste.ms dependents listing of `name`.
///
/// Items that do not look like packages are dropped here.
pub fn ecosystem_candidates(
    api: &EcosystemsApi,
    name: &str,
    options: &DependentsOptions,
) -> Result<BoxStream<'static, Result<Candidate, RegistryError>>, RegistryError> {
    let url = api.dependents_url(name, options.include_historic)?;
    let page_options = JsonPageOptions::default()
        .with_per_page(options.per_page.unwrap_or(ECOSYSTEMS_PER_PAGE))
        .with_max_pages(options.max_pages);

    let candidates = fetch_json_items(api.transport(), url, page_options)
        .filter_map(|item| async move {
            match item {
                Ok(value) => match EcosystemsPackage::from_value(value) {
                    Some(package) => Some(Ok(Candidate::Listed(package))),
                    None => {
                        log::debug!(target: LOG_TARGET, "Skipping listing item without a name");
                        None
                    }
                },
                Err(e) => Some(Err(e)),
            }
        })
        .boxed();

    Ok(candidates)
}

/// Names linked from the npm website's dependents listing of `name`
pub fn npm_dependent_names(
    npm: &NpmRegistry,
    name: &str,
    max_pages: Option<u32>,
) -> Result<BoxStream<'static, Result<String, RegistryError>>, RegistryError> {
    let start = npm.depended_url(name)?;
    let pages = fetch_html_pages(
        npm.transport(),
        start,
        NpmRegistry::depended_next_prefix(name),
        max_pages,
    );

    Ok(bounded_map(pages, PAGE_CONCURRENCY, MapOrder::Unordered, |page| async move {
        match page {
            Ok(page) => {
                let names = page.links_with_prefix(PACKAGE_LINK_PREFIX);
                log::trace!(target: LOG_TARGET, "{} links on {}", names.len(), page.url);
                names.into_iter().map(Ok).collect::<Vec<_>>()
            }
            Err(e) => vec![Err(e)],
        }
    }))
}
