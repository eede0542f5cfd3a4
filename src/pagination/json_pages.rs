//! Page-numbered JSON listings
//!
//! Requests `per_page` and `page` query parameters, starting at a
//! configurable page, until a short page, an unusable response or the page
//! cap ends the listing.

use super::{without_zero, LOG_TARGET};
use crate::error::RegistryError;
use crate::registry::Transport;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;

/// Default number of items requested per page
pub const DEFAULT_PER_PAGE: usize = 25;

/// Default number of the first page
pub const DEFAULT_PAGE_START: u32 = 1;

/// Paging parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonPageOptions {
    pub per_page: usize,
    pub page_start: u32,
    /// Maximum number of pages fetched; `None` or zero for no cap
    pub max_pages: Option<u32>,
}

impl Default for JsonPageOptions {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            page_start: DEFAULT_PAGE_START,
            max_pages: None,
        }
    }
}

impl JsonPageOptions {
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }
}

/// Lazily fetch the pages of a JSON listing, one array per page.
///
/// A non-array body, a 404 or an unparseable body ends the listing without
/// an error. Transport failures are yielded once and end the listing.
pub fn fetch_json_pages(
    transport: Arc<dyn Transport>,
    base: Url,
    options: JsonPageOptions,
) -> BoxStream<'static, Result<Vec<Value>, RegistryError>> {
    let per_page = options.per_page.max(1);
    let page_start = options.page_start;
    let max_pages = without_zero(options.max_pages);

    stream::unfold(Some(page_start), move |next| {
        let transport = Arc::clone(&transport);
        let base = base.clone();

        async move {
            let page = next?;

            if max_pages.is_some_and(|max| page - page_start >= max) {
                log::debug!(target: LOG_TARGET, "Reached max pages at page {}", page);
                return None;
            }

            let mut url = base;
            url.query_pairs_mut()
                .append_pair("per_page", &per_page.to_string())
                .append_pair("page", &page.to_string());

            log::debug!(target: LOG_TARGET, "Fetching page {}: {}", page, url);

            match transport.get_json(&url).await {
                Ok(Value::Array(items)) => {
                    log::trace!(target: LOG_TARGET, "Page {} has {} items", page, items.len());
                    let next = (items.len() >= per_page).then(|| page + 1);
                    Some((Ok(items), next))
                }
                Ok(_) => {
                    log::debug!(target: LOG_TARGET, "Page {} is not a list, stopping", page);
                    None
                }
                Err(e) if e.is_unusable_response() => {
                    log::debug!(target: LOG_TARGET, "Stopping at page {}: {}", page, e);
                    None
                }
                Err(e) => Some((Err(e), None)),
            }
        }
    })
    .boxed()
}

/// Lazily fetch the items of a JSON listing, flattening its pages
pub fn fetch_json_items(
    transport: Arc<dyn Transport>,
    base: Url,
    options: JsonPageOptions,
) -> BoxStream<'static, Result<Value, RegistryError>> {
    fetch_json_pages(transport, base, options)
        .map(|page| {
            let items: Vec<Result<Value, RegistryError>> = match page {
                Ok(items) => items.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        })
        .flatten()
        .boxed()
}
