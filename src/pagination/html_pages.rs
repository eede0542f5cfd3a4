//! Link-following HTML listings
//!
//! Each page names its successor through an anchor whose href starts with a
//! known prefix; the last such anchor on a page is followed.

use super::{without_zero, LOG_TARGET};
use crate::error::RegistryError;
use crate::registry::Transport;
use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;
use reqwest::Url;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

/// Matches the href of an anchor element, double or single quoted
static ANCHOR_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s(?:[^>]*?\s)?href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// A fetched HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlPage {
    pub url: Url,
    pub body: String,
}

impl HtmlPage {
    /// Hrefs starting with `prefix`, with the prefix removed
    pub fn links_with_prefix(&self, prefix: &str) -> Vec<String> {
        links_with_prefix(&self.body, prefix)
    }
}

struct Crawl {
    next: Option<Url>,
    visited: HashSet<String>,
}

/// Lazily fetch a chain of HTML pages starting at `start`.
///
/// Stops when a page has no next link, the next link was already visited,
/// or `max_pages` pages have been fetched. A 404 ends the chain silently;
/// transport failures are yielded once and end the chain.
pub fn fetch_html_pages(
    transport: Arc<dyn Transport>,
    start: Url,
    next_link_prefix: String,
    max_pages: Option<u32>,
) -> BoxStream<'static, Result<HtmlPage, RegistryError>> {
    let max_pages = without_zero(max_pages);
    let crawl = Crawl {
        next: Some(start),
        visited: HashSet::new(),
    };

    stream::unfold(crawl, move |mut crawl| {
        let transport = Arc::clone(&transport);
        let prefix = next_link_prefix.clone();

        async move {
            let url = crawl.next.take()?;

            if crawl.visited.contains(url.as_str()) {
                log::debug!(target: LOG_TARGET, "Already visited {}, stopping", url);
                return None;
            }

            if max_pages.is_some_and(|max| crawl.visited.len() >= max as usize) {
                log::debug!(target: LOG_TARGET, "Reached max pages before {}", url);
                return None;
            }

            crawl.visited.insert(url.to_string());
            log::debug!(target: LOG_TARGET, "Fetching URL: {}", url);

            match transport.get_text(&url).await {
                Ok(body) => {
                    crawl.next = next_link(&body, &prefix).and_then(|href| url.join(&href).ok());
                    Some((Ok(HtmlPage { url, body }), crawl))
                }
                Err(e) if e.is_unusable_response() => {
                    log::debug!(target: LOG_TARGET, "Stopping at {}: {}", url, e);
                    None
                }
                Err(e) => Some((Err(e), crawl)),
            }
        }
    })
    .boxed()
}

/// All anchor hrefs in document order, with basic entities decoded
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    ANCHOR_HREF_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| decode_entities(m.as_str()))
        .collect()
}

/// Hrefs starting with `prefix`, with the prefix removed
pub fn links_with_prefix(html: &str, prefix: &str) -> Vec<String> {
    anchor_hrefs(html)
        .into_iter()
        .filter_map(|href| href.strip_prefix(prefix).map(str::to_string))
        .collect()
}

/// The last href starting with `prefix`, unmodified
pub fn next_link(html: &str, prefix: &str) -> Option<String> {
    anchor_hrefs(html)
        .into_iter()
        .rev()
        .find(|href| href.starts_with(prefix))
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
