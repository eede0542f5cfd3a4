//! Lazy paginated fetching
//!
//! Two strategies, both pull-based streams that fetch a page only when the
//! consumer asks for more:
//! - Page-numbered JSON listings
//! - HTML listings chained by "next page" links

mod html_pages;
mod json_pages;

pub use html_pages::{anchor_hrefs, fetch_html_pages, links_with_prefix, next_link, HtmlPage};
pub use json_pages::{
    fetch_json_items, fetch_json_pages, JsonPageOptions, DEFAULT_PAGE_START, DEFAULT_PER_PAGE,
};

const LOG_TARGET: &str = "list_dependents::pages";

/// A page cap of zero means no cap
fn without_zero(max_pages: Option<u32>) -> Option<u32> {
    max_pages.filter(|&max| max > 0)
}
