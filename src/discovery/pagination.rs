//! Listing pagination
//!
//! Listings announce their size in one of three ways: "Page 2 of 7" text,
//! "1-24 of 180 Results" text, or numbered page links. When none is present
//! the caller falls back to incrementing the page parameter.

use crate::extract::ProductPage;
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;
use url::Url;

static PAGE_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpage\s+(\d+)\s+of\s+(\d+)").unwrap());
static RESULT_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*[-\u{2013}]\s*(\d+)\s+of\s+([\d,]+)\s+results?").unwrap()
});
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Total number of listing pages, when the markup reveals it
pub fn total_pages(markup: &str, page_param: &str) -> Option<u32> {
    let page = ProductPage::parse("about:blank", markup);
    let text = page.body_text();

    if let Some(caps) = PAGE_OF.captures(&text) {
        return caps[2].parse().ok();
    }

    if let Some(caps) = RESULT_RANGE.captures(&text) {
        let first: u32 = caps[1].parse().ok()?;
        let last: u32 = caps[2].parse().ok()?;
        let total: u32 = caps[3].replace(',', "").parse().ok()?;
        let per_page = last.checked_sub(first)?.checked_add(1)?;
        return Some(total.div_ceil(per_page));
    }

    max_linked_page(&page, page_param)
}

/// Highest page number among pagination links
fn max_linked_page(page: &ProductPage, page_param: &str) -> Option<u32> {
    let pattern = format!(r"[?&](?:{}|p|pageNumber)=(\d+)", regex::escape(page_param));
    let re = Regex::new(&pattern).ok()?;
    page.html()
        .select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| re.captures(href)?.get(1)?.as_str().parse::<u32>().ok())
        .max()
}

/// The URL of page `n` of a listing, replacing any existing page parameter
pub fn page_url(listing: &str, page_param: &str, n: u32) -> Option<String> {
    let mut url = Url::parse(listing).ok()?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != page_param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(page_param, &n.to_string());
    Some(url.to_string())
}
