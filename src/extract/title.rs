//! Product title chain

use super::chain::{Chain, Strategy};
use super::page::{element_text, ProductPage};
use scraper::Selector;
use std::sync::LazyLock;

static H1_PRODUCT_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1.product-title").unwrap());
static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

pub static TITLE_CHAIN: Chain<String> = Chain::new(
    "title",
    &[
        Strategy::new("h1.product-title", product_title_heading),
        Strategy::new("h1", any_heading),
        Strategy::new("og:title", og_title),
        Strategy::new("title-tag", title_tag),
    ],
);

/// Resolves the product title, or an empty string
pub fn resolve_title(page: &ProductPage) -> String {
    TITLE_CHAIN.value(page).unwrap_or_default()
}

fn product_title_heading(page: &ProductPage) -> Option<String> {
    page.select_first(&H1_PRODUCT_TITLE).map(element_text)
}

fn any_heading(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&H1)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn og_title(page: &ProductPage) -> Option<String> {
    page.meta_property("og:title")
}

fn title_tag(page: &ProductPage) -> Option<String> {
    page.title_tag().map(|t| trim_site_suffix(&t))
}

/// Drops trailing site-name and category segments from a `<title>`
///
/// Only spaced separators count, so hyphenated part numbers survive:
/// `"Acura 42700-TK4-A51 Wheel - Acura Parts | Warehouse"` becomes
/// `"Acura 42700-TK4-A51 Wheel"`.
pub fn trim_site_suffix(title: &str) -> String {
    let head = title.split(" | ").next().unwrap_or(title).trim();
    let segments: Vec<&str> = head.split(" - ").collect();
    let kept = if segments.len() > 1 {
        segments[..segments.len() - 1].join(" - ")
    } else {
        head.to_string()
    };
    kept.trim().to_string()
}
