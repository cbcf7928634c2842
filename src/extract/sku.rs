//! SKU / part number chain
//!
//! Strategies run from the most to the least trustworthy source. The last
//! three (title tag, request URL, product title) only pattern-match a
//! part-number-shaped token and are fallbacks for pages that hide the SKU.

use super::chain::{Chain, Strategy};
use super::page::{element_text, has_class_matching, ProductPage};
use super::title::resolve_title;
use regex::Regex;
use scraper::{ElementRef, Selector};
use serde_json::Value;
use std::sync::LazyLock;

/// `XXXXX-XXX-XXX` style codes, matched against uppercased text
static PART_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z0-9]{5,}-[A-Z0-9]+-[A-Z0-9]+)").unwrap());
static CONTIGUOUS_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z0-9]{10,})\b").unwrap());
static PART_NUMBER_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)part\s*number:\s*([A-Z0-9\-]+)").unwrap());
static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:sku|part\s*(?:number|no\.?|#))\s*[:#]?\s*").unwrap()
});
static SKU_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)sku|part.*number").unwrap());
static SPEC_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)spec").unwrap());
static PART_NUMBER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)part.*number").unwrap());
static JSON_SKU_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9\-]+$").unwrap());

static SKU_DISPLAY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.sku-display").unwrap());
static SPAN_OR_DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span, div").unwrap());
static TABLE_CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());

const JSON_SKU_KEYS: [&str; 5] = ["sku", "productID", "mpn", "partNumber", "identifier"];

pub static SKU_CHAIN: Chain<String> = Chain::new(
    "sku",
    &[
        Strategy::new("sku-display", sku_display),
        Strategy::new("part-number-element", part_number_element),
        Strategy::new("part-number-text", part_number_text),
        Strategy::new("spec-table", spec_table),
        Strategy::new("og:title", og_title_code),
        Strategy::new("meta-description", meta_description_code),
        Strategy::new("canonical-link", canonical_code),
        Strategy::new("json-ld", json_ld),
        Strategy::new("title-tag", title_tag_code),
        Strategy::new("request-url", request_url_code),
        Strategy::new("product-title", product_title_code),
    ],
);

/// First part-number-shaped code in `text`
pub fn find_part_code(text: &str) -> Option<String> {
    PART_CODE
        .captures(&text.to_uppercase())
        .map(|c| c[1].to_string())
}

/// Reformats a contiguous code (`42700TK4A51`) into dash groups (`42700-TK4-A51`)
///
/// Only codes of at least ten characters that contain a digit qualify, so
/// long words in marketing copy are not mistaken for part numbers.
pub fn find_contiguous_code(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    CONTIGUOUS_CODE
        .captures_iter(&upper)
        .map(|c| c[1].to_string())
        .find(|code| code.chars().any(|ch| ch.is_ascii_digit()))
        .map(|code| format!("{}-{}-{}", &code[..5], &code[5..8], &code[8..]))
}

fn strip_label(text: &str) -> String {
    LEADING_LABEL.replace(text, "").trim().to_string()
}

fn sku_display(page: &ProductPage) -> Option<String> {
    page.select_first(&SKU_DISPLAY).map(element_text)
}

fn part_number_element(page: &ProductPage) -> Option<String> {
    let classed = page
        .html()
        .select(&SPAN_OR_DIV)
        .filter(|el| has_class_matching(*el, &SKU_CLASS))
        .map(|el| strip_label(&element_text(el)))
        .find(|v| !v.is_empty());

    classed.or_else(|| {
        page.html()
            .select(&TABLE_CELL)
            .filter(|cell| PART_NUMBER_LABEL.is_match(&element_text(*cell)))
            .filter_map(next_cell_text)
            .find(|v| !v.is_empty())
    })
}

fn next_cell_text(cell: ElementRef<'_>) -> Option<String> {
    cell.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| matches!(el.value().name(), "td" | "th"))
        .map(element_text)
}

fn part_number_text(page: &ProductPage) -> Option<String> {
    PART_NUMBER_TEXT
        .captures(&page.body_text())
        .map(|c| c[1].trim().to_string())
}

fn spec_table(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&TABLE)
        .filter(|t| has_class_matching(*t, &SPEC_CLASS))
        .flat_map(|t| t.select(&ROW).collect::<Vec<_>>())
        .find_map(|row| {
            let cells: Vec<String> = row.select(&TABLE_CELL).map(element_text).collect();
            cells
                .windows(2)
                .find(|pair| pair[0].contains("Part Number") && !pair[1].is_empty())
                .map(|pair| pair[1].clone())
        })
}

fn og_title_code(page: &ProductPage) -> Option<String> {
    page.meta_property("og:title")
        .and_then(|t| find_part_code(&t))
}

fn meta_description_code(page: &ProductPage) -> Option<String> {
    let description = page.meta_name("description")?;
    find_part_code(&description).or_else(|| find_contiguous_code(&description))
}

fn canonical_code(page: &ProductPage) -> Option<String> {
    page.link_href("canonical").and_then(|h| find_part_code(&h))
}

fn json_ld(page: &ProductPage) -> Option<String> {
    page.json_blocks().iter().find_map(|block| sku_from_json(&block.value))
}

fn sku_from_json(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    JSON_SKU_KEYS.iter().find_map(|key| {
        let candidate = match object.get(*key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!candidate.is_empty() && JSON_SKU_VALUE.is_match(&candidate.to_uppercase()))
            .then_some(candidate)
    })
}

fn title_tag_code(page: &ProductPage) -> Option<String> {
    page.title_tag().and_then(|t| find_part_code(&t))
}

fn request_url_code(page: &ProductPage) -> Option<String> {
    find_part_code(page.url())
}

fn product_title_code(page: &ProductPage) -> Option<String> {
    find_part_code(&resolve_title(page))
}
