//! Description chain and the specification-section fallback

use super::chain::{Chain, Strategy};
use super::page::{element_text, has_class_matching, ProductPage};
use regex::Regex;
use scraper::Selector;
use serde_json::Value;
use std::sync::LazyLock;

static DESCRIPTION_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.description_body").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.description, p.product-description").unwrap());
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static SPEC_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, section, ul, table, dl").unwrap());
static DESCRIPTION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)description|product.*desc").unwrap());
static SPEC_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)specification|product.*spec|^specs?$").unwrap());

pub static DESCRIPTION_CHAIN: Chain<String> = Chain::new(
    "description",
    &[
        Strategy::new("description-body", description_body),
        Strategy::new("description-element", description_element),
        Strategy::new("description-class", description_class),
        Strategy::new("product-data", product_data_description),
        Strategy::new("meta-description", meta_description),
    ],
);

fn description_body(page: &ProductPage) -> Option<String> {
    page.select_first(&DESCRIPTION_BODY).map(element_text)
}

fn description_element(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&DESCRIPTION)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn description_class(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&DIV)
        .filter(|el| has_class_matching(*el, &DESCRIPTION_CLASS))
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn product_data_description(page: &ProductPage) -> Option<String> {
    match page.product_data()?.get("description")? {
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn meta_description(page: &ProductPage) -> Option<String> {
    page.meta_name("description")
        .filter(|d| d.chars().count() > page.hints().min_meta_description_chars)
}

/// Text of the page's specification section
pub fn specification_text(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&SPEC_BLOCK)
        .filter(|el| has_class_matching(*el, &SPEC_CLASS))
        .map(element_text)
        .find(|t| !t.is_empty())
}
