//! Sale price and MSRP chains

use super::chain::{Chain, Strategy};
use super::page::{element_text, has_class_matching, ProductPage};
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());
static PRICE_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)price|cost").unwrap());
static LIST_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)msrp|list.*price").unwrap());

static SALE_PRICE_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong.sale-price-value").unwrap());
static SALE_PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.sale-price, div.sale-price").unwrap());
static LIST_PRICE_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.list-price-value").unwrap());
static LIST_PRICE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.list-price, div.msrp").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());

pub static PRICE_CHAIN: Chain<String> = Chain::new(
    "actual_price",
    &[
        Strategy::new("sale-price-value", sale_price_value),
        Strategy::new("sale-price", sale_price),
        Strategy::new("price-class", generic_price),
    ],
);

pub static MSRP_CHAIN: Chain<String> = Chain::new(
    "msrp",
    &[
        Strategy::new("list-price-value", list_price_value),
        Strategy::new("list-price", list_price),
        Strategy::new("msrp-class", generic_msrp),
    ],
);

/// Parses the first amount in a price text into a plain decimal string
///
/// `"$1,234.56 USD"` becomes `"1234.56"`; text without digits yields `None`.
pub fn parse_price(text: &str) -> Option<String> {
    AMOUNT
        .find(text)
        .map(|m| m.as_str().replace(',', ""))
}

fn sale_price_value(page: &ProductPage) -> Option<String> {
    page.select_first(&SALE_PRICE_VALUE)
        .and_then(|el| parse_price(&element_text(el)))
}

fn sale_price(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&SALE_PRICE)
        .find_map(|el| parse_price(&element_text(el)))
}

fn generic_price(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&SPAN)
        .filter(|el| has_class_matching(*el, &PRICE_CLASS) && !has_class_matching(*el, &LIST_CLASS))
        .find_map(|el| parse_price(&element_text(el)))
}

fn list_price_value(page: &ProductPage) -> Option<String> {
    page.select_first(&LIST_PRICE_VALUE)
        .and_then(|el| parse_price(&element_text(el)))
}

fn list_price(page: &ProductPage) -> Option<String> {
    page.html()
        .select(&LIST_PRICE)
        .find_map(|el| parse_price(&element_text(el)))
}

fn generic_msrp(page: &ProductPage) -> Option<String> {
    page.first_with_class(&SPAN, &LIST_CLASS)
        .and_then(|el| parse_price(&element_text(el)))
}
