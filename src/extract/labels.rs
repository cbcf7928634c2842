//! Labeled list fields: also-known-as, positions, replaces, applications
//!
//! All four share the same shape: a dedicated list element, then a
//! class-matched element, then a scan of the page text for a literal label
//! that takes the rest of the line (or the next line when the label sits in
//! its own element).

use super::chain::{Chain, Strategy};
use super::page::{element_text, has_class_matching, ProductPage};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static LIST_VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".list-value, span.value").unwrap());
static LIST_LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".list-label").unwrap());
static LEADING_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^:]{1,40}:\s*").unwrap());
static LI_OR_DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li, div").unwrap());
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());

static AKA_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.also_known_as").unwrap());
static AKA_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)also.*known|other.*name").unwrap());
static AKA_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:other\s+names?|also\s+known\s+as)\s*:\s*(.*)$").unwrap());

static POSITION_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.footnotes, li.positions").unwrap());
static POSITION_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)footnote|note|position").unwrap());
static POSITION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:positions?|footnotes?)\s*:\s*(.*)$").unwrap());

static REPLACES_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.replaces, li.supersedes").unwrap());
static REPLACES_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)replaces|supersede").unwrap());
static REPLACES_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:replaces|supersedes)\s*:\s*(.*)$").unwrap());

static APPLICATIONS_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li.applications").unwrap());
static APPLICATIONS_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)application").unwrap());
static APPLICATIONS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bapplications?\s*:\s*(.*)$").unwrap());

pub static ALSO_KNOWN_AS_CHAIN: Chain<String> = Chain::new(
    "also_known_as",
    &[
        Strategy::new("also-known-as-item", |p| dedicated(p, &AKA_ITEM)),
        Strategy::new("also-known-as-class", |p| classed(p, &DIV, &AKA_CLASS)),
        Strategy::new("other-name-label", |p| label_scan(p, &AKA_LABEL)),
    ],
);

pub static POSITIONS_CHAIN: Chain<String> = Chain::new(
    "positions",
    &[
        Strategy::new("footnotes-item", |p| dedicated(p, &POSITION_ITEM)),
        Strategy::new("position-class", |p| classed(p, &DIV, &POSITION_CLASS)),
        Strategy::new("position-label", |p| label_scan(p, &POSITION_LABEL)),
    ],
);

pub static REPLACES_CHAIN: Chain<String> = Chain::new(
    "replaces",
    &[
        Strategy::new("replaces-item", |p| dedicated(p, &REPLACES_ITEM)),
        Strategy::new("replaces-class", |p| classed(p, &LI_OR_DIV, &REPLACES_CLASS)),
        Strategy::new("replaces-label", |p| label_scan(p, &REPLACES_LABEL)),
    ],
);

pub static APPLICATIONS_CHAIN: Chain<String> = Chain::new(
    "applications",
    &[
        Strategy::new("applications-item", |p| dedicated(p, &APPLICATIONS_ITEM)),
        Strategy::new("applications-class", |p| classed(p, &LI_OR_DIV, &APPLICATIONS_CLASS)),
        Strategy::new("applications-label", |p| label_scan(p, &APPLICATIONS_LABEL)),
    ],
);

/// Value of a label/value list element
///
/// Prefers an explicit value child, otherwise the element text with its
/// label removed.
fn labeled_value(el: ElementRef<'_>) -> Option<String> {
    if let Some(value) = el.select(&LIST_VALUE).map(element_text).find(|v| !v.is_empty()) {
        return Some(value);
    }

    let text = element_text(el);
    let rest = match el.select(&LIST_LABEL).next().map(element_text) {
        Some(label) if !label.is_empty() && text.starts_with(&label) => {
            text[label.len()..].trim().to_string()
        }
        _ => LEADING_LABEL.replace(&text, "").trim().to_string(),
    };
    (!rest.is_empty()).then_some(rest)
}

fn dedicated(page: &ProductPage, selector: &Selector) -> Option<String> {
    page.html().select(selector).find_map(labeled_value)
}

fn classed(page: &ProductPage, selector: &Selector, class: &Regex) -> Option<String> {
    page.html()
        .select(selector)
        .filter(|el| has_class_matching(*el, class))
        .find_map(labeled_value)
}

/// Finds `label` in the page text and takes the rest of its line
///
/// When the label ends its text node, the next non-empty line is the value.
fn label_scan(page: &ProductPage, label: &Regex) -> Option<String> {
    let lines = page.text_lines();
    lines.iter().enumerate().find_map(|(i, line)| {
        let rest = label.captures(line)?.get(1)?.as_str().trim();
        if !rest.is_empty() {
            return Some(rest.to_string());
        }
        lines.get(i + 1).map(|next| next.trim().to_string())
    })
}
