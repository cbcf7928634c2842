//! "Fits the following ... Models" lists

use super::{expand_years, strip_manufacturer};
use crate::extract::page::{element_text, own_text, ProductPage};
use crate::extract::FitmentRow;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static ANCHOR_CANDIDATES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div, p, span, strong, b, h2, h3, h4, h5, label, dt").unwrap()
});
static ANCHOR_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)fits\s+the\s+following\b.*\bmodels?").unwrap());
static ITEMS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li, p").unwrap());

static MODEL_THEN_YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<model>.*?\S)\s+(?P<from>(?:19|20)\d{2})(?:\s*-\s*(?P<to>(?:19|20)\d{2}))?$")
        .unwrap()
});
static YEARS_THEN_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<from>(?:19|20)\d{2})(?:\s*-\s*(?P<to>(?:19|20)\d{2}))?\s+(?P<model>\S.*)$")
        .unwrap()
});

pub(super) fn expand(page: &ProductPage) -> Option<Vec<FitmentRow>> {
    let anchor = page
        .html()
        .select(&ANCHOR_CANDIDATES)
        .find(|el| ANCHOR_TEXT.is_match(&own_text(*el)))?;

    let manufacturer = page.hints().manufacturer.as_str();
    let parent = anchor.parent().and_then(ElementRef::wrap)?;

    let rows = rows_below(parent, anchor, manufacturer);
    if !rows.is_empty() {
        return Some(rows);
    }

    let grandparent = parent.parent().and_then(ElementRef::wrap)?;
    let rows = rows_below(grandparent, anchor, manufacturer);
    (!rows.is_empty()).then_some(rows)
}

fn rows_below(container: ElementRef<'_>, anchor: ElementRef<'_>, manufacturer: &str) -> Vec<FitmentRow> {
    container
        .select(&ITEMS)
        .filter(|item| item.id() != anchor.id())
        .flat_map(|item| parse_item(&element_text(item), manufacturer))
        .collect()
}

/// Parses "TLX 2019-2021" or "2019-2021 Acura TLX" into one row per year
pub(crate) fn parse_item(text: &str, manufacturer: &str) -> Vec<FitmentRow> {
    let text = text.trim();
    let Some(caps) = MODEL_THEN_YEARS
        .captures(text)
        .or_else(|| YEARS_THEN_MODEL.captures(text))
    else {
        return Vec::new();
    };

    let from: u32 = caps["from"].parse().unwrap_or_default();
    let to = caps.name("to").and_then(|m| m.as_str().parse().ok());
    let model = strip_manufacturer(&caps["model"], manufacturer);

    expand_years(from, to)
        .into_iter()
        .map(|year| FitmentRow::new(&year, manufacturer, &model, "", ""))
        .collect()
}
