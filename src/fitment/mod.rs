//! Vehicle fitment expansion
//!
//! Fitment data shows up as a JSON block, a "Fits the following ... Models"
//! list, a year/make/model table or a single "Fits:" line in the
//! specifications. Each representation has its own strategy; the first one
//! that yields rows wins and results are never merged across strategies.

mod listed;
mod spec_text;
mod structured;
mod tabular;

use crate::extract::chain::{Chain, Strategy};
use crate::extract::page::ProductPage;
use crate::extract::FitmentRow;

pub static FITMENT_CHAIN: Chain<Vec<FitmentRow>> = Chain::new(
    "fitments",
    &[
        Strategy::new("structured-data", structured::expand),
        Strategy::new("labeled-list", listed::expand),
        Strategy::new("table", tabular::expand),
        Strategy::new("spec-text", spec_text::expand),
    ],
);

/// Wide year ranges beyond this are treated as malformed
const MAX_YEAR_SPAN: u32 = 100;

/// Turns a rendered page into a flat list of fitment rows
#[derive(Debug, Clone, Copy, Default)]
pub struct FitmentExpander;

impl FitmentExpander {
    pub fn new() -> Self {
        Self
    }

    /// Expands fitments, falling back to one blank row
    ///
    /// The result is never empty.
    pub fn expand(&self, page: &ProductPage) -> Vec<FitmentRow> {
        match FITMENT_CHAIN.resolve(page) {
            Some(resolved) => {
                tracing::info!(
                    "Extracted {} fitment rows via {}",
                    resolved.value.len(),
                    resolved.strategy
                );
                resolved.value
            }
            None => {
                tracing::warn!("No fitment data found for {}", page.url());
                vec![FitmentRow::blank()]
            }
        }
    }
}

/// One row per (trim, engine) pair
///
/// Empty trim or engine lists are replaced by a single blank entry so the
/// product still gets a row for the vehicle.
pub(crate) fn cross_product(
    year: &str,
    make: &str,
    model: &str,
    trims: &[String],
    engines: &[String],
) -> Vec<FitmentRow> {
    let blank = [String::new()];
    let trims = if trims.is_empty() { &blank[..] } else { trims };
    let engines = if engines.is_empty() { &blank[..] } else { engines };

    trims
        .iter()
        .flat_map(|trim| {
            engines
                .iter()
                .map(move |engine| FitmentRow::new(year, make, model, trim, engine))
        })
        .collect()
}

/// Inclusive list of years between two bounds, in ascending order
///
/// Inverted bounds are swapped. A span wider than a century yields only the
/// lower year.
pub(crate) fn expand_years(start: u32, end: Option<u32>) -> Vec<String> {
    let end = end.unwrap_or(start);
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    if hi - lo > MAX_YEAR_SPAN {
        return vec![lo.to_string()];
    }
    (lo..=hi).map(|y| y.to_string()).collect()
}

/// Splits a comma-separated cell into trimmed, non-empty entries
pub(crate) fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes a leading manufacturer name from a model string
pub(crate) fn strip_manufacturer(model: &str, manufacturer: &str) -> String {
    let model = model.trim();
    if manufacturer.is_empty() {
        return model.to_string();
    }
    match model.get(..manufacturer.len()) {
        Some(prefix)
            if prefix.eq_ignore_ascii_case(manufacturer)
                && model[manufacturer.len()..].starts_with(char::is_whitespace) =>
        {
            model[manufacturer.len()..].trim().to_string()
        }
        _ => model.to_string(),
    }
}
