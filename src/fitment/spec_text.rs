//! A single "Fits: 2019-2021 Acura RDX" line inside the specifications

use super::expand_years;
use crate::extract::description::specification_text;
use crate::extract::page::ProductPage;
use crate::extract::FitmentRow;
use regex::Regex;
use std::sync::LazyLock;

static FITS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bfits\s*:\s*((?:19|20)\d{2})(?:\s*-\s*((?:19|20)\d{2}))?\s+([A-Za-z][\w-]*)\s+([A-Za-z0-9][\w-]*)",
    )
    .unwrap()
});

pub(super) fn expand(page: &ProductPage) -> Option<Vec<FitmentRow>> {
    let spec = specification_text(page)?;
    let caps = FITS_LINE.captures(&spec)?;

    let from = caps[1].parse().ok()?;
    let to = caps.get(2).and_then(|m| m.as_str().parse().ok());
    let make = &caps[3];
    let model = &caps[4];

    Some(
        expand_years(from, to)
            .into_iter()
            .map(|year| FitmentRow::new(&year, make, model, "", ""))
            .collect(),
    )
}
