use crate::output::FlatRow;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One vehicle a part fits
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FitmentRow {
    pub year: String,
    pub make: String,
    pub model: String,
    pub trim: String,
    pub engine: String,
}

impl FitmentRow {
    pub fn new(year: &str, make: &str, model: &str, trim: &str, engine: &str) -> Self {
        Self {
            year: year.trim().to_string(),
            make: make.trim().to_string(),
            model: model.trim().to_string(),
            trim: trim.trim().to_string(),
            engine: engine.trim().to_string(),
        }
    }

    /// The placeholder row used when a product has no fitment data
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn is_blank(&self) -> bool {
        self == &Self::blank()
    }
}

/// A product extracted from one page
///
/// Absent fields are empty strings. `fitments` always holds at least one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub url: String,
    pub image_url: String,
    pub captured_at: DateTime<Utc>,
    pub sku: String,
    pub normalized_part_number: String,
    pub actual_price: String,
    pub msrp: String,
    pub title: String,
    pub also_known_as: String,
    pub positions: String,
    pub description: String,
    pub applications: String,
    pub replaces: String,
    pub fitments: Vec<FitmentRow>,
}

impl ProductRecord {
    /// One output row per fitment, each carrying the full product payload
    pub fn flatten(&self) -> Vec<FlatRow> {
        let captured_at = self.captured_at.format("%Y-%m-%d %H:%M:%S").to_string();
        self.fitments
            .iter()
            .map(|f| FlatRow {
                url: self.url.clone(),
                image_url: self.image_url.clone(),
                captured_at: captured_at.clone(),
                sku: self.sku.clone(),
                normalized_part_number: self.normalized_part_number.clone(),
                actual_price: self.actual_price.clone(),
                msrp: self.msrp.clone(),
                title: self.title.clone(),
                also_known_as: self.also_known_as.clone(),
                positions: self.positions.clone(),
                description: self.description.clone(),
                applications: self.applications.clone(),
                replaces: self.replaces.clone(),
                year: f.year.clone(),
                make: f.make.clone(),
                model: f.model.clone(),
                trim: f.trim.clone(),
                engine: f.engine.clone(),
            })
            .collect()
    }
}

/// Cleans a raw SKU into its normalized part number
///
/// Keeps ASCII letters and digits only, uppercased:
/// `"42700-tk4-a51"` becomes `"42700TK4A51"`.
pub fn normalize_part_number(sku: &str) -> String {
    sku.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
