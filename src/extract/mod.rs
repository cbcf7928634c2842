//! Field extraction
//!
//! [`FieldExtractor`] turns a rendered page into a [`ProductRecord`]. Each
//! field is resolved by its own ordered [`Chain`] of strategies; the record
//! is rejected when the title is missing or when the product is not relevant.

pub mod chain;
pub mod description;
pub mod image;
pub mod labels;
pub mod page;
pub mod price;
pub mod record;
pub mod sku;
pub mod title;

pub use chain::{Candidate, Chain, Resolved, Strategy};
pub use page::{PageHints, ProductPage};
pub use record::{normalize_part_number, FitmentRow, ProductRecord};

use crate::config::Config;
use crate::fetch::RenderedPage;
use crate::fitment::FitmentExpander;
use crate::relevance::RelevanceFilter;
use crate::ConfigError;
use chrono::Utc;
use thiserror::Error;

/// Reasons a rendered page yields no record
///
/// These are never retried: the page loaded, it just isn't a usable product.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("No usable title on {url}")]
    MissingTitle { url: String },

    #[error("Not a relevant product: {title}")]
    Irrelevant { title: String },
}

/// Extracts product records from rendered pages
#[derive(Debug)]
pub struct FieldExtractor {
    relevance: RelevanceFilter,
    fitment: FitmentExpander,
    hints: PageHints,
    min_title_chars: usize,
    min_description_chars: usize,
}

impl FieldExtractor {
    pub fn new(relevance: RelevanceFilter, hints: PageHints) -> Self {
        Self {
            relevance,
            fitment: FitmentExpander::new(),
            hints,
            min_title_chars: 3,
            min_description_chars: 20,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let relevance = RelevanceFilter::new(&config.relevance)?;
        let hints = PageHints {
            manufacturer: config.site.manufacturer.clone(),
            min_meta_description_chars: config.thresholds.min_meta_description_chars,
        };
        Ok(Self {
            relevance,
            fitment: FitmentExpander::new(),
            hints,
            min_title_chars: config.thresholds.min_title_chars,
            min_description_chars: config.thresholds.min_description_chars,
        })
    }

    pub fn extract(&self, page: &RenderedPage) -> Result<ProductRecord, ExtractError> {
        self.extract_markup(&page.url, &page.final_url, &page.markup)
    }

    /// Extracts from raw markup requested from `url` and served at `final_url`
    pub fn extract_markup(
        &self,
        url: &str,
        final_url: &str,
        markup: &str,
    ) -> Result<ProductRecord, ExtractError> {
        let page = ProductPage::parse(url, markup)
            .with_final_url(final_url)
            .with_hints(self.hints.clone());

        let title = title::resolve_title(&page);
        if title.chars().count() < self.min_title_chars {
            tracing::warn!(url, title = %title, "Title missing or too short");
            return Err(ExtractError::MissingTitle {
                url: url.to_string(),
            });
        }

        let sku = sku::SKU_CHAIN.value(&page).unwrap_or_default();
        let normalized_part_number = normalize_part_number(&sku);

        match self.relevance.matched_keyword(&title) {
            Some(keyword) => tracing::debug!(url, keyword, "Relevant product"),
            None => {
                tracing::info!(url, title = %title, "Skipping irrelevant product");
                return Err(ExtractError::Irrelevant { title });
            }
        }

        let mut description = description::DESCRIPTION_CHAIN.value(&page).unwrap_or_default();
        if description.chars().count() < self.min_description_chars {
            if let Some(spec) = description::specification_text(&page) {
                description = if description.is_empty() {
                    spec
                } else {
                    format!("{description} {spec}")
                };
            }
        }

        let fitments = self.fitment.expand(&page);

        let record = ProductRecord {
            url: url.to_string(),
            image_url: image::IMAGE_CHAIN.value(&page).unwrap_or_default(),
            captured_at: Utc::now(),
            sku,
            normalized_part_number,
            actual_price: price::PRICE_CHAIN.value(&page).unwrap_or_default(),
            msrp: price::MSRP_CHAIN.value(&page).unwrap_or_default(),
            title,
            also_known_as: labels::ALSO_KNOWN_AS_CHAIN.value(&page).unwrap_or_default(),
            positions: labels::POSITIONS_CHAIN.value(&page).unwrap_or_default(),
            description,
            applications: labels::APPLICATIONS_CHAIN.value(&page).unwrap_or_default(),
            replaces: labels::REPLACES_CHAIN.value(&page).unwrap_or_default(),
            fitments,
        };

        tracing::info!(
            url,
            sku = %record.sku,
            fitments = record.fitments.len(),
            "Extracted product"
        );
        Ok(record)
    }
}
