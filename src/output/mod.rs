//! Output of flattened product rows and run statistics
//!
//! A [`ProductRecord`](crate::extract::ProductRecord) with N fitments
//! flattens into N [`FlatRow`]s, each carrying the full product payload plus
//! one vehicle. Rows are written as TSV or JSON lines.

mod jsonl;
pub mod stats;
mod traits;
mod tsv;

pub use jsonl::JsonLinesWriter;
pub use stats::{print_statistics, RunStats};
pub use traits::{OutputError, OutputResult, RowWriter};
pub use tsv::TsvWriter;

use crate::config::OutputFormat;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Column names in output order
pub const COLUMNS: [&str; 18] = [
    "url",
    "image_url",
    "captured_at",
    "sku",
    "normalized_part_number",
    "actual_price",
    "msrp",
    "title",
    "also_known_as",
    "positions",
    "description",
    "applications",
    "replaces",
    "year",
    "make",
    "model",
    "trim",
    "engine",
];

/// One (product, fitment) output row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub url: String,
    pub image_url: String,
    pub captured_at: String,
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
    pub year: String,
    pub make: String,
    pub model: String,
    pub trim: String,
    pub engine: String,
}

impl FlatRow {
    /// Field values in [`COLUMNS`] order
    pub fn values(&self) -> [&str; 18] {
        [
            self.url.as_str(),
            self.image_url.as_str(),
            self.captured_at.as_str(),
            self.sku.as_str(),
            self.normalized_part_number.as_str(),
            self.actual_price.as_str(),
            self.msrp.as_str(),
            self.title.as_str(),
            self.also_known_as.as_str(),
            self.positions.as_str(),
            self.description.as_str(),
            self.applications.as_str(),
            self.replaces.as_str(),
            self.year.as_str(),
            self.make.as_str(),
            self.model.as_str(),
            self.trim.as_str(),
            self.engine.as_str(),
        ]
    }
}

/// Opens `path` and wraps it in the writer for `format`
///
/// Parent directories are created as needed; an existing file is replaced.
pub fn create_writer(format: OutputFormat, path: &Path) -> OutputResult<Box<dyn RowWriter>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = BufWriter::new(File::create(path)?);
    writer_for(format, file)
}

/// Wraps any byte sink in the writer for `format`
pub fn writer_for<W: Write + 'static>(format: OutputFormat, out: W) -> OutputResult<Box<dyn RowWriter>> {
    Ok(match format {
        OutputFormat::Tsv => Box::new(TsvWriter::new(out)?),
        OutputFormat::Jsonl => Box::new(JsonLinesWriter::new(out)),
    })
}
