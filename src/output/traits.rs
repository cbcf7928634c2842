//! Row writer trait and output errors

use super::FlatRow;
use thiserror::Error;

/// Errors that can occur while writing rows
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize row: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A sink for flattened product rows
///
/// Rows are written as they are produced so a long catalog run keeps its
/// output even if it is interrupted.
pub trait RowWriter {
    /// Writes rows and returns how many were written
    ///
    /// # Arguments
    ///
    /// * `rows` - Flattened rows of one product
    fn write_rows(&mut self, rows: &[FlatRow]) -> OutputResult<usize>;

    /// Flushes buffered output
    fn finish(&mut self) -> OutputResult<()>;
}
