//! JSON lines output, one object per row

use super::traits::{OutputResult, RowWriter};
use super::FlatRow;
use std::io::Write;

pub struct JsonLinesWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RowWriter for JsonLinesWriter<W> {
    fn write_rows(&mut self, rows: &[FlatRow]) -> OutputResult<usize> {
        for row in rows {
            serde_json::to_writer(&mut self.out, row)?;
            self.out.write_all(b"\n")?;
        }
        Ok(rows.len())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.out.flush()?;
        Ok(())
    }
}
