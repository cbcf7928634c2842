//! Tab-separated output with a header row

use super::traits::{OutputResult, RowWriter};
use super::{FlatRow, COLUMNS};
use std::io::Write;

pub struct TsvWriter<W: Write> {
    out: W,
}

impl<W: Write> TsvWriter<W> {
    /// Creates a writer and emits the header row
    pub fn new(mut out: W) -> OutputResult<Self> {
        writeln!(out, "{}", COLUMNS.join("\t"))?;
        Ok(Self { out })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Tabs and line breaks inside a value would split the row
fn clean(value: &str) -> String {
    value.replace(['\t', '\r', '\n'], " ")
}

impl<W: Write> RowWriter for TsvWriter<W> {
    fn write_rows(&mut self, rows: &[FlatRow]) -> OutputResult<usize> {
        for row in rows {
            let line: Vec<String> = row.values().iter().map(|v| clean(v)).collect();
            writeln!(self.out, "{}", line.join("\t"))?;
        }
        Ok(rows.len())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::tests::sample_row;

    #[test]
    fn test_header_and_rows() {
        let mut writer = TsvWriter::new(Vec::new()).unwrap();
        let mut row = sample_row();
        row.description = "Line one\nLine\ttwo".to_string();
        assert_eq!(writer.write_rows(&[row.clone(), row]).unwrap(), 2);
        writer.finish().unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("url\timage_url\tcaptured_at\tsku"));
        assert!(lines[0].ends_with("year\tmake\tmodel\ttrim\tengine"));

        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields.len(), COLUMNS.len());
        assert_eq!(fields[3], "42700-TK4-A51");
        assert_eq!(fields[10], "Line one Line two");
        assert_eq!(fields[16], "Base");
    }
}
