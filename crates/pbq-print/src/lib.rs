//! Output formatting for query results.
//!
//! ```ignore
//! let mut printer = Printer::builder().spacing(2).build(std::io::stdout())?;
//! printer.print(&cols, &rows)?;
//! ```

use std::io::{self, Write};

use pbq::Value;
use thiserror::Error;

mod table;

use table::TableFormatter;

/// Output format. Only `Table` is implemented; CSV and TSV are recognized
/// but reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Csv,
    Tsv,
}

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("format not implemented: {0:?}")]
    Unimplemented(Format),
}

/// Builder for [`Printer`]: format, header, cell spacing.
#[derive(Debug, Clone)]
pub struct PrinterBuilder {
    format: Format,
    header: bool,
    spacing: usize,
}

impl Default for PrinterBuilder {
    fn default() -> Self {
        Self {
            format: Format::Table,
            header: true,
            spacing: 2,
        }
    }
}

impl PrinterBuilder {
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn spacing(mut self, spacing: usize) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn build<W: Write>(self, out: W) -> Result<Printer<W>, PrintError> {
        let formatter = match self.format {
            Format::Table => TableFormatter {
                header: self.header,
                spacing: self.spacing,
            },
            other => return Err(PrintError::Unimplemented(other)),
        };
        Ok(Printer { out, formatter })
    }
}

/// Writes query results to an output stream.
pub struct Printer<W: Write> {
    out: W,
    formatter: TableFormatter,
}

impl<W: Write> Printer<W> {
    pub fn builder() -> PrinterBuilder {
        PrinterBuilder::default()
    }

    pub fn print(&mut self, cols: &[String], rows: &[Vec<Value>]) -> io::Result<()> {
        self.formatter.format(&mut self.out, cols, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let mut printer = Printer::<Vec<u8>>::builder().build(Vec::new()).unwrap();
        let cols = vec!["id".to_string()];
        printer.print(&cols, &[vec![Value::I64(1)]]).unwrap();
        let out = String::from_utf8(printer.out).unwrap();
        assert_eq!(out, "id  \n--  \n 1  \n");
    }

    #[test]
    fn test_builder_no_header() {
        let mut printer = Printer::<Vec<u8>>::builder()
            .header(false)
            .spacing(1)
            .build(Vec::new())
            .unwrap();
        let cols = vec!["id".to_string()];
        printer.print(&cols, &[vec![Value::I64(1)]]).unwrap();
        assert_eq!(String::from_utf8(printer.out).unwrap(), " 1 \n");
    }

    #[test]
    fn test_csv_and_tsv_reserved() {
        for format in [Format::Csv, Format::Tsv] {
            let res = PrinterBuilder::default().format(format).build(Vec::new());
            assert!(matches!(res, Err(PrintError::Unimplemented(_))));
        }
    }
}
