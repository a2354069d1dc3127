//! Fixed-width table rendering.

use std::io::{self, Write};

use pbq::Value;

/// Column value kind, detected from the first row. Drives the format and
/// alignment of every cell in the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Default,
    String,
    Bool,
    Int,
    Float,
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Align {
    Left,
    Right,
}

pub(crate) fn kind_of(value: Option<&Value>) -> Kind {
    match value {
        Some(Value::Bool(_)) => Kind::Bool,
        Some(Value::I16(_) | Value::I32(_) | Value::I64(_)) => Kind::Int,
        Some(Value::F32(_) | Value::F64(_) | Value::Numeric(_)) => Kind::Float,
        Some(Value::String(_)) => Kind::String,
        Some(Value::Bytes(_)) => Kind::Bytes,
        _ => Kind::Default,
    }
}

pub(crate) fn align_of(kind: Kind) -> Align {
    match kind {
        Kind::Int | Kind::Float => Align::Right,
        _ => Align::Left,
    }
}

/// Render one cell value; width padding is applied separately.
pub(crate) fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Numeric(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Bytes(v) => format!("{v:?}"),
        Value::Timestamp(v) => v.to_string(),
        Value::TimestampTz(v) => v.to_string(),
        Value::Date(v) => v.to_string(),
    }
}

struct Column {
    width: usize,
    align: Align,
}

pub(crate) struct TableFormatter {
    pub header: bool,
    pub spacing: usize,
}

impl TableFormatter {
    pub fn format<W: Write>(
        &self,
        w: &mut W,
        cols: &[String],
        rows: &[Vec<Value>],
    ) -> io::Result<()> {
        if cols.is_empty() {
            return Ok(());
        }
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(render_cell).collect())
            .collect();
        let columns = self.columns(cols, rows, &cells);
        if self.header {
            self.write_header(w, cols, &columns)?;
        }
        for row in &cells {
            for (cell, col) in row.iter().zip(&columns) {
                self.write_cell(w, cell, col.width, col.align)?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    /// Column metadata: kind from the first row, width fitting the widest
    /// rendered value and the header.
    fn columns(&self, cols: &[String], rows: &[Vec<Value>], cells: &[Vec<String>]) -> Vec<Column> {
        cols.iter()
            .enumerate()
            .map(|(idx, name)| {
                let kind = kind_of(rows.first().map(|row| &row[idx]));
                let width = cells
                    .iter()
                    .map(|row| row[idx].len())
                    .max()
                    .unwrap_or(0)
                    .max(name.len());
                Column {
                    width,
                    align: align_of(kind),
                }
            })
            .collect()
    }

    fn write_header<W: Write>(&self, w: &mut W, cols: &[String], columns: &[Column]) -> io::Result<()> {
        for (name, col) in cols.iter().zip(columns) {
            self.write_cell(w, name, col.width, Align::Left)?;
        }
        writeln!(w)?;
        for col in columns {
            write!(w, "{}", "-".repeat(col.width))?;
            self.write_spacing(w)?;
        }
        writeln!(w)?;
        Ok(())
    }

    fn write_cell<W: Write>(
        &self,
        w: &mut W,
        cell: &str,
        width: usize,
        align: Align,
    ) -> io::Result<()> {
        match align {
            Align::Left => write!(w, "{cell:<width$}")?,
            Align::Right => write!(w, "{cell:>width$}")?,
        }
        self.write_spacing(w)
    }

    fn write_spacing<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(w, "{}", " ".repeat(self.spacing))
    }
}
