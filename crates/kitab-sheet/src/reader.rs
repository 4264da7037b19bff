//! # Workbook Reader
//!
//! Opens the first worksheet of an uploaded workbook and exposes its cells
//! by header name.
//!
//! ## Row Numbers
//! ```text
//!   sheet row 1   │ Nama     │ Harga  │   ◄── header
//!   sheet row 2   │ Kitab A  │ 25000  │   ◄── SheetRowRef { line: 2 }
//!   sheet row 3   │ Kitab B  │ 30000  │   ◄── SheetRowRef { line: 3 }
//! ```
//! `line` is what the admin sees in Excel, so warnings quote it directly.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use kitab_core::dates::parse_flexible_date;
use kitab_core::validation::{validate_extension, ALLOWED_SHEET_EXTENSIONS};
use tracing::debug;

use crate::error::{SheetError, SheetResult};

/// Rejects uploads whose name is not `.xlsx` / `.xls`.
pub fn check_extension(filename: &str) -> SheetResult<()> {
    validate_extension("file", filename, ALLOWED_SHEET_EXTENSIONS)
        .map(|_| ())
        .map_err(|_| SheetError::UnsupportedExtension {
            filename: filename.to_string(),
        })
}

/// Header plus data rows of the first worksheet.
#[derive(Debug, Clone)]
pub struct SheetTable {
    headers: Vec<String>,
    rows: Vec<Vec<Data>>,
    /// Sheet row number of the header (1-based)
    header_line: usize,
}

impl SheetTable {
    /// Parses workbook bytes (xlsx, xls, xlsb or ods, detected by content).
    pub fn from_bytes(bytes: &[u8]) -> SheetResult<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| SheetError::Unreadable(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SheetError::Empty)?
            .map_err(|e| SheetError::Unreadable(e.to_string()))?;

        // The range starts at the first used cell, not necessarily A1
        let header_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or(SheetError::Empty)?
            .iter()
            .map(cell_text)
            .collect::<Vec<_>>();

        let rows: Vec<Vec<Data>> = rows.map(<[Data]>::to_vec).collect();

        debug!(columns = headers.len(), rows = rows.len(), "Worksheet loaded");
        Ok(SheetTable {
            headers,
            rows,
            header_line,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Index of a header, matched after trimming and ignoring case.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    /// Like [`column`](Self::column) but a missing header is fatal.
    pub fn require_column(&self, name: &str) -> SheetResult<usize> {
        self.column(name)
            .ok_or_else(|| SheetError::MissingColumn(name.to_string()))
    }

    /// Data rows with their sheet row numbers. Fully blank rows are dropped.
    pub fn rows(&self) -> impl Iterator<Item = SheetRowRef<'_>> {
        let first = self.header_line + 1;
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, cells)| SheetRowRef { line: first + i, cells })
            .filter(|row| !row.is_blank())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One data row.
#[derive(Debug, Clone, Copy)]
pub struct SheetRowRef<'a> {
    /// 1-based sheet row number
    pub line: usize,
    cells: &'a [Data],
}

impl<'a> SheetRowRef<'a> {
    pub fn cell(&self, column: usize) -> Option<&'a Data> {
        self.cells.get(column)
    }

    /// Trimmed text of a cell; empty for missing cells.
    pub fn text(&self, column: usize) -> String {
        self.cell(column).map(cell_text).unwrap_or_default()
    }

    /// Text of an optional column; empty when the column is absent.
    pub fn text_opt(&self, column: Option<usize>) -> String {
        column.map(|c| self.text(c)).unwrap_or_default()
    }

    /// Date of an optional column, if the cell holds one.
    pub fn date_opt(&self, column: Option<usize>) -> Option<NaiveDate> {
        column.and_then(|c| self.cell(c)).and_then(cell_date)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| cell_text(c).is_empty())
    }
}

// =============================================================================
// Cell Coercion
// =============================================================================

/// Renders a cell as trimmed text.
///
/// Whole floats lose their `.0` so `3.0` reads as `3`; native dates render
/// as `YYYY-MM-DD`.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        _ => String::new(),
    }
}

/// Reads a date from a native date cell or from date text.
pub fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|d| d.date()),
        Data::String(s) | Data::DateTimeIso(s) => parse_flexible_date(s),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::workbook;

    #[test]
    fn test_check_extension() {
        assert!(check_extension("data.xlsx").is_ok());
        assert!(check_extension("DATA.XLS").is_ok());
        assert!(matches!(
            check_extension("data.csv"),
            Err(SheetError::UnsupportedExtension { .. })
        ));
        assert!(check_extension("xlsx").is_err());
    }

    #[test]
    fn test_headers_and_line_numbers() {
        let bytes = workbook(&[&[" Nama ", "Alamat"], &["Ahmad", "Jepara"], &["", ""], &["Budi", ""]]);
        let table = SheetTable::from_bytes(&bytes).unwrap();

        assert_eq!(table.column("nama"), Some(0));
        assert_eq!(table.column("Alamat"), Some(1));
        assert!(matches!(
            table.require_column("Harga"),
            Err(SheetError::MissingColumn(ref c)) if c == "Harga"
        ));

        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].text(0), "Ahmad");
        assert_eq!(rows[1].line, 4);
        assert_eq!(rows[1].text_opt(Some(1)), "");
        assert_eq!(rows[1].text(9), "");
    }

    #[test]
    fn test_garbage_bytes_unreadable() {
        assert!(matches!(
            SheetTable::from_bytes(b"not a workbook"),
            Err(SheetError::Unreadable(_))
        ));
    }

    #[test]
    fn test_cell_text_numbers() {
        assert_eq!(cell_text(&Data::Float(3.0)), "3");
        assert_eq!(cell_text(&Data::Float(12500.5)), "12500.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("  Lunas ".to_string())), "Lunas");
    }

    #[test]
    fn test_cell_date_text() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(cell_date(&Data::String("01/05/2024".to_string())), expected);
        assert_eq!(cell_date(&Data::DateTimeIso("2024-05-01".to_string())), expected);
        assert_eq!(cell_date(&Data::String("kemarin".to_string())), None);
        assert_eq!(cell_date(&Data::Float(3.0)), None);
    }
}
