//! # Sheet Error Types
//!
//! Everything here except [`SheetError::Write`] is the uploader's fault and
//! maps to a validation error at the HTTP layer.

use thiserror::Error;

/// Spreadsheet errors.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Upload is not an Excel workbook by name.
    #[error("Format file harus Excel (.xlsx atau .xls): '{filename}'")]
    UnsupportedExtension { filename: String },

    /// Bytes could not be opened as a workbook.
    #[error("Error memproses file: {0}")]
    Unreadable(String),

    /// Workbook has no worksheet or no header row.
    #[error("File Excel kosong")]
    Empty,

    /// A required header is absent. Fatal for the whole import.
    #[error("Kolom '{0}' tidak ditemukan di file Excel.")]
    MissingColumn(String),

    /// Writing an export failed.
    #[error("Failed to write spreadsheet: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}

impl SheetError {
    /// True when the uploaded file itself is at fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, SheetError::Write(_))
    }
}

/// Result type for spreadsheet operations.
pub type SheetResult<T> = Result<T, SheetError>;
