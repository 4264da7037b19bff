//! # Import Rows
//!
//! Typed rows handed from spreadsheet parsing (`kitab-sheet`) to the
//! repositories (`kitab-db`), and the report returned to the admin.
//!
//! ## Row Lifecycle
//! ```text
//! sheet row ──► parse ──┬── blank key field ──────────► skipped += 1
//!                       ├── bad cell (number, status) ─► warning + skipped
//!                       └── ok ──► ImportBatch.rows
//!                                      │
//!                                      ▼
//!                       repository upsert ──┬── inserted ──► imported += 1
//!                                           ├── updated  ──► updated += 1
//!                                           └── lookup failed ► warning + skipped
//! ```
//!
//! Warnings carry the spreadsheet row number (header is row 1).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::requests::BuyerDraft;
use crate::types::{BookDraft, PaymentStatus};

// =============================================================================
// Parsed Rows
// =============================================================================

/// A parsed row tagged with its spreadsheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow<T> {
    pub line: usize,
    pub data: T,
}

/// Output of parsing one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportBatch<T> {
    pub rows: Vec<SheetRow<T>>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl<T> Default for ImportBatch<T> {
    fn default() -> Self {
        ImportBatch {
            rows: Vec::new(),
            skipped: 0,
            warnings: Vec::new(),
        }
    }
}

impl<T> ImportBatch<T> {
    pub fn push(&mut self, line: usize, data: T) {
        self.rows.push(SheetRow { line, data });
    }

    /// Counts a silently skipped row (blank key field).
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// Skips a row and records why.
    pub fn warn(&mut self, line: usize, message: impl AsRef<str>) {
        self.skipped += 1;
        self.warnings.push(row_warning(line, message.as_ref()));
    }
}

/// `Baris {line}: {message}`
pub fn row_warning(line: usize, message: &str) -> String {
    format!("Baris {}: {}", line, message)
}

/// Catalog import row.
pub type BookImportRow = BookDraft;

/// Buyer import row.
pub type BuyerImportRow = BuyerDraft;

/// Offline sale import row; buyer and book are referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineSaleImportRow {
    pub buyer_name: String,
    pub buyer_address: String,
    pub book_name: String,
    pub quantity: i64,
    pub payment_status: PaymentStatus,
}

/// Online sale import row; each row is a one-line order with its own shipping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineSaleImportRow {
    pub buyer_name: String,
    pub buyer_address: String,
    pub book_name: String,
    pub quantity: i64,
    pub shipping: Money,
    pub transfer_date: NaiveDate,
}

// =============================================================================
// Import Report
// =============================================================================

/// Result of an import request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub message: String,
    /// Rows inserted
    pub imported: usize,
    /// Existing rows overwritten (catalog and buyer imports)
    pub updated: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

impl ImportReport {
    /// Starts a report carrying the parse-stage skips and warnings.
    pub fn from_batch<T>(batch: &ImportBatch<T>) -> Self {
        ImportReport {
            skipped: batch.skipped,
            warnings: batch.warnings.clone(),
            ..Default::default()
        }
    }

    /// Records a row that failed during the write stage.
    pub fn warn(&mut self, line: usize, message: impl AsRef<str>) {
        self.skipped += 1;
        self.warnings.push(row_warning(line, message.as_ref()));
    }

    /// Sets the message for catalog/buyer upserts.
    pub fn finish_upsert(mut self) -> Self {
        self.message = format!(
            "Import berhasil! Ditambah: {}, Diupdate: {}, Dilewati: {}",
            self.imported, self.updated, self.skipped
        );
        self
    }

    /// Sets the message for sale imports.
    pub fn finish_append(mut self) -> Self {
        self.message = format!(
            "Import selesai! Berhasil: {}, Dilewati: {}",
            self.imported, self.skipped
        );
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_counts_and_warnings() {
        let mut batch: ImportBatch<&str> = ImportBatch::default();
        batch.push(2, "a");
        batch.skip();
        batch.warn(4, "Jumlah 'x' tidak valid");

        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].line, 2);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.warnings, vec!["Baris 4: Jumlah 'x' tidak valid".to_string()]);
    }

    #[test]
    fn test_report_messages() {
        let mut batch: ImportBatch<()> = ImportBatch::default();
        batch.skip();
        let mut report = ImportReport::from_batch(&batch);
        report.imported = 3;
        report.updated = 2;
        report.warn(5, "Kitab 'X' tidak ditemukan");

        let upsert = report.clone().finish_upsert();
        assert_eq!(upsert.message, "Import berhasil! Ditambah: 3, Diupdate: 2, Dilewati: 2");

        let append = report.finish_append();
        assert_eq!(append.message, "Import selesai! Berhasil: 3, Dilewati: 2");
        assert_eq!(append.warnings, vec!["Baris 5: Kitab 'X' tidak ditemukan".to_string()]);
    }
}
