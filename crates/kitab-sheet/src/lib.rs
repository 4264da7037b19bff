//! # kitab-sheet: Spreadsheet Import and Export
//!
//! Reads admin-uploaded workbooks into typed [`ImportBatch`]es and writes
//! recap workbooks for download.
//!
//! ## Import Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  multipart `file` (bytes)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_extension(.xlsx | .xls)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SheetTable::from_bytes  ── first worksheet, row 1 = header            │
//! │       │                                                                 │
//! │       ├── required column missing ──► SheetError::MissingColumn         │
//! │       │                                (nothing is written)             │
//! │       ▼                                                                 │
//! │  parse_* ──► ImportBatch { rows, skipped, warnings }                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kitab-db repository (one transaction per file)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`ImportBatch`]: kitab_core::import::ImportBatch

pub mod error;
pub mod export;
pub mod import;
pub mod reader;

pub use error::{SheetError, SheetResult};
pub use export::{
    cash_export_filename, export_cash_records, export_offline_sales, export_online_sales,
    offline_export_filename, online_export_filename, XLSX_CONTENT_TYPE,
};
pub use import::{parse_books, parse_buyers, parse_offline_sales, parse_online_sales};
pub use reader::{check_extension, SheetTable};
