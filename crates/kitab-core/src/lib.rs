//! # kitab-core: Pure Business Logic for Kitab Store
//!
//! Domain types and rules for the book shop back-office. Everything here is
//! deterministic and free of I/O; storage lives in `kitab-db`, spreadsheets
//! in `kitab-sheet` and HTTP in the server app.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitab Store Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Admin console / public shop (browser)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON / multipart                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  kitab-server (axum handlers)                   │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────┐ ┌─────────────▼───────────────────┐   │
//! │  │ kitab-db (SQLite, sqlx)     │ │ kitab-sheet (xlsx import/export)│   │
//! │  └──────────────┬──────────────┘ └─────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────────────────▼───────────────────┐   │
//! │  │               ★ kitab-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   types     money     requests    pricing    ledger    dates    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Book, OfflineBuyer, OfflineSale, OnlineSale, CashRecord)
//! - [`money`] - Rupiah amounts as integer sen
//! - [`requests`] - Typed request contracts and their validated commands
//! - [`pricing`] - Line totals and shipping allocation
//! - [`ledger`] - Debit/kredit summary for the cash ledger
//! - [`dates`] - Date filters, lenient transfer-date parsing, shop clock, display formats
//! - [`import`] - Rows produced by spreadsheet parsing and the import report
//! - [`validation`] - Field-level rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kitab_core::money::Money;
//! use kitab_core::pricing::allocate_shipping;
//!
//! let price = Money::from_rupiah(25_000);
//! assert_eq!(price.multiply_quantity(3), Money::from_rupiah(75_000));
//!
//! let shares = allocate_shipping(Money::from_rupiah(20_000), 2).unwrap();
//! assert_eq!(shares, vec![Money::from_rupiah(10_000); 2]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dates;
pub mod error;
pub mod import;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod requests;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use dates::{DateRange, ShopClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use import::ImportReport;
pub use ledger::CashSummary;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Literal token that must accompany a request to wipe the buyer directory.
pub const DELETE_ALL_BUYERS_CONFIRMATION: &str = "DELETE_ALL_BUYERS";

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches typos such as `3000` instead of `30` on bulk pesantren orders.
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

/// Maximum number of line items in one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Shipping cost applied to imported online sales without an `Ongkir` cell.
pub const DEFAULT_IMPORT_SHIPPING: Money = Money::from_rupiah(15_000);
