//! # kitab-db: Database Layer for Kitab Store
//!
//! SQLite storage for the catalog, buyer directory, sales ledgers, cash
//! ledger and admin accounts, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kitab Store Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (add-offline-sale)                                       │
//! │       │  OfflineSaleRequest::validate() → OfflineOrder                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kitab-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │ BookRepository     │  │ (embedded, │  │   │
//! │  │   │               │◄───│ BuyerRepository    │  │ reversible)│  │   │
//! │  │   │ SqlitePool    │    │ OfflineSaleRepo    │  │            │  │   │
//! │  │   │ WAL, FK on    │    │ OnlineSaleRepo     │  │ 0001 ...   │  │   │
//! │  │   │               │    │ CashRepository     │  │ 0004 ...   │  │   │
//! │  │   │               │    │ UserRepository     │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (KITAB_DATABASE_PATH, default ./data/kitab.db)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactions
//! Every multi-statement write opens `pool.begin()` and commits at the end.
//! Any `?` before the commit drops the transaction, which rolls it back and
//! returns the connection to the pool.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kitab_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/kitab.db")).await?;
//! let books = db.books().list_available().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

pub use repository::book::BookRepository;
pub use repository::buyer::BuyerRepository;
pub use repository::cash::{CashLedger, CashRepository};
pub use repository::offline_sale::OfflineSaleRepository;
pub use repository::online_sale::OnlineSaleRepository;
pub use repository::user::{hash_password, verify_password, UserRepository};
