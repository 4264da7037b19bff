//! # Repository Module
//!
//! Database repository implementations for Kitab Store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.offline_sales().record(&order)                        │
//! │       ▼                                                                 │
//! │  OfflineSaleRepository                                                 │
//! │  ├── record(&self, order)         one transaction per order            │
//! │  ├── list_recent(&self, filter)   joined view, newest first            │
//! │  ├── update / delete / get                                             │
//! │  └── import(&self, batch)         one transaction per file             │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, sqlx::query_as + FromRow)               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`book::BookRepository`] - Catalog CRUD and catalog import
//! - [`buyer::BuyerRepository`] - Offline buyer directory
//! - [`offline_sale::OfflineSaleRepository`] - In-person sales ledger
//! - [`online_sale::OnlineSaleRepository`] - Shipped orders ledger
//! - [`cash::CashRepository`] - Cash journal and its summary
//! - [`user::UserRepository`] - Admin accounts

pub mod book;
pub mod buyer;
pub mod cash;
pub mod offline_sale;
pub mod online_sale;
pub mod user;

use kitab_core::{Money, ShopClock};
use sqlx::SqliteConnection;

use crate::error::{DbError, DbResult};

/// SQLite `date()` modifier moving a stored UTC timestamp into shop time,
/// e.g. `+420 minutes` for WIB.
pub(crate) fn shop_date_modifier(clock: ShopClock) -> String {
    format!("{:+} minutes", clock.offset_minutes())
}

/// Reads a book's current price inside an open transaction.
///
/// ## Errors
/// `NotFound("Book", id)` when the id does not exist.
pub(crate) async fn book_price_in(conn: &mut SqliteConnection, book_id: i64) -> DbResult<Money> {
    let price: Option<i64> = sqlx::query_scalar("SELECT price_cents FROM books WHERE id = ?1")
        .bind(book_id)
        .fetch_optional(&mut *conn)
        .await?;

    price
        .map(Money::from_cents)
        .ok_or_else(|| DbError::not_found("Book", book_id))
}

/// Looks a book up by name (case-insensitive) inside an open transaction.
pub(crate) async fn book_by_name_in(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Option<(i64, Money)>> {
    let row: Option<(i64, i64)> =
        sqlx::query_as("SELECT id, price_cents FROM books WHERE name = ?1 COLLATE NOCASE")
            .bind(name.trim())
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(|(id, cents)| (id, Money::from_cents(cents))))
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_date_modifier() {
        assert_eq!(shop_date_modifier(ShopClock::from_offset_minutes(420).unwrap()), "+420 minutes");
        assert_eq!(shop_date_modifier(ShopClock::from_offset_minutes(-300).unwrap()), "-300 minutes");
        assert_eq!(shop_date_modifier(ShopClock::utc()), "+0 minutes");
    }
}
