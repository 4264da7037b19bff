//! # Online Sale Repository
//!
//! Shipped orders. Buyer name and address are copied onto every row; there
//! is no online buyer table.
//!
//! ## Shipping Allocation
//! ```text
//! order: 2 lines, shipping Rp 20.000
//!
//!   line 1: Kitab A × 1 @ 25.000 ──► share 10.000 ──► total 35.000
//!   line 2: Kitab A × 1 @ 25.000 ──► share 10.000 ──► total 35.000
//!                                    ───────────
//!                                    Σ = 20.000 (exact, leftover sen go
//!                                                to the leading lines)
//! ```

use chrono::{DateTime, Utc};
use kitab_core::dates::format_date;
use kitab_core::import::{ImportBatch, OnlineSaleImportRow};
use kitab_core::pricing::{price_online_lines, PricedLine};
use kitab_core::requests::{OnlineOrder, OnlineSaleUpdate, OrderLine};
use kitab_core::{DateRange, ImportReport, OnlineSale, OnlineSaleView, ShopClock};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::{book_by_name_in, book_price_in};
use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = "id, buyer_name, buyer_address, book_id, quantity, unit_price_cents, \
                            shipping_cost_cents, total_price_cents, transfer_date, sale_date";

/// Repository for online sales.
#[derive(Debug, Clone)]
pub struct OnlineSaleRepository {
    pool: SqlitePool,
    clock: ShopClock,
}

/// Buyer and dates shared by every row of one order.
struct OrderHeader<'a> {
    buyer_name: &'a str,
    buyer_address: &'a str,
    transfer_date: chrono::NaiveDate,
    sale_date: DateTime<Utc>,
}

impl OnlineSaleRepository {
    pub fn new(pool: SqlitePool, clock: ShopClock) -> Self {
        OnlineSaleRepository { pool, clock }
    }

    /// Records every line of an order in one transaction, spreading the
    /// order's shipping cost across its lines.
    pub async fn record(&self, order: &OnlineOrder) -> DbResult<Vec<OnlineSale>> {
        debug!(
            buyer = %order.buyer_name,
            lines = order.lines.len(),
            shipping = %order.shipping,
            "Recording online sale"
        );

        let mut tx = self.pool.begin().await?;

        let mut priced_input = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let price = book_price_in(&mut *tx, line.book_id).await?;
            priced_input.push((*line, price));
        }

        let priced = price_online_lines(&priced_input, order.shipping)?;
        let header = OrderHeader {
            buyer_name: &order.buyer_name,
            buyer_address: &order.buyer_address,
            transfer_date: order.transfer_date,
            sale_date: Utc::now(),
        };

        let mut rows = Vec::with_capacity(priced.len());
        for line in &priced {
            rows.push(insert_in(&mut *tx, &header, line).await?);
        }

        tx.commit().await?;

        info!(buyer = %order.buyer_name, rows = rows.len(), "Online sale recorded");
        Ok(rows)
    }

    /// Joined view for the recap screen and export, newest first.
    ///
    /// Date bounds compare against `transfer_date`.
    pub async fn list_recent(&self, range: &DateRange) -> DbResult<Vec<OnlineSaleView>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                s.id, s.buyer_name, s.buyer_address,
                s.book_id, k.name AS book_name,
                s.quantity, s.unit_price_cents, s.shipping_cost_cents, s.total_price_cents,
                s.transfer_date, s.sale_date
            FROM online_sales s
            JOIN books k ON k.id = s.book_id
            WHERE 1 = 1
            "#,
        );

        if let Some(start) = range.start {
            query.push(" AND s.transfer_date >= ").push_bind(start);
        }
        if let Some(end) = range.end {
            query.push(" AND s.transfer_date <= ").push_bind(end);
        }
        query.push(" ORDER BY s.id DESC");

        let mut rows = query
            .build_query_as::<OnlineSaleView>()
            .fetch_all(&self.pool)
            .await?;

        for row in &mut rows {
            row.sale_date_formatted = self.clock.format_timestamp(row.sale_date);
            row.transfer_date_formatted = format_date(row.transfer_date);
        }

        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> DbResult<OnlineSale> {
        sqlx::query_as::<_, OnlineSale>(&format!("SELECT {SALE_COLUMNS} FROM online_sales WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Online sale", id))
    }

    /// Replaces one row. Total = current book price × quantity + the
    /// supplied shipping cost.
    pub async fn update(&self, update: &OnlineSaleUpdate) -> DbResult<OnlineSale> {
        debug!(id = update.id, "Updating online sale");

        let mut tx = self.pool.begin().await?;

        let price = book_price_in(&mut *tx, update.line.book_id).await?;
        let priced = PricedLine::new(update.line, price, update.shipping)?;

        let sale = sqlx::query_as::<_, OnlineSale>(&format!(
            r#"
            UPDATE online_sales SET
                buyer_name = ?2,
                buyer_address = ?3,
                book_id = ?4,
                quantity = ?5,
                unit_price_cents = ?6,
                shipping_cost_cents = ?7,
                total_price_cents = ?8,
                transfer_date = ?9
            WHERE id = ?1
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(update.id)
        .bind(&update.buyer_name)
        .bind(&update.buyer_address)
        .bind(priced.book_id)
        .bind(priced.quantity)
        .bind(priced.unit_price.cents())
        .bind(priced.shipping.cents())
        .bind(priced.total.cents())
        .bind(update.transfer_date)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Online sale", update.id))?;

        tx.commit().await?;

        info!(id = sale.id, total = sale.total_price_cents, "Online sale updated");
        Ok(sale)
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM online_sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Online sale", id));
        }

        info!(id, "Online sale deleted");
        Ok(())
    }

    /// Appends imported rows in one transaction. Each row is its own
    /// one-line order carrying its own shipping cost.
    pub async fn import(&self, batch: &ImportBatch<OnlineSaleImportRow>) -> DbResult<ImportReport> {
        debug!(rows = batch.rows.len(), "Importing online sales");

        let mut report = ImportReport::from_batch(batch);
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for row in &batch.rows {
            match import_row_in(&mut *tx, &row.data, now).await {
                Ok(()) => report.imported += 1,
                Err(message) => {
                    warn!(line = row.line, %message, "Online sale row rejected");
                    report.warn(row.line, message);
                }
            }
        }

        tx.commit().await?;

        let report = report.finish_append();
        info!(imported = report.imported, skipped = report.skipped, "Online sale import complete");
        Ok(report)
    }
}

async fn insert_in(conn: &mut SqliteConnection, header: &OrderHeader<'_>, line: &PricedLine) -> DbResult<OnlineSale> {
    let sale = sqlx::query_as::<_, OnlineSale>(&format!(
        r#"
        INSERT INTO online_sales (
            buyer_name, buyer_address, book_id, quantity, unit_price_cents,
            shipping_cost_cents, total_price_cents, transfer_date, sale_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        RETURNING {SALE_COLUMNS}
        "#
    ))
    .bind(header.buyer_name)
    .bind(header.buyer_address)
    .bind(line.book_id)
    .bind(line.quantity)
    .bind(line.unit_price.cents())
    .bind(line.shipping.cents())
    .bind(line.total.cents())
    .bind(header.transfer_date)
    .bind(header.sale_date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(sale)
}

async fn import_row_in(
    conn: &mut SqliteConnection,
    row: &OnlineSaleImportRow,
    now: DateTime<Utc>,
) -> Result<(), String> {
    let (book_id, price) = book_by_name_in(conn, &row.book_name)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Kitab '{}' tidak ditemukan", row.book_name))?;

    let line = OrderLine {
        book_id,
        quantity: row.quantity,
    };
    let priced = PricedLine::new(line, price, row.shipping).map_err(|e| e.to_string())?;

    let header = OrderHeader {
        buyer_name: &row.buyer_name,
        buyer_address: &row.buyer_address,
        transfer_date: row.transfer_date,
        sale_date: now,
    };
    insert_in(conn, &header, &priced).await.map_err(|e| e.to_string())?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
