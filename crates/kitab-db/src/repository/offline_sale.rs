//! # Offline Sale Repository
//!
//! In-person sales. Each stored row is one priced line of an order.
//!
//! ## Recording an Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   record(OfflineOrder)                                  │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    │                                                                    │
//! │    ├── buyer exists? ────────────── no ──► NotFound (rollback)         │
//! │    │                                                                    │
//! │    ├── for each line: book price ── missing ──► NotFound (rollback)    │
//! │    │                                                                    │
//! │    ├── price_offline_lines()  total = price × quantity                 │
//! │    │                                                                    │
//! │    └── INSERT one row per line                                         │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Either every line of an order is written or none is.

use chrono::{DateTime, Utc};
use kitab_core::import::{ImportBatch, OfflineSaleImportRow};
use kitab_core::pricing::{price_offline_lines, PricedLine};
use kitab_core::requests::{OfflineOrder, OfflineSaleUpdate, OrderLine};
use kitab_core::{ImportReport, Money, OfflineSale, OfflineSaleView, OfflineSalesFilter, PaymentStatus, ShopClock};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::buyer::find_or_create_in;
use super::{book_by_name_in, book_price_in, shop_date_modifier};
use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str =
    "id, buyer_id, book_id, quantity, unit_price_cents, total_price_cents, payment_status, sale_date";

/// Repository for offline sales.
#[derive(Debug, Clone)]
pub struct OfflineSaleRepository {
    pool: SqlitePool,
    clock: ShopClock,
}

impl OfflineSaleRepository {
    pub fn new(pool: SqlitePool, clock: ShopClock) -> Self {
        OfflineSaleRepository { pool, clock }
    }

    /// Records every line of an order in one transaction.
    ///
    /// ## Errors
    /// - `NotFound("Buyer")` for an unknown buyer
    /// - `NotFound("Book")` for the first line whose book is missing
    pub async fn record(&self, order: &OfflineOrder) -> DbResult<Vec<OfflineSale>> {
        debug!(buyer_id = order.buyer_id, lines = order.lines.len(), "Recording offline sale");

        let mut tx = self.pool.begin().await?;

        let buyer: Option<i64> = sqlx::query_scalar("SELECT id FROM offline_buyers WHERE id = ?1")
            .bind(order.buyer_id)
            .fetch_optional(&mut *tx)
            .await?;
        if buyer.is_none() {
            return Err(DbError::not_found("Buyer", order.buyer_id));
        }

        let mut priced_input = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let price = book_price_in(&mut *tx, line.book_id).await?;
            priced_input.push((*line, price));
        }

        let priced = price_offline_lines(&priced_input)?;
        let now = Utc::now();

        let mut rows = Vec::with_capacity(priced.len());
        for line in &priced {
            rows.push(insert_in(&mut *tx, order.buyer_id, line, order.payment_status, now).await?);
        }

        tx.commit().await?;

        info!(
            buyer_id = order.buyer_id,
            rows = rows.len(),
            status = order.payment_status.as_str(),
            "Offline sale recorded"
        );
        Ok(rows)
    }

    /// Joined view for the recap screen and export, newest first.
    ///
    /// Date bounds compare against the shop-time calendar date of `sale_date`.
    pub async fn list_recent(&self, filter: &OfflineSalesFilter) -> DbResult<Vec<OfflineSaleView>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                s.id, s.buyer_id, b.name AS buyer_name, b.address,
                s.book_id, k.name AS book_name,
                s.quantity, s.unit_price_cents, s.total_price_cents,
                s.payment_status, s.sale_date
            FROM offline_sales s
            JOIN offline_buyers b ON b.id = s.buyer_id
            JOIN books k ON k.id = s.book_id
            WHERE 1 = 1
            "#,
        );

        if let Some(status) = filter.payment_status {
            query.push(" AND s.payment_status = ").push_bind(status);
        }
        if let Some(start) = filter.range.start {
            query
                .push(" AND date(s.sale_date, ")
                .push_bind(shop_date_modifier(self.clock))
                .push(") >= ")
                .push_bind(start);
        }
        if let Some(end) = filter.range.end {
            query
                .push(" AND date(s.sale_date, ")
                .push_bind(shop_date_modifier(self.clock))
                .push(") <= ")
                .push_bind(end);
        }
        query.push(" ORDER BY s.id DESC");

        let mut rows = query
            .build_query_as::<OfflineSaleView>()
            .fetch_all(&self.pool)
            .await?;

        for row in &mut rows {
            row.sale_date_formatted = self.clock.format_timestamp(row.sale_date);
        }

        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> DbResult<OfflineSale> {
        sqlx::query_as::<_, OfflineSale>(&format!("SELECT {SALE_COLUMNS} FROM offline_sales WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Offline sale", id))
    }

    /// Replaces buyer, book, quantity and status of one row.
    ///
    /// The total is recomputed from the book's current price.
    pub async fn update(&self, update: &OfflineSaleUpdate) -> DbResult<OfflineSale> {
        debug!(id = update.id, "Updating offline sale");

        let mut tx = self.pool.begin().await?;

        let buyer: Option<i64> = sqlx::query_scalar("SELECT id FROM offline_buyers WHERE id = ?1")
            .bind(update.buyer_id)
            .fetch_optional(&mut *tx)
            .await?;
        if buyer.is_none() {
            return Err(DbError::not_found("Buyer", update.buyer_id));
        }

        let price = book_price_in(&mut *tx, update.line.book_id).await?;
        let priced = PricedLine::new(update.line, price, Money::zero())?;

        let sale = sqlx::query_as::<_, OfflineSale>(&format!(
            r#"
            UPDATE offline_sales SET
                buyer_id = ?2,
                book_id = ?3,
                quantity = ?4,
                unit_price_cents = ?5,
                total_price_cents = ?6,
                payment_status = ?7
            WHERE id = ?1
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(update.id)
        .bind(update.buyer_id)
        .bind(priced.book_id)
        .bind(priced.quantity)
        .bind(priced.unit_price.cents())
        .bind(priced.total.cents())
        .bind(update.payment_status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Offline sale", update.id))?;

        tx.commit().await?;

        info!(id = sale.id, total = sale.total_price_cents, "Offline sale updated");
        Ok(sale)
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM offline_sales WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Offline sale", id));
        }

        info!(id, "Offline sale deleted");
        Ok(())
    }

    /// Appends imported rows in one transaction.
    ///
    /// Books are matched by name; buyers are found or created by name.
    pub async fn import(&self, batch: &ImportBatch<OfflineSaleImportRow>) -> DbResult<ImportReport> {
        debug!(rows = batch.rows.len(), "Importing offline sales");

        let mut report = ImportReport::from_batch(batch);
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for row in &batch.rows {
            match import_row_in(&mut *tx, &row.data, now).await {
                Ok(()) => report.imported += 1,
                Err(message) => {
                    warn!(line = row.line, %message, "Offline sale row rejected");
                    report.warn(row.line, message);
                }
            }
        }

        tx.commit().await?;

        let report = report.finish_append();
        info!(imported = report.imported, skipped = report.skipped, "Offline sale import complete");
        Ok(report)
    }
}

async fn insert_in(
    conn: &mut SqliteConnection,
    buyer_id: i64,
    line: &PricedLine,
    status: PaymentStatus,
    sale_date: DateTime<Utc>,
) -> DbResult<OfflineSale> {
    let sale = sqlx::query_as::<_, OfflineSale>(&format!(
        r#"
        INSERT INTO offline_sales (
            buyer_id, book_id, quantity, unit_price_cents,
            total_price_cents, payment_status, sale_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING {SALE_COLUMNS}
        "#
    ))
    .bind(buyer_id)
    .bind(line.book_id)
    .bind(line.quantity)
    .bind(line.unit_price.cents())
    .bind(line.total.cents())
    .bind(status)
    .bind(sale_date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(sale)
}

/// Writes one imported row; the error is the warning text.
async fn import_row_in(
    conn: &mut SqliteConnection,
    row: &OfflineSaleImportRow,
    now: DateTime<Utc>,
) -> Result<(), String> {
    let (book_id, price) = book_by_name_in(conn, &row.book_name)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("Kitab '{}' tidak ditemukan", row.book_name))?;

    let buyer_id = find_or_create_in(conn, &row.buyer_name, &row.buyer_address)
        .await
        .map_err(|e| e.to_string())?;

    let line = OrderLine {
        book_id,
        quantity: row.quantity,
    };
    let priced = PricedLine::new(line, price, Money::zero()).map_err(|e| e.to_string())?;

    insert_in(conn, buyer_id, &priced, row.payment_status, now)
        .await
        .map_err(|e| e.to_string())?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{seed_book, seed_buyer, test_db};
    use chrono::{NaiveDate, TimeZone};
    use kitab_core::DateRange;

    fn order(buyer_id: i64, lines: &[(i64, i64)], status: PaymentStatus) -> OfflineOrder {
        OfflineOrder {
            buyer_id,
            lines: lines
                .iter()
                .map(|&(book_id, quantity)| OrderLine { book_id, quantity })
                .collect(),
            payment_status: status,
        }
    }

    #[tokio::test]
    async fn test_total_is_price_times_quantity() {
        let db = test_db().await;
        let book = seed_book(&db, "Kitab A", 25_000).await;
        let buyer = seed_buyer(&db, "Ahmad").await;

        let rows = db
            .offline_sales()
            .record(&order(buyer.id, &[(book.id, 3)], PaymentStatus::Paid))
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_price_cents, Money::from_rupiah(75_000).cents());
        assert_eq!(rows[0].unit_price_cents, Money::from_rupiah(25_000).cents());
    }

    #[tokio::test]
    async fn test_missing_book_rolls_back_whole_order() {
        let db = test_db().await;
        let book = seed_book(&db, "Kitab A", 25_000).await;
        let buyer = seed_buyer(&db, "Ahmad").await;

        let err = db
            .offline_sales()
            .record(&order(buyer.id, &[(book.id, 1), (999, 1)], PaymentStatus::Paid))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Book"));

        let all = db.offline_sales().list_recent(&OfflineSalesFilter::default()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_buyer_rejected() {
        let db = test_db().await;
        let book = seed_book(&db, "Kitab A", 25_000).await;

        let err = db
            .offline_sales()
            .record(&order(42, &[(book.id, 1)], PaymentStatus::Paid))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Buyer"));
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_price_change() {
        let db = test_db().await;
        let book = seed_book(&db, "Kitab A", 25_000).await;
        let buyer = seed_buyer(&db, "Ahmad").await;

        db.offline_sales()
            .record(&order(buyer.id, &[(book.id, 2)], PaymentStatus::Paid))
            .await
            .unwrap();

        let draft = crate::repository::fixtures::book_draft("Kitab A", 40_000);
        db.books().update(book.id, &draft, None).await.unwrap();

        let rows = db.offline_sales().list_recent(&OfflineSalesFilter::default()).await.unwrap();
        assert_eq!(rows[0].total_price_cents, Money::from_rupiah(50_000).cents());
    }

    #[tokio::test]
    async fn test_list_recent_filters_and_order() {
        let db = test_db().await;
        let book = seed_book(&db, "Kitab A", 10_000).await;
        let buyer = seed_buyer(&db, "Ahmad").await;
        let repo = db.offline_sales();

        repo.record(&order(buyer.id, &[(book.id, 1)], PaymentStatus::Paid)).await.unwrap();
        repo.record(&order(buyer.id, &[(book.id, 2)], PaymentStatus::Unpaid)).await.unwrap();

        let all = repo.list_recent(&OfflineSalesFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id > all[1].id);
        assert_eq!(all[0].buyer_name, "Ahmad");
        assert_eq!(all[0].book_name, "Kitab A");
        assert!(!all[0].sale_date_formatted.is_empty());

        let unpaid = repo
            .list_recent(&OfflineSalesFilter {
                payment_status: Some(PaymentStatus::Unpaid),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].quantity, 2);

        let today = db.clock().today();
        let today_only = repo
            .list_recent(&OfflineSalesFilter {
                payment_status: None,
                range: DateRange::new(Some(today), Some(today)),
            })
            .await
            .unwrap();
        assert_eq!(today_only.len(), 2);

        let past = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let none = repo
            .list_recent(&OfflineSalesFilter {
                payment_status: None,
                range: DateRange::new(None, Some(past)),
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_early_morning_sale_belongs_to_shop_day() {
        let db = test_db().await;
        let book = seed_book(&db, "Kitab A", 10_000).await;
        let buyer = seed_buyer(&db, "Ahmad").await;
        let wib = ShopClock::from_offset_minutes(420).unwrap();
        let repo = OfflineSaleRepository::new(db.pool().clone(), wib);

        // 01:30 WIB on 19 October
        let sold_at = Utc.with_ymd_and_hms(2026, 10, 18, 18, 30, 0).unwrap();
        let line = PricedLine::new(OrderLine { book_id: book.id, quantity: 1 }, book.price(), Money::zero()).unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert_in(&mut *conn, buyer.id, &line, PaymentStatus::Paid, sold_at).await.unwrap();
        }

        let day = |date: NaiveDate| OfflineSalesFilter {
            payment_status: None,
            range: DateRange::new(Some(date), Some(date)),
        };

        let rows = repo.list_recent(&day(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sale_date_formatted, "19-10-2026 01:30");

        let previous = repo.list_recent(&day(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())).await.unwrap();
        assert!(previous.is_empty());

        let utc_repo = OfflineSaleRepository::new(db.pool().clone(), ShopClock::utc());
        let utc_rows = utc_repo.list_recent(&day(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap())).await.unwrap();
        assert_eq!(utc_rows.len(), 1);
    }

    #[tokio::test]
    async fn test_update_recomputes_and_delete() {
        let db = test_db().await;
        let a = seed_book(&db, "Kitab A", 10_000).await;
        let b = seed_book(&db, "Kitab B", 12_500).await;
        let buyer = seed_buyer(&db, "Ahmad").await;
        let repo = db.offline_sales();

        let rows = repo.record(&order(buyer.id, &[(a.id, 1)], PaymentStatus::Paid)).await.unwrap();
        let id = rows[0].id;

        let updated = repo
            .update(&OfflineSaleUpdate {
                id,
                buyer_id: buyer.id,
                line: OrderLine { book_id: b.id, quantity: 4 },
                payment_status: PaymentStatus::Unpaid,
            })
            .await
            .unwrap();
        assert_eq!(updated.total_price_cents, Money::from_rupiah(50_000).cents());
        assert_eq!(updated.payment_status, PaymentStatus::Unpaid);
        assert_eq!(repo.get(id).await.unwrap(), updated);

        repo.delete(id).await.unwrap();
        assert!(matches!(repo.delete(id).await, Err(DbError::NotFound { .. })));
        assert!(matches!(repo.get(id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_import_creates_buyers_and_warns_on_unknown_book() {
        let db = test_db().await;
        seed_book(&db, "Kitab A", 20_000).await;

        let mut batch = ImportBatch::default();
        batch.push(2, OfflineSaleImportRow {
            buyer_name: "Zaid".to_string(),
            buyer_address: "Pati".to_string(),
            book_name: "kitab a".to_string(),
            quantity: 2,
            payment_status: PaymentStatus::Unpaid,
        });
        batch.push(3, OfflineSaleImportRow {
            buyer_name: "Zaid".to_string(),
            buyer_address: String::new(),
            book_name: "Kitab Hilang".to_string(),
            quantity: 1,
            payment_status: PaymentStatus::Paid,
        });

        let report = db.offline_sales().import(&batch).await.unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.warnings, vec!["Baris 3: Kitab 'Kitab Hilang' tidak ditemukan".to_string()]);
        assert_eq!(report.message, "Import selesai! Berhasil: 1, Dilewati: 1");

        let zaid = db.buyers().find_by_name("Zaid").await.unwrap().unwrap();
        assert_eq!(zaid.address, "Pati");

        let rows = db.offline_sales().list_recent(&OfflineSalesFilter::default()).await.unwrap();
        assert_eq!(rows[0].total_price_cents, Money::from_rupiah(40_000).cents());
    }
}
