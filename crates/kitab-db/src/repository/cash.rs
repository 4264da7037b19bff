//! # Cash Repository
//!
//! The cash journal. Independent of the sales tables.
//!
//! The summary returned by [`CashRepository::list`] is computed from exactly
//! the rows it returns, so the screen, the export and the totals always agree.

use chrono::Utc;
use kitab_core::requests::CashRecordDraft;
use kitab_core::{CashFilter, CashRecord, CashSummary};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const RECORD_COLUMNS: &str =
    "id, record_type, amount_cents, description, category, record_date, created_at, updated_at";

/// Filtered records with their totals.
#[derive(Debug, Clone, PartialEq)]
pub struct CashLedger {
    pub records: Vec<CashRecord>,
    pub summary: CashSummary,
}

/// Repository for cash records.
#[derive(Debug, Clone)]
pub struct CashRepository {
    pool: SqlitePool,
}

impl CashRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashRepository { pool }
    }

    pub async fn add(&self, draft: &CashRecordDraft) -> DbResult<CashRecord> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, CashRecord>(&format!(
            r#"
            INSERT INTO cash_records (
                record_type, amount_cents, description, category,
                record_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(draft.record_type)
        .bind(draft.amount.cents())
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(draft.record_date)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(
            id = record.id,
            record_type = record.record_type.as_str(),
            amount = %draft.amount,
            "Cash record added"
        );
        Ok(record)
    }

    /// Records matching `filter`, newest `record_date` first, with totals.
    pub async fn list(&self, filter: &CashFilter) -> DbResult<CashLedger> {
        debug!(?filter, "Listing cash records");

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {RECORD_COLUMNS} FROM cash_records WHERE 1 = 1"));

        if let Some(record_type) = filter.record_type {
            query.push(" AND record_type = ").push_bind(record_type);
        }
        if let Some(start) = filter.range.start {
            query.push(" AND record_date >= ").push_bind(start);
        }
        if let Some(end) = filter.range.end {
            query.push(" AND record_date <= ").push_bind(end);
        }
        query.push(" ORDER BY record_date DESC, id DESC");

        let records = query.build_query_as::<CashRecord>().fetch_all(&self.pool).await?;
        let summary = CashSummary::from_records(&records)?;

        Ok(CashLedger { records, summary })
    }

    pub async fn get(&self, id: i64) -> DbResult<CashRecord> {
        sqlx::query_as::<_, CashRecord>(&format!("SELECT {RECORD_COLUMNS} FROM cash_records WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Cash record", id))
    }

    pub async fn update(&self, id: i64, draft: &CashRecordDraft) -> DbResult<CashRecord> {
        let record = sqlx::query_as::<_, CashRecord>(&format!(
            r#"
            UPDATE cash_records SET
                record_type = ?2,
                amount_cents = ?3,
                description = ?4,
                category = ?5,
                record_date = ?6,
                updated_at = ?7
            WHERE id = ?1
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(draft.record_type)
        .bind(draft.amount.cents())
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(draft.record_date)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Cash record", id))?;

        info!(id, "Cash record updated");
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cash_records WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cash record", id));
        }

        info!(id, "Cash record deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::test_db;
    use chrono::NaiveDate;
    use kitab_core::{CashType, DateRange, Money};

    fn draft(record_type: CashType, rupiah: i64, day: u32) -> CashRecordDraft {
        CashRecordDraft {
            record_type,
            amount: Money::from_rupiah(rupiah),
            description: format!("Entry {day}"),
            category: None,
            record_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_summary_matches_returned_rows_for_every_filter() {
        let db = test_db().await;
        let repo = db.cash();

        repo.add(&draft(CashType::Debit, 100_000, 1)).await.unwrap();
        repo.add(&draft(CashType::Kredit, 30_000, 5)).await.unwrap();
        repo.add(&draft(CashType::Debit, 20_000, 10)).await.unwrap();
        repo.add(&draft(CashType::Kredit, 5_000, 20)).await.unwrap();

        let filters = [
            CashFilter::default(),
            CashFilter {
                record_type: Some(CashType::Debit),
                range: DateRange::default(),
            },
            CashFilter {
                record_type: None,
                range: DateRange::new(NaiveDate::from_ymd_opt(2024, 3, 5), NaiveDate::from_ymd_opt(2024, 3, 10)),
            },
        ];

        for filter in &filters {
            let ledger = repo.list(filter).await.unwrap();
            let debit: i64 = ledger
                .records
                .iter()
                .filter(|r| r.record_type == CashType::Debit)
                .map(|r| r.amount_cents)
                .sum();
            let kredit: i64 = ledger
                .records
                .iter()
                .filter(|r| r.record_type == CashType::Kredit)
                .map(|r| r.amount_cents)
                .sum();
            assert_eq!(ledger.summary.total_debit_cents, debit);
            assert_eq!(ledger.summary.total_kredit_cents, kredit);
            assert_eq!(ledger.summary.total_kas_cents, debit - kredit);
        }

        let all = repo.list(&CashFilter::default()).await.unwrap();
        assert_eq!(all.records.len(), 4);
        assert_eq!(all.summary.total_kas(), Money::from_rupiah(85_000));
        assert_eq!(all.records[0].description, "Entry 20");

        let window = repo.list(&filters[2]).await.unwrap();
        assert_eq!(window.records.len(), 2);
        assert_eq!(window.summary.total_kas(), Money::from_rupiah(-10_000));
    }

    #[tokio::test]
    async fn test_same_day_orders_by_id_desc() {
        let db = test_db().await;
        let repo = db.cash();
        let first = repo.add(&draft(CashType::Debit, 1_000, 3)).await.unwrap();
        let second = repo.add(&draft(CashType::Debit, 2_000, 3)).await.unwrap();

        let ledger = repo.list(&CashFilter::default()).await.unwrap();
        assert_eq!(ledger.records[0].id, second.id);
        assert_eq!(ledger.records[1].id, first.id);
    }

    #[tokio::test]
    async fn test_update_get_delete() {
        let db = test_db().await;
        let repo = db.cash();
        let record = repo.add(&draft(CashType::Debit, 1_000, 3)).await.unwrap();

        let mut changed = draft(CashType::Kredit, 4_500, 4);
        changed.category = Some("Operasional".to_string());
        let updated = repo.update(record.id, &changed).await.unwrap();
        assert_eq!(updated.record_type, CashType::Kredit);
        assert_eq!(updated.amount(), Money::from_rupiah(4_500));
        assert_eq!(repo.get(record.id).await.unwrap().category.as_deref(), Some("Operasional"));

        assert!(matches!(repo.update(999, &changed).await, Err(DbError::NotFound { .. })));

        repo.delete(record.id).await.unwrap();
        assert!(matches!(repo.delete(record.id).await, Err(DbError::NotFound { .. })));
    }
}
