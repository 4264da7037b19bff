//! # Buyer Repository
//!
//! The offline buyer directory.
//!
//! ## Reference Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete(id)                                                            │
//! │     └── COUNT offline_sales WHERE buyer_id = id                        │
//! │            ├── 0  ──► DELETE buyer                                     │
//! │            └── n  ──► HasReferences { count: n }, nothing removed      │
//! │                                                                         │
//! │  delete_all(confirm)                                                   │
//! │     └── confirm == "DELETE_ALL_BUYERS" ?                               │
//! │            ├── no  ──► ConfirmationMismatch                            │
//! │            └── yes ──► BEGIN                                           │
//! │                          DELETE offline_sales (all buyer rows)         │
//! │                          DELETE offline_buyers                         │
//! │                        COMMIT                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use kitab_core::import::{BuyerImportRow, ImportBatch};
use kitab_core::requests::{BuyerDraft, DeleteAllBuyersRequest};
use kitab_core::{CoreError, ImportReport, OfflineBuyer};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

/// Repository for offline buyers.
#[derive(Debug, Clone)]
pub struct BuyerRepository {
    pool: SqlitePool,
}

impl BuyerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BuyerRepository { pool }
    }

    /// All buyers, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<OfflineBuyer>> {
        let buyers = sqlx::query_as::<_, OfflineBuyer>(
            "SELECT id, name, address, created_at FROM offline_buyers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(buyers)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<OfflineBuyer>> {
        let buyer = sqlx::query_as::<_, OfflineBuyer>(
            "SELECT id, name, address, created_at FROM offline_buyers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(buyer)
    }

    pub async fn require(&self, id: i64) -> DbResult<OfflineBuyer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Buyer", id))
    }

    /// Case-insensitive lookup by name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<OfflineBuyer>> {
        let buyer = sqlx::query_as::<_, OfflineBuyer>(
            "SELECT id, name, address, created_at FROM offline_buyers WHERE name = ?1 COLLATE NOCASE",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(buyer)
    }

    /// Distinct buyer names seen on online sales, for autocomplete.
    pub async fn list_online_buyer_names(&self) -> DbResult<Vec<String>> {
        let names = sqlx::query_scalar(
            "SELECT DISTINCT buyer_name FROM online_sales ORDER BY buyer_name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Adds a buyer.
    ///
    /// ## Errors
    /// - `UniqueViolation` when the name is taken
    pub async fn create(&self, draft: &BuyerDraft) -> DbResult<OfflineBuyer> {
        let buyer = sqlx::query_as::<_, OfflineBuyer>(
            r#"
            INSERT INTO offline_buyers (name, address, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, name, address, created_at
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.address)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("name", &draft.name))?;

        info!(id = buyer.id, name = %buyer.name, "Buyer created");
        Ok(buyer)
    }

    /// Renames and/or re-addresses a buyer.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `UniqueViolation` when renaming onto another buyer's name
    pub async fn update(&self, id: i64, draft: &BuyerDraft) -> DbResult<OfflineBuyer> {
        debug!(id, name = %draft.name, "Updating buyer");

        if let Some(other) = self.find_by_name(&draft.name).await? {
            if other.id != id {
                return Err(DbError::duplicate("name", &draft.name));
            }
        }

        let buyer = sqlx::query_as::<_, OfflineBuyer>(
            r#"
            UPDATE offline_buyers SET name = ?2, address = ?3
            WHERE id = ?1
            RETURNING id, name, address, created_at
            "#,
        )
        .bind(id)
        .bind(&draft.name)
        .bind(&draft.address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("name", &draft.name))?
        .ok_or_else(|| DbError::not_found("Buyer", id))?;

        info!(id, name = %buyer.name, "Buyer updated");
        Ok(buyer)
    }

    /// Removes a buyer that no sale refers to.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting buyer");

        let mut tx = self.pool.begin().await?;

        let references: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offline_sales WHERE buyer_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if references > 0 {
            return Err(CoreError::HasReferences {
                entity: "buyer",
                id,
                count: references,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM offline_buyers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Buyer", id));
        }

        tx.commit().await?;

        info!(id, "Buyer deleted");
        Ok(())
    }

    /// Wipes the directory together with every offline sale.
    ///
    /// Returns `(deleted_sales, deleted_buyers)`.
    pub async fn delete_all(&self, request: &DeleteAllBuyersRequest) -> DbResult<(u64, u64)> {
        request.verify()?;

        let mut tx = self.pool.begin().await?;

        let sales = sqlx::query("DELETE FROM offline_sales WHERE buyer_id IN (SELECT id FROM offline_buyers)")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let buyers = sqlx::query("DELETE FROM offline_buyers")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        warn!(sales, buyers, "Buyer directory wiped");
        Ok((sales, buyers))
    }

    /// Upserts parsed buyer rows by name in one transaction.
    pub async fn bulk_upsert(&self, batch: &ImportBatch<BuyerImportRow>) -> DbResult<ImportReport> {
        debug!(rows = batch.rows.len(), "Importing buyers");

        let mut report = ImportReport::from_batch(batch);
        let mut tx = self.pool.begin().await?;

        for row in &batch.rows {
            let draft = &row.data;
            let existing: Option<i64> =
                match sqlx::query_scalar("SELECT id FROM offline_buyers WHERE name = ?1 COLLATE NOCASE")
                    .bind(&draft.name)
                    .fetch_optional(&mut *tx)
                    .await
                {
                    Ok(id) => id,
                    Err(e) => {
                        report.warn(row.line, DbError::from(e).to_string());
                        continue;
                    }
                };

            let written = match existing {
                Some(id) => sqlx::query("UPDATE offline_buyers SET address = ?2 WHERE id = ?1")
                    .bind(id)
                    .bind(&draft.address)
                    .execute(&mut *tx)
                    .await
                    .map(|_| false),
                None => sqlx::query("INSERT INTO offline_buyers (name, address, created_at) VALUES (?1, ?2, ?3)")
                    .bind(&draft.name)
                    .bind(&draft.address)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await
                    .map(|_| true),
            };

            match written {
                Ok(true) => report.imported += 1,
                Ok(false) => report.updated += 1,
                Err(e) => {
                    let e = DbError::from(e).with_duplicate_value("name", &draft.name);
                    warn!(line = row.line, error = %e, "Buyer row rejected");
                    report.warn(row.line, e.to_string());
                }
            }
        }

        tx.commit().await?;

        let report = report.finish_upsert();
        info!(imported = report.imported, updated = report.updated, "Buyer import complete");
        Ok(report)
    }
}

/// Finds a buyer by name or creates one, inside an open transaction.
///
/// An existing buyer keeps its stored address.
pub(crate) async fn find_or_create_in(conn: &mut SqliteConnection, name: &str, address: &str) -> DbResult<i64> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM offline_buyers WHERE name = ?1 COLLATE NOCASE")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO offline_buyers (name, address, created_at) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(name)
    .bind(address)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    debug!(id, name, "Buyer created during import");
    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================
