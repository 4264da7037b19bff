//! # Database Migrations
//!
//! Embedded, versioned and reversible SQL migrations.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Server startup / `kitab-admin migrate`                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs _sqlx_migrations                       │
//! │       │                                                                 │
//! │       ├── 0001_catalog_and_buyers   ✓ (already applied)               │
//! │       ├── 0002_sales                ✓ (already applied)               │
//! │       └── 0003_cash_records         ⬜ (NEW - needs to run)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending `.up.sql` files in order, record version + checksum       │
//! │                                                                         │
//! │  `kitab-admin rollback <version>` runs `.down.sql` files newest-first  │
//! │  until only migrations <= version remain                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Add `NNNN_description.up.sql` and `NNNN_description.down.sql` to
//!    `migrations/sqlite/` with the next sequence number
//! 2. **NEVER** modify applied migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applied/pending overview for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Versions embedded in the binary
    pub known: Vec<(i64, String)>,
    /// Versions recorded as applied
    pub applied: Vec<i64>,
}

impl MigrationStatus {
    pub fn pending(&self) -> Vec<i64> {
        self.known
            .iter()
            .map(|(v, _)| *v)
            .filter(|v| !self.applied.contains(v))
            .collect()
    }
}

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Reverts applied migrations newer than `target`.
///
/// `target = 0` reverts everything.
pub async fn undo_migrations(pool: &SqlitePool, target: i64) -> DbResult<()> {
    info!(target, "Reverting migrations");

    MIGRATOR.undo(pool, target).await?;

    info!(target, "Migrations reverted");
    Ok(())
}

/// Returns known and applied migration versions.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let known = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| (m.version, m.description.to_string()))
        .collect();

    // Table is absent until the first run
    let applied: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version")
            .fetch_all(pool)
            .await
            .unwrap_or_default();

    Ok(MigrationStatus { known, applied })
}
