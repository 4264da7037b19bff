//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  kitab-server startup                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← from ServerConfig.database_path                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       │ Checked out per request / transaction, returned on drop        │
//! │       ▼                                                                 │
//! │  axum handler 1 ──► Conn1                                              │
//! │  axum handler 2 ──► Conn2                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases run in WAL mode so recap reads do not block sale writes.

use kitab_core::ShopClock;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, MigrationStatus};
use crate::repository::book::BookRepository;
use crate::repository::buyer::BuyerRepository;
use crate::repository::cash::CashRepository;
use crate::repository::offline_sale::OfflineSaleRepository;
use crate::repository::online_sale::OnlineSaleRepository;
use crate::repository::user::UserRepository;

const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./data/kitab.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// How long to wait for a free connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,

    /// Calendar used for sale-date filters and display.
    /// Default: the host's offset
    pub clock: ShopClock,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
            clock: ShopClock::system(),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Sets the shop calendar.
    pub fn clock(mut self, clock: ShopClock) -> Self {
        self.clock = clock;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Note
    /// Every SQLite in-memory connection is its own database, so the pool
    /// is pinned to one connection that is never recycled. Repository code
    /// must therefore never touch the pool while holding a transaction.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
            clock: ShopClock::system(),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone; every clone shares the same pool. The server keeps one in
/// its `AppState` and hands out repositories per request.
///
/// ## Usage in Handlers
/// ```rust,ignore
/// async fn list_books(State(state): State<SharedState>) -> ApiResult<Json<Vec<Book>>> {
///     let books = state.db.books().list_all().await?;
///     Ok(Json(books))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    clock: ShopClock,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file (and its directory) if missing
    /// 2. Configures SQLite: WAL, NORMAL synchronous, foreign keys on
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let pool = if config.is_in_memory() {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(config.connect_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            if let Some(parent) = config.database_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(&config.database_path)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .foreign_keys(true)
                .create_if_missing(true);

            debug!("Connection options configured");

            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(config.connect_timeout)
                .idle_timeout(Some(config.idle_timeout))
                .connect_with(options)
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        };

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            clock: config.clock,
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Reverts migrations newer than `target`.
    pub async fn undo_migrations(&self, target: i64) -> DbResult<()> {
        migrations::undo_migrations(&self.pool, target).await
    }

    /// Known vs applied migration versions.
    pub async fn migration_status(&self) -> DbResult<MigrationStatus> {
        migrations::migration_status(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Shop calendar shared by the sale repositories.
    pub fn clock(&self) -> ShopClock {
        self.clock
    }

    /// Catalog store.
    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    /// Offline buyer directory.
    pub fn buyers(&self) -> BuyerRepository {
        BuyerRepository::new(self.pool.clone())
    }

    /// Offline sales ledger.
    pub fn offline_sales(&self) -> OfflineSaleRepository {
        OfflineSaleRepository::new(self.pool.clone(), self.clock)
    }

    /// Online sales ledger.
    pub fn online_sales(&self) -> OnlineSaleRepository {
        OnlineSaleRepository::new(self.pool.clone(), self.clock)
    }

    /// Cash ledger.
    pub fn cash(&self) -> CashRepository {
        CashRepository::new(self.pool.clone())
    }

    /// Admin accounts.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_migrations_applied_and_reversible() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let status = db.migration_status().await.unwrap();
        assert_eq!(status.known.len(), 4);
        assert!(status.pending().is_empty());

        db.undo_migrations(2).await.unwrap();
        let status = db.migration_status().await.unwrap();
        assert_eq!(status.applied, vec![1, 2]);
        assert_eq!(status.pending(), vec![3, 4]);

        db.run_migrations().await.unwrap();
        assert!(db.migration_status().await.unwrap().pending().is_empty());
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/kitab-test.db")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false)
            .clock(ShopClock::utc());

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert_eq!(config.clock, ShopClock::utc());
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
