//! # Book Repository
//!
//! Catalog CRUD and catalog import.
//!
//! ## Name Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create("Kitab A")                                                     │
//! │       │                                                                 │
//! │       ├── SELECT by name (NOCASE) ── found ──► DuplicateName, no write │
//! │       │                                                                 │
//! │       └── INSERT ── UNIQUE fails (lost a race) ──► DuplicateName       │
//! │                 └── ok ──► Book                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Image files are owned by the server's image store. This repository only
//! records the file name and hands back the one it replaced or removed.

use chrono::Utc;
use kitab_core::import::{BookImportRow, ImportBatch};
use kitab_core::{Availability, Book, BookDraft, CoreError, ImportReport};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

const BOOK_COLUMNS: &str = "id, name, price_cents, availability, link_ig, link_wa, link_shopee, \
                            link_tiktok, image_filename, created_at, updated_at";

/// Repository for catalog operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

/// Outcome of an upsert-by-name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upserted {
    Inserted,
    Updated,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All books, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Books marked `Tersedia`, ordered by name.
    pub async fn list_available(&self) -> DbResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE availability = ?1 ORDER BY name"
        ))
        .bind(Availability::Available)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Like [`get_by_id`](Self::get_by_id) but unknown ids are `NotFound`.
    pub async fn require(&self, id: i64) -> DbResult<Book> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Book", id))
    }

    /// Case-insensitive lookup by name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE name = ?1 COLLATE NOCASE"
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a new book.
    ///
    /// ## Errors
    /// - `UniqueViolation` when the name is taken (nothing is written)
    pub async fn create(&self, draft: &BookDraft, image_filename: Option<String>) -> DbResult<Book> {
        debug!(name = %draft.name, "Creating book");

        if self.find_by_name(&draft.name).await?.is_some() {
            return Err(DbError::duplicate("name", &draft.name));
        }

        let now = Utc::now();
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (
                name, price_cents, availability,
                link_ig, link_wa, link_shopee, link_tiktok,
                image_filename, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.price.cents())
        .bind(draft.availability)
        .bind(&draft.links.link_ig)
        .bind(&draft.links.link_wa)
        .bind(&draft.links.link_shopee)
        .bind(&draft.links.link_tiktok)
        .bind(&image_filename)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("name", &draft.name))?;

        info!(id = book.id, name = %book.name, price = %draft.price, "Book created");
        Ok(book)
    }

    /// Replaces a book's fields.
    ///
    /// `new_image = None` keeps the current image. Returns the updated book
    /// and, when the image was replaced, the previous file name so the caller
    /// can delete it after this write succeeded.
    pub async fn update(
        &self,
        id: i64,
        draft: &BookDraft,
        new_image: Option<String>,
    ) -> DbResult<(Book, Option<String>)> {
        debug!(id, name = %draft.name, "Updating book");

        let current = self.require(id).await?;

        if let Some(other) = self.find_by_name(&draft.name).await? {
            if other.id != id {
                return Err(DbError::duplicate("name", &draft.name));
            }
        }

        let image_filename = new_image.clone().or_else(|| current.image_filename.clone());

        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                name = ?2,
                price_cents = ?3,
                availability = ?4,
                link_ig = ?5,
                link_wa = ?6,
                link_shopee = ?7,
                link_tiktok = ?8,
                image_filename = ?9,
                updated_at = ?10
            WHERE id = ?1
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(draft.price.cents())
        .bind(draft.availability)
        .bind(&draft.links.link_ig)
        .bind(&draft.links.link_wa)
        .bind(&draft.links.link_shopee)
        .bind(&draft.links.link_tiktok)
        .bind(&image_filename)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("name", &draft.name))?
        .ok_or_else(|| DbError::not_found("Book", id))?;

        let replaced = match new_image {
            Some(_) => current.image_filename.filter(|old| Some(old) != book.image_filename.as_ref()),
            None => None,
        };

        info!(id, name = %book.name, "Book updated");
        Ok((book, replaced))
    }

    /// Removes a book and returns the deleted row (for image cleanup).
    ///
    /// ## Errors
    /// - `NotFound` for an unknown id
    /// - `HasReferences` while any offline or online sale points at it
    pub async fn delete(&self, id: i64) -> DbResult<Book> {
        debug!(id, "Deleting book");

        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Book", id))?;

        let references: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM offline_sales WHERE book_id = ?1)
                 + (SELECT COUNT(*) FROM online_sales WHERE book_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if references > 0 {
            return Err(CoreError::HasReferences {
                entity: "book",
                id,
                count: references,
            }
            .into());
        }

        sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id, name = %book.name, "Book deleted");
        Ok(book)
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Upserts parsed catalog rows by name in one transaction.
    ///
    /// Existing books get price, availability and links overwritten; the
    /// image is left alone. A row that fails to write becomes a warning and
    /// the batch carries on.
    pub async fn bulk_upsert(&self, batch: &ImportBatch<BookImportRow>) -> DbResult<ImportReport> {
        debug!(rows = batch.rows.len(), "Importing books");

        let mut report = ImportReport::from_batch(batch);
        let mut tx = self.pool.begin().await?;

        for row in &batch.rows {
            match upsert_in(&mut *tx, &row.data).await {
                Ok(Upserted::Inserted) => report.imported += 1,
                Ok(Upserted::Updated) => report.updated += 1,
                Err(e) => {
                    warn!(line = row.line, error = %e, "Book row rejected");
                    report.warn(row.line, e.to_string());
                }
            }
        }

        tx.commit().await?;

        let report = report.finish_upsert();
        info!(
            imported = report.imported,
            updated = report.updated,
            skipped = report.skipped,
            "Book import complete"
        );
        Ok(report)
    }
}

async fn upsert_in(conn: &mut SqliteConnection, draft: &BookDraft) -> DbResult<Upserted> {
    let now = Utc::now();

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE name = ?1 COLLATE NOCASE")
        .bind(&draft.name)
        .fetch_optional(&mut *conn)
        .await?;

    match existing {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE books SET
                    price_cents = ?2,
                    availability = ?3,
                    link_ig = ?4,
                    link_wa = ?5,
                    link_shopee = ?6,
                    link_tiktok = ?7,
                    updated_at = ?8
                WHERE id = ?1
                "#,
            )
            .bind(id)
            .bind(draft.price.cents())
            .bind(draft.availability)
            .bind(&draft.links.link_ig)
            .bind(&draft.links.link_wa)
            .bind(&draft.links.link_shopee)
            .bind(&draft.links.link_tiktok)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            Ok(Upserted::Updated)
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO books (
                    name, price_cents, availability,
                    link_ig, link_wa, link_shopee, link_tiktok,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                "#,
            )
            .bind(&draft.name)
            .bind(draft.price.cents())
            .bind(draft.availability)
            .bind(&draft.links.link_ig)
            .bind(&draft.links.link_wa)
            .bind(&draft.links.link_shopee)
            .bind(&draft.links.link_tiktok)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::from(e).with_duplicate_value("name", &draft.name))?;

            Ok(Upserted::Inserted)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
