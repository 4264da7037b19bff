//! # Spreadsheet Import Handlers
//!
//! ## Import Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Spreadsheet Import                              │
//! │                                                                         │
//! │  multipart "file" ──► check_extension (.xlsx / .xls)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kitab_sheet::parse_*  (first sheet, header row)                        │
//! │       │  missing required column ──► 400, nothing written               │
//! │       │  blank key / bad cell ──► skipped / "Baris n: ..." warning      │
//! │       ▼                                                                 │
//! │  repository import / bulk_upsert  (one transaction)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { message, imported, updated, skipped, warnings }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parsing is CPU-bound and runs on the blocking pool.

use axum::extract::{Multipart, State};
use axum::Json;
use kitab_core::ImportReport;
use kitab_sheet::{check_extension, SheetResult};
use tracing::{error, info};

use super::UploadForm;
use crate::error::{ApiError, ApiResult};
use crate::SharedState;

/// Reads the `file` part and parses it off the async runtime.
async fn parse_upload<T, F>(multipart: Multipart, parse: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&[u8]) -> SheetResult<T> + Send + 'static,
{
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_file("file")?;
    check_extension(&file.filename)?;
    info!(filename = %file.filename, bytes = file.bytes.len(), "Parsing spreadsheet upload");

    let parsed = tokio::task::spawn_blocking(move || parse(&file.bytes))
        .await
        .map_err(|e| {
            error!("Spreadsheet parser panicked: {}", e);
            ApiError::internal("Failed to read spreadsheet")
        })??;
    Ok(parsed)
}

/// `POST /api/import-books`
pub async fn import_books(State(state): State<SharedState>, multipart: Multipart) -> ApiResult<Json<ImportReport>> {
    let batch = parse_upload(multipart, kitab_sheet::parse_books).await?;
    Ok(Json(state.db.books().bulk_upsert(&batch).await?))
}

/// `POST /api/import-buyers`
pub async fn import_buyers(State(state): State<SharedState>, multipart: Multipart) -> ApiResult<Json<ImportReport>> {
    let batch = parse_upload(multipart, kitab_sheet::parse_buyers).await?;
    Ok(Json(state.db.buyers().bulk_upsert(&batch).await?))
}

/// `POST /api/import-offline-sales`
pub async fn import_offline_sales(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    let batch = parse_upload(multipart, kitab_sheet::parse_offline_sales).await?;
    Ok(Json(state.db.offline_sales().import(&batch).await?))
}

/// `POST /api/import-online-sales`
///
/// Rows without a readable `Tanggal Transfer` are dated today, in shop time.
pub async fn import_online_sales(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    let today = state.db.clock().today();
    let batch = parse_upload(multipart, move |bytes| kitab_sheet::parse_online_sales(bytes, today)).await?;
    Ok(Json(state.db.online_sales().import(&batch).await?))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rust_xlsxwriter::Workbook;

    use crate::testing::{expect_status, seed_book, TestApp};

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    #[tokio::test]
    async fn test_import_books_twice_updates() {
        let app = TestApp::new().await;
        let sheet = workbook(&[
            &["Nama", "Harga", "Ketersediaan"],
            &["Kitab A", "25000", "Tersedia"],
            &["Kitab B", "30000", ""],
            &["", "10000", ""],
        ]);

        let first = expect_status(
            app.post_multipart("/api/import-books", &[], Some(("file", "kitab.xlsx", sheet.clone())))
                .await,
            StatusCode::OK,
        )
        .await;
        assert_eq!(first["imported"], 2);
        assert_eq!(first["skipped"], 1);

        let second = expect_status(
            app.post_multipart("/api/import-books", &[], Some(("file", "kitab.xlsx", sheet))).await,
            StatusCode::OK,
        )
        .await;
        assert_eq!(second["imported"], 0);
        assert_eq!(second["updated"], 2);
        assert!(second["message"].as_str().unwrap().starts_with("Import berhasil!"));
    }

    #[tokio::test]
    async fn test_import_buyers_missing_column() {
        let app = TestApp::new().await;
        let sheet = workbook(&[&["Pembeli", "Alamat"], &["Ahmad", "Jepara"]]);

        let response = app
            .post_multipart("/api/import-buyers", &[], Some(("file", "pembeli.xlsx", sheet)))
            .await;
        let body = expect_status(response, StatusCode::BAD_REQUEST).await;
        assert_eq!(body["error"], "Kolom 'Nama' tidak ditemukan di file Excel.");
        assert!(app.state.db.buyers().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_rejects_other_extensions() {
        let app = TestApp::new().await;
        let response = app
            .post_multipart("/api/import-books", &[], Some(("file", "kitab.csv", b"Nama\nA".to_vec())))
            .await;
        expect_status(response, StatusCode::BAD_REQUEST).await;

        let response = app.post_multipart("/api/import-books", &[], None).await;
        expect_status(response, StatusCode::BAD_REQUEST).await;
    }

    #[tokio::test]
    async fn test_import_offline_sales_warns_on_unknown_book() {
        let app = TestApp::new().await;
        seed_book(&app, "Kitab A", 25_000).await;
        let sheet = workbook(&[
            &["Nama Pembeli", "Nama Kitab", "Jumlah", "Status Pembayaran"],
            &["Ahmad", "Kitab A", "2", "Belum Lunas"],
            &["Budi", "Kitab Z", "1", ""],
        ]);

        let body = expect_status(
            app.post_multipart("/api/import-offline-sales", &[], Some(("file", "rekap.xlsx", sheet)))
                .await,
            StatusCode::OK,
        )
        .await;
        assert_eq!(body["imported"], 1);
        assert_eq!(body["skipped"], 1);
        assert!(body["warnings"][0].as_str().unwrap().starts_with("Baris 3:"));

        // Buyer created on the fly
        let buyers = app.state.db.buyers().list_all().await.unwrap();
        assert_eq!(buyers.len(), 1);
        assert_eq!(buyers[0].name, "Ahmad");
    }
}
