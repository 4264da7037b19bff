//! # Catalog Handlers
//!
//! Book management for the admin console.
//!
//! ## Image Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Book Write With Cover Image                          │
//! │                                                                         │
//! │  multipart form ──► BookRequest::validate                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ImageStore::save (new file, if any)                                    │
//! │       │                                                                 │
//! │       ├── row write fails ──► remove the new file, return error         │
//! │       ▼                                                                 │
//! │  row written ──► remove the replaced file (update) / stored file (del)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Multipart, Path, State};
use axum::Json;
use kitab_core::requests::{BookRequest, NumberInput};
use kitab_core::Book;
use serde::Serialize;
use tracing::{debug, info};

use super::{MessageResponse, UploadForm, UploadedFile};
use crate::error::{ApiError, ApiResult};
use crate::SharedState;

/// Add/update acknowledgement carrying the stored book.
#[derive(Debug, Serialize)]
pub struct BookSaved {
    pub message: String,
    pub book: Book,
}

fn book_request(form: &UploadForm) -> BookRequest {
    BookRequest {
        name: form.text("name"),
        price: form.text("price"),
        availability: form.text("availability"),
        link_ig: form.text("link_ig"),
        link_wa: form.text("link_wa"),
        link_shopee: form.text("link_shopee"),
        link_tiktok: form.text("link_tiktok"),
    }
}

async fn store_image(state: &SharedState, image: Option<UploadedFile>) -> ApiResult<Option<String>> {
    match image {
        Some(file) => Ok(Some(state.images.save(&file.filename, &file.bytes).await?)),
        None => Ok(None),
    }
}

/// `POST /api/add-book` (multipart, optional `image`)
pub async fn add_book(State(state): State<SharedState>, multipart: Multipart) -> ApiResult<Json<BookSaved>> {
    let mut form = UploadForm::read(multipart).await?;
    let draft = book_request(&form).validate()?;
    debug!(name = %draft.name, "add_book");

    let image = store_image(&state, form.take_file("image")).await?;

    let book = match state.db.books().create(&draft, image.clone()).await {
        Ok(book) => book,
        Err(e) => {
            if let Some(orphan) = image {
                state.images.remove(&orphan).await;
            }
            return Err(e.into());
        }
    };

    Ok(Json(BookSaved {
        message: "Kitab baru berhasil ditambahkan!".to_string(),
        book,
    }))
}

/// `POST /api/update-book` (multipart with `id`, optional `image`)
///
/// Without a new image the current cover is kept.
pub async fn update_book(State(state): State<SharedState>, multipart: Multipart) -> ApiResult<Json<BookSaved>> {
    let mut form = UploadForm::read(multipart).await?;
    let id = NumberInput::Text(form.text("id").unwrap_or_default()).to_id("id")?;
    let draft = book_request(&form).validate()?;
    debug!(id, name = %draft.name, "update_book");

    let image = store_image(&state, form.take_file("image")).await?;

    let (book, replaced) = match state.db.books().update(id, &draft, image.clone()).await {
        Ok(result) => result,
        Err(e) => {
            if let Some(orphan) = image {
                state.images.remove(&orphan).await;
            }
            return Err(e.into());
        }
    };

    if let Some(old) = replaced {
        state.images.remove(&old).await;
    }

    Ok(Json(BookSaved {
        message: "Data kitab berhasil diupdate!".to_string(),
        book,
    }))
}

/// `POST /api/delete-book/{id}`
pub async fn delete_book(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Json<MessageResponse>> {
    let book = state.db.books().delete(id).await?;

    if let Some(image) = book.image_filename {
        state.images.remove(&image).await;
    }

    info!(id, "Book and cover removed");
    Ok(Json(MessageResponse::new("Kitab berhasil dihapus.")))
}

/// `GET /api/books` - books that can be ordered, by name.
pub async fn list_available(State(state): State<SharedState>) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(state.db.books().list_available().await?))
}

/// `GET /api/books/all`
pub async fn list_all(State(state): State<SharedState>) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(state.db.books().list_all().await?))
}

/// `GET /api/book/{id}`
pub async fn get_book(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Json<Book>> {
    state
        .db
        .books()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Kitab tidak ditemukan"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::testing::{expect_status, TestApp};

    fn book_fields<'a>(name: &'a str, price: &'a str) -> Vec<(&'a str, &'a str)> {
        vec![("name", name), ("price", price), ("availability", "Tersedia")]
    }

    #[tokio::test]
    async fn test_add_book_with_image() {
        let app = TestApp::new().await;

        let response = app
            .post_multipart(
                "/api/add-book",
                &book_fields("Kitab A", "25000"),
                Some(("image", "sampul.png", b"png".to_vec())),
            )
            .await;
        let body = expect_status(response, StatusCode::OK).await;

        assert_eq!(body["message"], "Kitab baru berhasil ditambahkan!");
        assert_eq!(body["book"]["priceCents"], 2_500_000);
        let image = body["book"]["imageFilename"].as_str().unwrap().to_string();
        assert!(image.ends_with("_sampul.png"));
        assert!(app.state.images.read(&image).await.unwrap().is_some());

        let _ = std::fs::remove_dir_all(app.state.images.dir());
    }

    #[tokio::test]
    async fn test_duplicate_book_name_conflicts() {
        let app = TestApp::new().await;
        app.post_multipart("/api/add-book", &book_fields("Kitab A", "25000"), None)
            .await;

        let response = app
            .post_multipart("/api/add-book", &book_fields("Kitab A", "30000"), None)
            .await;
        let body = expect_status(response, StatusCode::CONFLICT).await;
        assert_eq!(body["code"], "DUPLICATE_NAME");

        let books = app.state.db.books().list_all().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].price_cents, 2_500_000);
    }

    #[tokio::test]
    async fn test_add_book_rejects_bad_price() {
        let app = TestApp::new().await;
        let response = app
            .post_multipart("/api/add-book", &book_fields("Kitab A", "murah"), None)
            .await;
        let body = expect_status(response, StatusCode::BAD_REQUEST).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_keeps_image_and_delete_removes_it() {
        let app = TestApp::new().await;
        let created = expect_status(
            app.post_multipart(
                "/api/add-book",
                &book_fields("Kitab A", "25000"),
                Some(("image", "a.jpg", b"jpg".to_vec())),
            )
            .await,
            StatusCode::OK,
        )
        .await;
        let id = created["book"]["id"].as_i64().unwrap().to_string();
        let image = created["book"]["imageFilename"].as_str().unwrap().to_string();

        let mut fields = book_fields("Kitab A Revisi", "27500");
        fields.push(("id", &id));
        let updated = expect_status(app.post_multipart("/api/update-book", &fields, None).await, StatusCode::OK).await;
        assert_eq!(updated["message"], "Data kitab berhasil diupdate!");
        assert_eq!(updated["book"]["imageFilename"], image.as_str());

        let response = app.post_empty(&format!("/api/delete-book/{}", id)).await;
        expect_status(response, StatusCode::OK).await;
        assert!(app.state.images.read(&image).await.unwrap().is_none());

        let response = app.get(&format!("/api/book/{}", id)).await;
        expect_status(response, StatusCode::NOT_FOUND).await;
    }

    #[tokio::test]
    async fn test_available_list_filters_unavailable() {
        let app = TestApp::new().await;
        app.post_multipart("/api/add-book", &book_fields("Kitab A", "10000"), None)
            .await;
        app.post_multipart(
            "/api/add-book",
            &[("name", "Kitab B"), ("price", "10000"), ("availability", "Tidak Tersedia")],
            None,
        )
        .await;

        let all = expect_status(app.get("/api/books/all").await, StatusCode::OK).await;
        let available = expect_status(app.get("/api/books").await, StatusCode::OK).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
        assert_eq!(available.as_array().unwrap().len(), 1);
        assert_eq!(available[0]["name"], "Kitab A");
    }
}
