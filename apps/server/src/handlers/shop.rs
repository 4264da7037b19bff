//! # Public Shop Handlers
//!
//! No session required: the storefront catalog, cover images and the health
//! check.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kitab_core::Book;
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::uploads::content_type_for;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// `GET /health`
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    if state.db.health_check().await {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: "ok",
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "degraded",
                database: "unavailable",
            }),
        )
    }
}

/// `GET /toko` - books on sale, by name.
pub async fn list_books(State(state): State<SharedState>) -> ApiResult<Json<Vec<Book>>> {
    Ok(Json(state.db.books().list_available().await?))
}

/// `GET /toko/kitab/{id}`
pub async fn book_detail(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Json<Book>> {
    state
        .db
        .books()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Kitab tidak ditemukan"))
}

/// `GET /uploads/{filename}`
///
/// A missing file answers 404 with `Location` set to the placeholder image,
/// so `<img>` tags that follow it still render something.
pub async fn uploaded_file(State(state): State<SharedState>, Path(filename): Path<String>) -> ApiResult<Response> {
    match state.images.read(&filename).await? {
        Some(bytes) => Ok((
            [
                (CONTENT_TYPE, content_type_for(&filename)),
                (CACHE_CONTROL, "public, max-age=86400"),
            ],
            bytes,
        )
            .into_response()),
        None => {
            debug!(%filename, "Image missing, pointing at placeholder");
            Ok((
                StatusCode::NOT_FOUND,
                [(LOCATION, state.config.placeholder_image_url.clone())],
            )
                .into_response())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, LOCATION};
    use axum::http::{Request, StatusCode};

    use crate::testing::{body_bytes, expect_status, seed_book, TestApp};

    fn public_get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new().await;
        let body = expect_status(app.send(public_get("/health")).await, StatusCode::OK).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn test_shop_lists_without_session() {
        let app = TestApp::new().await;
        let id = seed_book(&app, "Kitab A", 25_000).await;

        let list = expect_status(app.send(public_get("/toko")).await, StatusCode::OK).await;
        assert_eq!(list[0]["name"], "Kitab A");

        let detail = expect_status(app.send(public_get(&format!("/toko/kitab/{}", id))).await, StatusCode::OK).await;
        assert_eq!(detail["id"], id);

        expect_status(app.send(public_get("/toko/kitab/999")).await, StatusCode::NOT_FOUND).await;
    }

    #[tokio::test]
    async fn test_uploads_serves_and_falls_back() {
        let app = TestApp::new().await;
        let stored = app.state.images.save("cover.webp", b"webp-bytes").await.unwrap();

        let response = app.send(public_get(&format!("/uploads/{}", stored))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/webp");
        assert_eq!(body_bytes(response).await, b"webp-bytes");

        let response = app.send(public_get("/uploads/missing.png")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers()[LOCATION].to_str().unwrap().starts_with("https://placehold.co/"));

        let response = app.send(public_get("/uploads/..%2Fkitab.db")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let _ = std::fs::remove_dir_all(app.state.images.dir());
    }
}
