//! # Buyer Handlers
//!
//! The offline buyer directory and the online buyer autocomplete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use kitab_core::requests::{BuyerUpdateRequest, DeleteAllBuyersRequest};
use kitab_core::OfflineBuyer;
use serde::Serialize;
use tracing::{debug, info};

use super::MessageResponse;
use crate::error::ApiResult;
use crate::SharedState;

/// Entry of the online buyer autocomplete list.
#[derive(Debug, Serialize)]
pub struct OnlineBuyerName {
    pub name: String,
}

/// Result of wiping the buyer directory.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyersDeleted {
    pub message: String,
    pub deleted_sales: u64,
    pub deleted_buyers: u64,
}

/// `GET /api/offline-buyers`
pub async fn list_buyers(State(state): State<SharedState>) -> ApiResult<Json<Vec<OfflineBuyer>>> {
    Ok(Json(state.db.buyers().list_all().await?))
}

/// `GET /api/online-buyers` - distinct names from past online sales.
pub async fn list_online_buyers(State(state): State<SharedState>) -> ApiResult<Json<Vec<OnlineBuyerName>>> {
    let names = state.db.buyers().list_online_buyer_names().await?;
    Ok(Json(names.into_iter().map(|name| OnlineBuyerName { name }).collect()))
}

/// `POST /api/update-buyer {id, name, address}`
pub async fn update_buyer(
    State(state): State<SharedState>,
    payload: Result<Json<BuyerUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;
    let (id, draft) = request.validate()?;
    debug!(id, name = %draft.name, "update_buyer");

    state.db.buyers().update(id, &draft).await?;
    Ok(Json(MessageResponse::new("Data pembeli berhasil diupdate!")))
}

/// `POST /api/delete-buyer/{id}`
///
/// Refused with `HAS_REFERENCES` while offline sales point at the buyer.
pub async fn delete_buyer(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Json<MessageResponse>> {
    state.db.buyers().delete(id).await?;
    Ok(Json(MessageResponse::new("Pembeli berhasil dihapus.")))
}

/// `POST /api/delete-all-buyers {confirm: "DELETE_ALL_BUYERS"}`
pub async fn delete_all_buyers(
    State(state): State<SharedState>,
    payload: Result<Json<DeleteAllBuyersRequest>, JsonRejection>,
) -> ApiResult<Json<BuyersDeleted>> {
    let Json(request) = payload?;
    let (deleted_sales, deleted_buyers) = state.db.buyers().delete_all(&request).await?;

    info!(deleted_sales, deleted_buyers, "Buyer directory wiped");
    Ok(Json(BuyersDeleted {
        message: "Semua data pembeli dan transaksi offline berhasil dihapus!".to_string(),
        deleted_sales,
        deleted_buyers,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::{expect_status, seed_book, seed_buyer, TestApp};

    #[tokio::test]
    async fn test_update_buyer_rename_conflict() {
        let app = TestApp::new().await;
        let ahmad = seed_buyer(&app, "Ahmad").await;
        seed_buyer(&app, "Budi").await;

        let response = app
            .post_json("/api/update-buyer", json!({"id": ahmad, "name": "Budi", "address": "Kudus"}))
            .await;
        let body = expect_status(response, StatusCode::CONFLICT).await;
        assert_eq!(body["code"], "DUPLICATE_NAME");

        let response = app
            .post_json("/api/update-buyer", json!({"id": ahmad.to_string(), "name": "Ahmad F", "address": "Kudus"}))
            .await;
        let body = expect_status(response, StatusCode::OK).await;
        assert_eq!(body["message"], "Data pembeli berhasil diupdate!");
    }

    #[tokio::test]
    async fn test_delete_buyer_blocked_by_sales() {
        let app = TestApp::new().await;
        let buyer = seed_buyer(&app, "Ahmad").await;
        let other = seed_buyer(&app, "Budi").await;
        let book = seed_book(&app, "Kitab A", 25_000).await;

        let response = app
            .post_json(
                "/api/add-offline-sale",
                json!({"buyerId": buyer, "items": [{"bookId": book, "quantity": 1}]}),
            )
            .await;
        expect_status(response, StatusCode::OK).await;

        let body = expect_status(
            app.post_empty(&format!("/api/delete-buyer/{}", buyer)).await,
            StatusCode::BAD_REQUEST,
        )
        .await;
        assert_eq!(body["code"], "HAS_REFERENCES");

        let body = expect_status(app.post_empty(&format!("/api/delete-buyer/{}", other)).await, StatusCode::OK).await;
        assert_eq!(body["message"], "Pembeli berhasil dihapus.");
    }

    #[tokio::test]
    async fn test_delete_all_requires_exact_token() {
        let app = TestApp::new().await;
        seed_buyer(&app, "Ahmad").await;

        let response = app
            .post_json("/api/delete-all-buyers", json!({"confirm": "delete_all_buyers"}))
            .await;
        expect_status(response, StatusCode::BAD_REQUEST).await;
        assert_eq!(app.state.db.buyers().list_all().await.unwrap().len(), 1);

        let response = app
            .post_json("/api/delete-all-buyers", json!({"confirm": "DELETE_ALL_BUYERS"}))
            .await;
        let body = expect_status(response, StatusCode::OK).await;
        assert_eq!(body["deletedBuyers"], 1);
        assert!(app.state.db.buyers().list_all().await.unwrap().is_empty());
    }
}
