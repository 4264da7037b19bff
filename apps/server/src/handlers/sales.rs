//! # Sales Handlers
//!
//! Offline (in-person) and online (shipped) sales: record, recap, edit.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Recording A Sale                                │
//! │                                                                         │
//! │  JSON ──► OfflineSaleRequest / OnlineSaleRequest                        │
//! │              │  validate(): ≥1 line, quantities > 0, ids, dates         │
//! │              ▼                                                          │
//! │           OfflineOrder / OnlineOrder                                    │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  repository.record() ── one transaction ──► one row per line            │
//! │     price snapshot per book, shipping split across rows                 │
//! │     any missing book ──► NOT_FOUND, nothing written                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use kitab_core::requests::{OfflineSaleRequest, OfflineSaleUpdateRequest, OnlineSaleRequest, OnlineSaleUpdateRequest};
use kitab_core::{DateRange, OfflineSale, OfflineSaleView, OfflineSalesFilter, OnlineSale, OnlineSaleView};
use serde::Serialize;
use tracing::debug;

use super::{MessageResponse, RecapQuery};
use crate::error::ApiResult;
use crate::SharedState;

/// Acknowledgement for a recorded order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecorded<T> {
    pub message: String,
    /// Rows written, one per order line
    pub rows: usize,
    pub sales: Vec<T>,
}

impl<T> SaleRecorded<T> {
    fn new(message: &str, sales: Vec<T>) -> Self {
        SaleRecorded {
            message: message.to_string(),
            rows: sales.len(),
            sales,
        }
    }
}

impl RecapQuery {
    pub(crate) fn offline_filter(&self) -> ApiResult<OfflineSalesFilter> {
        Ok(OfflineSalesFilter::from_query(
            self.payment_status.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )?)
    }

    pub(crate) fn date_range(&self) -> ApiResult<DateRange> {
        Ok(DateRange::from_query(self.start_date.as_deref(), self.end_date.as_deref())?)
    }
}

// =============================================================================
// Offline Sales
// =============================================================================

/// `POST /api/add-offline-sale {buyerId, items: [{bookId, quantity}], paymentStatus?}`
pub async fn add_offline_sale(
    State(state): State<SharedState>,
    payload: Result<Json<OfflineSaleRequest>, JsonRejection>,
) -> ApiResult<Json<SaleRecorded<OfflineSale>>> {
    let Json(request) = payload?;
    let order = request.validate()?;
    debug!(buyer_id = order.buyer_id, lines = order.lines.len(), "add_offline_sale");

    let sales = state.db.offline_sales().record(&order).await?;
    Ok(Json(SaleRecorded::new("Transaksi offline berhasil disimpan!", sales)))
}

/// `GET /api/recent-offline-sales?payment_status=&start_date=&end_date=`
pub async fn recent_offline_sales(
    State(state): State<SharedState>,
    Query(query): Query<RecapQuery>,
) -> ApiResult<Json<Vec<OfflineSaleView>>> {
    let filter = query.offline_filter()?;
    Ok(Json(state.db.offline_sales().list_recent(&filter).await?))
}

/// `GET /api/offline-sale/{id}`
pub async fn get_offline_sale(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Json<OfflineSale>> {
    Ok(Json(state.db.offline_sales().get(id).await?))
}

/// `POST /api/update-offline-sale {id, buyerId, bookId, quantity, paymentStatus}`
///
/// The total is recomputed from the book's current price.
pub async fn update_offline_sale(
    State(state): State<SharedState>,
    payload: Result<Json<OfflineSaleUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;
    let update = request.validate()?;
    debug!(id = update.id, "update_offline_sale");

    state.db.offline_sales().update(&update).await?;
    Ok(Json(MessageResponse::new("Transaksi offline berhasil diupdate!")))
}

/// `POST /api/delete-offline-sale/{id}`
pub async fn delete_offline_sale(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.offline_sales().delete(id).await?;
    Ok(Json(MessageResponse::new("Transaksi offline berhasil dihapus!")))
}

// =============================================================================
// Online Sales
// =============================================================================

/// `POST /api/add-online-sale`
///
/// Accepts `items` or the older single `bookId`/`quantity` form.
pub async fn add_online_sale(
    State(state): State<SharedState>,
    payload: Result<Json<OnlineSaleRequest>, JsonRejection>,
) -> ApiResult<Json<SaleRecorded<OnlineSale>>> {
    let Json(request) = payload?;
    let order = request.validate()?;
    debug!(buyer = %order.buyer_name, lines = order.lines.len(), "add_online_sale");

    let sales = state.db.online_sales().record(&order).await?;
    Ok(Json(SaleRecorded::new("Rekap online berhasil ditambahkan!", sales)))
}

/// `GET /api/recent-online-sales?start_date=&end_date=`
pub async fn recent_online_sales(
    State(state): State<SharedState>,
    Query(query): Query<RecapQuery>,
) -> ApiResult<Json<Vec<OnlineSaleView>>> {
    let range = query.date_range()?;
    Ok(Json(state.db.online_sales().list_recent(&range).await?))
}

/// `GET /api/online-sale/{id}`
pub async fn get_online_sale(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Json<OnlineSale>> {
    Ok(Json(state.db.online_sales().get(id).await?))
}

/// `POST /api/update-online-sale`
pub async fn update_online_sale(
    State(state): State<SharedState>,
    payload: Result<Json<OnlineSaleUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;
    let update = request.validate()?;
    debug!(id = update.id, "update_online_sale");

    state.db.online_sales().update(&update).await?;
    Ok(Json(MessageResponse::new("Transaksi online berhasil diupdate!")))
}

/// `POST /api/delete-online-sale/{id}`
pub async fn delete_online_sale(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.online_sales().delete(id).await?;
    Ok(Json(MessageResponse::new("Transaksi online berhasil dihapus!")))
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
    async fn test_offline_sale_totals_and_recap() {
        let app = TestApp::new().await;
        let buyer = seed_buyer(&app, "Ahmad").await;
        let book = seed_book(&app, "Kitab A", 25_000).await;

        let response = app
            .post_json(
                "/api/add-offline-sale",
                json!({"buyerId": buyer.to_string(), "items": [{"bookId": book, "quantity": "3"}]}),
            )
            .await;
        let body = expect_status(response, StatusCode::OK).await;
        assert_eq!(body["message"], "Transaksi offline berhasil disimpan!");
        assert_eq!(body["rows"], 1);

        let recap = expect_status(app.get("/api/recent-offline-sales").await, StatusCode::OK).await;
        assert_eq!(recap[0]["bookName"], "Kitab A");
        assert_eq!(recap[0]["buyerName"], "Ahmad");
        assert_eq!(recap[0]["totalPriceCents"], 7_500_000);
        assert_eq!(recap[0]["paymentStatus"], "Lunas");

        let unpaid = expect_status(
            app.get("/api/recent-offline-sales?payment_status=Belum%20Lunas&start_date=&end_date=")
                .await,
            StatusCode::OK,
        )
        .await;
        assert!(unpaid.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_sale_unknown_book_writes_nothing() {
        let app = TestApp::new().await;
        let buyer = seed_buyer(&app, "Ahmad").await;
        let book = seed_book(&app, "Kitab A", 25_000).await;

        let response = app
            .post_json(
                "/api/add-offline-sale",
                json!({"buyerId": buyer, "items": [{"bookId": book, "quantity": 1}, {"bookId": 999, "quantity": 1}]}),
            )
            .await;
        let body = expect_status(response, StatusCode::NOT_FOUND).await;
        assert_eq!(body["code"], "NOT_FOUND");

        let recap = expect_status(app.get("/api/recent-offline-sales").await, StatusCode::OK).await;
        assert!(recap.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_online_sale_splits_shipping() {
        let app = TestApp::new().await;
        let a = seed_book(&app, "Kitab A", 25_000).await;
        let b = seed_book(&app, "Kitab B", 25_000).await;

        let response = app
            .post_json(
                "/api/add-online-sale",
                json!({
                    "buyerName": "Siti",
                    "buyerAddress": "Jl. Melati 5, Kudus",
                    "transferDate": "2024-05-01",
                    "shippingCost": 20000,
                    "items": [{"bookId": a, "quantity": 1}, {"bookId": b, "quantity": 1}]
                }),
            )
            .await;
        let body = expect_status(response, StatusCode::OK).await;
        assert_eq!(body["rows"], 2);
        for sale in body["sales"].as_array().unwrap() {
            assert_eq!(sale["shippingCostCents"], 1_000_000);
            assert_eq!(sale["totalPriceCents"], 3_500_000);
        }

        let names = expect_status(app.get("/api/online-buyers").await, StatusCode::OK).await;
        assert_eq!(names, json!([{"name": "Siti"}]));

        let in_range = expect_status(
            app.get("/api/recent-online-sales?start_date=2024-05-01&end_date=2024-05-01").await,
            StatusCode::OK,
        )
        .await;
        assert_eq!(in_range.as_array().unwrap().len(), 2);
        let out_of_range =
            expect_status(app.get("/api/recent-online-sales?start_date=2024-05-02").await, StatusCode::OK).await;
        assert!(out_of_range.as_array().unwrap().is_empty());

        let id = body["sales"][0]["id"].as_i64().unwrap();
        let sale = expect_status(app.get(&format!("/api/online-sale/{}", id)).await, StatusCode::OK).await;
        let legacy = expect_status(app.get(&format!("/api/get-online-sale/{}", id)).await, StatusCode::OK).await;
        assert_eq!(legacy, sale);
        assert_eq!(sale["buyerName"], "Siti");
    }

    #[tokio::test]
    async fn test_online_sale_rejects_empty_items() {
        let app = TestApp::new().await;
        let response = app
            .post_json(
                "/api/add-online-sale",
                json!({"buyerName": "Siti", "buyerAddress": "Kudus", "transferDate": "2024-05-01", "items": []}),
            )
            .await;
        let body = expect_status(response, StatusCode::BAD_REQUEST).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_update_and_delete_offline_sale() {
        let app = TestApp::new().await;
        let buyer = seed_buyer(&app, "Ahmad").await;
        let book = seed_book(&app, "Kitab A", 25_000).await;
        let recorded = expect_status(
            app.post_json(
                "/api/add-offline-sale",
                json!({"buyerId": buyer, "items": [{"bookId": book, "quantity": 1}]}),
            )
            .await,
            StatusCode::OK,
        )
        .await;
        let id = recorded["sales"][0]["id"].as_i64().unwrap();

        let response = app
            .post_json(
                "/api/update-offline-sale",
                json!({"id": id, "buyerId": buyer, "bookId": book, "quantity": 4, "paymentStatus": "Belum Lunas"}),
            )
            .await;
        expect_status(response, StatusCode::OK).await;

        let sale = expect_status(app.get(&format!("/api/offline-sale/{}", id)).await, StatusCode::OK).await;
        assert_eq!(sale["quantity"], 4);
        assert_eq!(sale["totalPriceCents"], 10_000_000);
        assert_eq!(sale["paymentStatus"], "Belum Lunas");

        let legacy = expect_status(app.get(&format!("/api/get-offline-sale/{}", id)).await, StatusCode::OK).await;
        assert_eq!(legacy, sale);

        expect_status(app.post_empty(&format!("/api/delete-offline-sale/{}", id)).await, StatusCode::OK).await;
        expect_status(app.get(&format!("/api/get-offline-sale/{}", id)).await, StatusCode::NOT_FOUND).await;
        expect_status(app.post_empty(&format!("/api/delete-offline-sale/{}", id)).await, StatusCode::NOT_FOUND).await;
    }
}
