//! # Cash Ledger Handlers
//!
//! ```text
//! GET /api/cash-records?start_date=&end_date=&type=
//!      │
//!      ▼
//! { "records": [...], "summary": { "totalDebit", "totalKredit", "totalKas" } }
//!                        └── computed from exactly these records
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use kitab_core::requests::CashRecordRequest;
use kitab_core::{CashFilter, CashRecord, CashSummary};
use serde::Serialize;
use tracing::debug;

use super::{MessageResponse, RecapQuery};
use crate::error::ApiResult;
use crate::SharedState;

/// Ledger totals in rupiah, as the admin console displays them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub total_debit: f64,
    pub total_kredit: f64,
    pub total_kas: f64,
}

impl From<CashSummary> for SummaryDto {
    fn from(summary: CashSummary) -> Self {
        SummaryDto {
            total_debit: summary.total_debit().as_rupiah_f64(),
            total_kredit: summary.total_kredit().as_rupiah_f64(),
            total_kas: summary.total_kas().as_rupiah_f64(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub records: Vec<CashRecord>,
    pub summary: SummaryDto,
}

impl RecapQuery {
    pub(crate) fn cash_filter(&self) -> ApiResult<CashFilter> {
        Ok(CashFilter::from_query(
            self.record_type.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )?)
    }
}

/// `GET /api/cash-records`
pub async fn list_records(
    State(state): State<SharedState>,
    Query(query): Query<RecapQuery>,
) -> ApiResult<Json<LedgerResponse>> {
    let filter = query.cash_filter()?;
    let ledger = state.db.cash().list(&filter).await?;

    Ok(Json(LedgerResponse {
        records: ledger.records,
        summary: ledger.summary.into(),
    }))
}

/// `POST /api/cash-records`, `POST /api/add-cash-record`
pub async fn add_record(
    State(state): State<SharedState>,
    payload: Result<Json<CashRecordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;
    let draft = request.validate()?;
    debug!(kind = draft.record_type.as_str(), amount = %draft.amount, "add_cash_record");

    state.db.cash().add(&draft).await?;
    Ok(Json(MessageResponse::new("Catatan kas berhasil ditambahkan!")))
}

/// `GET /api/cash-record/{id}`
pub async fn get_record(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Json<CashRecord>> {
    Ok(Json(state.db.cash().get(id).await?))
}

/// `POST /api/update-cash-record`
pub async fn update_record(
    State(state): State<SharedState>,
    payload: Result<Json<CashRecordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload?;
    let (id, draft) = request.validate_update()?;

    state.db.cash().update(id, &draft).await?;
    Ok(Json(MessageResponse::new("Catatan kas berhasil diupdate!")))
}

/// `POST /api/delete-cash-record/{id}`
pub async fn delete_record(State(state): State<SharedState>, Path(id): Path<i64>) -> ApiResult<Json<MessageResponse>> {
    state.db.cash().delete(id).await?;
    Ok(Json(MessageResponse::new("Catatan kas berhasil dihapus!")))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::testing::{expect_status, TestApp};

    async fn add(app: &TestApp, kind: &str, amount: i64, date: &str) {
        let response = app
            .post_json(
                "/api/add-cash-record",
                json!({"type": kind, "amount": amount, "description": "Catatan", "recordDate": date}),
            )
            .await;
        expect_status(response, StatusCode::OK).await;
    }

    #[tokio::test]
    async fn test_summary_follows_filters() {
        let app = TestApp::new().await;
        add(&app, "debit", 100_000, "2024-05-01").await;
        add(&app, "kredit", 30_000, "2024-05-02").await;
        add(&app, "debit", 50_000, "2024-06-01").await;

        let all = expect_status(app.get("/api/cash-records").await, StatusCode::OK).await;
        assert_eq!(all["records"].as_array().unwrap().len(), 3);
        assert_eq!(all["summary"]["totalKas"], 120_000.0);

        let may = expect_status(
            app.get("/api/cash-records?start_date=2024-05-01&end_date=2024-05-31&type=").await,
            StatusCode::OK,
        )
        .await;
        assert_eq!(may["summary"]["totalDebit"], 100_000.0);
        assert_eq!(may["summary"]["totalKredit"], 30_000.0);
        assert_eq!(may["summary"]["totalKas"], 70_000.0);

        // Summary of a type filter covers only that type
        let debit = expect_status(app.get("/api/cash-records?type=debit").await, StatusCode::OK).await;
        let sum: i64 = debit["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r: &Value| r["amountCents"].as_i64().unwrap())
            .sum();
        assert_eq!(sum, 15_000_000);
        assert_eq!(debit["summary"]["totalKredit"], 0.0);
    }

    #[tokio::test]
    async fn test_rejects_bad_record() {
        let app = TestApp::new().await;
        let response = app
            .post_json(
                "/api/cash-records",
                json!({"type": "transfer", "amount": 1000, "description": "x", "recordDate": "2024-05-01"}),
            )
            .await;
        expect_status(response, StatusCode::BAD_REQUEST).await;

        let response = app
            .post_json(
                "/api/cash-records",
                json!({"type": "debit", "amount": 0, "description": "x", "recordDate": "2024-05-01"}),
            )
            .await;
        expect_status(response, StatusCode::BAD_REQUEST).await;
    }

    #[tokio::test]
    async fn test_update_get_delete() {
        let app = TestApp::new().await;
        add(&app, "debit", 100_000, "2024-05-01").await;
        let listed = expect_status(app.get("/api/cash-records").await, StatusCode::OK).await;
        let id = listed["records"][0]["id"].as_i64().unwrap();

        let response = app
            .post_json(
                "/api/update-cash-record",
                json!({"id": id, "type": "kredit", "amount": "2500", "description": "Ongkir", "category": "Operasional", "recordDate": "2024-05-03"}),
            )
            .await;
        expect_status(response, StatusCode::OK).await;

        let record = expect_status(app.get(&format!("/api/cash-record/{}", id)).await, StatusCode::OK).await;
        assert_eq!(record["type"], "kredit");
        assert_eq!(record["amountCents"], 250_000);
        assert_eq!(record["category"], "Operasional");

        expect_status(app.post_empty(&format!("/api/delete-cash-record/{}", id)).await, StatusCode::OK).await;
        expect_status(app.get(&format!("/api/cash-record/{}", id)).await, StatusCode::NOT_FOUND).await;
    }
}
