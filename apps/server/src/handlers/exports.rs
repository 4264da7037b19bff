//! # Recap Export Handlers
//!
//! Each export takes the same query filters as its list endpoint and returns
//! an `.xlsx` attachment.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use kitab_sheet::{
    cash_export_filename, offline_export_filename, online_export_filename, XLSX_CONTENT_TYPE,
};
use tracing::info;

use super::RecapQuery;
use crate::error::ApiResult;
use crate::SharedState;

fn attachment(filename: String, bytes: Vec<u8>) -> Response {
    info!(%filename, bytes = bytes.len(), "Sending export");
    (
        [
            (CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        bytes,
    )
        .into_response()
}

/// `GET /api/export-offline-sales`
pub async fn export_offline_sales(
    State(state): State<SharedState>,
    Query(query): Query<RecapQuery>,
) -> ApiResult<Response> {
    let filter = query.offline_filter()?;
    let sales = state.db.offline_sales().list_recent(&filter).await?;
    let bytes = kitab_sheet::export_offline_sales(&sales)?;
    Ok(attachment(offline_export_filename(state.db.clock().now()), bytes))
}

/// `GET /api/export-online-sales`
pub async fn export_online_sales(
    State(state): State<SharedState>,
    Query(query): Query<RecapQuery>,
) -> ApiResult<Response> {
    let range = query.date_range()?;
    let sales = state.db.online_sales().list_recent(&range).await?;
    let bytes = kitab_sheet::export_online_sales(&sales)?;
    Ok(attachment(online_export_filename(state.db.clock().now()), bytes))
}

/// `GET /api/export-cash-records` - records plus the `RINGKASAN` block.
pub async fn export_cash_records(
    State(state): State<SharedState>,
    Query(query): Query<RecapQuery>,
) -> ApiResult<Response> {
    let filter = query.cash_filter()?;
    let ledger = state.db.cash().list(&filter).await?;
    let bytes = kitab_sheet::export_cash_records(&ledger.records, &ledger.summary)?;
    Ok(attachment(cash_export_filename(state.db.clock().now()), bytes))
}

// =============================================================================
// Unit Tests
// =============================================================================
