//! # Shipping Calculator Handlers
//!
//! Public endpoints behind the shop's "cek ongkir" page. Both proxy Biteship
//! through [`BiteshipClient`](crate::shipping::BiteshipClient).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use kitab_core::requests::NumberInput;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct AreaQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    #[serde(alias = "destination_area_id")]
    pub destination_area_id: String,
    /// Parcel weight in grams
    pub weight: NumberInput,
}

/// `GET /api/cari-area?q=`
pub async fn search_areas(
    State(state): State<SharedState>,
    Query(query): Query<AreaQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    Ok(Json(state.shipping.search_areas(&query.q).await?))
}

/// `POST /api/cek-ongkir {destinationAreaId, weight}`
pub async fn courier_rates(
    State(state): State<SharedState>,
    payload: Result<Json<RateRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Value>>> {
    let Json(request) = payload?;

    let destination = request.destination_area_id.trim();
    if destination.is_empty() {
        return Err(ApiError::validation("destinationAreaId is required"));
    }
    let weight = request.weight.to_id("weight")?;

    Ok(Json(state.shipping.courier_rates(destination, weight).await?))
}

// =============================================================================
// Unit Tests
// =============================================================================
