//! # Biteship Client
//!
//! Thin proxy for area search and courier rates. One request per call,
//! 15 second timeout, no retry.
//!
//! ## Outcomes
//! ```text
//! transport error / timeout / non-JSON   ──► UPSTREAM_ERROR (500)
//! upstream answered { success: false }   ──► UPSTREAM_ERROR (400, upstream message)
//! upstream answered { success: true }    ──► areas / pricing passed through
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shown when the rate endpoint fails without saying why.
const DEFAULT_RATE_ERROR: &str = "Gagal mengambil data ongkir. Periksa kembali input Anda.";

/// Biteship REST client.
#[derive(Debug, Clone)]
pub struct BiteshipClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    origin_area_id: String,
    couriers: String,
}

#[derive(Debug, Deserialize)]
struct AreasResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    areas: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    pricing: Vec<Value>,
    error: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct RateItem {
    name: &'static str,
    description: &'static str,
    value: i64,
    weight: i64,
    height: i64,
    width: i64,
    length: i64,
}

#[derive(Debug, Serialize, PartialEq)]
struct RateRequest<'a> {
    origin_area_id: &'a str,
    destination_area_id: &'a str,
    couriers: &'a str,
    items: Vec<RateItem>,
}

impl BiteshipClient {
    pub fn new(config: &ServerConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        BiteshipClient {
            http,
            base_url: config.biteship_base_url.trim_end_matches('/').to_string(),
            api_key: config.biteship_api_key.clone().filter(|k| !k.trim().is_empty()),
            origin_area_id: config.biteship_origin_area_id.clone(),
            couriers: config.biteship_couriers.clone(),
        }
    }

    fn api_key(&self) -> ApiResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ApiError::upstream_unreachable("Shipping service is not configured"))
    }

    /// Searches Indonesian areas by free text. Blank input returns nothing.
    pub async fn search_areas(&self, query: &str) -> ApiResult<Vec<Value>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let api_key = self.api_key()?;
        debug!(%query, "Searching shipping areas");

        let response = self
            .http
            .get(format!("{}/v1/maps/areas", self.base_url))
            .bearer_auth(api_key)
            .query(&[("countries", "ID"), ("input", query), ("type", "single")])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(transport_error)?;

        let body: AreasResponse = response.json().await.map_err(transport_error)?;
        Ok(if body.success { body.areas } else { Vec::new() })
    }

    /// Courier rates from the shop's origin to `destination_area_id`.
    pub async fn courier_rates(&self, destination_area_id: &str, weight_grams: i64) -> ApiResult<Vec<Value>> {
        let api_key = self.api_key()?;
        let payload = self.rate_request(destination_area_id, weight_grams);
        debug!(destination = %destination_area_id, weight_grams, "Requesting courier rates");

        let response = self
            .http
            .post(format!("{}/v1/rates/couriers", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body: RatesResponse = response.json().await.map_err(transport_error)?;

        if status.is_success() && body.success {
            Ok(body.pricing)
        } else {
            let message = body.error.unwrap_or_else(|| DEFAULT_RATE_ERROR.to_string());
            warn!(%status, %message, "Courier rate request rejected");
            Err(ApiError::upstream_rejected(message))
        }
    }

    fn rate_request<'a>(&'a self, destination_area_id: &'a str, weight_grams: i64) -> RateRequest<'a> {
        RateRequest {
            origin_area_id: &self.origin_area_id,
            destination_area_id,
            couriers: &self.couriers,
            items: vec![RateItem {
                name: "Paket Kitab",
                description: "Pembelian dari Kitab Store",
                value: 50_000,
                weight: weight_grams,
                height: 5,
                width: 15,
                length: 20,
            }],
        }
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    warn!("Shipping service call failed: {}", err);
    ApiError::upstream_unreachable(err.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
