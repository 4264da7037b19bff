//! # Kitab Server
//!
//! HTTP API for the Kitab Store back-office and the public shop.
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kitab Server Routes                            │
//! │                                                                         │
//! │  Public                          Admin (require_admin)                  │
//! │  ──────                          ─────────────────────                  │
//! │  GET  /health                    /api/add-book, /api/update-book, ...   │
//! │  GET  /toko                      /api/offline-buyers, ...               │
//! │  GET  /toko/kitab/{id}           /api/add-offline-sale, ...             │
//! │  GET  /uploads/{filename}        /api/cash-records, ...                 │
//! │  POST /admin/login               /api/import-*, /api/export-*           │
//! │  POST /admin/logout                                                     │
//! │  GET  /api/cari-area                                                    │
//! │  POST /api/cek-ongkir                                                   │
//! │                                                                         │
//! │  Layers: CookieManager → TraceLayer → RequestBodyLimit                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ServerConfig`]. Every key can be set as `KITAB_<KEY>`:
//! - `KITAB_DATABASE_PATH` - SQLite file (default: ./data/kitab.db)
//! - `KITAB_UPLOAD_DIR` - cover images (default: ./uploads)
//! - `KITAB_SESSION_SECRET` - required in production
//! - `KITAB_BITESHIP_API_KEY` - shipping rate lookups

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod shipping;
pub mod uploads;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use kitab_db::Database;
use tower_cookies::CookieManagerLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};

use crate::auth::JwtManager;
use crate::shipping::BiteshipClient;
use crate::uploads::ImageStore;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub jwt: JwtManager,
    pub images: ImageStore,
    pub shipping: BiteshipClient,
}

/// State handle passed to every handler.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> SharedState {
        let jwt = JwtManager::new(config.session_secret.clone(), config.session_lifetime_secs);
        let images = ImageStore::new(config.upload_dir.clone());
        let shipping = BiteshipClient::new(&config);

        Arc::new(AppState {
            db,
            config,
            jwt,
            images,
            shipping,
        })
    }
}

// =============================================================================
// Router
// =============================================================================

/// Builds the full application router.
pub fn build_router(state: SharedState) -> Router {
    use handlers::{buyers, cash, catalog, exports, imports, sales, session, shipping, shop};

    let admin = Router::new()
        // Catalog
        .route("/api/add-book", post(catalog::add_book))
        .route("/api/update-book", post(catalog::update_book))
        .route("/api/delete-book/{id}", post(catalog::delete_book))
        .route("/api/books", get(catalog::list_available))
        .route("/api/books/all", get(catalog::list_all))
        .route("/api/book/{id}", get(catalog::get_book))
        // Imports
        .route("/api/import-books", post(imports::import_books))
        .route("/api/import-buyers", post(imports::import_buyers))
        .route("/api/import-offline-sales", post(imports::import_offline_sales))
        .route("/api/import-online-sales", post(imports::import_online_sales))
        // Buyers
        .route("/api/offline-buyers", get(buyers::list_buyers))
        .route("/api/online-buyers", get(buyers::list_online_buyers))
        .route("/api/update-buyer", post(buyers::update_buyer))
        .route("/api/delete-buyer/{id}", post(buyers::delete_buyer))
        .route("/api/delete-all-buyers", post(buyers::delete_all_buyers))
        // Sales
        .route("/api/add-offline-sale", post(sales::add_offline_sale))
        .route("/api/add-online-sale", post(sales::add_online_sale))
        .route("/api/recent-offline-sales", get(sales::recent_offline_sales))
        .route("/api/recent-online-sales", get(sales::recent_online_sales))
        .route("/api/offline-sale/{id}", get(sales::get_offline_sale))
        .route("/api/online-sale/{id}", get(sales::get_online_sale))
        .route("/api/get-offline-sale/{id}", get(sales::get_offline_sale))
        .route("/api/get-online-sale/{id}", get(sales::get_online_sale))
        .route("/api/update-offline-sale", post(sales::update_offline_sale))
        .route("/api/update-online-sale", post(sales::update_online_sale))
        .route("/api/delete-offline-sale/{id}", post(sales::delete_offline_sale))
        .route("/api/delete-online-sale/{id}", post(sales::delete_online_sale))
        // Exports
        .route("/api/export-offline-sales", get(exports::export_offline_sales))
        .route("/api/export-online-sales", get(exports::export_online_sales))
        .route("/api/export-cash-records", get(exports::export_cash_records))
        // Cash ledger
        .route("/api/cash-records", get(cash::list_records).post(cash::add_record))
        .route("/api/add-cash-record", post(cash::add_record))
        .route("/api/update-cash-record", post(cash::update_record))
        .route("/api/delete-cash-record/{id}", post(cash::delete_record))
        .route("/api/cash-record/{id}", get(cash::get_record))
        .route_layer(from_fn_with_state(state.clone(), auth::require_admin));

    let public = Router::new()
        .route("/health", get(shop::health))
        .route("/toko", get(shop::list_books))
        .route("/toko/kitab/{id}", get(shop::book_detail))
        .route("/uploads/{filename}", get(shop::uploaded_file))
        .route("/admin/login", post(session::login))
        .route("/admin/logout", post(session::logout))
        .route("/api/cari-area", get(shipping::search_areas))
        .route("/api/cek-ongkir", post(shipping::courier_rates));

    let body_limit = state.config.max_upload_bytes;

    public
        .merge(admin)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use kitab_db::DbConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    pub const BOUNDARY: &str = "----kitab-test-boundary";

    /// Router over an in-memory database with one admin account.
    pub struct TestApp {
        pub router: Router,
        pub state: SharedState,
        pub token: String,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let db = Database::new(DbConfig::in_memory()).await.unwrap();
            let user = db.users().upsert("admin", "rahasia").await.unwrap();

            let config = ServerConfig {
                environment: "testing".to_string(),
                upload_dir: std::env::temp_dir().join(format!("kitab-uploads-{}", uuid::Uuid::new_v4())),
                ..ServerConfig::default()
            };
            let state = AppState::new(db, config);
            let token = state.jwt.issue(&user).unwrap();

            TestApp {
                router: build_router(state.clone()),
                state,
                token,
            }
        }

        pub async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        fn authed(&self, method: &str, uri: &str) -> axum::http::request::Builder {
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
        }

        pub async fn get(&self, uri: &str) -> Response {
            self.send(self.authed("GET", uri).body(Body::empty()).unwrap()).await
        }

        pub async fn post_json(&self, uri: &str, body: Value) -> Response {
            let request = self
                .authed("POST", uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(request).await
        }

        pub async fn post_empty(&self, uri: &str) -> Response {
            self.send(self.authed("POST", uri).body(Body::empty()).unwrap()).await
        }

        /// Multipart POST with text fields and at most one file part.
        pub async fn post_multipart(
            &self,
            uri: &str,
            fields: &[(&str, &str)],
            file: Option<(&str, &str, Vec<u8>)>,
        ) -> Response {
            let request = self
                .authed("POST", uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(fields, file)))
                .unwrap();
            self.send(request).await
        }
    }

    pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, Vec<u8>)>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((field, filename, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    pub async fn body_bytes(response: Response) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    pub async fn json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    /// Inserts a book priced in whole rupiah and returns its id.
    pub async fn seed_book(app: &TestApp, name: &str, rupiah: i64) -> i64 {
        let draft = kitab_core::BookDraft {
            name: name.to_string(),
            price: kitab_core::Money::from_rupiah(rupiah),
            availability: kitab_core::Availability::Available,
            links: kitab_core::AffiliateLinks::default(),
        };
        app.state.db.books().create(&draft, None).await.unwrap().id
    }

    pub async fn seed_buyer(app: &TestApp, name: &str) -> i64 {
        let draft = kitab_core::requests::BuyerDraft {
            name: name.to_string(),
            address: "Jepara".to_string(),
        };
        app.state.db.buyers().create(&draft).await.unwrap().id
    }

    pub async fn expect_status(response: Response, status: StatusCode) -> Value {
        assert_eq!(response.status(), status);
        json(response).await
    }
}
