//! # HTTP Handlers
//!
//! One module per admin screen, plus the public shop and session routes.
//!
//! ## Module Organization
//! ```text
//! handlers/
//! ├── catalog.rs   ─► add/update/delete books, book lists
//! ├── buyers.rs    ─► offline buyer directory, online buyer names
//! ├── sales.rs     ─► offline and online sales: write, recap, edit
//! ├── cash.rs      ─► cash journal and its summary
//! ├── imports.rs   ─► xlsx uploads into books, buyers, sales
//! ├── exports.rs   ─► xlsx recap downloads
//! ├── session.rs   ─► admin login / logout
//! ├── shop.rs      ─► public catalog, cover images, health
//! └── shipping.rs  ─► Biteship area search and courier rates
//! ```
//!
//! Every handler returns [`ApiResult`](crate::error::ApiResult); domain and
//! storage errors convert with `?`.

pub mod buyers;
pub mod cash;
pub mod catalog;
pub mod exports;
pub mod imports;
pub mod sales;
pub mod session;
pub mod shipping;
pub mod shop;

use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult};

// =============================================================================
// Shared Response Shapes
// =============================================================================

/// `{ "message": "..." }` acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

/// Query-string filters shared by recap lists and exports.
///
/// Empty strings are treated as absent by the `from_query` constructors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecapQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub payment_status: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
}

// =============================================================================
// Multipart Forms
// =============================================================================

/// A file part from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A fully read multipart body: text fields and file parts by field name.
///
/// Browsers send an empty file part when no file was chosen; those are
/// dropped so "no file" always reads as `None`.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    /// Drains the multipart stream.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if !filename.trim().is_empty() && !bytes.is_empty() {
                        form.files.insert(
                            name,
                            UploadedFile {
                                filename,
                                bytes: bytes.to_vec(),
                            },
                        );
                    }
                }
                None => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    /// The `file` part of a spreadsheet upload.
    pub fn require_file(&mut self, name: &str) -> ApiResult<UploadedFile> {
        self.take_file(name)
            .ok_or_else(|| ApiError::validation("Tidak ada file yang dipilih"))
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    warn!(status = %err.status(), "Malformed multipart body: {}", err.body_text());
    ApiError::validation(err.body_text())
}
