//! # Domain Types
//!
//! Records stored by the back-office and the enums they carry.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌─────────────────┐                        │
//! │  │      Book       │◄───┬───│  OfflineSale    │───►┌────────────────┐  │
//! │  │  name (unique)  │    │   │  quantity       │    │ OfflineBuyer   │  │
//! │  │  price_cents    │    │   │  total_price    │    │ name (unique)  │  │
//! │  │  availability   │    │   │  payment_status │    │ address        │  │
//! │  └─────────────────┘    │   └─────────────────┘    └────────────────┘  │
//! │                         │                                               │
//! │                         │   ┌─────────────────┐                        │
//! │                         └───│   OnlineSale    │  buyer name/address    │
//! │                             │  shipping share │  copied per row        │
//! │                             │  transfer_date  │                        │
//! │                             └─────────────────┘                        │
//! │                                                                         │
//! │  ┌─────────────────┐   (independent journal, no foreign keys)          │
//! │  │   CashRecord    │                                                   │
//! │  │  debit | kredit │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Snapshots
//! Sale rows copy `unit_price_cents` from the book at write time. Changing a
//! book's price later never alters historical totals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

// =============================================================================
// Availability
// =============================================================================

/// Whether a book can currently be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum Availability {
    #[default]
    #[serde(rename = "Tersedia")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Tersedia"))]
    Available,

    #[serde(rename = "Tidak Tersedia")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Tidak Tersedia"))]
    Unavailable,
}

impl Availability {
    /// Stored and displayed label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "Tersedia",
            Availability::Unavailable => "Tidak Tersedia",
        }
    }

    /// Parses a label, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> ValidationResult<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("Tersedia") {
            Ok(Availability::Available)
        } else if value.eq_ignore_ascii_case("Tidak Tersedia") {
            Ok(Availability::Unavailable)
        } else {
            Err(ValidationError::NotAllowed {
                field: "availability".to_string(),
                allowed: vec!["Tersedia".to_string(), "Tidak Tersedia".to_string()],
            })
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Settlement state of an offline sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaymentStatus {
    /// Paid in full.
    #[default]
    #[serde(rename = "Lunas")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Lunas"))]
    Paid,

    /// Goods handed over, payment outstanding.
    #[serde(rename = "Belum Lunas")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Belum Lunas"))]
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Lunas",
            PaymentStatus::Unpaid => "Belum Lunas",
        }
    }

    /// Parses a label, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> ValidationResult<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("Lunas") {
            Ok(PaymentStatus::Paid)
        } else if value.eq_ignore_ascii_case("Belum Lunas") {
            Ok(PaymentStatus::Unpaid)
        } else {
            Err(ValidationError::NotAllowed {
                field: "paymentStatus".to_string(),
                allowed: vec!["Lunas".to_string(), "Belum Lunas".to_string()],
            })
        }
    }

    /// Parses an optional label; blank or absent means [`PaymentStatus::Paid`].
    pub fn parse_or_default(value: Option<&str>) -> ValidationResult<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(PaymentStatus::default()),
            Some(v) => PaymentStatus::parse(v),
        }
    }
}

// =============================================================================
// Cash Type
// =============================================================================

/// Direction of a cash ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CashType {
    /// Cash in (kas masuk).
    Debit,
    /// Cash out (kas keluar).
    Kredit,
}

impl CashType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashType::Debit => "debit",
            CashType::Kredit => "kredit",
        }
    }

    /// Label used in exported recaps.
    pub fn label(&self) -> &'static str {
        match self {
            CashType::Debit => "Debit (Kas Masuk)",
            CashType::Kredit => "Kredit (Kas Keluar)",
        }
    }

    pub fn parse(value: &str) -> ValidationResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debit" => Ok(CashType::Debit),
            "kredit" => Ok(CashType::Kredit),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: vec!["debit".to_string(), "kredit".to_string()],
            }),
        }
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,

    /// Unique display name
    pub name: String,

    /// Current selling price in cents
    pub price_cents: i64,

    pub availability: Availability,

    /// Instagram post link
    pub link_ig: Option<String>,

    /// WhatsApp order link
    pub link_wa: Option<String>,

    pub link_shopee: Option<String>,

    pub link_tiktok: Option<String>,

    /// File name inside the upload directory
    pub image_filename: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Current price as Money.
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }
}

/// Optional marketplace and social links attached to a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateLinks {
    pub link_ig: Option<String>,
    pub link_wa: Option<String>,
    pub link_shopee: Option<String>,
    pub link_tiktok: Option<String>,
}

/// Validated fields for creating or updating a book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub name: String,
    pub price: Money,
    pub availability: Availability,
    pub links: AffiliateLinks,
}

// =============================================================================
// Buyers
// =============================================================================

/// A known in-person customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OfflineBuyer {
    pub id: i64,

    /// Unique name
    pub name: String,

    /// Free-text address, empty when unknown
    pub address: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Offline Sales
// =============================================================================

/// One line of an in-person sale, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSale {
    pub id: i64,
    pub buyer_id: i64,
    pub book_id: i64,
    pub quantity: i64,

    /// Book price copied at write time
    pub unit_price_cents: i64,

    /// unit_price_cents × quantity
    pub total_price_cents: i64,

    pub payment_status: PaymentStatus,

    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
}

/// Offline sale joined with buyer and book names for recap screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSaleView {
    pub id: i64,
    pub buyer_id: i64,
    pub buyer_name: String,
    pub address: String,
    pub book_id: i64,
    pub book_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub payment_status: PaymentStatus,

    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,

    /// `dd-mm-YYYY HH:MM`
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub sale_date_formatted: String,
}

// =============================================================================
// Online Sales
// =============================================================================

/// One line of a shipped order, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OnlineSale {
    pub id: i64,
    pub buyer_name: String,
    pub buyer_address: String,
    pub book_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,

    /// This row's share of the order's shipping cost
    pub shipping_cost_cents: i64,

    /// unit_price_cents × quantity + shipping_cost_cents
    pub total_price_cents: i64,

    #[ts(as = "String")]
    pub transfer_date: NaiveDate,

    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
}

/// Online sale joined with the book name for recap screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OnlineSaleView {
    pub id: i64,
    pub buyer_name: String,
    pub buyer_address: String,
    pub book_id: i64,
    pub book_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub shipping_cost_cents: i64,
    pub total_price_cents: i64,

    #[ts(as = "String")]
    pub transfer_date: NaiveDate,

    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,

    /// `dd-mm-YYYY HH:MM`
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub sale_date_formatted: String,

    /// `dd-mm-YYYY`
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub transfer_date_formatted: String,
}

// =============================================================================
// Cash Ledger
// =============================================================================

/// One cash journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashRecord {
    pub id: i64,

    #[serde(rename = "type")]
    pub record_type: CashType,

    /// Always positive; direction comes from `record_type`
    pub amount_cents: i64,

    pub description: String,

    pub category: Option<String>,

    #[ts(as = "String")]
    pub record_date: NaiveDate,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl CashRecord {
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Admin Users
// =============================================================================

/// An admin console account.
///
/// ## Note
/// `password_hash` is an argon2 PHC string and is never serialized.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Filters
// =============================================================================

/// Filters accepted by the offline recap list and export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OfflineSalesFilter {
    /// `None` means every status (the UI sends `"all"`)
    pub payment_status: Option<PaymentStatus>,
    pub range: crate::dates::DateRange,
}

impl OfflineSalesFilter {
    /// Builds a filter from raw query-string values.
    ///
    /// Blank values and `payment_status = "all"` mean "no filter".
    pub fn from_query(
        payment_status: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ValidationResult<Self> {
        let payment_status = match payment_status.map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(PaymentStatus::parse(s)?),
        };
        Ok(OfflineSalesFilter {
            payment_status,
            range: crate::dates::DateRange::from_query(start_date, end_date)?,
        })
    }
}

/// Filters accepted by the cash ledger list and export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CashFilter {
    pub record_type: Option<CashType>,
    pub range: crate::dates::DateRange,
}

impl CashFilter {
    /// Builds a filter from raw query-string values.
    pub fn from_query(
        record_type: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ValidationResult<Self> {
        let record_type = match record_type.map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(CashType::parse(s)?),
        };
        Ok(CashFilter {
            record_type,
            range: crate::dates::DateRange::from_query(start_date, end_date)?,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
