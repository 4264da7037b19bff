//! # Request Contracts
//!
//! Typed shapes of what the admin console sends, and the validated commands
//! they become. Handlers deserialize a `*Request`, call `validate()` and pass
//! the resulting command to a repository; nothing downstream sees raw input.
//!
//! ## Contract → Command
//! ```text
//! ┌──────────────────────────┐  validate()  ┌──────────────────────────┐
//! │ OfflineSaleRequest       │ ───────────► │ OfflineOrder             │
//! │  buyerId: 3 | "3"        │              │  buyer_id: 3             │
//! │  items: [{bookId, qty}]  │              │  lines: [OrderLine]      │
//! │  paymentStatus?: String  │              │  payment_status: Paid    │
//! └──────────────────────────┘              └──────────────────────────┘
//! ```
//!
//! Numbers coming from HTML forms often arrive as strings, so numeric fields
//! accept either JSON numbers or numeric text via [`NumberInput`].

use chrono::NaiveDate;
use serde::Deserialize;

use crate::dates::parse_required_date;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{AffiliateLinks, Availability, BookDraft, CashType, PaymentStatus};
use crate::validation::{
    optional_text, parse_amount, parse_quantity, validate_name, validate_non_negative_amount,
    validate_positive_amount, validate_quantity, validate_text, ValidationResult,
};
use crate::{DELETE_ALL_BUYERS_CONFIRMATION, MAX_ORDER_LINES};

// =============================================================================
// Numeric Input
// =============================================================================

/// A number that may arrive as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumberInput {
    /// Interprets the value as a positive row id.
    pub fn to_id(&self, field: &str) -> ValidationResult<i64> {
        let id = match self {
            NumberInput::Integer(i) => *i,
            NumberInput::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i64,
            NumberInput::Float(_) => return Err(ValidationError::invalid(field, "must be a whole number")),
            NumberInput::Text(t) if t.trim().is_empty() => return Err(ValidationError::required(field)),
            NumberInput::Text(t) => t
                .trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::invalid(field, format!("'{}' is not an id", t.trim())))?,
        };
        if id < 1 {
            return Err(ValidationError::MustBePositive {
                field: field.to_string(),
            });
        }
        Ok(id)
    }

    /// Interprets the value as a line-item quantity.
    pub fn to_quantity(&self) -> ValidationResult<i64> {
        match self {
            NumberInput::Integer(i) => validate_quantity(*i),
            NumberInput::Float(f) if f.fract() == 0.0 && f.is_finite() => validate_quantity(*f as i64),
            NumberInput::Float(_) => Err(ValidationError::invalid("quantity", "must be a whole number")),
            NumberInput::Text(t) => parse_quantity(t),
        }
    }

    /// Interprets the value as a rupiah amount.
    pub fn to_money(&self, field: &str) -> ValidationResult<Money> {
        match self {
            NumberInput::Integer(i) => i
                .checked_mul(100)
                .map(Money::from_cents)
                .ok_or_else(|| ValidationError::invalid(field, "amount too large")),
            NumberInput::Float(f) if f.is_finite() => parse_amount(field, &f.to_string()),
            NumberInput::Float(_) => Err(ValidationError::invalid(field, "must be a finite number")),
            NumberInput::Text(t) => parse_amount(field, t),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Book fields as posted by the add/update form (multipart text fields).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookRequest {
    pub name: Option<String>,
    pub price: Option<String>,
    pub availability: Option<String>,
    pub link_ig: Option<String>,
    pub link_wa: Option<String>,
    pub link_shopee: Option<String>,
    pub link_tiktok: Option<String>,
}

impl BookRequest {
    /// Validates the form into a [`BookDraft`].
    ///
    /// ## Rules
    /// - `name` required
    /// - `price` required, numeric, > 0
    /// - `availability` defaults to `Tersedia`
    /// - blank links become `None`
    pub fn validate(&self) -> ValidationResult<BookDraft> {
        let name = validate_name("name", self.name.as_deref().unwrap_or_default())?;
        let price = parse_amount("price", self.price.as_deref().unwrap_or_default())?;
        let price = validate_positive_amount("price", price)?;

        let availability = match self.availability.as_deref().map(str::trim) {
            None | Some("") => Availability::default(),
            Some(value) => Availability::parse(value)?,
        };

        Ok(BookDraft {
            name,
            price,
            availability,
            links: AffiliateLinks {
                link_ig: optional_text("link_ig", self.link_ig.as_deref())?,
                link_wa: optional_text("link_wa", self.link_wa.as_deref())?,
                link_shopee: optional_text("link_shopee", self.link_shopee.as_deref())?,
                link_tiktok: optional_text("link_tiktok", self.link_tiktok.as_deref())?,
            },
        })
    }
}

// =============================================================================
// Buyers
// =============================================================================

/// Validated buyer fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerDraft {
    pub name: String,
    pub address: String,
}

/// `POST /api/update-buyer`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerUpdateRequest {
    pub id: NumberInput,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl BuyerUpdateRequest {
    pub fn validate(&self) -> ValidationResult<(i64, BuyerDraft)> {
        let id = self.id.to_id("id")?;
        let name = validate_name("name", self.name.as_deref().unwrap_or_default())?;
        let address = validate_text("address", self.address.as_deref().unwrap_or_default())?;
        Ok((id, BuyerDraft { name, address }))
    }
}

/// `POST /api/delete-all-buyers`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAllBuyersRequest {
    pub confirm: Option<String>,
}

impl DeleteAllBuyersRequest {
    /// The token must match exactly: no trimming, no case folding.
    pub fn verify(&self) -> CoreResult<()> {
        match self.confirm.as_deref() {
            Some(DELETE_ALL_BUYERS_CONFIRMATION) => Ok(()),
            _ => Err(CoreError::ConfirmationMismatch),
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

/// One validated line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub book_id: i64,
    pub quantity: i64,
}

/// `{bookId, quantity}` as sent by the order forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub book_id: NumberInput,
    pub quantity: NumberInput,
}

impl SaleLineRequest {
    pub fn validate(&self) -> ValidationResult<OrderLine> {
        Ok(OrderLine {
            book_id: self.book_id.to_id("bookId")?,
            quantity: self.quantity.to_quantity()?,
        })
    }
}

fn validate_lines(items: &[SaleLineRequest]) -> ValidationResult<Vec<OrderLine>> {
    if items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }
    if items.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }
    items.iter().map(SaleLineRequest::validate).collect()
}

/// `POST /api/add-offline-sale`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSaleRequest {
    pub buyer_id: NumberInput,
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
    pub payment_status: Option<String>,
}

/// A validated in-person order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineOrder {
    pub buyer_id: i64,
    pub lines: Vec<OrderLine>,
    pub payment_status: PaymentStatus,
}

impl OfflineSaleRequest {
    pub fn validate(&self) -> ValidationResult<OfflineOrder> {
        Ok(OfflineOrder {
            buyer_id: self.buyer_id.to_id("buyerId")?,
            lines: validate_lines(&self.items)?,
            payment_status: PaymentStatus::parse_or_default(self.payment_status.as_deref())?,
        })
    }
}

/// `POST /api/add-online-sale`
///
/// ## Legacy Shape
/// Older forms post a single book at the top level instead of `items`:
/// ```text
/// { buyerName, buyerAddress, transferDate, shippingCost, bookId, quantity }
/// ```
/// That is treated as a one-line order carrying the full shipping cost.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineSaleRequest {
    pub buyer_name: Option<String>,
    pub buyer_address: Option<String>,
    pub transfer_date: Option<String>,
    pub shipping_cost: Option<NumberInput>,
    pub items: Option<Vec<SaleLineRequest>>,
    pub book_id: Option<NumberInput>,
    pub quantity: Option<NumberInput>,
}

/// A validated shipped order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineOrder {
    pub buyer_name: String,
    pub buyer_address: String,
    pub transfer_date: NaiveDate,
    /// Aggregate shipping for the whole order
    pub shipping: Money,
    pub lines: Vec<OrderLine>,
}

fn shipping_or_zero(value: Option<&NumberInput>) -> ValidationResult<Money> {
    match value {
        None => Ok(Money::zero()),
        Some(NumberInput::Text(t)) if t.trim().is_empty() => Ok(Money::zero()),
        Some(v) => validate_non_negative_amount("shippingCost", v.to_money("shippingCost")?),
    }
}

impl OnlineSaleRequest {
    pub fn validate(&self) -> ValidationResult<OnlineOrder> {
        let buyer_name = validate_name("buyerName", self.buyer_name.as_deref().unwrap_or_default())?;
        let buyer_address =
            validate_text("buyerAddress", self.buyer_address.as_deref().unwrap_or_default())?;
        let transfer_date = parse_required_date("transferDate", self.transfer_date.as_deref())?;
        let shipping = shipping_or_zero(self.shipping_cost.as_ref())?;

        let lines = match (&self.items, &self.book_id) {
            (Some(items), _) => validate_lines(items)?,
            (None, Some(book_id)) => vec![OrderLine {
                book_id: book_id.to_id("bookId")?,
                quantity: match &self.quantity {
                    Some(q) => q.to_quantity()?,
                    None => 1,
                },
            }],
            (None, None) => {
                return Err(ValidationError::Empty {
                    field: "items".to_string(),
                })
            }
        };

        Ok(OnlineOrder {
            buyer_name,
            buyer_address,
            transfer_date,
            shipping,
            lines,
        })
    }
}

/// `POST /api/update-offline-sale`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSaleUpdateRequest {
    pub id: NumberInput,
    pub buyer_id: NumberInput,
    pub book_id: NumberInput,
    pub quantity: NumberInput,
    pub payment_status: Option<String>,
}

/// Replacement fields for one offline sale row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflineSaleUpdate {
    pub id: i64,
    pub buyer_id: i64,
    pub line: OrderLine,
    pub payment_status: PaymentStatus,
}

impl OfflineSaleUpdateRequest {
    pub fn validate(&self) -> ValidationResult<OfflineSaleUpdate> {
        Ok(OfflineSaleUpdate {
            id: self.id.to_id("id")?,
            buyer_id: self.buyer_id.to_id("buyerId")?,
            line: OrderLine {
                book_id: self.book_id.to_id("bookId")?,
                quantity: self.quantity.to_quantity()?,
            },
            payment_status: PaymentStatus::parse_or_default(self.payment_status.as_deref())?,
        })
    }
}

/// `POST /api/update-online-sale`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineSaleUpdateRequest {
    pub id: NumberInput,
    pub buyer_name: Option<String>,
    pub buyer_address: Option<String>,
    pub book_id: NumberInput,
    pub quantity: NumberInput,
    pub shipping_cost: Option<NumberInput>,
    pub transfer_date: Option<String>,
}

/// Replacement fields for one online sale row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineSaleUpdate {
    pub id: i64,
    pub buyer_name: String,
    pub buyer_address: String,
    pub line: OrderLine,
    /// This row's shipping cost, taken as given
    pub shipping: Money,
    pub transfer_date: NaiveDate,
}

impl OnlineSaleUpdateRequest {
    pub fn validate(&self) -> ValidationResult<OnlineSaleUpdate> {
        Ok(OnlineSaleUpdate {
            id: self.id.to_id("id")?,
            buyer_name: validate_name("buyerName", self.buyer_name.as_deref().unwrap_or_default())?,
            buyer_address: validate_text(
                "buyerAddress",
                self.buyer_address.as_deref().unwrap_or_default(),
            )?,
            line: OrderLine {
                book_id: self.book_id.to_id("bookId")?,
                quantity: self.quantity.to_quantity()?,
            },
            shipping: shipping_or_zero(self.shipping_cost.as_ref())?,
            transfer_date: parse_required_date("transferDate", self.transfer_date.as_deref())?,
        })
    }
}

// =============================================================================
// Cash Ledger
// =============================================================================

/// `POST /api/add-cash-record` and `POST /api/update-cash-record`
///
/// `id` is only read by the update endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashRecordRequest {
    pub id: Option<NumberInput>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub amount: Option<NumberInput>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub record_date: Option<String>,
}

/// Validated cash ledger fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashRecordDraft {
    pub record_type: CashType,
    pub amount: Money,
    pub description: String,
    pub category: Option<String>,
    pub record_date: NaiveDate,
}

impl CashRecordRequest {
    pub fn validate(&self) -> ValidationResult<CashRecordDraft> {
        let record_type = match self.record_type.as_deref() {
            Some(t) if !t.trim().is_empty() => CashType::parse(t)?,
            _ => return Err(ValidationError::required("type")),
        };
        let amount = self
            .amount
            .as_ref()
            .ok_or_else(|| ValidationError::required("amount"))?
            .to_money("amount")?;

        Ok(CashRecordDraft {
            record_type,
            amount: validate_positive_amount("amount", amount)?,
            description: validate_name("description", self.description.as_deref().unwrap_or_default())?,
            category: optional_text("category", self.category.as_deref())?,
            record_date: parse_required_date("recordDate", self.record_date.as_deref())?,
        })
    }

    /// Validates an update: `id` plus the same fields as an insert.
    pub fn validate_update(&self) -> ValidationResult<(i64, CashRecordDraft)> {
        let id = self
            .id
            .as_ref()
            .ok_or_else(|| ValidationError::required("id"))?
            .to_id("id")?;
        Ok((id, self.validate()?))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
