//! # Sheet Import Parsers
//!
//! One parser per import screen. Each resolves its columns up front (a
//! missing required column aborts before any row is read), then turns every
//! data row into a typed row, a silent skip, or a `Baris n: ...` warning.
//!
//! | Parser | Required | Optional (default) |
//! |--------|----------|--------------------|
//! | [`parse_books`] | Nama | Harga, Ketersediaan (Tersedia), Link Instagram/WhatsApp/Shopee/TikTok |
//! | [`parse_buyers`] | Nama | Alamat |
//! | [`parse_offline_sales`] | Nama Pembeli, Nama Kitab, Jumlah | Status Pembayaran (Lunas), Alamat |
//! | [`parse_online_sales`] | Nama Pembeli, Nama Kitab, Jumlah | Alamat Kirim, Ongkir (15000), Tanggal Transfer (today) |
//!
//! Name lookups (does the book exist?) happen later in the repository,
//! inside the import transaction.

use chrono::NaiveDate;
use kitab_core::import::{
    BookImportRow, BuyerImportRow, ImportBatch, OfflineSaleImportRow, OnlineSaleImportRow,
};
use kitab_core::validation::{
    optional_text, parse_amount, parse_quantity, validate_name, validate_non_negative_amount,
    validate_positive_amount, validate_text,
};
use kitab_core::{AffiliateLinks, Availability, Money, PaymentStatus, DEFAULT_IMPORT_SHIPPING};
use tracing::debug;

use crate::error::SheetResult;
use crate::reader::{SheetRowRef, SheetTable};

// Column headers
const COL_NAME: &str = "Nama";
const COL_PRICE: &str = "Harga";
const COL_AVAILABILITY: &str = "Ketersediaan";
const COL_LINK_IG: &str = "Link Instagram";
const COL_LINK_WA: &str = "Link WhatsApp";
const COL_LINK_SHOPEE: &str = "Link Shopee";
const COL_LINK_TIKTOK: &str = "Link TikTok";
const COL_ADDRESS: &str = "Alamat";
const COL_BUYER_NAME: &str = "Nama Pembeli";
const COL_BOOK_NAME: &str = "Nama Kitab";
const COL_QUANTITY: &str = "Jumlah";
const COL_PAYMENT_STATUS: &str = "Status Pembayaran";
const COL_SHIP_ADDRESS: &str = "Alamat Kirim";
const COL_SHIPPING: &str = "Ongkir";
const COL_TRANSFER_DATE: &str = "Tanggal Transfer";

// =============================================================================
// Catalog
// =============================================================================

/// Parses a catalog sheet.
///
/// ## Row Rules
/// - Blank `Nama` → skipped
/// - `Harga` missing, non-numeric or not positive → warning
/// - Blank `Ketersediaan` → `Tersedia`; unknown label → warning
/// - Blank links → `None`
pub fn parse_books(bytes: &[u8]) -> SheetResult<ImportBatch<BookImportRow>> {
    let table = SheetTable::from_bytes(bytes)?;
    let name_col = table.require_column(COL_NAME)?;
    let price_col = table.column(COL_PRICE);
    let availability_col = table.column(COL_AVAILABILITY);
    let link_cols = [
        table.column(COL_LINK_IG),
        table.column(COL_LINK_WA),
        table.column(COL_LINK_SHOPEE),
        table.column(COL_LINK_TIKTOK),
    ];

    let mut batch = ImportBatch::default();
    for row in table.rows() {
        let raw_name = row.text(name_col);
        if raw_name.is_empty() {
            batch.skip();
            continue;
        }

        let parsed = parse_book_row(&row, &raw_name, price_col, availability_col, &link_cols);
        match parsed {
            Ok(draft) => batch.push(row.line, draft),
            Err(message) => batch.warn(row.line, message),
        }
    }

    debug!(rows = batch.rows.len(), skipped = batch.skipped, "Parsed catalog sheet");
    Ok(batch)
}

fn parse_book_row(
    row: &SheetRowRef<'_>,
    raw_name: &str,
    price_col: Option<usize>,
    availability_col: Option<usize>,
    link_cols: &[Option<usize>; 4],
) -> Result<BookImportRow, String> {
    let name = validate_name("Nama", raw_name).map_err(|e| e.to_string())?;

    let price_text = row.text_opt(price_col);
    let price = parse_amount("Harga", &price_text)
        .and_then(|p| validate_positive_amount("Harga", p))
        .map_err(|_| invalid("Harga", &price_text))?;

    let availability_text = row.text_opt(availability_col);
    let availability = if availability_text.is_empty() {
        Availability::default()
    } else {
        Availability::parse(&availability_text).map_err(|_| invalid("Ketersediaan", &availability_text))?
    };

    let link = |i: usize| -> Result<Option<String>, String> {
        let text = row.text_opt(link_cols[i]);
        optional_text("link", Some(text.as_str())).map_err(|e| e.to_string())
    };

    Ok(BookImportRow {
        name,
        price,
        availability,
        links: AffiliateLinks {
            link_ig: link(0)?,
            link_wa: link(1)?,
            link_shopee: link(2)?,
            link_tiktok: link(3)?,
        },
    })
}

// =============================================================================
// Buyers
// =============================================================================

/// Parses a buyer sheet. Blank `Nama` rows are skipped.
pub fn parse_buyers(bytes: &[u8]) -> SheetResult<ImportBatch<BuyerImportRow>> {
    let table = SheetTable::from_bytes(bytes)?;
    let name_col = table.require_column(COL_NAME)?;
    let address_col = table.column(COL_ADDRESS);

    let mut batch = ImportBatch::default();
    for row in table.rows() {
        let raw_name = row.text(name_col);
        if raw_name.is_empty() {
            batch.skip();
            continue;
        }

        let parsed = validate_name("Nama", &raw_name)
            .and_then(|name| {
                let address = validate_text("Alamat", &row.text_opt(address_col))?;
                Ok(BuyerImportRow { name, address })
            })
            .map_err(|e| e.to_string());

        match parsed {
            Ok(buyer) => batch.push(row.line, buyer),
            Err(message) => batch.warn(row.line, message),
        }
    }

    debug!(rows = batch.rows.len(), skipped = batch.skipped, "Parsed buyer sheet");
    Ok(batch)
}

// =============================================================================
// Sales
// =============================================================================

/// Columns shared by both sale sheets.
struct SaleColumns {
    buyer: usize,
    book: usize,
    quantity: usize,
}

impl SaleColumns {
    fn resolve(table: &SheetTable) -> SheetResult<Self> {
        Ok(SaleColumns {
            buyer: table.require_column(COL_BUYER_NAME)?,
            book: table.require_column(COL_BOOK_NAME)?,
            quantity: table.require_column(COL_QUANTITY)?,
        })
    }

    /// `(buyer, book, quantity)`, or `Ok(None)` when the buyer name is blank.
    fn read(&self, row: &SheetRowRef<'_>) -> Result<Option<(String, String, i64)>, String> {
        let raw_buyer = row.text(self.buyer);
        if raw_buyer.is_empty() {
            return Ok(None);
        }
        let buyer = validate_name("Nama Pembeli", &raw_buyer).map_err(|e| e.to_string())?;
        let book = validate_name("Nama Kitab", &row.text(self.book)).map_err(|e| e.to_string())?;

        let quantity_text = row.text(self.quantity);
        let quantity = parse_quantity(&quantity_text).map_err(|_| invalid("Jumlah", &quantity_text))?;

        Ok(Some((buyer, book, quantity)))
    }
}

/// Parses an offline sales sheet.
///
/// Blank `Nama Pembeli` rows are skipped. `Alamat` is only used when the
/// buyer does not exist yet.
pub fn parse_offline_sales(bytes: &[u8]) -> SheetResult<ImportBatch<OfflineSaleImportRow>> {
    let table = SheetTable::from_bytes(bytes)?;
    let columns = SaleColumns::resolve(&table)?;
    let status_col = table.column(COL_PAYMENT_STATUS);
    let address_col = table.column(COL_ADDRESS);

    let mut batch = ImportBatch::default();
    for row in table.rows() {
        let parsed = columns.read(&row).and_then(|common| {
            let Some((buyer_name, book_name, quantity)) = common else {
                return Ok(None);
            };
            let status_text = row.text_opt(status_col);
            let payment_status = PaymentStatus::parse_or_default(Some(status_text.as_str()))
                .map_err(|_| invalid("Status Pembayaran", &status_text))?;
            let buyer_address = validate_text("Alamat", &row.text_opt(address_col)).map_err(|e| e.to_string())?;

            Ok(Some(OfflineSaleImportRow {
                buyer_name,
                buyer_address,
                book_name,
                quantity,
                payment_status,
            }))
        });

        match parsed {
            Ok(Some(sale)) => batch.push(row.line, sale),
            Ok(None) => batch.skip(),
            Err(message) => batch.warn(row.line, message),
        }
    }

    debug!(rows = batch.rows.len(), skipped = batch.skipped, "Parsed offline sales sheet");
    Ok(batch)
}

/// Parses an online sales sheet. Every row becomes a one-line order.
///
/// ## Defaults
/// - Blank `Ongkir` → 15000; negative or non-numeric → warning
/// - `Tanggal Transfer` missing or unparseable → `today`
pub fn parse_online_sales(bytes: &[u8], today: NaiveDate) -> SheetResult<ImportBatch<OnlineSaleImportRow>> {
    let table = SheetTable::from_bytes(bytes)?;
    let columns = SaleColumns::resolve(&table)?;
    let address_col = table.column(COL_SHIP_ADDRESS);
    let shipping_col = table.column(COL_SHIPPING);
    let date_col = table.column(COL_TRANSFER_DATE);

    let mut batch = ImportBatch::default();
    for row in table.rows() {
        let parsed = columns.read(&row).and_then(|common| {
            let Some((buyer_name, book_name, quantity)) = common else {
                return Ok(None);
            };
            let buyer_address =
                validate_text("Alamat Kirim", &row.text_opt(address_col)).map_err(|e| e.to_string())?;
            let shipping = parse_shipping(&row.text_opt(shipping_col))?;
            let transfer_date = row.date_opt(date_col).unwrap_or(today);

            Ok(Some(OnlineSaleImportRow {
                buyer_name,
                buyer_address,
                book_name,
                quantity,
                shipping,
                transfer_date,
            }))
        });

        match parsed {
            Ok(Some(sale)) => batch.push(row.line, sale),
            Ok(None) => batch.skip(),
            Err(message) => batch.warn(row.line, message),
        }
    }

    debug!(rows = batch.rows.len(), skipped = batch.skipped, "Parsed online sales sheet");
    Ok(batch)
}

fn parse_shipping(text: &str) -> Result<Money, String> {
    if text.is_empty() {
        return Ok(DEFAULT_IMPORT_SHIPPING);
    }
    parse_amount("Ongkir", text)
        .and_then(|s| validate_non_negative_amount("Ongkir", s))
        .map_err(|_| invalid("Ongkir", text))
}

fn invalid(column: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{} kosong", column)
    } else {
        format!("{} '{}' tidak valid", column, value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
