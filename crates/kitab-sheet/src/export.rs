//! # Recap Exports
//!
//! Writes the offline, online and cash recaps as single-sheet `.xlsx` files.
//! Callers pass rows already filtered by the list query, so an export always
//! matches what the admin sees on screen.
//!
//! ## Layout
//! ```text
//! ┌───────────────────┬──────────────┬─────┬─────────────┐
//! │ Tanggal Transaksi │ Nama Pembeli │ ... │ Total Harga │  ◄── bold
//! ├───────────────────┼──────────────┼─────┼─────────────┤
//! │ 01-05-2024 09:30  │ Ahmad        │ ... │       75000 │  ◄── rupiah, numeric
//! └───────────────────┴──────────────┴─────┴─────────────┘
//! ```
//! The cash recap appends a blank row and a `RINGKASAN` block. Transaction
//! times come from `sale_date_formatted`, already in shop time.

use chrono::NaiveDateTime;
use kitab_core::dates::format_date;
use kitab_core::{CashRecord, CashSummary, Money, OfflineSaleView, OnlineSaleView};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::debug;

use crate::error::SheetResult;

/// MIME type for `.xlsx` downloads.
pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// (header, column width)
type Column = (&'static str, f64);

const OFFLINE_COLUMNS: &[Column] = &[
    ("Tanggal Transaksi", 18.0),
    ("Nama Pembeli", 25.0),
    ("Alamat", 30.0),
    ("Nama Kitab", 25.0),
    ("Jumlah", 10.0),
    ("Harga Satuan", 15.0),
    ("Total Harga", 15.0),
    ("Status Pembayaran", 18.0),
];

const ONLINE_COLUMNS: &[Column] = &[
    ("Tanggal Transaksi", 18.0),
    ("Tanggal Transfer", 18.0),
    ("Nama Pembeli", 25.0),
    ("Alamat Pengiriman", 35.0),
    ("Nama Kitab", 25.0),
    ("Jumlah", 10.0),
    ("Harga Kitab", 15.0),
    ("Ongkir", 15.0),
    ("Total Harga", 15.0),
];

const CASH_COLUMNS: &[Column] = &[
    ("Tanggal", 15.0),
    ("Jenis Transaksi", 20.0),
    ("Keterangan", 40.0),
    ("Kategori", 15.0),
    ("Jumlah", 15.0),
];

// =============================================================================
// Exports
// =============================================================================

/// Offline recap, sheet `Rekap Offline`.
pub fn export_offline_sales(sales: &[OfflineSaleView]) -> SheetResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = new_sheet(&mut workbook, "Rekap Offline", OFFLINE_COLUMNS)?;

    for (i, sale) in sales.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &sale.sale_date_formatted)?;
        sheet.write_string(row, 1, &sale.buyer_name)?;
        sheet.write_string(row, 2, &sale.address)?;
        sheet.write_string(row, 3, &sale.book_name)?;
        sheet.write_number(row, 4, sale.quantity as f64)?;
        write_money(sheet, row, 5, Money::from_cents(sale.unit_price_cents))?;
        write_money(sheet, row, 6, Money::from_cents(sale.total_price_cents))?;
        sheet.write_string(row, 7, sale.payment_status.as_str())?;
    }

    debug!(rows = sales.len(), "Offline recap written");
    Ok(workbook.save_to_buffer()?)
}

/// Online recap, sheet `Rekap Online`.
pub fn export_online_sales(sales: &[OnlineSaleView]) -> SheetResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = new_sheet(&mut workbook, "Rekap Online", ONLINE_COLUMNS)?;

    for (i, sale) in sales.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &sale.sale_date_formatted)?;
        sheet.write_string(row, 1, format_date(sale.transfer_date))?;
        sheet.write_string(row, 2, &sale.buyer_name)?;
        sheet.write_string(row, 3, &sale.buyer_address)?;
        sheet.write_string(row, 4, &sale.book_name)?;
        sheet.write_number(row, 5, sale.quantity as f64)?;
        write_money(sheet, row, 6, Money::from_cents(sale.unit_price_cents))?;
        write_money(sheet, row, 7, Money::from_cents(sale.shipping_cost_cents))?;
        write_money(sheet, row, 8, Money::from_cents(sale.total_price_cents))?;
    }

    debug!(rows = sales.len(), "Online recap written");
    Ok(workbook.save_to_buffer()?)
}

/// Cash recap, sheet `Rekap Kas`, followed by the `RINGKASAN` block.
///
/// `summary` must be computed from `records`; the list endpoint and this
/// export share [`CashSummary::from_records`].
pub fn export_cash_records(records: &[CashRecord], summary: &CashSummary) -> SheetResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = new_sheet(&mut workbook, "Rekap Kas", CASH_COLUMNS)?;

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, format_date(record.record_date))?;
        sheet.write_string(row, 1, record.record_type.label())?;
        sheet.write_string(row, 2, &record.description)?;
        sheet.write_string(row, 3, record.category.as_deref().unwrap_or_default())?;
        write_money(sheet, row, 4, record.amount())?;
    }

    // One blank row, then the summary
    let start = records.len() as u32 + 2;
    sheet.write_string_with_format(start, 0, "RINGKASAN", &bold)?;
    let totals = [
        ("Total Debit", summary.total_debit()),
        ("Total Kredit", summary.total_kredit()),
        ("Saldo Akhir", summary.total_kas()),
    ];
    for (offset, (label, amount)) in totals.into_iter().enumerate() {
        let row = start + 1 + offset as u32;
        sheet.write_string(row, 0, label)?;
        write_money(sheet, row, 4, amount)?;
    }

    debug!(rows = records.len(), "Cash recap written");
    Ok(workbook.save_to_buffer()?)
}

// =============================================================================
// File Names
// =============================================================================

/// `rekap_offline_YYYYMMDD.xlsx`
pub fn offline_export_filename(now: NaiveDateTime) -> String {
    format!("rekap_offline_{}.xlsx", now.format("%Y%m%d"))
}

/// `rekap_online_YYYYMMDD.xlsx`
pub fn online_export_filename(now: NaiveDateTime) -> String {
    format!("rekap_online_{}.xlsx", now.format("%Y%m%d"))
}

/// `rekap_kas_YYYYMMDD_HHMMSS.xlsx`
pub fn cash_export_filename(now: NaiveDateTime) -> String {
    format!("rekap_kas_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

// =============================================================================
// Helpers
// =============================================================================

fn new_sheet<'a>(workbook: &'a mut Workbook, name: &str, columns: &[Column]) -> SheetResult<&'a mut Worksheet> {
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;

    for (col, (header, width)) in columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *header, &bold)?;
        sheet.set_column_width(col, *width)?;
    }
    Ok(sheet)
}

/// Money cells hold rupiah so spreadsheet sums read naturally.
fn write_money(sheet: &mut Worksheet, row: u32, col: u16, amount: Money) -> SheetResult<()> {
    sheet.write_number(row, col, amount.as_rupiah_f64())?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
