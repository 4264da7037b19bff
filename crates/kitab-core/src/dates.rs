//! # Dates
//!
//! Inclusive date filters, transfer-date parsing and the display formats
//! used by recap screens and exported sheets.
//!
//! ## Transfer Date Resolution
//! ```text
//! spreadsheet cell / JSON text
//!      │
//!      ▼
//! try TRANSFER_DATE_FORMATS in order ──► first match wins
//!      │
//!      ├── none matched (import)  ──► today
//!      └── none matched (API)     ──► ValidationError
//! ```
//!
//! ## Shop Time
//! Sale timestamps are stored as UTC instants. Everything a person reads or
//! filters on (recap dates, `start_date`/`end_date`, export file names, the
//! import fallback date) goes through one [`ShopClock`] so a sale made at
//! 01:30 WIB belongs to that day, not the previous one.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Date-only formats tried, in order, for transfer and record dates.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Date-time formats tried after [`DATE_FORMATS`]; only the date part is kept.
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

/// `dd-mm-YYYY`
pub const DISPLAY_DATE: &str = "%d-%m-%Y";

/// `dd-mm-YYYY HH:MM`
pub const DISPLAY_TIMESTAMP: &str = "%d-%m-%Y %H:%M";

// =============================================================================
// Parsing
// =============================================================================

/// Tries every known format, returning the first successful parse.
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a required date field.
pub fn parse_required_date(field: &str, text: Option<&str>) -> ValidationResult<NaiveDate> {
    let text = text.map(str::trim).filter(|t| !t.is_empty());
    let text = text.ok_or_else(|| ValidationError::required(field))?;
    parse_flexible_date(text)
        .ok_or_else(|| ValidationError::invalid(field, format!("unrecognised date '{}'", text)))
}

/// Lenient parse used by spreadsheet imports: anything unparseable or
/// absent becomes `today`.
pub fn parse_transfer_date_or(text: Option<&str>, today: NaiveDate) -> NaiveDate {
    text.and_then(parse_flexible_date).unwrap_or(today)
}

// =============================================================================
// Formatting
// =============================================================================

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE).to_string()
}

// =============================================================================
// Shop Clock
// =============================================================================

/// Fixed UTC offset the shop keeps its calendar in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopClock {
    offset: FixedOffset,
}

impl ShopClock {
    pub fn utc() -> Self {
        ShopClock { offset: Utc.fix() }
    }

    /// The host's offset at the moment of the call.
    pub fn system() -> Self {
        ShopClock {
            offset: *Local::now().offset(),
        }
    }

    /// `420` is WIB (UTC+07:00).
    pub fn from_offset_minutes(minutes: i32) -> ValidationResult<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| ShopClock { offset })
            .ok_or_else(|| ValidationError::invalid("utc_offset_minutes", "must be between -1439 and 1439"))
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Wall-clock time in the shop for a stored instant.
    pub fn local(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        ts.with_timezone(&self.offset).naive_local()
    }

    /// Calendar date in the shop for a stored instant.
    pub fn date_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        self.local(ts).date()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.local(Utc::now())
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// `dd-mm-YYYY HH:MM` in shop time.
    pub fn format_timestamp(&self, ts: DateTime<Utc>) -> String {
        self.local(ts).format(DISPLAY_TIMESTAMP).to_string()
    }
}

impl Default for ShopClock {
    fn default() -> Self {
        ShopClock::system()
    }
}

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive `[start, end]` filter; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// Builds a range from `start_date` / `end_date` query values.
    ///
    /// Blank strings are treated as absent. Bounds must be `YYYY-MM-DD`
    /// (what `<input type="date">` sends) or another known format.
    pub fn from_query(start: Option<&str>, end: Option<&str>) -> ValidationResult<Self> {
        let parse = |field: &str, value: Option<&str>| -> ValidationResult<Option<NaiveDate>> {
            match value.map(str::trim) {
                None | Some("") => Ok(None),
                Some(v) => parse_flexible_date(v)
                    .map(Some)
                    .ok_or_else(|| ValidationError::invalid(field, format!("unrecognised date '{}'", v))),
            }
        };

        let range = DateRange {
            start: parse("start_date", start)?,
            end: parse("end_date", end)?,
        };

        if let (Some(start), Some(end)) = (range.start, range.end) {
            if start > end {
                return Err(ValidationError::invalid(
                    "end_date",
                    "must not be earlier than start_date",
                ));
            }
        }

        Ok(range)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
