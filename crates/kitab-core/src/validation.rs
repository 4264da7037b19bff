//! # Validation Module
//!
//! Field-level rules shared by request contracts and spreadsheet imports.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: axum extractors                                              │
//! │  └── JSON / multipart shape (serde)                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: kitab-core                                                   │
//! │  ├── requests::*::validate()  (contract → command)                    │
//! │  └── THIS MODULE: names, quantities, amounts, file names               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── UNIQUE(name) on books / offline_buyers                            │
//! │  ├── CHECK(quantity > 0), CHECK(amount_cents > 0)                      │
//! │  └── FOREIGN KEY sales → books / offline_buyers                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Image extensions accepted for book covers.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Spreadsheet extensions accepted by the import endpoints.
pub const ALLOWED_SHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];

const MAX_NAME_LEN: usize = 200;
const MAX_TEXT_LEN: usize = 1000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates and trims a required name (book, buyer, username).
///
/// ## Example
/// ```rust
/// use kitab_core::validation::validate_name;
///
/// assert_eq!(validate_name("name", "  Kitab A ").unwrap(), "Kitab A");
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Trims free text (address, description, links), bounding its length.
pub fn validate_text(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }
    Ok(value.to_string())
}

/// Trims optional free text, mapping blank to `None`.
pub fn optional_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) => {
            let v = validate_text(field, v)?;
            Ok(if v.is_empty() { None } else { Some(v) })
        }
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> ValidationResult<i64> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(quantity)
}

/// Parses quantity text such as `"3"` or `"3.0"` into a whole number.
pub fn parse_quantity(text: &str) -> ValidationResult<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::required("quantity"));
    }

    let whole = match text.split_once('.') {
        Some((whole, fraction)) if fraction.bytes().all(|b| b == b'0') => whole,
        Some(_) => {
            return Err(ValidationError::invalid("quantity", "must be a whole number"));
        }
        None => text,
    };

    let quantity = whole
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid("quantity", format!("'{}' is not a number", text)))?;
    validate_quantity(quantity)
}

/// Validates a strictly positive amount (prices, cash entries).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<Money> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

/// Validates an amount that may be zero but not negative (shipping).
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<Money> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(amount)
}

/// Parses decimal rupiah text into Money.
pub fn parse_amount(field: &str, text: &str) -> ValidationResult<Money> {
    if text.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Money::parse_decimal(text)
        .ok_or_else(|| ValidationError::invalid(field, format!("'{}' is not a number", text.trim())))
}

// =============================================================================
// File Names
// =============================================================================

/// Lower-cased extension of a file name, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Checks a file name against an extension allow-list.
pub fn validate_extension(field: &str, filename: &str, allowed: &[&str]) -> ValidationResult<String> {
    match file_extension(filename) {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(ext),
        _ => Err(ValidationError::NotAllowed {
            field: field.to_string(),
            allowed: allowed.iter().map(|e| format!(".{}", e)).collect(),
        }),
    }
}

/// Reduces an uploaded file name to a safe ASCII name.
///
/// Keeps the last path component, replaces whitespace with `_`, drops every
/// character outside `[A-Za-z0-9._-]` and strips leading dots. Returns an
/// empty string when nothing usable remains.
///
/// ## Example
/// ```rust
/// use kitab_core::validation::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
/// assert_eq!(sanitize_filename("Sampul Kitab (1).png"), "Sampul_Kitab_1.png");
/// ```
pub fn sanitize_filename(filename: &str) -> String {
    let last = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("name", " Budi ").unwrap(), "Budi");
        assert!(matches!(
            validate_name("name", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_name("name", &"a".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("category", Some("  ")).unwrap(), None);
        assert_eq!(
            optional_text("category", Some(" Operasional ")).unwrap(),
            Some("Operasional".to_string())
        );
        assert_eq!(optional_text("category", None).unwrap(), None);
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3").unwrap(), 3);
        assert_eq!(parse_quantity(" 3.0 ").unwrap(), 3);
        assert!(parse_quantity("2.5").is_err());
        assert!(parse_quantity("tiga").is_err());
        assert!(parse_quantity("0").is_err());
        assert!(matches!(parse_quantity(""), Err(ValidationError::Required { .. })));
    }

    #[test]
    fn test_amount_validators() {
        assert!(validate_positive_amount("price", Money::from_rupiah(1)).is_ok());
        assert!(validate_positive_amount("price", Money::zero()).is_err());
        assert!(validate_non_negative_amount("shippingCost", Money::zero()).is_ok());
        assert!(validate_non_negative_amount("shippingCost", Money::from_cents(-1)).is_err());
        assert_eq!(
            parse_amount("price", "25000").unwrap(),
            Money::from_rupiah(25_000)
        );
        assert!(matches!(
            parse_amount("price", "murah"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_extensions() {
        assert_eq!(file_extension("cover.PNG"), Some("png".to_string()));
        assert_eq!(file_extension(".bashrc"), None);
        assert_eq!(file_extension("noext"), None);
        assert!(validate_extension("image", "a.webp", ALLOWED_IMAGE_EXTENSIONS).is_ok());
        assert!(validate_extension("image", "a.exe", ALLOWED_IMAGE_EXTENSIONS).is_err());
        assert!(validate_extension("file", "rekap.xls", ALLOWED_SHEET_EXTENSIONS).is_ok());
        assert!(validate_extension("file", "rekap.csv", ALLOWED_SHEET_EXTENSIONS).is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("C:\\Users\\admin\\cover.jpg"), "cover.jpg");
        assert_eq!(sanitize_filename("..hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename("كتاب.png"), "png");
        assert_eq!(sanitize_filename("///"), "");
    }
}
