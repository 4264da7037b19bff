//! # Money Module
//!
//! Provides the `Money` type for rupiah amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Shipping Rp 10.000 split over 3 books as floats:                       │
//! │    3333.3333… × 3 = 9999.999…       → which row owns the lost bit?      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer cents (sen, 1/100 rupiah)                        │
//! │    1_000_000 sen / 3 = 333_333 r 1                                      │
//! │    shares: 333_334 + 333_333 + 333_333 = 1_000_000  (exact)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kitab_core::money::Money;
//!
//! let price = Money::from_rupiah(25_000);
//! let total = price * 3;
//! assert_eq!(total.cents(), 7_500_000);
//! assert_eq!(total.to_string(), "Rp 75.000");
//!
//! // Text from forms and spreadsheet cells
//! assert_eq!(Money::parse_decimal("25000.5"), Some(Money::from_cents(2_500_050)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Minor units per rupiah.
const CENTS_PER_RUPIAH: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A rupiah amount in the smallest unit (cents, i.e. sen).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Book.price_cents ──► OfflineSale.unit_price_cents ──► total_price     │
/// │         │                                                               │
/// │         └──► OnlineSale.unit_price_cents ─┐                            │
/// │                                            ├──► total_price             │
/// │  order shipping ──► split_evenly(N) ──────┘                            │
/// │                                                                         │
/// │  CashRecord.amount_cents ──► CashSummary (debit − kredit)              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (sen).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole rupiah.
    ///
    /// ## Example
    /// ```rust
    /// use kitab_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupiah(15_000).cents(), 1_500_000);
    /// ```
    #[inline]
    pub const fn from_rupiah(rupiah: i64) -> Self {
        Money(rupiah * CENTS_PER_RUPIAH)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupiah portion (truncated toward zero).
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0 / CENTS_PER_RUPIAH
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % CENTS_PER_RUPIAH).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Book: Kitab A Rp 25.000
    /// Quantity: 3
    ///      │
    ///      ▼
    /// multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// total_price: Rp 75.000
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub fn checked_multiply(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts, returning `None` on overflow.
    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Totals any number of amounts, returning `None` on overflow.
    ///
    /// Use this rather than `+` for totals over stored or imported rows.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Splits the amount into `parts` shares that sum back to `self` exactly.
    ///
    /// Every share is `self / parts`; the leftover cents (`self % parts`)
    /// go one each to the leading shares, so shares differ by at most one
    /// cent. Returns `None` when `parts` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use kitab_core::money::Money;
    ///
    /// let shares = Money::from_cents(1000).split_evenly(3).unwrap();
    /// assert_eq!(shares, vec![
    ///     Money::from_cents(334),
    ///     Money::from_cents(333),
    ///     Money::from_cents(333),
    /// ]);
    /// ```
    pub fn split_evenly(&self, parts: usize) -> Option<Vec<Money>> {
        if parts == 0 {
            return None;
        }
        let divisor = i64::try_from(parts).ok()?;
        let base = self.0 / divisor;
        let remainder = self.0 % divisor;
        let step = remainder.signum();

        Some(
            (0..divisor)
                .map(|i| {
                    if i < remainder.abs() {
                        Money(base + step)
                    } else {
                        Money(base)
                    }
                })
                .collect(),
        )
    }

    /// Parses a decimal rupiah amount such as `"25000"`, `"25000.50"` or
    /// `"-1500"`.
    ///
    /// `.` is the decimal separator. Fractions beyond two digits are rounded
    /// half away from zero, so spreadsheet artefacts like
    /// `"25000.000000001"` land on the intended cent. Returns `None` for
    /// anything that is not a plain decimal number.
    pub fn parse_decimal(text: &str) -> Option<Money> {
        let text = text.trim();
        let (negative, digits) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut cents: i64 = 0;
        for b in whole.bytes() {
            cents = cents.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
        }
        cents = cents.checked_mul(CENTS_PER_RUPIAH)?;

        let mut fraction_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = fraction_digits.next().unwrap_or(0);
        let hundredths = fraction_digits.next().unwrap_or(0);
        let round_up = fraction_digits.next().map(|d| d >= 5).unwrap_or(false);

        cents = cents.checked_add(tenths * 10 + hundredths + i64::from(round_up))?;

        Some(Money(if negative { -cents } else { cents }))
    }

    /// Returns the amount in rupiah as a float.
    ///
    /// ## Note
    /// For spreadsheet cells and display only. Never feed this back into
    /// arithmetic.
    pub fn as_rupiah_f64(&self) -> f64 {
        self.0 as f64 / CENTS_PER_RUPIAH as f64
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Indonesian rupiah format: `Rp 25.000`, `Rp 1.250,50`, `-Rp 5.000`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = self.rupiah().unsigned_abs().to_string();

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}Rp {}", sign, grouped)?;
        if self.cents_part() != 0 {
            write!(f, ",{:02}", self.cents_part())?;
        }
        Ok(())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// Operators follow plain `i64` arithmetic. Totals over stored or imported
// rows go through `checked_add` / `checked_sub` / `checked_sum` instead.

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupiah() {
        let money = Money::from_rupiah(25_000);
        assert_eq!(money.cents(), 2_500_000);
        assert_eq!(money.rupiah(), 25_000);
        assert_eq!(money.cents_part(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rupiah(25_000).to_string(), "Rp 25.000");
        assert_eq!(Money::from_rupiah(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Money::from_cents(125_050).to_string(), "Rp 1.250,50");
        assert_eq!(Money::from_rupiah(-5_000).to_string(), "-Rp 5.000");
        assert_eq!(Money::from_rupiah(999).to_string(), "Rp 999");
        assert_eq!(Money::zero().to_string(), "Rp 0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupiah(1_000);
        let b = Money::from_rupiah(500);

        assert_eq!(a + b, Money::from_rupiah(1_500));
        assert_eq!(a - b, Money::from_rupiah(500));
        assert_eq!(a * 3, Money::from_rupiah(3_000));

        assert_eq!(Money::checked_sum(vec![a, b, b]), Some(Money::from_rupiah(2_000)));
        assert_eq!(Money::checked_sum(Vec::new()), Some(Money::zero()));
    }

    #[test]
    fn test_checked_sum_and_sub_overflow() {
        let big = Money::from_cents(i64::MAX - 10);
        assert!(Money::checked_sum(vec![big, Money::from_cents(11)]).is_none());
        assert_eq!(Money::checked_sum(vec![big, Money::from_cents(10)]), Some(Money::from_cents(i64::MAX)));
        assert!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)).is_none());
        assert_eq!(
            Money::from_rupiah(500).checked_sub(Money::from_rupiah(800)),
            Some(Money::from_rupiah(-300))
        );
    }

    #[test]
    fn test_checked_multiply_overflow() {
        assert!(Money::from_cents(i64::MAX).checked_multiply(2).is_none());
        assert_eq!(
            Money::from_rupiah(25_000).checked_multiply(3),
            Some(Money::from_rupiah(75_000))
        );
    }

    #[test]
    fn test_split_evenly_exact() {
        let shares = Money::from_rupiah(20_000).split_evenly(2).unwrap();
        assert_eq!(shares, vec![Money::from_rupiah(10_000); 2]);
    }

    #[test]
    fn test_split_evenly_distributes_remainder() {
        let total = Money::from_rupiah(10_000);
        let shares = total.split_evenly(3).unwrap();

        assert_eq!(shares.len(), 3);
        assert_eq!(Money::checked_sum(shares.iter().copied()), Some(total));

        let max = shares.iter().max().unwrap().cents();
        let min = shares.iter().min().unwrap().cents();
        assert!(max - min <= 1);
    }

    #[test]
    fn test_split_evenly_zero_parts() {
        assert!(Money::from_rupiah(100).split_evenly(0).is_none());
    }

    #[test]
    fn test_split_evenly_zero_amount() {
        let shares = Money::zero().split_evenly(4).unwrap();
        assert_eq!(shares, vec![Money::zero(); 4]);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("25000"), Some(Money::from_rupiah(25_000)));
        assert_eq!(Money::parse_decimal(" 25000.5 "), Some(Money::from_cents(2_500_050)));
        assert_eq!(Money::parse_decimal("0.07"), Some(Money::from_cents(7)));
        assert_eq!(Money::parse_decimal(".5"), Some(Money::from_cents(50)));
        assert_eq!(Money::parse_decimal("-1500"), Some(Money::from_rupiah(-1_500)));
        assert_eq!(Money::parse_decimal("+10"), Some(Money::from_rupiah(10)));
    }

    #[test]
    fn test_parse_decimal_rounds_long_fractions() {
        assert_eq!(
            Money::parse_decimal("25000.000000001"),
            Some(Money::from_rupiah(25_000))
        );
        assert_eq!(Money::parse_decimal("1.005"), Some(Money::from_cents(101)));
        assert_eq!(Money::parse_decimal("1.004"), Some(Money::from_cents(100)));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(Money::parse_decimal(""), None);
        assert_eq!(Money::parse_decimal("-"), None);
        assert_eq!(Money::parse_decimal("."), None);
        assert_eq!(Money::parse_decimal("abc"), None);
        assert_eq!(Money::parse_decimal("25.000.000"), None);
        assert_eq!(Money::parse_decimal("Rp 25.000"), None);
        assert_eq!(Money::parse_decimal("99999999999999999999"), None);
    }

    #[test]
    fn test_as_rupiah_f64() {
        assert_eq!(Money::from_cents(2_500_050).as_rupiah_f64(), 25_000.5);
    }
}
