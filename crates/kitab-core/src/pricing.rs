//! # Pricing
//!
//! Turns validated order lines plus the current book prices into the rows
//! the sales ledger persists.
//!
//! ## Online Order Pricing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order: [Kitab A ×1, Kitab A ×1]   shipping: Rp 20.000                 │
//! │                                                                         │
//! │  allocate_shipping(20.000, 2) ──► [10.000, 10.000]                      │
//! │                                                                         │
//! │  row 1: 25.000 × 1 + 10.000 = 35.000                                    │
//! │  row 2: 25.000 × 1 + 10.000 = 35.000                                    │
//! │                                                                         │
//! │  Σ shipping shares == order shipping (to the cent, always)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shipping is split evenly by line count, not by value or quantity.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::requests::OrderLine;
use crate::validation::ValidationResult;

/// A fully priced line ready to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub book_id: i64,
    pub quantity: i64,
    /// Book price at the time of sale
    pub unit_price: Money,
    /// Allocated shipping share (zero for offline sales)
    pub shipping: Money,
    /// unit_price × quantity + shipping
    pub total: Money,
}

impl PricedLine {
    /// Prices one line.
    pub fn new(line: OrderLine, unit_price: Money, shipping: Money) -> CoreResult<Self> {
        let total = line_total(unit_price, line.quantity)?
            .checked_add(shipping)
            .ok_or(CoreError::AmountOverflow {
                context: "line total with shipping",
            })?;

        Ok(PricedLine {
            book_id: line.book_id,
            quantity: line.quantity,
            unit_price,
            shipping,
            total,
        })
    }
}

/// `unit_price × quantity`, refusing to overflow.
pub fn line_total(unit_price: Money, quantity: i64) -> CoreResult<Money> {
    unit_price
        .checked_multiply(quantity)
        .ok_or(CoreError::AmountOverflow {
            context: "line total",
        })
}

/// Splits an order's shipping cost across its lines.
///
/// Rejects an empty order before dividing. Shares differ by at most one
/// cent and always sum to `shipping`.
pub fn allocate_shipping(shipping: Money, line_count: usize) -> ValidationResult<Vec<Money>> {
    shipping.split_evenly(line_count).ok_or(ValidationError::Empty {
        field: "items".to_string(),
    })
}

/// Prices an in-person order; each pair is a line and its book's current price.
pub fn price_offline_lines(lines: &[(OrderLine, Money)]) -> CoreResult<Vec<PricedLine>> {
    lines
        .iter()
        .map(|(line, price)| PricedLine::new(*line, *price, Money::zero()))
        .collect()
}

/// Prices a shipped order, spreading `shipping` over its lines.
pub fn price_online_lines(lines: &[(OrderLine, Money)], shipping: Money) -> CoreResult<Vec<PricedLine>> {
    let shares = allocate_shipping(shipping, lines.len())?;

    lines
        .iter()
        .zip(shares)
        .map(|((line, price), share)| PricedLine::new(*line, *price, share))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(book_id: i64, quantity: i64) -> OrderLine {
        OrderLine { book_id, quantity }
    }

    #[test]
    fn test_offline_total_is_price_times_quantity() {
        let priced = price_offline_lines(&[(line(1, 3), Money::from_rupiah(25_000))]).unwrap();
        assert_eq!(priced.len(), 1);
        assert_eq!(priced[0].total, Money::from_rupiah(75_000));
        assert_eq!(priced[0].shipping, Money::zero());
        assert_eq!(priced[0].unit_price, Money::from_rupiah(25_000));
    }

    #[test]
    fn test_online_two_lines_split_shipping() {
        let price = Money::from_rupiah(25_000);
        let priced =
            price_online_lines(&[(line(1, 1), price), (line(1, 1), price)], Money::from_rupiah(20_000))
                .unwrap();

        assert_eq!(priced.len(), 2);
        for row in &priced {
            assert_eq!(row.shipping, Money::from_rupiah(10_000));
            assert_eq!(row.total, Money::from_rupiah(35_000));
        }
    }

    #[test]
    fn test_online_shares_reconstitute_shipping() {
        let shipping = Money::from_rupiah(10_000);
        let lines: Vec<_> = (1..=7).map(|i| (line(i, i), Money::from_rupiah(1_000))).collect();
        let priced = price_online_lines(&lines, shipping).unwrap();

        assert_eq!(priced.len(), 7);
        assert_eq!(Money::checked_sum(priced.iter().map(|p| p.shipping)), Some(shipping));
        for p in &priced {
            assert_eq!(p.total, p.unit_price * p.quantity + p.shipping);
        }
    }

    #[test]
    fn test_single_line_gets_full_shipping() {
        let priced = price_online_lines(
            &[(line(9, 2), Money::from_rupiah(30_000))],
            Money::from_rupiah(15_000),
        )
        .unwrap();
        assert_eq!(priced[0].shipping, Money::from_rupiah(15_000));
        assert_eq!(priced[0].total, Money::from_rupiah(75_000));
    }

    #[test]
    fn test_empty_online_order_rejected() {
        let err = price_online_lines(&[], Money::from_rupiah(15_000)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = line_total(Money::from_cents(i64::MAX / 2), 3).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }
}
