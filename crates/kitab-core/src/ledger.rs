//! # Cash Ledger Summary
//!
//! The one place debit/kredit totals are computed. The list endpoint and the
//! spreadsheet export both summarize the exact rows they return, so the two
//! can never disagree.
//!
//! ```text
//! records (already filtered) ──► CashSummary::from_records
//!                                   total_debit  = Σ amount where debit
//!                                   total_kredit = Σ amount where kredit
//!                                   total_kas    = total_debit − total_kredit
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CashRecord, CashType};

/// Totals over a set of cash records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashSummary {
    pub total_debit_cents: i64,
    pub total_kredit_cents: i64,
    /// Running balance: debit − kredit
    pub total_kas_cents: i64,
}

impl CashSummary {
    /// Summarizes `(type, amount)` pairs.
    ///
    /// ## Errors
    /// `AmountOverflow` when a total leaves the `i64` cent range.
    pub fn from_entries<I>(entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (CashType, Money)>,
    {
        let overflow = || CoreError::AmountOverflow { context: "cash summary" };

        let (mut debit, mut kredit) = (Money::zero(), Money::zero());
        for (kind, amount) in entries {
            match kind {
                CashType::Debit => debit = debit.checked_add(amount).ok_or_else(overflow)?,
                CashType::Kredit => kredit = kredit.checked_add(amount).ok_or_else(overflow)?,
            }
        }
        let kas = debit.checked_sub(kredit).ok_or_else(overflow)?;

        Ok(CashSummary {
            total_debit_cents: debit.cents(),
            total_kredit_cents: kredit.cents(),
            total_kas_cents: kas.cents(),
        })
    }

    /// Summarizes stored records.
    pub fn from_records(records: &[CashRecord]) -> CoreResult<Self> {
        Self::from_entries(records.iter().map(|r| (r.record_type, r.amount())))
    }

    pub fn total_debit(&self) -> Money {
        Money::from_cents(self.total_debit_cents)
    }

    pub fn total_kredit(&self) -> Money {
        Money::from_cents(self.total_kredit_cents)
    }

    pub fn total_kas(&self) -> Money {
        Money::from_cents(self.total_kas_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = CashSummary::from_entries(Vec::new()).unwrap();
        assert_eq!(summary, CashSummary::default());
    }

    #[test]
    fn test_balance_is_debit_minus_kredit() {
        let summary = CashSummary::from_entries(vec![
            (CashType::Debit, Money::from_rupiah(100_000)),
            (CashType::Kredit, Money::from_rupiah(30_000)),
            (CashType::Debit, Money::from_rupiah(5_000)),
            (CashType::Kredit, Money::from_rupiah(80_000)),
        ])
        .unwrap();

        assert_eq!(summary.total_debit(), Money::from_rupiah(105_000));
        assert_eq!(summary.total_kredit(), Money::from_rupiah(110_000));
        assert_eq!(summary.total_kas(), Money::from_rupiah(-5_000));
        assert_eq!(
            summary.total_kas_cents,
            summary.total_debit_cents - summary.total_kredit_cents
        );
    }

    #[test]
    fn test_overflowing_totals_are_errors() {
        let huge = Money::from_cents(i64::MAX);
        let err = CashSummary::from_entries(vec![(CashType::Debit, huge), (CashType::Debit, Money::from_cents(1))])
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));

        let err = CashSummary::from_entries(vec![(CashType::Kredit, huge), (CashType::Kredit, huge)]).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));

        let summary = CashSummary::from_entries(vec![(CashType::Kredit, huge)]).unwrap();
        assert_eq!(summary.total_kas(), Money::from_cents(-i64::MAX));
    }
}
