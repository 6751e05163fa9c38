//! Repayment Installment Math
//!
//! Applies one installment against an open obligation and detects completion.
//! Overpayment is absorbed: `amount_paid` may exceed the target and the
//! surplus is neither refunded nor carried over.

use lib_types::Amount;
use serde::{Deserialize, Serialize};

use crate::errors::{RotationError, RotationResult};

/// Result of applying one installment to an obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentOutcome {
    /// `amount_paid` after the installment (monotone non-decreasing)
    pub new_amount_paid: Amount,
    /// True exactly when this installment reached the target
    pub completed: bool,
}

/// Apply an installment of `amount` to an obligation at `amount_paid` toward
/// `target_amount`
///
/// # Rules
///
/// 1. `amount > 0`, else `InvalidAmount`
/// 2. `amount_paid` only increases, with checked arithmetic
/// 3. Completion triggers exactly once, when the running total first reaches
///    the target — the caller must not invoke this on a completed obligation
pub fn apply_installment(
    target_amount: Amount,
    amount_paid: Amount,
    amount: Amount,
) -> RotationResult<InstallmentOutcome> {
    if amount <= 0 {
        return Err(RotationError::InvalidAmount { amount });
    }

    let new_amount_paid = amount_paid
        .checked_add(amount)
        .ok_or(RotationError::Overflow)?;

    Ok(InstallmentOutcome {
        new_amount_paid,
        completed: new_amount_paid >= target_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 80 000 paid, 20 000 installment completes a 100 000 target
    #[test]
    fn exact_completion() {
        let outcome = apply_installment(100_000, 80_000, 20_000).unwrap();
        assert_eq!(outcome.new_amount_paid, 100_000);
        assert!(outcome.completed);
    }

    #[test]
    fn partial_installment_stays_open() {
        let outcome = apply_installment(100_000, 0, 30_000).unwrap();
        assert_eq!(outcome.new_amount_paid, 30_000);
        assert!(!outcome.completed);
    }

    /// Overpayment is absorbed, not rejected
    #[test]
    fn overpayment_absorbed() {
        let outcome = apply_installment(100_000, 90_000, 25_000).unwrap();
        assert_eq!(outcome.new_amount_paid, 115_000);
        assert!(outcome.completed);
    }

    #[test]
    fn zero_and_negative_amounts_rejected() {
        assert_eq!(
            apply_installment(100_000, 0, 0),
            Err(RotationError::InvalidAmount { amount: 0 })
        );
        assert_eq!(
            apply_installment(100_000, 0, -5),
            Err(RotationError::InvalidAmount { amount: -5 })
        );
    }

    #[test]
    fn overflow_is_checked() {
        assert_eq!(
            apply_installment(100_000, Amount::MAX, 1),
            Err(RotationError::Overflow)
        );
    }
}
