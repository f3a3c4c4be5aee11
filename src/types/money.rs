//! Fixed-point money helpers
//!
//! Amounts are `Decimal` with a smallest unit of 0.01. Anything that divides
//! money goes through minor units (i64 hundredths) so rounding is explicit.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Number of decimal places of the smallest currency unit
pub const MONEY_SCALE: u32 = 2;

const MINOR_PER_UNIT: i64 = 100;

/// Convert an amount to whole minor units
///
/// Returns `None` if the amount carries sub-unit precision or does not fit
/// in an i64.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    if !has_money_precision(amount) {
        return None;
    }
    amount
        .checked_mul(Decimal::from(MINOR_PER_UNIT))?
        .trunc()
        .to_i64()
}

/// Build an amount from minor units
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MONEY_SCALE)
}

/// True if the amount has no digits below the smallest unit
pub fn has_money_precision(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE
}

/// Result of splitting an amount evenly across recipients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvenSplit {
    /// Floor of `total / recipients` at the smallest unit
    pub per_recipient: Decimal,

    /// `per_recipient * recipients`
    pub distributed: Decimal,

    /// `total - distributed`, always in `[0, recipients * 0.01)`
    pub remainder: Decimal,
}

/// Split `total` evenly across `recipients`, flooring to the smallest unit
///
/// Never rounds up, so `distributed` cannot exceed `total`.
///
/// # Returns
///
/// `None` if `recipients` is zero, `total` is negative or has sub-unit
/// precision, or the arithmetic overflows.
pub fn split_evenly(total: Decimal, recipients: u32) -> Option<EvenSplit> {
    if recipients == 0 || total.is_sign_negative() {
        return None;
    }
    let total_minor = to_minor_units(total)?;
    let count = i64::from(recipients);
    let per_minor = total_minor / count;
    let distributed_minor = per_minor.checked_mul(count)?;

    let distributed = from_minor_units(distributed_minor);
    Some(EvenSplit {
        per_recipient: from_minor_units(per_minor),
        distributed,
        remainder: total - distributed,
    })
}
