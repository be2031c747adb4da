//! Conversions between minor-unit amounts and JSON decimal amounts.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use salvo::prelude::StatusError;

/// `299` becomes `2.99`.
#[must_use]
pub(crate) fn to_decimal(minor: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(minor), 2)
}

/// `2.99` becomes `299`. Negative amounts, fractions of a cent and amounts that
/// do not fit are rejected.
#[must_use]
pub(crate) fn to_minor(amount: Decimal) -> Option<u64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }

    let minor = amount.checked_mul(Decimal::ONE_HUNDRED)?;

    if !minor.fract().is_zero() {
        return None;
    }

    minor.trunc().to_u64()
}

/// [`to_minor`] for request payloads.
pub(crate) fn minor_or_422(amount: Decimal, field: &str) -> Result<u64, StatusError> {
    to_minor(amount).ok_or_else(|| {
        StatusError::unprocessable_entity().brief(format!(
            "{field} must be a non-negative amount with at most two decimal places"
        ))
    })
}
