//! Money arithmetic shared by carts, coupons and checkout.
//!
//! Amounts are minor currency units (`299` is `2.99`). Rates are [`Decimal`] and
//! results are rounded half away from zero to whole minor units.

use jiff::SignedDuration;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("amount overflowed while pricing")]
    Overflow,

    #[error("rate must not be negative")]
    NegativeRate,
}

/// Store-wide pricing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingSettings {
    /// Fraction of the subtotal charged as tax (`0.10` is 10%).
    pub tax_rate: Decimal,

    /// Flat fee added to delivery orders.
    pub delivery_fee: u64,

    pub delivery_lead_time: SignedDuration,

    pub pickup_lead_time: SignedDuration,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            delivery_fee: 5_00,
            delivery_lead_time: SignedDuration::from_mins(45),
            pickup_lead_time: SignedDuration::from_mins(20),
        }
    }
}

/// Derived cart amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: u64,
    pub tax: u64,
    pub total: u64,
}

impl Totals {
    /// Derive tax and total from a subtotal.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is negative or the amounts overflow.
    pub fn from_subtotal(subtotal: u64, tax_rate: Decimal) -> Result<Self, PricingError> {
        let tax = rate_of_minor(tax_rate, subtotal)?;
        let total = subtotal.checked_add(tax).ok_or(PricingError::Overflow)?;

        Ok(Self {
            subtotal,
            tax,
            total,
        })
    }
}

/// Apply a fractional rate (`0.10`) to a minor amount.
///
/// # Errors
///
/// Returns an error if the rate is negative or the product overflows.
pub fn rate_of_minor(rate: Decimal, minor: u64) -> Result<u64, PricingError> {
    if rate.is_sign_negative() {
        return Err(PricingError::NegativeRate);
    }

    let applied = rate
        .checked_mul(Decimal::from(minor))
        .ok_or(PricingError::Overflow)?;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(PricingError::Overflow)
}

/// Apply a whole-number percentage (`20` is 20%) to a minor amount.
///
/// # Errors
///
/// Returns an error if the percentage is negative or the product overflows.
pub fn percent_of_minor(percent: Decimal, minor: u64) -> Result<u64, PricingError> {
    let rate = percent
        .checked_div(Decimal::ONE_HUNDRED)
        .ok_or(PricingError::Overflow)?;

    rate_of_minor(rate, minor)
}

/// `(unit + customization_total) * quantity` for a single line.
///
/// # Errors
///
/// Returns an error on overflow.
pub fn line_total(unit_price: u64, customization_total: u64, quantity: u32) -> Result<u64, PricingError> {
    unit_price
        .checked_add(customization_total)
        .and_then(|each| each.checked_mul(u64::from(quantity)))
        .ok_or(PricingError::Overflow)
}
