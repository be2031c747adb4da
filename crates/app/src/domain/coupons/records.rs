//! Coupon Records

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{domain::pricing::percent_of_minor, uuids::TypedUuid};

/// Coupon UUID
pub type CouponUuid = TypedUuid<CouponRecord>;

/// Trim and upper-case a user supplied code. Returns `None` for blank input.
#[must_use]
pub fn canonical_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    (!trimmed.is_empty()).then(|| trimmed.to_uppercase())
}

/// How a coupon reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponDiscount {
    /// `percent` of the subtotal, optionally capped.
    Percentage {
        percent: Decimal,
        max_discount: Option<u64>,
    },

    /// A flat amount.
    Fixed { amount: u64 },
}

impl CouponDiscount {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Percentage { .. } => "percentage",
            Self::Fixed { .. } => "fixed",
        }
    }

    /// Whether the discount values are in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Percentage { percent, .. } => {
                *percent > Decimal::ZERO && *percent <= Decimal::ONE_HUNDRED
            }
            Self::Fixed { .. } => true,
        }
    }
}

/// Why a coupon cannot be applied. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponRejection {
    NotFound,
    Inactive,
    NotYetValid,
    Expired,
    UsageLimitReached,
    UserLimitReached,
    BelowMinimum { minimum: u64 },
}

impl CouponRejection {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Inactive => "inactive",
            Self::NotYetValid => "not_yet_valid",
            Self::Expired => "expired",
            Self::UsageLimitReached => "usage_limit_reached",
            Self::UserLimitReached => "user_limit_reached",
            Self::BelowMinimum { .. } => "below_minimum",
        }
    }
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("coupon code does not exist"),
            Self::Inactive => f.write_str("coupon is not active"),
            Self::NotYetValid => f.write_str("coupon is not valid yet"),
            Self::Expired => f.write_str("coupon has expired"),
            Self::UsageLimitReached => f.write_str("coupon usage limit reached"),
            Self::UserLimitReached => f.write_str("coupon already used the maximum number of times"),
            Self::BelowMinimum { minimum } => write!(
                f,
                "order subtotal is below the coupon minimum of {}.{:02}",
                minimum / 100,
                minimum % 100
            ),
        }
    }
}

impl std::error::Error for CouponRejection {}

/// Outcome of checking a code against a subtotal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponValidation {
    Valid { code: String, discount: u64 },
    Invalid { reason: CouponRejection },
}

/// Coupon Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponRecord {
    pub uuid: CouponUuid,
    pub code: String,
    pub description: Option<String>,
    pub discount: CouponDiscount,
    pub min_order_amount: u64,
    pub usage_limit: Option<u64>,
    pub used_count: u64,
    pub per_user_limit: u64,
    pub active: bool,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CouponRecord {
    /// Discount this coupon grants on `subtotal`, never more than the subtotal
    /// and zero below the minimum order amount.
    #[must_use]
    pub fn calculate_discount(&self, subtotal: u64) -> u64 {
        if subtotal < self.min_order_amount {
            return 0;
        }

        let discount = match self.discount {
            CouponDiscount::Percentage {
                percent,
                max_discount,
            } => {
                // Only overflow can fail here, which already exceeds the subtotal.
                let discount = percent_of_minor(percent, subtotal).unwrap_or(subtotal);

                max_discount.map_or(discount, |cap| discount.min(cap))
            }
            CouponDiscount::Fixed { amount } => amount,
        };

        discount.min(subtotal)
    }

    /// Run every eligibility check and return the discount.
    ///
    /// `user_redemptions` is the caller's past redemption count, or `None` for guests.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(
        &self,
        now: Timestamp,
        subtotal: u64,
        user_redemptions: Option<u64>,
    ) -> Result<u64, CouponRejection> {
        if !self.active {
            return Err(CouponRejection::Inactive);
        }

        if now < self.valid_from {
            return Err(CouponRejection::NotYetValid);
        }

        if now > self.valid_until {
            return Err(CouponRejection::Expired);
        }

        if self
            .usage_limit
            .is_some_and(|limit| self.used_count >= limit)
        {
            return Err(CouponRejection::UsageLimitReached);
        }

        if user_redemptions.is_some_and(|count| count >= self.per_user_limit) {
            return Err(CouponRejection::UserLimitReached);
        }

        if subtotal < self.min_order_amount {
            return Err(CouponRejection::BelowMinimum {
                minimum: self.min_order_amount,
            });
        }

        Ok(self.calculate_discount(subtotal))
    }
}
