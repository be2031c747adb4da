//! Coupon Data

use jiff::Timestamp;

use crate::domain::coupons::records::{CouponDiscount, CouponUuid};

/// New Coupon Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoupon {
    pub uuid: CouponUuid,
    pub code: String,
    pub description: Option<String>,
    pub discount: CouponDiscount,
    pub min_order_amount: u64,
    pub usage_limit: Option<u64>,
    pub per_user_limit: u64,
    pub active: bool,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
}

/// Coupon Update Data
///
/// The code and redemption counters are fixed once a coupon exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponUpdate {
    pub description: Option<String>,
    pub discount: CouponDiscount,
    pub min_order_amount: u64,
    pub usage_limit: Option<u64>,
    pub per_user_limit: u64,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
}
