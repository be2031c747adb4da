//! Coupon Handlers

use rust_decimal::Decimal;
use salvo::{http::StatusError, oapi::ToSchema};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use jiff::Timestamp;
use pizzeria_app::domain::coupons::records::{CouponDiscount, CouponRecord};

use crate::money::{minor_or_422, to_decimal};

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod toggle;
pub(crate) mod update;
pub(crate) mod validate;

const fn default_per_user_limit() -> u64 {
    1
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponResponse {
    pub uuid: Uuid,

    pub code: String,

    pub description: Option<String>,

    /// `percentage` or `fixed`
    pub discount_type: String,

    /// Percent for `percentage` coupons, amount for `fixed` ones
    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub discount_value: Decimal,

    #[serde(with = "rust_decimal::serde::float_option")]
    #[salvo(schema(value_type = Option<f64>))]
    pub max_discount: Option<Decimal>,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub min_order_amount: Decimal,

    pub usage_limit: Option<u64>,

    pub used_count: u64,

    pub per_user_limit: u64,

    pub active: bool,

    pub valid_from: String,

    pub valid_until: String,

    pub created_at: String,

    pub updated_at: String,
}

impl From<CouponRecord> for CouponResponse {
    fn from(coupon: CouponRecord) -> Self {
        let (discount_value, max_discount) = match coupon.discount {
            CouponDiscount::Percentage {
                percent,
                max_discount,
            } => (percent, max_discount.map(to_decimal)),
            CouponDiscount::Fixed { amount } => (to_decimal(amount), None),
        };

        Self {
            uuid: coupon.uuid.into(),
            code: coupon.code,
            description: coupon.description,
            discount_type: coupon.discount.kind().to_string(),
            discount_value,
            max_discount,
            min_order_amount: to_decimal(coupon.min_order_amount),
            usage_limit: coupon.usage_limit,
            used_count: coupon.used_count,
            per_user_limit: coupon.per_user_limit,
            active: coupon.active,
            valid_from: coupon.valid_from.to_string(),
            valid_until: coupon.valid_until.to_string(),
            created_at: coupon.created_at.to_string(),
            updated_at: coupon.updated_at.to_string(),
        }
    }
}

/// Coupon terms shared by create and update requests.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CouponTerms {
    #[serde(default)]
    pub description: Option<String>,

    /// `percentage` or `fixed`
    pub discount_type: String,

    /// Percent (0, 100] for `percentage` coupons, amount for `fixed` ones
    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub discount_value: Decimal,

    /// Cap for `percentage` coupons
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[salvo(schema(value_type = Option<f64>))]
    pub max_discount: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub min_order_amount: Decimal,

    /// Total redemptions allowed, unlimited when absent
    #[serde(default)]
    pub usage_limit: Option<u64>,

    #[serde(default = "default_per_user_limit")]
    pub per_user_limit: u64,

    /// RFC 3339 timestamp
    pub valid_from: String,

    /// RFC 3339 timestamp
    pub valid_until: String,
}

/// Validated coupon terms in minor units.
#[derive(Debug)]
pub(crate) struct ParsedTerms {
    pub description: Option<String>,
    pub discount: CouponDiscount,
    pub min_order_amount: u64,
    pub usage_limit: Option<u64>,
    pub per_user_limit: u64,
    pub valid_from: Timestamp,
    pub valid_until: Timestamp,
}

fn parse_timestamp(raw: &str, field: &str) -> Result<Timestamp, StatusError> {
    raw.parse::<Timestamp>().map_err(|_error| {
        StatusError::unprocessable_entity().brief(format!("{field} must be an RFC 3339 timestamp"))
    })
}

impl TryFrom<CouponTerms> for ParsedTerms {
    type Error = StatusError;

    fn try_from(terms: CouponTerms) -> Result<Self, Self::Error> {
        let discount = match terms.discount_type.as_str() {
            "percentage" => CouponDiscount::Percentage {
                percent: terms.discount_value,
                max_discount: terms
                    .max_discount
                    .map(|cap| minor_or_422(cap, "max_discount"))
                    .transpose()?,
            },
            "fixed" if terms.max_discount.is_some() => {
                return Err(StatusError::unprocessable_entity()
                    .brief("max_discount only applies to percentage coupons"));
            }
            "fixed" => CouponDiscount::Fixed {
                amount: minor_or_422(terms.discount_value, "discount_value")?,
            },
            other => {
                return Err(StatusError::unprocessable_entity()
                    .brief(format!("unknown discount_type \"{other}\"")));
            }
        };

        if !discount.is_valid() {
            return Err(StatusError::unprocessable_entity()
                .brief("percentage discount_value must be greater than 0 and at most 100"));
        }

        let valid_from = parse_timestamp(&terms.valid_from, "valid_from")?;
        let valid_until = parse_timestamp(&terms.valid_until, "valid_until")?;

        if valid_until < valid_from {
            return Err(StatusError::unprocessable_entity()
                .brief("valid_until must not be before valid_from"));
        }

        Ok(Self {
            description: terms.description.filter(|d| !d.trim().is_empty()),
            discount,
            min_order_amount: minor_or_422(terms.min_order_amount, "min_order_amount")?,
            usage_limit: terms.usage_limit,
            per_user_limit: terms.per_user_limit,
            valid_from,
            valid_until,
        })
    }
}
