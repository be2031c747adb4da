//! Validate Coupon Handler

use std::sync::Arc;

use rust_decimal::Decimal;
use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use pizzeria_app::domain::coupons::records::CouponValidation;

use crate::{
    coupons::errors::into_status_error,
    extensions::*,
    money::{minor_or_422, to_decimal},
    state::State,
};

/// Validate Coupon Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ValidateCouponRequest {
    pub code: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub subtotal: Decimal,
}

/// Validate Coupon Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ValidateCouponResponse {
    pub valid: bool,

    /// Canonical code when valid
    pub code: Option<String>,

    /// Discount the coupon would grant on `subtotal`
    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub discount: Decimal,

    /// Machine readable rejection, e.g. `expired`
    pub reason: Option<String>,

    pub message: Option<String>,
}

impl From<CouponValidation> for ValidateCouponResponse {
    fn from(validation: CouponValidation) -> Self {
        match validation {
            CouponValidation::Valid { code, discount } => Self {
                valid: true,
                code: Some(code),
                discount: to_decimal(discount),
                reason: None,
                message: None,
            },
            CouponValidation::Invalid { reason } => Self {
                valid: false,
                code: None,
                discount: Decimal::ZERO,
                reason: Some(reason.as_str().to_string()),
                message: Some(reason.to_string()),
            },
        }
    }
}

/// Validate Coupon Handler
///
/// Reports whether a code would apply to a subtotal without redeeming it.
#[endpoint(
    tags("coupons"),
    summary = "Validate Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Validation outcome"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid subtotal"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<ValidateCouponRequest>,
    depot: &mut Depot,
) -> Result<Json<ValidateCouponResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity_or_401()?;

    let request = json.into_inner();
    let subtotal = minor_or_422(request.subtotal, "subtotal")?;

    let validation = state
        .app
        .coupons
        .validate_coupon(&request.code, subtotal, identity.user())
        .await
        .map_err(into_status_error)?;

    Ok(Json(validation.into()))
}
