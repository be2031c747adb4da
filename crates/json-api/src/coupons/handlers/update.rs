//! Update Coupon Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use pizzeria_app::domain::coupons::data::CouponUpdate;

use crate::{
    coupons::{
        errors::into_status_error,
        handlers::{CouponResponse, CouponTerms, ParsedTerms},
    },
    extensions::*,
    state::State,
};

impl From<ParsedTerms> for CouponUpdate {
    fn from(terms: ParsedTerms) -> Self {
        Self {
            description: terms.description,
            discount: terms.discount,
            min_order_amount: terms.min_order_amount,
            usage_limit: terms.usage_limit,
            per_user_limit: terms.per_user_limit,
            valid_from: terms.valid_from,
            valid_until: terms.valid_until,
        }
    }
}

/// Update Coupon Handler
///
/// Replaces the coupon's terms. The code and usage counters stay as they are.
#[endpoint(
    tags("coupons"),
    summary = "Update Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Coupon updated"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::NOT_FOUND, description = "Coupon not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid coupon payload"),
    ),
)]
#[tracing::instrument(
    name = "coupons.update",
    skip(coupon, json, depot),
    fields(coupon_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    coupon: PathParam<Uuid>,
    json: JsonBody<CouponTerms>,
    depot: &mut Depot,
) -> Result<Json<CouponResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.admin_or_403()?;

    let coupon = coupon.into_inner();
    let update = CouponUpdate::from(ParsedTerms::try_from(json.into_inner())?);

    tracing::Span::current().record("coupon_uuid", tracing::field::display(coupon));

    let updated = state
        .app
        .coupons
        .update_coupon(coupon.into(), update)
        .await
        .map_err(into_status_error)?;

    Ok(Json(updated.into()))
}
