//! Toggle Coupon Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    coupons::{errors::into_status_error, handlers::CouponResponse},
    extensions::*,
    state::State,
};

/// Toggle Coupon Handler
///
/// Flips the coupon between active and inactive.
#[endpoint(
    tags("coupons"),
    summary = "Toggle Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Coupon toggled"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::NOT_FOUND, description = "Coupon not found"),
    ),
)]
pub(crate) async fn handler(
    coupon: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<CouponResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.admin_or_403()?;

    let coupon = coupon.into_inner().into();

    let current = state
        .app
        .coupons
        .get_coupon(coupon)
        .await
        .map_err(into_status_error)?;

    let toggled = state
        .app
        .coupons
        .set_coupon_active(coupon, !current.active)
        .await
        .map_err(into_status_error)?;

    tracing::info!(coupon_uuid = %coupon, active = toggled.active, "toggled coupon");

    Ok(Json(toggled.into()))
}
