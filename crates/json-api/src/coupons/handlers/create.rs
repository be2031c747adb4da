//! Create Coupon Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use pizzeria_app::domain::coupons::{
    data::NewCoupon,
    records::{CouponUuid, canonical_code},
};

use crate::{
    coupons::{
        errors::into_status_error,
        handlers::{CouponResponse, CouponTerms, ParsedTerms},
    },
    extensions::*,
    state::State,
};

const fn default_active() -> bool {
    true
}

/// Create Coupon Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateCouponRequest {
    /// Stored trimmed and upper-cased
    pub code: String,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(flatten)]
    pub terms: CouponTerms,
}

impl CreateCouponRequest {
    fn into_new_coupon(self, uuid: CouponUuid) -> Result<NewCoupon, StatusError> {
        let code = canonical_code(&self.code).ok_or_else(|| {
            StatusError::unprocessable_entity().brief("Coupon code must not be blank")
        })?;

        let terms = ParsedTerms::try_from(self.terms)?;

        Ok(NewCoupon {
            uuid,
            code,
            description: terms.description,
            discount: terms.discount,
            min_order_amount: terms.min_order_amount,
            usage_limit: terms.usage_limit,
            per_user_limit: terms.per_user_limit,
            active: self.active,
            valid_from: terms.valid_from,
            valid_until: terms.valid_until,
        })
    }
}

/// Create Coupon Handler
#[endpoint(
    tags("coupons"),
    summary = "Create Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Coupon created"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::CONFLICT, description = "Coupon code already exists"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid coupon payload"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "coupons.create", skip(json, depot, res), err)]
pub(crate) async fn handler(
    json: JsonBody<CreateCouponRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CouponResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    depot.admin_or_403()?;

    let coupon = json.into_inner().into_new_coupon(CouponUuid::new())?;

    let coupon = state
        .app
        .coupons
        .create_coupon(coupon)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/coupons/{}", coupon.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    tracing::info!(coupon_uuid = %coupon.uuid, code = %coupon.code, "created coupon");

    Ok(Json(coupon.into()))
}
