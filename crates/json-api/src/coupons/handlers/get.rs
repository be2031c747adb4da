//! Get Coupon Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    coupons::{errors::into_status_error, handlers::CouponResponse},
    extensions::*,
    state::State,
};

/// Get Coupon Handler
#[endpoint(
    tags("coupons"),
    summary = "Get Coupon",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Coupon found"),
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

    let coupon = state
        .app
        .coupons
        .get_coupon(coupon.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(coupon.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use testresult::TestResult;

    use pizzeria_app::domain::coupons::{CouponsServiceError, records::CouponUuid};

    use crate::test_helpers::{Caller, Mocks, make_coupon, service_as};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        service_as(
            Caller::Admin,
            mocks,
            Router::with_path("coupons/{coupon}").get(handler),
        )
    }

    #[tokio::test]
    async fn test_get_coupon_renders_percent_and_cap() -> TestResult {
        let uuid = CouponUuid::new();
        let coupon = make_coupon(uuid);

        let mut mocks = Mocks::default();

        mocks
            .coupons
            .expect_get_coupon()
            .once()
            .withf(move |c| *c == uuid)
            .return_once(move |_| Ok(coupon));

        let mut res = TestClient::get(format!("http://example.com/coupons/{uuid}"))
            .send(&make_service(mocks))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["discount_value"], 10.0);
        assert_eq!(body["max_discount"], 20.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_coupon_returns_404() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .coupons
            .expect_get_coupon()
            .once()
            .return_once(|_| Err(CouponsServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/coupons/{}", CouponUuid::new()))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
