//! Coupon Errors

use salvo::http::StatusError;
use tracing::error;

use pizzeria_app::domain::coupons::CouponsServiceError;

pub(crate) fn into_status_error(error: CouponsServiceError) -> StatusError {
    match error {
        CouponsServiceError::NotFound => StatusError::not_found().brief("Coupon not found"),
        CouponsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Coupon code already exists")
        }
        CouponsServiceError::InvalidCode => {
            StatusError::unprocessable_entity().brief("Coupon code must not be blank")
        }
        CouponsServiceError::InvalidData => {
            StatusError::unprocessable_entity().brief("Invalid coupon payload")
        }
        CouponsServiceError::InUse => {
            StatusError::conflict().brief("Coupon has been used by orders")
        }
        CouponsServiceError::Sql(source) => {
            error!("coupon storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
