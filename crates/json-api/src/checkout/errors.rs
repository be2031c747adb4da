//! Checkout Errors

use salvo::http::StatusError;
use tracing::error;

use pizzeria_app::domain::{checkout::CheckoutServiceError, coupons::records::CouponRejection};

pub(crate) fn into_status_error(error: CheckoutServiceError) -> StatusError {
    match error {
        CheckoutServiceError::EmptyCart => StatusError::conflict().brief("Cart is empty"),
        error @ (CheckoutServiceError::MissingDeliveryAddress
        | CheckoutServiceError::NotesTooLong
        | CheckoutServiceError::Pricing(_)) => {
            StatusError::unprocessable_entity().brief(error.to_string())
        }
        error @ CheckoutServiceError::ProductNotFound { .. } => {
            StatusError::not_found().brief(error.to_string())
        }
        CheckoutServiceError::Coupon(CouponRejection::NotFound) => {
            StatusError::not_found().brief("Coupon not found")
        }
        error @ (CheckoutServiceError::ProductUnavailable { .. }
        | CheckoutServiceError::InsufficientStock { .. }
        | CheckoutServiceError::Coupon(_)) => StatusError::conflict().brief(error.to_string()),
        CheckoutServiceError::OrderNumberExhausted => {
            error!("no order number left for today");

            StatusError::conflict().brief("Could not allocate an order number, try again")
        }
        CheckoutServiceError::Sql(source) => {
            error!("checkout storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use pizzeria_app::domain::products::records::ProductUuid;
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn stock_shortfall_names_the_product() {
        let status = into_status_error(CheckoutServiceError::InsufficientStock {
            product: ProductUuid::new(),
            name: "Margherita".to_string(),
            available: 1,
        });

        assert_eq!(status.code, StatusCode::CONFLICT);
        assert_eq!(status.brief, "only 1 of Margherita left in stock");
    }

    #[test]
    fn rejected_coupons_explain_why() {
        let status = into_status_error(CheckoutServiceError::Coupon(CouponRejection::Expired));

        assert_eq!(status.code, StatusCode::CONFLICT);
        assert!(status.brief.starts_with("coupon rejected: "), "{}", status.brief);

        let status = into_status_error(CheckoutServiceError::Coupon(CouponRejection::NotFound));

        assert_eq!(status.code, StatusCode::NOT_FOUND);
    }

    #[test]
    fn payload_problems_are_unprocessable() {
        for error in [
            CheckoutServiceError::MissingDeliveryAddress,
            CheckoutServiceError::NotesTooLong,
        ] {
            assert_eq!(
                into_status_error(error).code,
                StatusCode::UNPROCESSABLE_ENTITY
            );
        }
    }
}
