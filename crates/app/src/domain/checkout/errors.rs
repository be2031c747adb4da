//! Checkout service errors.

use sqlx::Error;
use thiserror::Error;

use crate::domain::{
    coupons::records::CouponRejection, pricing::PricingError, products::records::ProductUuid,
};

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("delivery orders need a delivery address")]
    MissingDeliveryAddress,

    #[error("order notes are too long")]
    NotesTooLong,

    #[error("product {product} no longer exists")]
    ProductNotFound { product: ProductUuid },

    #[error("{name} is not available")]
    ProductUnavailable { product: ProductUuid, name: String },

    #[error("only {available} of {name} left in stock")]
    InsufficientStock {
        product: ProductUuid,
        name: String,
        available: u64,
    },

    #[error("coupon rejected: {0}")]
    Coupon(CouponRejection),

    #[error("could not allocate an order number")]
    OrderNumberExhausted,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CheckoutServiceError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}

impl From<CouponRejection> for CheckoutServiceError {
    fn from(rejection: CouponRejection) -> Self {
        Self::Coupon(rejection)
    }
}
