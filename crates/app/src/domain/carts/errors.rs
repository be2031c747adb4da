//! Carts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    carts::records::NOTES_MAX_CHARS, pricing::PricingError, products::records::ProductUuid,
};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart item not found")]
    NotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("product {product} is not available")]
    ProductUnavailable { product: ProductUuid },

    #[error("insufficient stock for {name}: {available} available")]
    InsufficientStock {
        product: ProductUuid,
        name: String,
        available: u64,
    },

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("notes must be at most {NOTES_MAX_CHARS} characters")]
    NotesTooLong,

    #[error("customization is not offered for this product")]
    InvalidCustomization,

    #[error("invalid data")]
    InvalidData,

    #[error("pricing error")]
    Pricing(#[from] PricingError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CartsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            Some(_) | None => Self::Sql(error),
        }
    }
}
