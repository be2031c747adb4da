//! Cart Errors

use salvo::http::StatusError;
use tracing::error;

use pizzeria_app::domain::carts::CartsServiceError;

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::NotFound => StatusError::not_found().brief("Cart item not found"),
        CartsServiceError::ProductNotFound => StatusError::not_found().brief("Product not found"),
        CartsServiceError::ProductUnavailable { .. } => {
            StatusError::conflict().brief("Product is not available")
        }
        CartsServiceError::InsufficientStock {
            product,
            name,
            available,
        } => StatusError::conflict().brief(format!(
            "Insufficient stock for {name} ({product}): {available} available"
        )),
        error @ (CartsServiceError::InvalidQuantity
        | CartsServiceError::NotesTooLong
        | CartsServiceError::InvalidCustomization) => {
            StatusError::unprocessable_entity().brief(error.to_string())
        }
        CartsServiceError::InvalidData | CartsServiceError::Pricing(_) => {
            StatusError::unprocessable_entity().brief("Invalid cart payload")
        }
        CartsServiceError::Sql(source) => {
            error!("cart storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
