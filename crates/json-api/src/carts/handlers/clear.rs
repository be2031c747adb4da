//! Clear Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, handlers::CartResponse},
    extensions::*,
    state::State,
};

/// Clear Cart Handler
///
/// Removes every item and zeroes the totals.
#[endpoint(
    tags("carts"),
    summary = "Clear Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart cleared"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_401()?;

    let cart = state
        .app
        .carts
        .clear_cart(owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use crate::test_helpers::{Caller, Mocks, make_cart, service_as};

    use super::*;

    #[tokio::test]
    async fn test_clear_cart_returns_empty_cart() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_clear_cart()
            .once()
            .withf(|owner| *owner == Caller::Customer.identity())
            .return_once(|owner| Ok(make_cart(owner.clone())));

        let mut res = TestClient::delete("http://example.com/cart")
            .send(&service_as(
                Caller::Customer,
                mocks,
                Router::with_path("cart").delete(handler),
            ))
            .await;

        let body: CartResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.items.is_empty());
        assert_eq!(body.total, Decimal::ZERO);

        Ok(())
    }
}
