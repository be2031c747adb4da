//! Create Cart Item Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pizzeria_app::domain::{
    carts::data::{CustomizationNames, NewCartItem},
    products::records::Size,
};

use crate::{
    carts::{errors::into_status_error, handlers::CartResponse},
    extensions::*,
    state::State,
};

const fn default_quantity() -> u32 {
    1
}

/// An extra picked from the product's customization options.
///
/// Only the name is read; the price always comes from the product.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CustomizationChoice {
    pub name: String,
}

/// Create Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateCartItemRequest {
    pub product_uuid: Uuid,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// `small`, `medium` (default) or `large`
    #[serde(default)]
    pub size: Option<String>,

    #[serde(default)]
    pub customizations: Vec<CustomizationChoice>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl TryFrom<CreateCartItemRequest> for NewCartItem {
    type Error = StatusError;

    fn try_from(request: CreateCartItemRequest) -> Result<Self, Self::Error> {
        let size = request
            .size
            .as_deref()
            .map(str::parse::<Size>)
            .transpose()
            .map_err(|error| StatusError::unprocessable_entity().brief(error.to_string()))?
            .unwrap_or_default();

        let customizations: CustomizationNames = request
            .customizations
            .into_iter()
            .map(|choice| choice.name)
            .collect();

        Ok(NewCartItem {
            product_uuid: request.product_uuid.into(),
            quantity: request.quantity,
            size,
            customizations,
            notes: request.notes.filter(|notes| !notes.trim().is_empty()),
        })
    }
}

/// Create Cart Item Handler
///
/// Adds an item, merging it into an identical line already in the cart.
#[endpoint(
    tags("carts"),
    summary = "Add Item to Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Item added"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::CONFLICT, description = "Product unavailable or out of stock"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid item or customization"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "carts.items.create",
    skip(json, depot, res),
    fields(product_uuid = tracing::field::Empty, quantity = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateCartItemRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_401()?;

    let item = NewCartItem::try_from(json.into_inner())?;

    let span = tracing::Span::current();

    span.record("product_uuid", tracing::field::display(item.product_uuid));
    span.record("quantity", item.quantity);

    let (product, size, customizations) =
        (item.product_uuid, item.size, item.customizations.clone());

    let cart = state
        .app
        .carts
        .add_item(owner, item)
        .await
        .map_err(into_status_error)?;

    let line = cart
        .items
        .iter()
        .rev()
        .find(|line| {
            line.product_uuid == product
                && line.size == size
                && line.has_customization_names(&customizations)
        })
        .map(|line| line.uuid)
        .ok_or_else(|| {
            tracing::error!(%product, "added item missing from cart");

            StatusError::internal_server_error()
        })?;

    res.add_header(LOCATION, format!("/cart/items/{line}"), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(cart.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use pizzeria_app::domain::{
        carts::{CartsServiceError, records::CartItemUuid},
        products::records::ProductUuid,
    };

    use crate::test_helpers::{Caller, Mocks, make_filled_cart, service_as};

    use super::*;

    fn make_service(mocks: Mocks) -> Service {
        service_as(Caller::Guest, mocks, Router::with_path("cart/items").post(handler))
    }

    #[tokio::test]
    async fn test_add_item_success() -> TestResult {
        let item = CartItemUuid::new();
        let cart = make_filled_cart(Caller::Guest.identity(), item);
        let product = cart.items.first().map(|line| line.product_uuid);

        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_add_item()
            .once()
            .withf(move |owner, new| {
                *owner == Caller::Guest.identity()
                    && Some(new.product_uuid) == product
                    && new.quantity == 2
                    && new.size == Size::Medium
                    && new.customizations.is_empty()
            })
            .return_once(move |_, _| Ok(cart));

        let mut res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": product, "quantity": 2 }))
            .send(&make_service(mocks))
            .await;

        let body: CartResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/cart/items/{item}").as_str()));
        assert_eq!(body.items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_ignores_client_customization_prices() -> TestResult {
        let product = ProductUuid::new();

        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_add_item()
            .once()
            .withf(move |_, new| {
                new.size == Size::Large && new.customizations.as_slice() == ["olives".to_string()]
            })
            .return_once(|_, _| Err(CartsServiceError::ProductNotFound));

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({
                "product_uuid": product,
                "size": "large",
                "customizations": [{ "name": "olives", "price": 0.01 }]
            }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_insufficient_stock_returns_409() -> TestResult {
        let product = ProductUuid::new();

        let mut mocks = Mocks::default();

        mocks.carts.expect_add_item().once().return_once(move |_, _| {
            Err(CartsServiceError::InsufficientStock {
                product,
                name: "Margherita".to_string(),
                available: 1,
            })
        });

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": product, "quantity": 5 }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_unknown_size_returns_422() -> TestResult {
        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({ "product_uuid": ProductUuid::new(), "size": "family" }))
            .send(&make_service(Mocks::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_unknown_customization_returns_422() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .carts
            .expect_add_item()
            .once()
            .return_once(|_, _| Err(CartsServiceError::InvalidCustomization));

        let res = TestClient::post("http://example.com/cart/items")
            .json(&json!({
                "product_uuid": ProductUuid::new(),
                "customizations": [{ "name": "gold leaf" }]
            }))
            .send(&make_service(mocks))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
