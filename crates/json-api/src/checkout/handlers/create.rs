//! Checkout Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use pizzeria_app::domain::{
    checkout::data::CheckoutRequest,
    orders::records::{OrderType, PaymentMethod},
};

use crate::{
    checkout::errors::into_status_error,
    extensions::*,
    observability::record_order_placed,
    orders::OrderResponse,
    state::State,
};

/// Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateCheckoutRequest {
    /// `delivery` or `pickup`
    pub order_type: String,

    /// `cash`, `card` or `online`
    pub payment_method: String,

    /// Required for delivery orders
    #[serde(default)]
    pub delivery_address: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub coupon_code: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl TryFrom<CreateCheckoutRequest> for CheckoutRequest {
    type Error = StatusError;

    fn try_from(request: CreateCheckoutRequest) -> Result<Self, Self::Error> {
        let order_type = request
            .order_type
            .parse::<OrderType>()
            .map_err(|error| StatusError::unprocessable_entity().brief(error.to_string()))?;

        let payment_method = request
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|error| StatusError::unprocessable_entity().brief(error.to_string()))?;

        Ok(CheckoutRequest {
            order_type,
            payment_method,
            delivery_address: non_blank(request.delivery_address),
            notes: non_blank(request.notes),
            coupon_code: non_blank(request.coupon_code),
        })
    }
}

/// Checkout Handler
///
/// Places an order from the caller's cart and empties it.
#[endpoint(
    tags("checkout"),
    summary = "Checkout",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::NOT_FOUND, description = "Product or coupon not found"),
        (status_code = StatusCode::CONFLICT, description = "Empty cart, stock shortfall or rejected coupon"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid checkout payload"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "checkout.create",
    skip(json, depot, res),
    fields(order_type = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateCheckoutRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_401()?;

    let request = CheckoutRequest::try_from(json.into_inner())?;

    let span = tracing::Span::current();

    span.record("order_type", request.order_type.as_str());

    let order = state
        .app
        .checkout
        .checkout(owner, request)
        .await
        .map_err(into_status_error)?;

    span.record("order_uuid", tracing::field::display(order.uuid));

    record_order_placed(order.order_type, order.payment_method);

    res.add_header(LOCATION, format!("/orders/{}", order.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(order.into()))
}
