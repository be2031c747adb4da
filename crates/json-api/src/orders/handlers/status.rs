//! Update Order Status Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::Deserialize;
use uuid::Uuid;

use pizzeria_app::domain::orders::status::OrderStatus;

use crate::{
    extensions::*,
    observability::record_status_change,
    orders::{errors::into_status_error, handlers::OrderResponse},
    state::State,
};

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct UpdateStatusRequest {
    /// Target status, e.g. `confirmed`
    pub status: String,
}

/// Update Order Status Handler
///
/// Moves an order one step through the workflow, or cancels it.
#[endpoint(
    tags("orders"),
    summary = "Update Order Status",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Status updated"),
        (status_code = StatusCode::FORBIDDEN, description = "Admin access required"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Transition not allowed"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Unknown status"),
    ),
)]
#[tracing::instrument(
    name = "orders.update_status",
    skip(order, json, depot),
    fields(order_uuid = tracing::field::Empty, status = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<UpdateStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.admin_or_403()?;

    let order = order.into_inner();
    let status = json.into_inner().status.parse::<OrderStatus>().map_err(|error| {
        StatusError::unprocessable_entity().brief(error.to_string())
    })?;

    let span = tracing::Span::current();

    span.record("order_uuid", tracing::field::display(order));
    span.record("status", status.as_str());

    let order = state
        .app
        .orders
        .update_order_status(actor, order.into(), status)
        .await
        .map_err(into_status_error)?;

    record_status_change(order.status);

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use pizzeria_app::domain::orders::{
        OrdersServiceError,
        records::OrderUuid,
        status::TransitionError,
    };

    use crate::test_helpers::{Caller, Mocks, make_order, service_as};

    use super::*;

    fn make_service(caller: Caller, mocks: Mocks) -> Service {
        service_as(
            caller,
            mocks,
            Router::with_path("orders/{order}/status").put(handler),
        )
    }

    #[tokio::test]
    async fn test_admin_confirms_order() -> TestResult {
        let uuid = OrderUuid::new();
        let mut order = make_order(uuid, Caller::Customer.identity());

        order.status = OrderStatus::Confirmed;

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_update_order_status()
            .once()
            .withf(move |actor, o, status| {
                actor.is_admin() && *o == uuid && *status == OrderStatus::Confirmed
            })
            .return_once(move |_, _, _| Ok(order));

        let mut res = TestClient::put(format!("http://example.com/orders/{uuid}/status"))
            .json(&json!({ "status": "confirmed" }))
            .send(&make_service(Caller::Admin, mocks))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body["status"], "confirmed");

        Ok(())
    }

    #[tokio::test]
    async fn test_customers_cannot_update_status() -> TestResult {
        let res = TestClient::put(format!(
            "http://example.com/orders/{}/status",
            OrderUuid::new()
        ))
        .json(&json!({ "status": "confirmed" }))
        .send(&make_service(Caller::Customer, Mocks::default()))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_returns_422() -> TestResult {
        let res = TestClient::put(format!(
            "http://example.com/orders/{}/status",
            OrderUuid::new()
        ))
        .json(&json!({ "status": "baking" }))
        .send(&make_service(Caller::Admin, Mocks::default()))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_skipping_states_returns_409() -> TestResult {
        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_update_order_status()
            .once()
            .return_once(|_, _, _| {
                Err(OrdersServiceError::InvalidTransition(TransitionError {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Delivered,
                }))
            });

        let res = TestClient::put(format!(
            "http://example.com/orders/{}/status",
            OrderUuid::new()
        ))
        .json(&json!({ "status": "delivered" }))
        .send(&make_service(Caller::Admin, mocks))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
