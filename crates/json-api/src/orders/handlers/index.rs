//! Order Index Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use pizzeria_app::domain::orders::status::OrderStatus;

use crate::{
    extensions::*,
    orders::{
        errors::into_status_error,
        handlers::{OrderResponse, OrdersResponse},
    },
    state::State,
};

/// Order Index Handler
///
/// Admins see every order; everyone else sees their own. Newest first.
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Orders"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status filter"),
    ),
)]
pub(crate) async fn handler(
    status: QueryParam<String, false>,
    depot: &mut Depot,
) -> Result<Json<OrdersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.actor_or_401()?;

    let status = status
        .into_inner()
        .map(|status| status.parse::<OrderStatus>())
        .transpose()
        .or_400("could not parse \"status\" query parameter")?;

    let orders = if actor.is_admin() {
        state.app.orders.list_all_orders(actor, status).await
    } else {
        state.app.orders.list_orders(&actor.identity).await
    }
    .map_err(into_status_error)?;

    Ok(Json(OrdersResponse {
        orders: orders
            .into_iter()
            .filter(|order| status.is_none_or(|status| order.status == status))
            .map(OrderResponse::from)
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use pizzeria_app::domain::orders::records::OrderUuid;

    use crate::test_helpers::{Caller, Mocks, make_order, service_as};

    use super::*;

    fn make_service(caller: Caller, mocks: Mocks) -> Service {
        service_as(caller, mocks, Router::with_path("orders").get(handler))
    }

    #[tokio::test]
    async fn test_customers_list_their_own_orders() -> TestResult {
        let mut confirmed = make_order(OrderUuid::new(), Caller::Customer.identity());

        confirmed.status = OrderStatus::Confirmed;

        let pending = make_order(OrderUuid::new(), Caller::Customer.identity());
        let confirmed_uuid = confirmed.uuid;

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_list_orders()
            .once()
            .withf(|owner| *owner == Caller::Customer.identity())
            .return_once(move |_| Ok(vec![confirmed, pending]));

        mocks.orders.expect_list_all_orders().never();

        let mut res = TestClient::get("http://example.com/orders?status=confirmed")
            .send(&make_service(Caller::Customer, mocks))
            .await;

        let body: OrdersResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.orders.len(), 1);
        assert!(
            body.orders.iter().all(|o| o.uuid == confirmed_uuid.into_uuid()),
            "expected only the confirmed order, got {body:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_admins_list_every_order() -> TestResult {
        let order = make_order(OrderUuid::new(), Caller::Guest.identity());

        let mut mocks = Mocks::default();

        mocks
            .orders
            .expect_list_all_orders()
            .once()
            .withf(|actor, status| actor.is_admin() && *status == Some(OrderStatus::Pending))
            .return_once(move |_, _| Ok(vec![order]));

        mocks.orders.expect_list_orders().never();

        let mut res = TestClient::get("http://example.com/orders?status=pending")
            .send(&make_service(Caller::Admin, mocks))
            .await;

        let body: OrdersResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.orders.len(), 1);
        assert!(
            body.orders.iter().all(|o| o.user_uuid.is_none()),
            "guest orders have no user"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_filter_returns_400() -> TestResult {
        let res = TestClient::get("http://example.com/orders?status=baking")
            .send(&make_service(Caller::Admin, Mocks::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
