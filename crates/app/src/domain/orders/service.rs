//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};

use crate::{
    database::Db,
    domain::{
        events::{OrderEvents, publish_status_changed},
        identity::{Actor, Identity},
        orders::{
            errors::OrdersServiceError,
            records::{OrderRecord, OrderUuid},
            repository::PgOrdersRepository,
            status::{OrderStatus, StatusPolicy},
        },
        products::repository::PgProductsRepository,
    },
};

#[derive(Clone)]
pub struct PgOrdersService {
    db: Db,
    orders_repository: PgOrdersRepository,
    products_repository: PgProductsRepository,
    events: Arc<dyn OrderEvents>,
    policy: StatusPolicy,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, events: Arc<dyn OrderEvents>, policy: StatusPolicy) -> Self {
        Self {
            db,
            orders_repository: PgOrdersRepository::new(),
            products_repository: PgProductsRepository::new(),
            events,
            policy,
        }
    }

    /// Move a locked order to `to`, returning stock to inventory when it is
    /// cancelled. Runs once per order because the row lock serialises callers
    /// and cancelled is terminal.
    async fn apply_transition(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &OrderRecord,
        to: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if to == OrderStatus::Cancelled {
            for item in &order.items {
                let restored = self
                    .products_repository
                    .restore_stock(tx, item.product_uuid, u64::from(item.quantity))
                    .await?;

                if !restored {
                    warn!(
                        order_uuid = %order.uuid,
                        product_uuid = %item.product_uuid,
                        quantity = item.quantity,
                        "product no longer exists, stock not restored"
                    );
                }
            }
        }

        let updated = self
            .orders_repository
            .update_status(tx, order.uuid, to)
            .await?;

        info!(
            order_uuid = %updated.uuid,
            number = %updated.number,
            from = %order.status,
            to = %updated.status,
            "order status changed"
        );

        Ok(updated)
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(name = "orders.service.list_orders", skip(self), fields(owner = %owner), err)]
    async fn list_orders(&self, owner: &Identity) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let orders = self.orders_repository.list_orders_for(&mut tx, owner).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.list_all_orders",
        skip(self, actor),
        fields(owner = %actor.identity, status = ?status),
        err
    )]
    async fn list_all_orders(
        &self,
        actor: &Actor,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        if !actor.is_admin() {
            return Err(OrdersServiceError::Forbidden);
        }

        let mut tx = self.db.begin_transaction().await?;

        let orders = self.orders_repository.list_all_orders(&mut tx, status).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self, actor),
        fields(owner = %actor.identity, order_uuid = %order),
        err
    )]
    async fn get_order(
        &self,
        actor: &Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self.orders_repository.get_order(&mut tx, order).await?;

        tx.commit().await?;

        if !actor.is_admin() && !record.is_owned_by(&actor.identity) {
            return Err(OrdersServiceError::Forbidden);
        }

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.update_order_status",
        skip(self, actor),
        fields(owner = %actor.identity, order_uuid = %order, to = %status),
        err
    )]
    async fn update_order_status(
        &self,
        actor: &Actor,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        if !actor.is_admin() {
            return Err(OrdersServiceError::Forbidden);
        }

        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders_repository.lock_order(&mut tx, order).await?;

        self.policy.admin_transition(current.status, status)?;

        let updated = self.apply_transition(&mut tx, &current, status).await?;

        tx.commit().await?;

        publish_status_changed(self.events.as_ref(), &updated, current.status).await;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "orders.service.cancel_order",
        skip(self, actor),
        fields(owner = %actor.identity, order_uuid = %order),
        err
    )]
    async fn cancel_order(
        &self,
        actor: &Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let current = self.orders_repository.lock_order(&mut tx, order).await?;

        if !current.is_owned_by(&actor.identity) {
            return Err(OrdersServiceError::Forbidden);
        }

        self.policy.owner_cancellation(current.status)?;

        let updated = self
            .apply_transition(&mut tx, &current, OrderStatus::Cancelled)
            .await?;

        tx.commit().await?;

        publish_status_changed(self.events.as_ref(), &updated, current.status).await;

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// The owner's orders, newest first.
    async fn list_orders(&self, owner: &Identity) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Every order, optionally filtered by status. Admin only.
    async fn list_all_orders(
        &self,
        actor: &Actor,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// A single order, visible to its owner and to admins.
    async fn get_order(
        &self,
        actor: &Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Advance an order through the workflow. Admin only.
    async fn update_order_status(
        &self,
        actor: &Actor,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Cancel one of the actor's own orders before preparation starts.
    async fn cancel_order(
        &self,
        actor: &Actor,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;

    use crate::{
        auth::Role,
        domain::{
            events::MockOrderEvents,
            identity::GuestSession,
            orders::{records::PaymentStatus, status::TransitionError},
            products::{ProductsService, records::ProductRecord},
        },
        test::{
            TestContext,
            helpers::{create_product, create_user, guest, place_order},
        },
    };

    use super::*;

    async fn admin(ctx: &TestContext) -> TestResult<Actor> {
        Ok(Actor::user(create_user(ctx, Role::Admin).await?, Role::Admin))
    }

    async fn stock_of(ctx: &TestContext, product: &ProductRecord) -> TestResult<u64> {
        Ok(ctx.products.get_product(product.uuid).await?.stock)
    }

    #[tokio::test]
    async fn admin_cancelling_a_preparing_order_restores_stock_once() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = admin(&ctx).await?;
        let product = create_product(&ctx, "Margherita", 10_00, 10).await?;
        let order = place_order(&ctx, &guest("guest-a"), product.uuid, 3).await?;

        assert_eq!(stock_of(&ctx, &product).await?, 7);

        for status in [OrderStatus::Confirmed, OrderStatus::Preparing] {
            ctx.orders.update_order_status(&admin, order.uuid, status).await?;
        }

        let cancelled = ctx
            .orders
            .update_order_status(&admin, order.uuid, OrderStatus::Cancelled)
            .await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(stock_of(&ctx, &product).await?, 10);

        let again = ctx
            .orders
            .update_order_status(&admin, order.uuid, OrderStatus::Cancelled)
            .await;

        assert!(
            matches!(again, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {again:?}"
        );
        assert_eq!(stock_of(&ctx, &product).await?, 10);

        Ok(())
    }

    #[tokio::test]
    async fn delivery_settles_payment() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = admin(&ctx).await?;
        let product = create_product(&ctx, "Margherita", 10_00, 10).await?;
        let order = place_order(&ctx, &guest("guest-a"), product.uuid, 1).await?;

        let mut current = order;
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ] {
            current = ctx
                .orders
                .update_order_status(&admin, current.uuid, status)
                .await?;
        }

        assert_eq!(current.status, OrderStatus::Delivered);
        assert_eq!(current.payment_status, PaymentStatus::Paid);
        assert!(current.delivered_at.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn skipping_states_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = admin(&ctx).await?;
        let product = create_product(&ctx, "Margherita", 10_00, 10).await?;
        let order = place_order(&ctx, &guest("guest-a"), product.uuid, 1).await?;

        let result = ctx
            .orders
            .update_order_status(&admin, order.uuid, OrderStatus::Delivered)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::InvalidTransition(TransitionError {
                    from: OrderStatus::Pending,
                    to: OrderStatus::Delivered,
                }))
            ),
            "expected InvalidTransition, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn ready_orders_can_be_cancelled_only_when_policy_allows() -> TestResult {
        for (policy, allowed) in [
            (StatusPolicy::default(), false),
            (StatusPolicy { admin_may_cancel_ready: true }, true),
        ] {
            let ctx = TestContext::with_policy(policy).await;
            let admin = admin(&ctx).await?;
            let product = create_product(&ctx, "Margherita", 10_00, 10).await?;
            let order = place_order(&ctx, &guest("guest-a"), product.uuid, 2).await?;

            for status in [OrderStatus::Confirmed, OrderStatus::Preparing, OrderStatus::Ready] {
                ctx.orders.update_order_status(&admin, order.uuid, status).await?;
            }

            let result = ctx
                .orders
                .update_order_status(&admin, order.uuid, OrderStatus::Cancelled)
                .await;

            assert_eq!(result.is_ok(), allowed, "policy {policy:?} gave {result:?}");
            assert_eq!(stock_of(&ctx, &product).await?, if allowed { 10 } else { 8 });
        }

        Ok(())
    }

    #[tokio::test]
    async fn owner_may_cancel_only_before_preparation() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = admin(&ctx).await?;
        let product = create_product(&ctx, "Margherita", 10_00, 10).await?;
        let owner = Actor::guest(GuestSession::parse("guest-a")?);

        let early = place_order(&ctx, &owner.identity, product.uuid, 1).await?;
        let cancelled = ctx.orders.cancel_order(&owner, early.uuid).await?;
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let late = place_order(&ctx, &owner.identity, product.uuid, 1).await?;
        for status in [OrderStatus::Confirmed, OrderStatus::Preparing] {
            ctx.orders.update_order_status(&admin, late.uuid, status).await?;
        }

        let result = ctx.orders.cancel_order(&owner, late.uuid).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {result:?}"
        );
        assert_eq!(stock_of(&ctx, &product).await?, 9);

        Ok(())
    }

    #[tokio::test]
    async fn strangers_cannot_see_or_cancel_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let product = create_product(&ctx, "Margherita", 10_00, 10).await?;
        let order = place_order(&ctx, &guest("guest-a"), product.uuid, 1).await?;
        let stranger = Actor::guest(GuestSession::parse("guest-b")?);

        let get = ctx.orders.get_order(&stranger, order.uuid).await;
        let cancel = ctx.orders.cancel_order(&stranger, order.uuid).await;
        let status = ctx
            .orders
            .update_order_status(&stranger, order.uuid, OrderStatus::Confirmed)
            .await;
        let all = ctx.orders.list_all_orders(&stranger, None).await;

        assert!(matches!(get, Err(OrdersServiceError::Forbidden)), "got {get:?}");
        assert!(matches!(cancel, Err(OrdersServiceError::Forbidden)), "got {cancel:?}");
        assert!(matches!(status, Err(OrdersServiceError::Forbidden)), "got {status:?}");
        assert!(matches!(all, Err(OrdersServiceError::Forbidden)), "got {all:?}");

        Ok(())
    }

    #[tokio::test]
    async fn admins_see_everything_owners_see_their_own() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = admin(&ctx).await?;
        let product = create_product(&ctx, "Margherita", 10_00, 10).await?;

        let first = place_order(&ctx, &guest("guest-a"), product.uuid, 1).await?;
        let second = place_order(&ctx, &guest("guest-a"), product.uuid, 1).await?;
        place_order(&ctx, &guest("guest-b"), product.uuid, 1).await?;

        let mine = ctx.orders.list_orders(&guest("guest-a")).await?;
        let uuids: Vec<_> = mine.iter().map(|order| order.uuid).collect();
        assert_eq!(uuids, vec![second.uuid, first.uuid], "newest first");

        assert_eq!(ctx.orders.list_all_orders(&admin, None).await?.len(), 3);

        ctx.orders
            .update_order_status(&admin, first.uuid, OrderStatus::Confirmed)
            .await?;

        let confirmed = ctx
            .orders
            .list_all_orders(&admin, Some(OrderStatus::Confirmed))
            .await?;
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].uuid, first.uuid);

        let fetched = ctx.orders.get_order(&admin, second.uuid).await?;
        assert_eq!(fetched.number, second.number);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = admin(&ctx).await?;

        let result = ctx.orders.get_order(&admin, OrderUuid::new()).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn status_change_is_published_with_previous_status() -> TestResult {
        let ctx = TestContext::new().await;
        let admin = admin(&ctx).await?;
        let product = create_product(&ctx, "Margherita", 10_00, 10).await?;
        let order = place_order(&ctx, &guest("guest-a"), product.uuid, 1).await?;

        let mut events = MockOrderEvents::new();
        events
            .expect_status_changed()
            .withf(|order, previous| {
                *previous == OrderStatus::Pending && order.status == OrderStatus::Confirmed
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = PgOrdersService::new(ctx.app_db(), Arc::new(events), StatusPolicy::default());

        service
            .update_order_status(&admin, order.uuid, OrderStatus::Confirmed)
            .await?;

        Ok(())
    }
}
