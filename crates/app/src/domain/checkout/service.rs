//! Checkout service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use crate::{
    database::Db,
    domain::{
        carts::repository::PgCartsRepository,
        checkout::{
            data::{CheckoutRequest, ORDER_NOTES_MAX_CHARS},
            errors::CheckoutServiceError,
            quote::{Quote, estimated_delivery_at, required_stock, snapshot_items},
        },
        coupons::{records::CouponRecord, repository::PgCouponsRepository, service::evaluate_coupon},
        events::{OrderEvents, publish_created},
        identity::Identity,
        orders::{
            data::NewOrder,
            numbers::{day_prefix, format_order_number, next_sequence, order_date},
            records::{OrderRecord, OrderType, OrderUuid},
            repository::PgOrdersRepository,
        },
        pricing::PricingSettings,
        products::{records::ProductUuid, repository::PgProductsRepository},
    },
};

/// Order number attempts before giving up on a busy day.
const ORDER_NUMBER_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct PgCheckoutService {
    db: Db,
    carts_repository: PgCartsRepository,
    products_repository: PgProductsRepository,
    coupons_repository: PgCouponsRepository,
    orders_repository: PgOrdersRepository,
    events: Arc<dyn OrderEvents>,
    pricing: PricingSettings,
}

impl PgCheckoutService {
    #[must_use]
    pub fn new(db: Db, events: Arc<dyn OrderEvents>, pricing: PricingSettings) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            products_repository: PgProductsRepository::new(),
            coupons_repository: PgCouponsRepository::new(),
            orders_repository: PgOrdersRepository::new(),
            events,
            pricing,
        }
    }

    /// Check live availability and stock for every product in the order.
    async fn check_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        required: &[(ProductUuid, u64)],
    ) -> Result<(), CheckoutServiceError> {
        for &(product, quantity) in required {
            let record = self
                .products_repository
                .find_product(tx, product)
                .await?
                .ok_or(CheckoutServiceError::ProductNotFound { product })?;

            if !record.available {
                return Err(CheckoutServiceError::ProductUnavailable {
                    product,
                    name: record.name,
                });
            }

            if !record.can_supply(quantity) {
                return Err(CheckoutServiceError::InsufficientStock {
                    product,
                    name: record.name,
                    available: record.stock,
                });
            }
        }

        Ok(())
    }

    /// Insert the order under the next free number for today.
    async fn insert_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
        now: Timestamp,
    ) -> Result<OrderRecord, CheckoutServiceError> {
        let prefix = day_prefix(order_date(now));

        let latest = self
            .orders_repository
            .latest_order_number(tx, &prefix)
            .await?;

        let mut sequence = next_sequence(&prefix, latest.as_deref());

        for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
            let number = format_order_number(&prefix, sequence);

            if let Some(created) = self.orders_repository.create_order(tx, &number, order).await? {
                return Ok(created);
            }

            debug!(%number, attempt, "order number taken, retrying");

            sequence = sequence.saturating_add(1);
        }

        Err(CheckoutServiceError::OrderNumberExhausted)
    }

    /// Take stock for every product, failing if a concurrent order got there first.
    async fn deduct_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        required: &[(ProductUuid, u64)],
    ) -> Result<(), CheckoutServiceError> {
        for &(product, quantity) in required {
            if self
                .products_repository
                .deduct_stock(tx, product, quantity)
                .await?
            {
                continue;
            }

            let record = self
                .products_repository
                .find_product(tx, product)
                .await?
                .ok_or(CheckoutServiceError::ProductNotFound { product })?;

            return Err(CheckoutServiceError::InsufficientStock {
                product,
                name: record.name,
                available: record.stock,
            });
        }

        Ok(())
    }
}

fn validate_request(request: &CheckoutRequest) -> Result<(), CheckoutServiceError> {
    if request.order_type == OrderType::Delivery && request.address().is_none() {
        return Err(CheckoutServiceError::MissingDeliveryAddress);
    }

    if request
        .notes
        .as_deref()
        .is_some_and(|notes| notes.chars().count() > ORDER_NOTES_MAX_CHARS)
    {
        return Err(CheckoutServiceError::NotesTooLong);
    }

    Ok(())
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.checkout",
        skip(self, request),
        fields(
            owner = %owner,
            order_type = %request.order_type,
            payment_method = %request.payment_method,
            coupon = request.coupon().is_some(),
        ),
        err
    )]
    async fn checkout(
        &self,
        owner: &Identity,
        request: CheckoutRequest,
    ) -> Result<OrderRecord, CheckoutServiceError> {
        validate_request(&request)?;

        let now = Timestamp::now();

        let mut tx = self.db.begin_transaction().await?;

        let mut cart = self
            .carts_repository
            .lock_cart(&mut tx, owner)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(CheckoutServiceError::EmptyCart)?;

        let items = snapshot_items(&cart);
        let required = required_stock(&items);

        self.check_stock(&mut tx, &required).await?;

        let mut quote = Quote::for_items(&items, request.order_type, &self.pricing)?;

        let mut coupon: Option<CouponRecord> = None;

        if let Some(code) = request.coupon() {
            let (record, discount) = evaluate_coupon(
                &self.coupons_repository,
                &mut tx,
                code,
                quote.subtotal,
                owner.user(),
                now,
            )
            .await??;

            quote = quote.with_discount(discount)?;
            coupon = Some(record);
        }

        let new_order = NewOrder {
            uuid: OrderUuid::new(),
            owner: owner.clone(),
            items,
            order_type: request.order_type,
            payment_method: request.payment_method,
            delivery_address: match request.order_type {
                OrderType::Delivery => request.address().map(str::to_string),
                OrderType::Pickup => None,
            },
            notes: request.notes.filter(|notes| !notes.trim().is_empty()),
            subtotal: quote.subtotal,
            tax: quote.tax,
            delivery_fee: quote.delivery_fee,
            discount: quote.discount,
            total: quote.total,
            coupon_code: coupon.as_ref().map(|coupon| coupon.code.clone()),
            estimated_delivery_at: estimated_delivery_at(now, request.order_type, &self.pricing),
        };

        let order = self.insert_order(&mut tx, &new_order, now).await?;

        if let Some(coupon) = &coupon {
            self.coupons_repository
                .consume(&mut tx, coupon, owner.user())
                .await??;
        }

        self.deduct_stock(&mut tx, &required).await?;

        cart.clear();
        self.carts_repository.save_cart(&mut tx, &cart).await?;

        tx.commit().await?;

        info!(
            order_uuid = %order.uuid,
            number = %order.number,
            total = order.total,
            "order placed"
        );

        publish_created(self.events.as_ref(), &order).await;

        Ok(order)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Turn the owner's cart into a pending order.
    ///
    /// Stock is re-checked against the live catalog, totals are computed from
    /// the frozen item snapshot, and the coupon (if any) is redeemed. The order
    /// insert, coupon redemption, stock deduction and cart clear commit together.
    async fn checkout(
        &self,
        owner: &Identity,
        request: CheckoutRequest,
    ) -> Result<OrderRecord, CheckoutServiceError>;
}
