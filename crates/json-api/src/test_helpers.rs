//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use pizzeria_app::{
    auth::{MockAuthService, Role, UserUuid},
    context::AppContext,
    domain::{
        carts::{
            MockCartsService,
            records::{CartItemRecord, CartItemUuid, CartRecord, CartUuid, Customizations},
        },
        checkout::MockCheckoutService,
        coupons::{
            MockCouponsService,
            records::{CouponDiscount, CouponRecord, CouponUuid},
        },
        events::BroadcastOrderEvents,
        identity::{Actor, GuestSession, Identity},
        orders::{
            MockOrdersService,
            records::{
                OrderItemRecord, OrderRecord, OrderType, OrderUuid, PaymentMethod, PaymentStatus,
            },
            status::OrderStatus,
        },
        products::{
            MockProductsService,
            records::{ProductRecord, ProductUuid, Size},
        },
    },
};
use rust_decimal::Decimal;
use salvo::{affix_state::inject, prelude::*};
use uuid::Uuid;

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::from_u128(1));
pub(crate) const TEST_ADMIN_UUID: UserUuid = UserUuid::from_uuid(Uuid::from_u128(2));
pub(crate) const TEST_SESSION_ID: &str = "guest-session-1";

/// Who the injected request identity is.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Caller {
    Customer,
    Admin,
    Guest,
}

impl Caller {
    pub(crate) fn actor(self) -> Actor {
        match self {
            Self::Customer => Actor::user(TEST_USER_UUID, Role::Customer),
            Self::Admin => Actor::user(TEST_ADMIN_UUID, Role::Admin),
            Self::Guest => Actor::guest(guest_session()),
        }
    }

    pub(crate) fn identity(self) -> Identity {
        self.actor().identity
    }
}

pub(crate) fn guest_session() -> GuestSession {
    GuestSession::parse(TEST_SESSION_ID).unwrap_or_else(|_| unreachable!("valid test session"))
}

#[salvo::handler]
pub(crate) async fn inject_customer(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_actor(Caller::Customer.actor());
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_actor(Caller::Admin.actor());
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_guest(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_actor(Caller::Guest.actor());
    ctrl.call_next(req, depot, res).await;
}

/// Service mocks. Any call without a matching expectation fails the test.
#[derive(Default)]
pub(crate) struct Mocks {
    pub(crate) products: MockProductsService,
    pub(crate) carts: MockCartsService,
    pub(crate) coupons: MockCouponsService,
    pub(crate) orders: MockOrdersService,
    pub(crate) checkout: MockCheckoutService,
    pub(crate) auth: MockAuthService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            products: Arc::new(self.products),
            carts: Arc::new(self.carts),
            coupons: Arc::new(self.coupons),
            orders: Arc::new(self.orders),
            checkout: Arc::new(self.checkout),
            auth: Arc::new(self.auth),
            order_events: BroadcastOrderEvents::new(16),
        })
    }
}

/// Serve `route` with `mocks` as the application and `caller` as the identity.
pub(crate) fn service_as(caller: Caller, mocks: Mocks, route: Router) -> Service {
    let router = Router::new().hoop(inject(mocks.into_state()));

    let router = match caller {
        Caller::Customer => router.hoop(inject_customer),
        Caller::Admin => router.hoop(inject_admin),
        Caller::Guest => router.hoop(inject_guest),
    };

    Service::new(router.push(route))
}

pub(crate) fn make_product(uuid: ProductUuid) -> ProductRecord {
    ProductRecord {
        uuid,
        name: "Margherita".to_string(),
        description: Some("Tomato, mozzarella, basil".to_string()),
        category: "pizza".to_string(),
        base_price: 10_00,
        sizes: [(Size::Large, 14_00)].into_iter().collect(),
        customizations: [("olives".to_string(), 50), ("basil".to_string(), 25)]
            .into_iter()
            .collect(),
        available: true,
        stock: 20,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
        deleted_at: None,
    }
}

pub(crate) fn make_cart(owner: Identity) -> CartRecord {
    CartRecord {
        uuid: CartUuid::new(),
        owner,
        items: Vec::new(),
        subtotal: 0,
        tax: 0,
        total: 0,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

/// A cart holding two medium Margheritas at `2.99`.
pub(crate) fn make_filled_cart(owner: Identity, item: CartItemUuid) -> CartRecord {
    CartRecord {
        items: vec![CartItemRecord {
            uuid: item,
            product_uuid: ProductUuid::new(),
            name: "Margherita".to_string(),
            size: Size::Medium,
            quantity: 2,
            unit_price: 2_99,
            customizations: Customizations::new(),
            notes: None,
        }],
        subtotal: 5_98,
        tax: 60,
        total: 6_58,
        ..make_cart(owner)
    }
}

pub(crate) fn make_order(uuid: OrderUuid, owner: Identity) -> OrderRecord {
    OrderRecord {
        uuid,
        number: "PZ-20260101-0001".to_string(),
        owner,
        items: vec![OrderItemRecord {
            product_uuid: ProductUuid::new(),
            name: "Margherita".to_string(),
            size: Size::Medium,
            quantity: 2,
            unit_price: 299_00,
            customizations: Customizations::new(),
            notes: None,
        }],
        order_type: OrderType::Delivery,
        payment_method: PaymentMethod::Cash,
        payment_status: PaymentStatus::Pending,
        status: OrderStatus::Pending,
        delivery_address: Some("1 Main St".to_string()),
        notes: None,
        subtotal: 598_00,
        tax: 59_80,
        delivery_fee: 50_00,
        discount: 0,
        total: 707_80,
        coupon_code: None,
        estimated_delivery_at: Timestamp::UNIX_EPOCH,
        delivered_at: None,
        cancelled_at: None,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_coupon(uuid: CouponUuid) -> CouponRecord {
    CouponRecord {
        uuid,
        code: "SAVE10".to_string(),
        description: None,
        discount: CouponDiscount::Percentage {
            percent: Decimal::TEN,
            max_discount: Some(20_00),
        },
        min_order_amount: 0,
        usage_limit: Some(100),
        used_count: 0,
        per_user_limit: 1,
        active: true,
        valid_from: Timestamp::UNIX_EPOCH,
        valid_until: Timestamp::MAX,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}
