//! Test Helpers

use jiff::{Timestamp, ToSpan};
use rust_decimal::Decimal;
use smallvec::smallvec;
use testresult::TestResult;

use crate::{
    auth::{AuthServiceError, NewUser, Role, UserUuid},
    domain::{
        carts::{CartsService, data::NewCartItem},
        checkout::{CheckoutService, data::CheckoutRequest},
        coupons::{
            data::NewCoupon,
            records::{CouponDiscount, CouponUuid},
        },
        identity::{GuestSession, Identity},
        orders::{
            records::{OrderItemRecord, OrderRecord, OrderType, OrderUuid, PaymentMethod, PaymentStatus},
            status::OrderStatus,
        },
        products::{
            ProductsService, ProductsServiceError,
            data::NewProduct,
            records::{CustomizationPrices, ProductRecord, ProductUuid, Size, SizePrices},
        },
    },
    test::TestContext,
};

pub(crate) fn new_product(name: &str, base_price: u64, stock: u64) -> NewProduct {
    NewProduct {
        uuid: ProductUuid::new(),
        name: name.to_string(),
        description: None,
        category: "pizza".to_string(),
        base_price,
        sizes: SizePrices::default(),
        customizations: CustomizationPrices::default(),
        available: true,
        stock,
    }
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    name: &str,
    base_price: u64,
    stock: u64,
) -> Result<ProductRecord, ProductsServiceError> {
    ctx.products
        .create_product(new_product(name, base_price, stock))
        .await
}

pub(crate) async fn create_user(ctx: &TestContext, role: Role) -> Result<UserUuid, AuthServiceError> {
    let user = ctx
        .auth
        .create_user(NewUser {
            uuid: UserUuid::new(),
            name: "Test User".to_string(),
            role,
        })
        .await?;

    Ok(user.uuid)
}

pub(crate) fn guest(session: &str) -> Identity {
    Identity::Guest(GuestSession::parse(session).expect("valid guest session"))
}

pub(crate) fn new_item(product_uuid: ProductUuid, quantity: u32) -> NewCartItem {
    NewCartItem {
        product_uuid,
        quantity,
        size: Size::Medium,
        customizations: smallvec![],
        notes: None,
    }
}

/// An active 20% coupon, one use per user, valid for the next hour.
pub(crate) fn new_coupon(code: &str) -> TestResult<NewCoupon> {
    let now = Timestamp::now();

    Ok(NewCoupon {
        uuid: CouponUuid::new(),
        code: code.to_string(),
        description: None,
        discount: CouponDiscount::Percentage {
            percent: Decimal::from(20),
            max_discount: None,
        },
        min_order_amount: 0,
        usage_limit: None,
        per_user_limit: 1,
        active: true,
        valid_from: now.checked_sub(1.hour())?,
        valid_until: now.checked_add(1.hour())?,
    })
}

pub(crate) fn pickup() -> CheckoutRequest {
    CheckoutRequest {
        order_type: OrderType::Pickup,
        payment_method: PaymentMethod::Cash,
        delivery_address: None,
        notes: None,
        coupon_code: None,
    }
}

pub(crate) fn delivery(address: &str) -> CheckoutRequest {
    CheckoutRequest {
        order_type: OrderType::Delivery,
        payment_method: PaymentMethod::Card,
        delivery_address: Some(address.to_string()),
        notes: None,
        coupon_code: None,
    }
}

/// Put `quantity` of `product` in the owner's cart and check out for pickup.
pub(crate) async fn place_order(
    ctx: &TestContext,
    owner: &Identity,
    product: ProductUuid,
    quantity: u32,
) -> TestResult<OrderRecord> {
    ctx.carts.add_item(owner, new_item(product, quantity)).await?;

    Ok(ctx.checkout.checkout(owner, pickup()).await?)
}

/// An in-memory pending order for tests that never touch the database.
pub(crate) fn sample_order() -> OrderRecord {
    let now = Timestamp::now();

    OrderRecord {
        uuid: OrderUuid::new(),
        number: "PZ-20260307-0001".to_string(),
        owner: guest("guest-a"),
        items: vec![OrderItemRecord {
            product_uuid: ProductUuid::new(),
            name: "Margherita".to_string(),
            size: Size::Medium,
            quantity: 2,
            unit_price: 10_00,
            customizations: smallvec![],
            notes: None,
        }],
        order_type: OrderType::Pickup,
        payment_method: PaymentMethod::Cash,
        payment_status: PaymentStatus::Pending,
        status: OrderStatus::Pending,
        delivery_address: None,
        notes: None,
        subtotal: 20_00,
        tax: 2_00,
        delivery_fee: 0,
        discount: 0,
        total: 22_00,
        coupon_code: None,
        estimated_delivery_at: now,
        delivered_at: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    }
}
