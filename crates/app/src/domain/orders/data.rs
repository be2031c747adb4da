//! Order Data

use jiff::Timestamp;

use crate::domain::{
    identity::Identity,
    orders::records::{OrderItemRecord, OrderType, OrderUuid, PaymentMethod},
};

/// Everything needed to persist a freshly checked-out order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub owner: Identity,
    pub items: Vec<OrderItemRecord>,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub subtotal: u64,
    pub tax: u64,
    pub delivery_fee: u64,
    pub discount: u64,
    pub total: u64,
    pub coupon_code: Option<String>,
    pub estimated_delivery_at: Timestamp,
}
