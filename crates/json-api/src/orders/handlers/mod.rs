//! Order Handlers

use std::string::ToString;

use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pizzeria_app::domain::orders::records::{OrderItemRecord, OrderRecord};

use crate::{carts::CustomizationPayload, money::to_decimal};

pub(crate) mod cancel;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod status;

/// A line frozen at checkout.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub product_uuid: Uuid,

    pub name: String,

    pub size: String,

    pub quantity: u32,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub unit_price: Decimal,

    pub customizations: Vec<CustomizationPayload>,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub line_total: Decimal,

    pub notes: Option<String>,
}

impl From<&OrderItemRecord> for OrderItemResponse {
    fn from(item: &OrderItemRecord) -> Self {
        Self {
            product_uuid: item.product_uuid.into(),
            name: item.name.clone(),
            size: item.size.to_string(),
            quantity: item.quantity,
            unit_price: to_decimal(item.unit_price),
            customizations: item.customizations.iter().map(Into::into).collect(),
            line_total: to_decimal(item.line_total().unwrap_or_default()),
            notes: item.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub uuid: Uuid,

    /// Human readable number, `PZ-YYYYMMDD-NNNN`
    pub number: String,

    /// Owning user, absent for guest orders
    pub user_uuid: Option<Uuid>,

    pub items: Vec<OrderItemResponse>,

    /// `delivery` or `pickup`
    pub order_type: String,

    /// `cash`, `card` or `online`
    pub payment_method: String,

    /// `pending` or `paid`
    pub payment_status: String,

    /// `pending`, `confirmed`, `preparing`, `ready`, `delivered` or `cancelled`
    pub status: String,

    pub delivery_address: Option<String>,

    pub notes: Option<String>,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub subtotal: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub tax: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub delivery_fee: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub discount: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub total: Decimal,

    pub coupon_code: Option<String>,

    pub estimated_delivery_at: String,

    pub delivered_at: Option<String>,

    pub cancelled_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

impl From<OrderRecord> for OrderResponse {
    fn from(order: OrderRecord) -> Self {
        Self {
            uuid: order.uuid.into(),
            number: order.number,
            user_uuid: order.owner.user().map(Into::into),
            items: order.items.iter().map(Into::into).collect(),
            order_type: order.order_type.to_string(),
            payment_method: order.payment_method.to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            status: order.status.to_string(),
            delivery_address: order.delivery_address,
            notes: order.notes,
            subtotal: to_decimal(order.subtotal),
            tax: to_decimal(order.tax),
            delivery_fee: to_decimal(order.delivery_fee),
            discount: to_decimal(order.discount),
            total: to_decimal(order.total),
            coupon_code: order.coupon_code,
            estimated_delivery_at: order.estimated_delivery_at.to_string(),
            delivered_at: order.delivered_at.as_ref().map(ToString::to_string),
            cancelled_at: order.cancelled_at.as_ref().map(ToString::to_string),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    /// Newest first
    pub orders: Vec<OrderResponse>,
}
