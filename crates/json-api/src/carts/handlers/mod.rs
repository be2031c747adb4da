//! Cart Handlers

use rust_decimal::Decimal;
use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pizzeria_app::domain::carts::records::{CartItemRecord, CartRecord, Customization};

use crate::money::to_decimal;

pub(crate) mod clear;
pub(crate) mod get;
pub(crate) mod merge;

/// A paid extra on a cart or order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CustomizationPayload {
    pub name: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub price: Decimal,
}

impl From<&Customization> for CustomizationPayload {
    fn from(customization: &Customization) -> Self {
        Self {
            name: customization.name.clone(),
            price: to_decimal(customization.price),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartItemResponse {
    pub uuid: Uuid,

    pub product_uuid: Uuid,

    /// Product name when the item was added
    pub name: String,

    pub size: String,

    pub quantity: u32,

    /// Size price when the item was added
    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub unit_price: Decimal,

    pub customizations: Vec<CustomizationPayload>,

    /// `(unit_price + customizations) * quantity`
    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub line_total: Decimal,

    pub notes: Option<String>,
}

impl From<&CartItemRecord> for CartItemResponse {
    fn from(item: &CartItemRecord) -> Self {
        Self {
            uuid: item.uuid.into(),
            product_uuid: item.product_uuid.into(),
            name: item.name.clone(),
            size: item.size.to_string(),
            quantity: item.quantity,
            unit_price: to_decimal(item.unit_price),
            customizations: item.customizations.iter().map(Into::into).collect(),
            // Totals already validated when the cart was priced.
            line_total: to_decimal(item.line_total().unwrap_or_default()),
            notes: item.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CartResponse {
    pub uuid: Uuid,

    pub items: Vec<CartItemResponse>,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub subtotal: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub tax: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    #[salvo(schema(value_type = f64))]
    pub total: Decimal,

    pub updated_at: String,
}

impl From<CartRecord> for CartResponse {
    fn from(cart: CartRecord) -> Self {
        Self {
            uuid: cart.uuid.into(),
            items: cart.items.iter().map(Into::into).collect(),
            subtotal: to_decimal(cart.subtotal),
            tax: to_decimal(cart.tax),
            total: to_decimal(cart.total),
            updated_at: cart.updated_at.to_string(),
        }
    }
}
