//! Pricing a cart for checkout.
//!
//! Everything here is pure: the service feeds in the locked cart and live
//! catalog data, and persists what comes out.

use jiff::Timestamp;
use rustc_hash::FxHashMap;

use crate::domain::{
    carts::records::CartRecord,
    orders::records::{OrderItemRecord, OrderType},
    pricing::{PricingError, PricingSettings, rate_of_minor},
    products::records::ProductUuid,
};

/// Amounts for an order, computed from its item snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quote {
    pub subtotal: u64,
    pub tax: u64,
    pub delivery_fee: u64,
    pub discount: u64,
    pub total: u64,
}

impl Quote {
    /// Price `items` for an order of `order_type`, before any discount.
    ///
    /// # Errors
    ///
    /// Returns an error if the tax rate is negative or an amount overflows.
    pub fn for_items(
        items: &[OrderItemRecord],
        order_type: OrderType,
        settings: &PricingSettings,
    ) -> Result<Self, PricingError> {
        let subtotal = items.iter().try_fold(0_u64, |subtotal, item| {
            subtotal
                .checked_add(item.line_total()?)
                .ok_or(PricingError::Overflow)
        })?;

        let tax = rate_of_minor(settings.tax_rate, subtotal)?;

        let delivery_fee = match order_type {
            OrderType::Delivery => settings.delivery_fee,
            OrderType::Pickup => 0,
        };

        let mut quote = Self {
            subtotal,
            tax,
            delivery_fee,
            discount: 0,
            total: 0,
        };

        quote.total = quote.gross()?;

        Ok(quote)
    }

    /// Apply a discount. The total never drops below zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the amounts overflow.
    pub fn with_discount(self, discount: u64) -> Result<Self, PricingError> {
        Ok(Self {
            discount,
            total: self.gross()?.saturating_sub(discount),
            ..self
        })
    }

    fn gross(&self) -> Result<u64, PricingError> {
        self.subtotal
            .checked_add(self.tax)
            .and_then(|amount| amount.checked_add(self.delivery_fee))
            .ok_or(PricingError::Overflow)
    }
}

/// Freeze the cart's lines into order items.
#[must_use]
pub fn snapshot_items(cart: &CartRecord) -> Vec<OrderItemRecord> {
    cart.items.iter().map(OrderItemRecord::from).collect()
}

/// Total quantity per product across all lines, in product order.
///
/// Sorting gives concurrent checkouts a consistent row lock order.
#[must_use]
pub fn required_stock(items: &[OrderItemRecord]) -> Vec<(ProductUuid, u64)> {
    let mut totals: FxHashMap<ProductUuid, u64> = FxHashMap::default();

    for item in items {
        let total = totals.entry(item.product_uuid).or_default();
        *total = total.saturating_add(u64::from(item.quantity));
    }

    let mut required: Vec<_> = totals.into_iter().collect();
    required.sort_unstable_by_key(|(product, _)| *product);

    required
}

/// When a new order should be ready, from the configured lead times.
#[must_use]
pub fn estimated_delivery_at(
    now: Timestamp,
    order_type: OrderType,
    settings: &PricingSettings,
) -> Timestamp {
    let lead_time = match order_type {
        OrderType::Delivery => settings.delivery_lead_time,
        OrderType::Pickup => settings.pickup_lead_time,
    };

    now.saturating_add(lead_time).unwrap_or(now)
}
