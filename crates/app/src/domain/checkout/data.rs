//! Checkout Data

use crate::domain::orders::records::{OrderType, PaymentMethod};

/// Longest order note accepted at checkout, in characters.
pub const ORDER_NOTES_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub coupon_code: Option<String>,
}

impl CheckoutRequest {
    /// The delivery address trimmed, or `None` when blank.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.delivery_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
    }

    /// The coupon code if one was actually supplied.
    #[must_use]
    pub fn coupon(&self) -> Option<&str> {
        self.coupon_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }
}
