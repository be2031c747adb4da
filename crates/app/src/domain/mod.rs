//! Pizzeria domain services.

pub mod carts;
pub mod checkout;
pub mod coupons;
pub mod events;
pub mod identity;
pub mod orders;
pub mod pricing;
pub mod products;
