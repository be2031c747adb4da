//! Checkout

pub mod data;
pub mod errors;
pub mod quote;
pub mod service;

pub use errors::CheckoutServiceError;
pub use service::*;
