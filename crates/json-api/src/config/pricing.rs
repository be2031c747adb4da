//! Store Config

use clap::Args;
use jiff::SignedDuration;
use pizzeria_app::{
    context::{AppSettings, DEFAULT_EVENT_CAPACITY},
    domain::{orders::status::StatusPolicy, pricing::PricingSettings},
};
use rust_decimal::Decimal;
use thiserror::Error;

/// Invalid store settings.
#[derive(Debug, Error)]
pub(crate) enum StoreConfigError {
    /// The tax rate is negative.
    #[error("tax rate must not be negative")]
    NegativeTaxRate,

    /// The delivery fee has more than two decimal places or is negative.
    #[error("delivery fee must be a non-negative amount with at most two decimals")]
    InvalidDeliveryFee,
}

/// Pricing and order workflow settings.
#[derive(Debug, Args)]
pub struct StoreConfig {
    /// Tax charged on the subtotal, as a fraction (0.10 is 10%)
    #[arg(long, env = "TAX_RATE", default_value = "0.10")]
    pub tax_rate: Decimal,

    /// Flat fee added to delivery orders
    #[arg(long, env = "DELIVERY_FEE", default_value = "5.00")]
    pub delivery_fee: Decimal,

    /// Minutes until a delivery order should arrive
    #[arg(long, env = "DELIVERY_LEAD_MINUTES", default_value_t = 45)]
    pub delivery_lead_minutes: u32,

    /// Minutes until a pickup order should be ready
    #[arg(long, env = "PICKUP_LEAD_MINUTES", default_value_t = 20)]
    pub pickup_lead_minutes: u32,

    /// Let admins cancel orders that are already ready
    #[arg(long, env = "ADMIN_MAY_CANCEL_READY", default_value_t = false)]
    pub admin_may_cancel_ready: bool,

    /// Buffered order events per real-time subscriber
    #[arg(long, env = "ORDER_EVENT_CAPACITY", default_value_t = DEFAULT_EVENT_CAPACITY)]
    pub order_event_capacity: usize,
}

impl StoreConfig {
    /// Build the application settings these flags describe.
    pub(crate) fn app_settings(&self, run_migrations: bool) -> Result<AppSettings, StoreConfigError> {
        if self.tax_rate.is_sign_negative() {
            return Err(StoreConfigError::NegativeTaxRate);
        }

        let delivery_fee = crate::money::to_minor(self.delivery_fee)
            .ok_or(StoreConfigError::InvalidDeliveryFee)?;

        Ok(AppSettings {
            pricing: PricingSettings {
                tax_rate: self.tax_rate,
                delivery_fee,
                delivery_lead_time: SignedDuration::from_mins(i64::from(
                    self.delivery_lead_minutes,
                )),
                pickup_lead_time: SignedDuration::from_mins(i64::from(self.pickup_lead_minutes)),
            },
            status_policy: StatusPolicy {
                admin_may_cancel_ready: self.admin_may_cancel_ready,
            },
            event_capacity: self.order_event_capacity,
            run_migrations,
        })
    }
}
