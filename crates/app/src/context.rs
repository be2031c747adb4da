//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        checkout::{CheckoutService, PgCheckoutService},
        coupons::{CouponsService, PgCouponsService},
        events::{BroadcastOrderEvents, FanoutOrderEvents, LogOrderEvents, OrderEvents},
        orders::{OrdersService, PgOrdersService, status::StatusPolicy},
        pricing::PricingSettings,
        products::{PgProductsService, ProductsService},
    },
};

/// Buffered order events per real-time subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to run database migrations")]
    Migrate(#[source] sqlx::migrate::MigrateError),
}

/// Tunables shared by the services.
#[derive(Debug, Clone, Copy)]
pub struct AppSettings {
    pub pricing: PricingSettings,
    pub status_policy: StatusPolicy,
    pub event_capacity: usize,
    pub run_migrations: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            pricing: PricingSettings::default(),
            status_policy: StatusPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            run_migrations: false,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub coupons: Arc<dyn CouponsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub auth: Arc<dyn AuthService>,

    /// Real-time order feed; call `subscribe` to listen.
    pub order_events: BroadcastOrderEvents,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or migrating fails.
    pub async fn from_database_url(url: &str, settings: AppSettings) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        if settings.run_migrations {
            database::migrate(&pool)
                .await
                .map_err(AppInitError::Migrate)?;
        }

        let db = Db::new(pool.clone());

        let order_events = BroadcastOrderEvents::new(settings.event_capacity);

        let events: Arc<dyn OrderEvents> = Arc::new(FanoutOrderEvents::new(vec![
            Arc::new(LogOrderEvents),
            Arc::new(order_events.clone()),
        ]));

        Ok(Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone(), settings.pricing)),
            coupons: Arc::new(PgCouponsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(
                db.clone(),
                Arc::clone(&events),
                settings.status_policy,
            )),
            checkout: Arc::new(PgCheckoutService::new(db, events, settings.pricing)),
            auth: Arc::new(PgAuthService::new(pool)),
            order_events,
        })
    }
}
