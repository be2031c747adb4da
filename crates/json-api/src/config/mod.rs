//! Server configuration module

use clap::Parser;

use crate::config::{
    db::DatabaseConfig,
    logging::LoggingConfig,
    observability::ObservabilityConfig,
    pricing::StoreConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod db;
pub(crate) mod logging;
pub(crate) mod observability;
pub(crate) mod pricing;
pub(crate) mod server;

pub(crate) use logging::LogFormat;

/// Pizzeria JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "pizzeria-json", about = "Pizzeria JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Pricing and order workflow settings.
    #[command(flatten)]
    pub store: StoreConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_with_only_a_database_url() -> Result<(), clap::Error> {
        let config =
            ServerConfig::try_parse_from(["pizzeria-json", "--database-url", "postgres://db"])?;

        assert_eq!(config.socket_addr(), "0.0.0.0:8698");
        assert_eq!(config.database.database_url, "postgres://db");
        assert!(!config.database.run_migrations);
        assert!(!config.observability.otel_enabled);
        assert!(!config.store.admin_may_cancel_ready);
        assert_eq!(config.logging.log_format, LogFormat::Compact);
        assert_eq!(config.server.shutdown_grace().as_secs(), 30);

        Ok(())
    }
}
