//! Configuration management for the Opsline inventory backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with OPSLINE__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Kitchen refill behaviour
    pub refill: RefillConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefillConfig {
    /// Reject a refill inside its transaction when locked stock is insufficient
    pub enforce_stock_check: bool,

    /// Decimal places kept on computed raw-material quantities
    pub quantity_scale: u32,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("OPSLINE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::builder(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (OPSLINE__ prefix)
            .add_source(
                Environment::with_prefix("OPSLINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Config>()?;

        config.validate()?;
        Ok(config)
    }

    /// Builder pre-populated with default values
    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("refill.enforce_stock_check", true)?
            .set_default("refill.quantity_scale", shared::DEFAULT_QUANTITY_SCALE as i64)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        shared::validate_quantity_scale(self.refill.quantity_scale)
            .map_err(|msg| ConfigError::Message(format!("refill.quantity_scale: {}", msg)))?;
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Message(
                "database.min_connections must not exceed database.max_connections".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RefillConfig {
    fn default() -> Self {
        Self {
            enforce_stock_check: true,
            quantity_scale: shared::DEFAULT_QUANTITY_SCALE,
        }
    }
}
