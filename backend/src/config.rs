//! Configuration management for the Inventory Back-Office service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with IBO_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Background product status re-evaluation
    pub status_monitor: StatusMonitorConfig,

    /// Invoice terms
    pub invoice: InvoiceConfig,

    /// Business details printed on invoices
    pub business: BusinessConfig,

    /// Static product images
    pub uploads: UploadsConfig,
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
pub struct StatusMonitorConfig {
    /// Start the monitor on boot
    pub enabled: bool,

    /// Seconds between checks
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InvoiceConfig {
    /// Days between order date and due date
    pub due_days: i64,

    /// Tax rate as a whole percentage
    pub tax_rate_percent: Decimal,

    pub payment_terms: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BusinessConfig {
    pub name: String,
    pub address: String,
    pub tax_id: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    /// Directory served under /uploads
    pub dir: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("IBO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("status_monitor.enabled", true)?
            .set_default("status_monitor.interval_secs", 86_400)?
            .set_default("invoice.due_days", 15)?
            .set_default("invoice.tax_rate_percent", "15")?
            .set_default(
                "invoice.payment_terms",
                "Please pay within 15 days of receiving this invoice.",
            )?
            .set_default("business.name", "Your Business Name")?
            .set_default("business.address", "City, State, PIN - 000 000")?
            .set_default("business.tax_id", "TAX ID 000000XX1234000XX")?
            .set_default("business.phone", "+91 00000 00000")?
            .set_default("business.email", "hello@email.com")?
            .set_default("uploads.dir", "uploads")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IBO_ prefix)
            .add_source(
                Environment::with_prefix("IBO")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
