//! Server configuration.
//!
//! ## Load Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. .env file (dotenvy, optional)                                       │
//! │  2. Built-in defaults                                                   │
//! │  3. TOML file: $POTU_CONFIG or ./potu.toml (optional)                   │
//! │  4. Environment: POTU_PORT, POTU_DATABASE_PATH, POTU_SMTP__HOST ...     │
//! │                                                                         │
//! │  Later sources override earlier ones.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::env;
use std::net::SocketAddr;

use config::{Config, Environment, File};
use potu_core::TaxRate;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "potu.toml";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind, e.g. `0.0.0.0`
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Shop details printed on invoices and emails
    pub store: StoreInfo,

    /// Outgoing mail. Notifications are disabled when absent.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

/// The shop as it appears on invoices.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreInfo {
    pub name: String,
    pub tagline: String,
    pub address_lines: Vec<String>,
    pub email: String,
    pub currency: String,
    /// VAT shown on invoices. Never stored on orders.
    pub tax_rate_bps: u32,
    /// Offset applied to invoice dates, in hours east of UTC.
    pub utc_offset_hours: i32,
}

impl StoreInfo {
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: "HEY POTU".to_string(),
            tagline: "Point of Sale System".to_string(),
            address_lines: vec![
                "House 26, Road 13, Sector 14, Uttara".to_string(),
                "Dhaka - 1230, Bangladesh".to_string(),
            ],
            email: "heypotu@gmail.com".to_string(),
            currency: "BDT".to_string(),
            tax_rate_bps: potu_core::DEFAULT_VAT_BPS,
            utc_offset_hours: 6,
        }
    }
}

/// SMTP relay settings (STARTTLS).
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    /// Display name on outgoing mail and invoice subjects
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Hey Potu POS".to_string()
}

impl ServerConfig {
    /// Loads configuration from `.env`, defaults, the optional TOML file
    /// and `POTU_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();

        let file = env::var("POTU_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let store = StoreInfo::default();

        let config = Config::builder()
            .set_default("bind_addr", "0.0.0.0")?
            .set_default("port", 5000)?
            .set_default("database_path", "./potu.db")?
            .set_default("store.name", store.name)?
            .set_default("store.tagline", store.tagline)?
            .set_default("store.address_lines", store.address_lines)?
            .set_default("store.email", store.email)?
            .set_default("store.currency", store.currency)?
            .set_default("store.tax_rate_bps", store.tax_rate_bps)?
            .set_default("store.utc_offset_hours", store.utc_offset_hours)?
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("POTU")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(";")
                    .with_list_parse_key("store.address_lines")
                    .try_parsing(true),
            )
            .build()?;

        let server: ServerConfig = config.try_deserialize()?;
        server.validate()?;
        Ok(server)
    }

    /// Checks values the type system can't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }
        if self.store.tax_rate_bps > 10_000 {
            return Err(ConfigError::InvalidValue("store.tax_rate_bps".to_string()));
        }
        if let Some(smtp) = &self.smtp {
            let fields = [
                ("smtp.host", &smtp.host),
                ("smtp.username", &smtp.username),
                ("smtp.password", &smtp.password),
                ("smtp.from_address", &smtp.from_address),
            ];
            for (name, value) in fields {
                if value.trim().is_empty() {
                    return Err(ConfigError::MissingRequired(name.to_string()));
                }
            }
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("bind_addr".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1".to_string(),
            port: 5000,
            database_path: ":memory:".to_string(),
            store: StoreInfo::default(),
            smtp: None,
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.tax_rate().bps(), 1000);
        assert_eq!(config.socket_addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_rejects_zero_port_and_huge_tax() {
        let mut bad_port = config();
        bad_port.port = 0;
        assert!(matches!(bad_port.validate(), Err(ConfigError::InvalidValue(_))));

        let mut bad_tax = config();
        bad_tax.store.tax_rate_bps = 10_001;
        assert!(bad_tax.validate().is_err());
    }

    #[test]
    fn test_smtp_fields_required_when_present() {
        let mut config = config();
        config.smtp = Some(SmtpConfig {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: "heypotu@gmail.com".to_string(),
            password: " ".to_string(),
            from_address: "heypotu@gmail.com".to_string(),
            from_name: default_from_name(),
        });
        match config.validate() {
            Err(ConfigError::MissingRequired(field)) => assert_eq!(field, "smtp.password"),
            other => panic!("expected MissingRequired, got {:?}", other),
        }
    }
}
