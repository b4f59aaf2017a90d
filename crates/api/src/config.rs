//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::Settings;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `DATABASE_URL` — PostgreSQL connection string; the in-memory store
///   is used when unset
/// - `LOCK_TIMEOUT_MS` — bound on row-lock waits in the commit path
///   (default: `5000`)
/// - `TAX_RATE_BPS` — sales tax in basis points (default: `1000`)
/// - `STORE_NAME`, `STORE_ADDRESS`, `STORE_PHONE`, `CURRENCY`,
///   `RECEIPT_HEADER`, `RECEIPT_FOOTER` — settings overrides
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub lock_timeout: Duration,
    pub settings: Settings,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        let settings = Settings {
            store_name: env_or("STORE_NAME", defaults.store_name),
            store_address: env_or("STORE_ADDRESS", defaults.store_address),
            store_phone: env_or("STORE_PHONE", defaults.store_phone),
            currency: env_or("CURRENCY", defaults.currency),
            receipt_header: env_or("RECEIPT_HEADER", defaults.receipt_header),
            receipt_footer: env_or("RECEIPT_FOOTER", defaults.receipt_footer),
            tax_rate_bps: std::env::var("TAX_RATE_BPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tax_rate_bps),
        };

        Self {
            host: env_or("HOST", "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            lock_timeout: Duration::from_millis(
                std::env::var("LOCK_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5000),
            ),
            settings,
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            lock_timeout: Duration::from_secs(5),
            settings: Settings::default(),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.settings.tax_rate_bps, 1000);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
