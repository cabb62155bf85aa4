//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::ShippingPolicy;
use thiserror::Error;

const BROADCAST_INTERVAL_KEY: &str = "TRACKING_BROADCAST_INTERVAL_SECS";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset runs in memory
/// - `TRACKING_BROADCAST_INTERVAL_SECS`: active tracking push period, at least 1 (default: `30`)
/// - `FREE_SHIPPING_THRESHOLD_UNITS`: subtotal for free shipping (default: `50000`)
/// - `FLAT_SHIPPING_FEE_UNITS`: shipping fee below the threshold (default: `10`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub tracking_broadcast_interval: Duration,
    pub free_shipping_threshold_units: i64,
    pub flat_shipping_fee_units: i64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let tracking_broadcast_interval = match parse::<u64>(&get, BROADCAST_INTERVAL_KEY)? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    key: BROADCAST_INTERVAL_KEY,
                    value: get(BROADCAST_INTERVAL_KEY).unwrap_or_default(),
                });
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.tracking_broadcast_interval,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse(&get, "PORT")?.unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: get("DATABASE_URL"),
            tracking_broadcast_interval,
            free_shipping_threshold_units: parse(&get, "FREE_SHIPPING_THRESHOLD_UNITS")?
                .unwrap_or(defaults.free_shipping_threshold_units),
            flat_shipping_fee_units: parse(&get, "FLAT_SHIPPING_FEE_UNITS")?
                .unwrap_or(defaults.flat_shipping_fee_units),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy::from_units(self.flat_shipping_fee_units, self.free_shipping_threshold_units)
    }
}

fn parse<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    get(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value })
        })
        .transpose()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            tracking_broadcast_interval: Duration::from_secs(30),
            free_shipping_threshold_units: 50_000,
            flat_shipping_fee_units: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.database_url, None);
        assert_eq!(config.tracking_broadcast_interval, Duration::from_secs(30));
        assert_eq!(config.shipping_policy(), ShippingPolicy::default());
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        assert_eq!(from_pairs(&[]).unwrap(), Config::default());
        assert_eq!(from_pairs(&[("PORT", " ")]).unwrap(), Config::default());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = from_pairs(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("RUST_LOG", "debug"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("TRACKING_BROADCAST_INTERVAL_SECS", "5"),
            ("FREE_SHIPPING_THRESHOLD_UNITS", "1000"),
            ("FLAT_SHIPPING_FEE_UNITS", "7"),
        ])
        .unwrap();

        assert_eq!(config.addr(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/shop"));
        assert_eq!(config.tracking_broadcast_interval, Duration::from_secs(5));

        let policy = config.shipping_policy();
        assert_eq!(policy.flat_fee, Money::from_units(7));
        assert_eq!(policy.free_shipping_threshold, Money::from_units(1000));
    }

    #[test]
    fn test_rejects_zero_broadcast_interval() {
        let err = from_pairs(&[("TRACKING_BROADCAST_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "TRACKING_BROADCAST_INTERVAL_SECS",
                ref value,
            } if value == "0"
        ));

        let config = from_pairs(&[("TRACKING_BROADCAST_INTERVAL_SECS", "1")]).unwrap();
        assert_eq!(config.tracking_broadcast_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        let err = from_pairs(&[("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }
}
