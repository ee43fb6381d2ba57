use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Runtime configuration read from environment variables at startup.
/// Loads `.env` if present; every variable has a usable default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds between price polls.
    pub poll_interval_secs: u64,
    /// Seconds between window rolls; history only advances this often.
    pub roll_interval_secs: u64,
    /// Path of the append-only transaction CSV.
    pub transaction_log_path: String,
    /// Optional TOML file overriding the service parameters.
    pub service_config_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Config {
            poll_interval_secs: optional_env("POLL_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            roll_interval_secs: optional_env("ROLL_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            transaction_log_path: optional_env("TRANSACTION_LOG_PATH")
                .unwrap_or_else(|| "transactions/results.csv".to_string()),
            service_config_path: optional_env("SERVICE_CONFIG_PATH"),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Fee schedule and trading parameters of the simulated venue.
/// Supplied once at construction and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Fraction taken from every simulated fill (0.001 = 0.1 %).
    #[serde(default = "default_trading_fee")]
    pub trading_fee: f64,
    #[serde(default = "default_deposit_fee")]
    pub deposit_fee: f64,
    #[serde(default = "default_withdrawal_fee")]
    pub withdrawal_fee: f64,
    /// Deposits under this amount are refused.
    #[serde(default = "default_minimum_deposit")]
    pub minimum_deposit: f64,
    /// Settlement currency; every tracked symbol must carry it in its name.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// A confirmed buy invests `cash / investment_split`.
    #[serde(default = "default_investment_split")]
    pub investment_split: f64,
    /// Consecutive confirming ticks required before a signal trades.
    #[serde(default = "default_signal_threshold")]
    pub signal_threshold: u32,
}

impl ServiceConfig {
    /// Load from a TOML file; keys missing from the file keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{path}: {e}")))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            trading_fee: default_trading_fee(),
            deposit_fee: default_deposit_fee(),
            withdrawal_fee: default_withdrawal_fee(),
            minimum_deposit: default_minimum_deposit(),
            currency: default_currency(),
            investment_split: default_investment_split(),
            signal_threshold: default_signal_threshold(),
        }
    }
}

fn default_trading_fee() -> f64 {
    0.001
}

fn default_deposit_fee() -> f64 {
    0.01
}

fn default_withdrawal_fee() -> f64 {
    0.01
}

fn default_minimum_deposit() -> f64 {
    15.0
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_investment_split() -> f64 {
    20.0
}

fn default_signal_threshold() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_defaults_match_the_simulated_venue() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.trading_fee, 0.001);
        assert_eq!(cfg.deposit_fee, 0.01);
        assert_eq!(cfg.withdrawal_fee, 0.01);
        assert_eq!(cfg.minimum_deposit, 15.0);
        assert_eq!(cfg.currency, "USD");
        assert_eq!(cfg.investment_split, 20.0);
        assert_eq!(cfg.signal_threshold, 10);
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let cfg: ServiceConfig = toml::from_str("trading_fee = 0.002\ncurrency = \"EUR\"").unwrap();
        assert_eq!(cfg.trading_fee, 0.002);
        assert_eq!(cfg.currency, "EUR");
        assert_eq!(cfg.deposit_fee, 0.01);
        assert_eq!(cfg.signal_threshold, 10);
    }
}
