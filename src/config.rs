//! Run configuration from `IBGAMMA_*` environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `IBGAMMA_ADDRESS` | `127.0.0.1:7497` |
//! | `IBGAMMA_CLIENT_ID` | `999` |
//! | `IBGAMMA_SYMBOL` / `IBGAMMA_EXCHANGE` / `IBGAMMA_SECURITY_TYPE` / `IBGAMMA_CONTRACT_ID` | `ES` / `GLOBEX` / `FUT` / `289128563` |
//! | `IBGAMMA_TIMEOUT_SECS` / `IBGAMMA_GREEKS_TIMEOUT_SECS` | `30` / `30` |
//! | `IBGAMMA_POLL_MILLIS` | `250` |
//! | `IBGAMMA_MIN_DAYS` / `IBGAMMA_MAX_DAYS` | `7` / `60` |
//! | `IBGAMMA_STRIKE_HALF_WIDTH` | `8` |
//! | `IBGAMMA_MAX_RATIO` / `IBGAMMA_MAX_LEGS` | `15` / `3` |
//! | `IBGAMMA_QUANTITY` | `10` |
//! | `IBGAMMA_MARKET_DATA_TYPE` | `1` (live; 3 is delayed) |
//! | `IBGAMMA_OUTPUT` | `option_chain.csv` |
//! | `IBGAMMA_LP_OUTPUT` | unset |
//! | `IBGAMMA_DRY_RUN` | `false` |

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::chain::ChainRequest;
use crate::contracts::SecurityType;
use crate::market_data::MarketDataType;
use crate::optimizer::OptimizerSettings;
use crate::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub address: String,
    pub client_id: i32,

    pub symbol: String,
    pub exchange: String,
    pub security_type: SecurityType,
    pub contract_id: i32,

    pub timeout: Duration,
    pub greeks_timeout: Duration,
    pub poll_interval: Duration,

    pub min_days: i64,
    pub max_days: i64,
    pub strike_half_width: usize,

    pub max_ratio: i32,
    pub max_legs: u32,
    pub quantity: f64,

    pub market_data_type: MarketDataType,
    pub output: PathBuf,
    pub lp_output: Option<PathBuf>,
    /// Build, export and optimize without placing the order.
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:7497".into(),
            client_id: 999,
            symbol: "ES".into(),
            exchange: "GLOBEX".into(),
            security_type: SecurityType::Future,
            contract_id: 289128563,
            timeout: Duration::from_secs(30),
            greeks_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            min_days: 7,
            max_days: 60,
            strike_half_width: 8,
            max_ratio: 15,
            max_legs: 3,
            quantity: 10.0,
            market_data_type: MarketDataType::Realtime,
            output: PathBuf::from("option_chain.csv"),
            lp_output: None,
            dry_run: false,
        }
    }
}

impl Config {
    /// Defaults overlaid with whatever `IBGAMMA_*` variables are set.
    pub fn from_env() -> Result<Config, Error> {
        let defaults = Config::default();

        let market_data_type = match env::var("IBGAMMA_MARKET_DATA_TYPE") {
            Ok(value) => parse::<i32>("IBGAMMA_MARKET_DATA_TYPE", &value)
                .and_then(|id| MarketDataType::from(id).ok_or_else(|| invalid("IBGAMMA_MARKET_DATA_TYPE", &value, "expected 1 to 4")))?,
            Err(_) => defaults.market_data_type,
        };

        Ok(Config {
            address: var("IBGAMMA_ADDRESS", defaults.address)?,
            client_id: var("IBGAMMA_CLIENT_ID", defaults.client_id)?,
            symbol: var("IBGAMMA_SYMBOL", defaults.symbol)?,
            exchange: var("IBGAMMA_EXCHANGE", defaults.exchange)?,
            security_type: env::var("IBGAMMA_SECURITY_TYPE")
                .map(|name| SecurityType::from(&name))
                .unwrap_or(defaults.security_type),
            contract_id: var("IBGAMMA_CONTRACT_ID", defaults.contract_id)?,
            timeout: Duration::from_secs(var("IBGAMMA_TIMEOUT_SECS", defaults.timeout.as_secs())?),
            greeks_timeout: Duration::from_secs(var("IBGAMMA_GREEKS_TIMEOUT_SECS", defaults.greeks_timeout.as_secs())?),
            poll_interval: Duration::from_millis(var("IBGAMMA_POLL_MILLIS", defaults.poll_interval.as_millis() as u64)?),
            min_days: var("IBGAMMA_MIN_DAYS", defaults.min_days)?,
            max_days: var("IBGAMMA_MAX_DAYS", defaults.max_days)?,
            strike_half_width: var("IBGAMMA_STRIKE_HALF_WIDTH", defaults.strike_half_width)?,
            max_ratio: var("IBGAMMA_MAX_RATIO", defaults.max_ratio)?,
            max_legs: var("IBGAMMA_MAX_LEGS", defaults.max_legs)?,
            quantity: var("IBGAMMA_QUANTITY", defaults.quantity)?,
            market_data_type,
            output: var("IBGAMMA_OUTPUT", defaults.output)?,
            lp_output: env::var("IBGAMMA_LP_OUTPUT").ok().filter(|path| !path.is_empty()).map(PathBuf::from),
            dry_run: var("IBGAMMA_DRY_RUN", defaults.dry_run)?,
        })
    }

    /// Chain request for the configured underlying, dated today.
    pub fn chain_request(&self) -> ChainRequest {
        ChainRequest {
            min_days: self.min_days,
            max_days: self.max_days,
            strike_half_width: self.strike_half_width,
            ..ChainRequest::new(&self.symbol, &self.exchange, self.security_type.clone(), self.contract_id)
        }
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            max_ratio: self.max_ratio,
            max_legs: self.max_legs,
            quantity: self.quantity,
            ..OptimizerSettings::default()
        }
    }
}

fn invalid(name: &str, value: &str, reason: impl Display) -> Error {
    Error::Simple(format!("invalid {name}={value:?}: {reason}"))
}

fn parse<T>(name: &str, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|err| invalid(name, value, err))
}

fn var<T>(name: &str, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse(name, &value),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    const VARS: &[&str] = &[
        "IBGAMMA_ADDRESS",
        "IBGAMMA_CLIENT_ID",
        "IBGAMMA_SYMBOL",
        "IBGAMMA_SECURITY_TYPE",
        "IBGAMMA_CONTRACT_ID",
        "IBGAMMA_POLL_MILLIS",
        "IBGAMMA_MARKET_DATA_TYPE",
        "IBGAMMA_LP_OUTPUT",
        "IBGAMMA_DRY_RUN",
    ];

    #[test]
    #[serial]
    fn test_defaults() {
        let unset: Vec<(&str, Option<&str>)> = VARS.iter().map(|name| (*name, None)).collect();

        temp_env::with_vars(unset, || {
            assert_eq!(Config::from_env().unwrap(), Config::default());
        });
    }

    #[test]
    #[serial]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("IBGAMMA_ADDRESS", Some("10.0.0.5:4002")),
                ("IBGAMMA_CLIENT_ID", Some("7")),
                ("IBGAMMA_SYMBOL", Some("IBM")),
                ("IBGAMMA_SECURITY_TYPE", Some("STK")),
                ("IBGAMMA_CONTRACT_ID", Some("8314")),
                ("IBGAMMA_POLL_MILLIS", Some("50")),
                ("IBGAMMA_MARKET_DATA_TYPE", Some("3")),
                ("IBGAMMA_LP_OUTPUT", Some("model.lp")),
                ("IBGAMMA_DRY_RUN", Some("true")),
            ],
            || {
                let config = Config::from_env().unwrap();

                assert_eq!(config.address, "10.0.0.5:4002");
                assert_eq!(config.client_id, 7);
                assert_eq!(config.security_type, SecurityType::Stock);
                assert_eq!(config.poll_interval, Duration::from_millis(50));
                assert_eq!(config.market_data_type, MarketDataType::Delayed);
                assert_eq!(config.lp_output, Some(PathBuf::from("model.lp")));
                assert!(config.dry_run);

                let request = config.chain_request();
                assert_eq!(request.symbol, "IBM");
                assert_eq!(request.contract_id, 8314);
                assert_eq!(request.security_type.option_type(), SecurityType::Option);
            },
        );
    }

    #[test]
    #[serial]
    fn test_invalid_values() {
        temp_env::with_var("IBGAMMA_CLIENT_ID", Some("abc"), || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("IBGAMMA_CLIENT_ID"), "{err}");
        });

        temp_env::with_var("IBGAMMA_MARKET_DATA_TYPE", Some("9"), || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_optimizer_settings() {
        let config = Config {
            max_ratio: 5,
            quantity: 2.0,
            ..Config::default()
        };

        let settings = config.optimizer_settings();
        assert_eq!(settings.max_ratio, 5);
        assert_eq!(settings.quantity, 2.0);
        assert_eq!(settings.max_legs, 3);
        assert_eq!(settings.delta_limit, 0.1);
    }
}
