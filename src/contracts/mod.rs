//! Contracts, contract details and option parameter answers.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::market_data::TickType;
use crate::ToField;

pub(crate) mod decoders;
pub(crate) mod encoders;

/// Security type of a contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityType {
    #[default]
    Stock,
    Option,
    Future,
    FuturesOption,
    /// Combination of legs (BAG).
    Spread,
    Other(String),
}

impl SecurityType {
    pub fn from(name: &str) -> SecurityType {
        match name {
            "STK" => SecurityType::Stock,
            "OPT" => SecurityType::Option,
            "FUT" => SecurityType::Future,
            "FOP" => SecurityType::FuturesOption,
            "BAG" => SecurityType::Spread,
            other => SecurityType::Other(other.to_string()),
        }
    }

    /// Security type of options written on an underlying of this type.
    pub fn option_type(&self) -> SecurityType {
        match self {
            SecurityType::Stock => SecurityType::Option,
            _ => SecurityType::FuturesOption,
        }
    }
}

impl Display for SecurityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityType::Stock => write!(f, "STK"),
            SecurityType::Option => write!(f, "OPT"),
            SecurityType::Future => write!(f, "FUT"),
            SecurityType::FuturesOption => write!(f, "FOP"),
            SecurityType::Spread => write!(f, "BAG"),
            SecurityType::Other(name) => write!(f, "{name}"),
        }
    }
}

impl ToField for SecurityType {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

/// A trading instrument as the gateway understands it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub contract_id: i32,
    pub symbol: String,
    pub security_type: SecurityType,
    /// Expiration as YYYYMMDD, or contract month as YYYYMM.
    pub last_trade_date_or_contract_month: String,
    pub strike: f64,
    /// "C" or "P" for options, empty otherwise.
    pub right: String,
    pub multiplier: String,
    pub exchange: String,
    pub currency: String,
    pub local_symbol: String,
    pub primary_exchange: String,
    pub trading_class: String,
    pub include_expired: bool,
    pub security_id_type: String,
    pub security_id: String,
    pub combo_legs: Vec<ComboLeg>,
    pub issuer_id: String,
}

impl Contract {
    pub fn is_bag(&self) -> bool {
        self.security_type == SecurityType::Spread
    }
}

/// One leg of a BAG contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboLeg {
    pub contract_id: i32,
    pub ratio: i32,
    /// BUY or SELL.
    pub action: String,
    pub exchange: String,
    pub open_close: ComboLegOpenClose,
    pub short_sale_slot: i32,
    pub designated_location: String,
    pub exempt_code: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboLegOpenClose {
    #[default]
    Same = 0,
    Open = 1,
    Close = 2,
    Unknown = 3,
}

impl ToField for ComboLegOpenClose {
    fn to_field(&self) -> String {
        (*self as u8).to_string()
    }
}

/// Contract details answer. Only the fields this crate reads are decoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContractDetails {
    pub contract: Contract,
    pub market_name: String,
    pub min_tick: f64,
    pub order_types: Vec<String>,
    pub valid_exchanges: Vec<String>,
    pub price_magnifier: i32,
    pub under_contract_id: i32,
    pub long_name: String,
    pub contract_month: String,
    pub time_zone_id: String,
    pub last_trade_time: String,
}

/// Greeks and model values carried by an option computation tick.
///
/// Values the gateway reports as not computed are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionComputation {
    pub field: TickType,
    pub tick_attribute: Option<i32>,
    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
    pub option_price: Option<f64>,
    pub present_value_dividend: Option<f64>,
    pub gamma: Option<f64>,
    pub vega: Option<f64>,
    pub theta: Option<f64>,
    pub underlying_price: Option<f64>,
}

/// One option parameters answer. The gateway sends one per exchange / trading class.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionParameters {
    pub exchange: String,
    pub underlying_contract_id: i32,
    pub trading_class: String,
    pub multiplier: String,
    pub expirations: Vec<String>,
    pub strikes: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_type_round_trips_names() {
        for name in ["STK", "OPT", "FUT", "FOP", "BAG", "IND"] {
            assert_eq!(SecurityType::from(name).to_string(), name);
        }
    }

    #[test]
    fn test_option_type_for_underlying() {
        assert_eq!(SecurityType::Stock.option_type(), SecurityType::Option);
        assert_eq!(SecurityType::Future.option_type(), SecurityType::FuturesOption);
        assert_eq!(SecurityType::Other("IND".into()).option_type(), SecurityType::FuturesOption);
    }

    #[test]
    fn test_is_bag() {
        let contract = Contract {
            security_type: SecurityType::Spread,
            ..Default::default()
        };
        assert!(contract.is_bag());
        assert!(!Contract::default().is_bag());
    }
}
