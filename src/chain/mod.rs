//! Option chain discovery.
//!
//! A run starts from one underlying. The [ChainBuilder] asks for the underlying's price and
//! for its option parameters, narrows the reported expirations and strikes down to a window
//! around the price, and then fans out one market data subscription and one contract details
//! request per selected contract. Answers arrive on the dispatcher thread, where the
//! [ChainHandler] writes them into the shared [ChainState]; the builder waits on that state
//! and returns an [OptionChain] once every contract has been sampled or given up on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contracts::SecurityType;

mod builder;
mod filters;
mod handler;
mod state;
mod store;

pub use builder::{ChainBuilder, ChainRequest, Phase};
pub use filters::{format_date, parse_date, select_expirations, select_strikes};
pub use handler::ChainHandler;
pub use state::ChainState;
pub use store::{CorrelationStore, Field, Greeks};

#[cfg(test)]
mod tests;

/// Option right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Right {
    #[default]
    Call,
    Put,
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Right::Call => write!(f, "C"),
            Right::Put => write!(f, "P"),
        }
    }
}

/// Identifies one explored option contract.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractKey {
    pub symbol: String,
    pub security_type: SecurityType,
    /// YYYYMMDD
    pub expiration: String,
    pub strike: f64,
    pub right: Right,
}

impl fmt::Display for ContractKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}{}", self.symbol, self.security_type, self.expiration, self.strike, self.right)
    }
}

/// Why an entry stopped waiting for answers.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryFailure {
    /// The gateway reported an error for the request id.
    Gateway { code: i32, message: String },
    /// No greeks arrived before the greeks timeout; the subscription was cancelled.
    TimedOut,
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryFailure::Gateway { code, message } => write!(f, "[{code}] {message}"),
            EntryFailure::TimedOut => write!(f, "timed out waiting for greeks"),
        }
    }
}

/// One row of the chain: a contract and whatever has been learned about it so far.
///
/// Fields stay `None` until their answer arrives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionChainEntry {
    pub request_id: i32,
    pub key: ContractKey,

    // from contract details
    pub contract_id: Option<i32>,
    pub multiplier: Option<f64>,
    pub exchange: Option<String>,
    pub details_end: bool,

    // from the model option computation
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub delta: Option<f64>,
    pub vega: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub option_price: Option<f64>,
    pub underlying_price: Option<f64>,
    /// Greeks were recorded and the subscription cancelled.
    pub sampled: bool,

    pub failure: Option<EntryFailure>,
}

impl OptionChainEntry {
    pub fn new(request_id: i32, key: ContractKey) -> Self {
        Self {
            request_id,
            key,
            ..Default::default()
        }
    }

    /// Both the contract details and the greeks have arrived.
    pub fn is_complete(&self) -> bool {
        self.contract_id.is_some() && self.sampled
    }
}

/// Result of a chain run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionChain {
    pub symbol: String,
    pub underlying_price: f64,
    /// Multiplier reported with the option parameters.
    pub multiplier: Option<String>,
    /// Entries in request id order.
    pub entries: Vec<OptionChainEntry>,
}

impl OptionChain {
    pub fn complete_entries(&self) -> impl Iterator<Item = &OptionChainEntry> {
        self.entries.iter().filter(|entry| entry.is_complete())
    }
}
