//! Gamma scalping on top of the Interactive Brokers [TWS API](https://interactivebrokers.github.io/tws-api/introduction.html).
//!
//! The crate speaks just enough of the TWS wire protocol to
//!
//! 1. discover an option chain around an underlying's price and near term expirations,
//! 2. collect greeks and prices for every explored contract from streaming market data,
//! 3. pick a multi leg combination maximizing a gamma / theta objective, and
//! 4. submit it as a single combo limit order.
//!
//! Requests go out through a [Sender](crate::client::Sender); answers come back on the
//! client's dispatcher thread as [Wrapper](crate::wrapper::Wrapper) callbacks. The
//! [chain](crate::chain) module correlates those answers by request id.
//!
//!```no_run
//! use std::sync::Arc;
//!
//! use ibgamma::chain::{ChainBuilder, ChainHandler, ChainRequest, ChainState};
//! use ibgamma::client::{Client, Sender};
//! use ibgamma::contracts::SecurityType;
//! use ibgamma::wait::Monitor;
//!
//! fn main() -> Result<(), ibgamma::Error> {
//!     let client = Client::connect("127.0.0.1:7497", 999)?;
//!     let sender: Arc<dyn Sender> = Arc::new(client.sender());
//!
//!     let state = Arc::new(Monitor::new(ChainState::new()));
//!     client.start(Arc::new(ChainHandler::new(state.clone(), sender.clone())))?;
//!
//!     let request = ChainRequest::new("ES", "GLOBEX", SecurityType::Future, 289128563);
//!     let chain = ChainBuilder::new(request, state, sender, client.id_allocator()).run()?;
//!     println!("{} contracts around {}", chain.entries.len(), chain.underlying_price);
//!     Ok(())
//! }
//!```

/// Option chain discovery and request correlation.
pub mod chain;

/// TWS API client: session, requests and the dispatcher thread.
pub mod client;

pub mod config;

pub(crate) mod connection;

/// A [Contract](crate::contracts::Contract) identifies a trading instrument such as a future, an option or a combination of legs.
pub mod contracts;

pub mod errors;

/// CSV export of an option chain.
pub mod export;

/// Streaming market data requests and ticks.
pub mod market_data;

mod messages;

/// Selection model, solver and combo order construction.
pub mod optimizer;

/// Order placement.
pub mod orders;

mod server_versions;

/// Call-count instrumentation.
pub mod trace;

pub(crate) mod transport;

pub mod wait;

pub mod wrapper;

pub use errors::Error;

pub(crate) trait ToField {
    fn to_field(&self) -> String;
}

impl ToField for bool {
    fn to_field(&self) -> String {
        if *self {
            String::from("1")
        } else {
            String::from("0")
        }
    }
}

impl ToField for String {
    fn to_field(&self) -> String {
        self.clone()
    }
}

impl ToField for &str {
    fn to_field(&self) -> String {
        <&str>::clone(self).to_string()
    }
}

impl ToField for usize {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl ToField for i32 {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl ToField for Option<i32> {
    fn to_field(&self) -> String {
        encode_option_field(self)
    }
}

impl ToField for f64 {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

impl ToField for Option<f64> {
    fn to_field(&self) -> String {
        encode_option_field(self)
    }
}

fn encode_option_field<T: ToField>(val: &Option<T>) -> String {
    match val {
        Some(val) => val.to_field(),
        None => String::from(""),
    }
}
