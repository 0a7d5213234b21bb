use std::fmt;

use crate::contracts::encoders::{encode_request_contract_data, encode_request_option_parameters};
use crate::contracts::{Contract, SecurityType};
use crate::market_data::encoders::{encode_cancel_market_data, encode_request_market_data, encode_request_market_data_type};
use crate::market_data::MarketDataType;
use crate::messages::RequestMessage;
use crate::orders::encoders::encode_place_order;
use crate::orders::Order;
use crate::Error;

/// A request the client can send to the gateway.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Subscribe to, or snapshot, market data for a contract.
    MarketData {
        request_id: i32,
        contract: Contract,
        generic_ticks: Vec<String>,
        snapshot: bool,
        regulatory_snapshot: bool,
    },
    CancelMarketData {
        request_id: i32,
    },
    /// Contract details; answered by zero or more details messages and an end marker.
    ContractDetails {
        request_id: i32,
        contract: Contract,
    },
    /// Expirations and strikes of options on an underlying.
    OptionParameters {
        request_id: i32,
        symbol: String,
        exchange: String,
        security_type: SecurityType,
        contract_id: i32,
    },
    PlaceOrder {
        order_id: i32,
        contract: Contract,
        order: Order,
    },
    MarketDataType(MarketDataType),
}

impl Request {
    /// Name of the call this request corresponds to, for instrumentation.
    pub fn method_name(&self) -> &'static str {
        match self {
            Request::MarketData { .. } => "reqMktData",
            Request::CancelMarketData { .. } => "cancelMktData",
            Request::ContractDetails { .. } => "reqContractDetails",
            Request::OptionParameters { .. } => "reqSecDefOptParams",
            Request::PlaceOrder { .. } => "placeOrder",
            Request::MarketDataType(_) => "reqMarketDataType",
        }
    }

    /// The request or order id the request carries, if any.
    pub fn request_id(&self) -> Option<i32> {
        match self {
            Request::MarketData { request_id, .. }
            | Request::CancelMarketData { request_id }
            | Request::ContractDetails { request_id, .. }
            | Request::OptionParameters { request_id, .. } => Some(*request_id),
            Request::PlaceOrder { order_id, .. } => Some(*order_id),
            Request::MarketDataType(_) => None,
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Request::CancelMarketData { .. })
    }

    pub(crate) fn encode(&self, server_version: i32) -> Result<RequestMessage, Error> {
        match self {
            Request::MarketData {
                request_id,
                contract,
                generic_ticks,
                snapshot,
                regulatory_snapshot,
            } => encode_request_market_data(server_version, *request_id, contract, generic_ticks, *snapshot, *regulatory_snapshot),
            Request::CancelMarketData { request_id } => encode_cancel_market_data(*request_id),
            Request::ContractDetails { request_id, contract } => encode_request_contract_data(server_version, *request_id, contract),
            Request::OptionParameters {
                request_id,
                symbol,
                exchange,
                security_type,
                contract_id,
            } => encode_request_option_parameters(*request_id, symbol, exchange, security_type, *contract_id),
            Request::PlaceOrder { order_id, contract, order } => encode_place_order(server_version, *order_id, contract, order),
            Request::MarketDataType(market_data_type) => encode_request_market_data_type(*market_data_type),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.request_id() {
            Some(id) => write!(f, "{}({id})", self.method_name()),
            None => write!(f, "{}", self.method_name()),
        }
    }
}
