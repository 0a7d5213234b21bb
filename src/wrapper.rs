//! Callback surface for messages arriving from the gateway.
//!
//! The dispatcher decodes each inbound message and invokes exactly one method on the
//! installed [Wrapper]. Every method has a no-op default so implementors only override
//! what they consume.

use crate::contracts::{ContractDetails, OptionComputation, OptionParameters};
use crate::market_data::{MarketDataType, TickAttribute, TickType};
use crate::orders::OrderStatus;

/// Receives decoded gateway messages. Called from the dispatcher thread.
#[allow(unused_variables)]
pub trait Wrapper: Send + Sync {
    fn next_valid_id(&self, order_id: i32) {}

    fn managed_accounts(&self, accounts: &str) {}

    fn tick_price(&self, request_id: i32, tick_type: TickType, price: f64, attributes: TickAttribute) {}

    fn tick_size(&self, request_id: i32, tick_type: TickType, size: f64) {}

    fn tick_generic(&self, request_id: i32, tick_type: TickType, value: f64) {}

    fn tick_string(&self, request_id: i32, tick_type: TickType, value: &str) {}

    fn tick_option_computation(&self, request_id: i32, computation: &OptionComputation) {}

    fn tick_snapshot_end(&self, request_id: i32) {}

    fn market_data_type(&self, request_id: i32, market_data_type: MarketDataType) {}

    fn contract_details(&self, request_id: i32, details: &ContractDetails) {}

    fn contract_details_end(&self, request_id: i32) {}

    fn security_definition_option_parameter(&self, request_id: i32, parameters: &OptionParameters) {}

    fn security_definition_option_parameter_end(&self, request_id: i32) {}

    fn order_status(&self, status: &OrderStatus) {}

    fn open_order(&self, order_id: i32) {}

    fn open_order_end(&self) {}

    /// An error or notice. `request_id` is -1 for notices not tied to a request.
    fn error(&self, request_id: i32, code: i32, message: &str) {}

    /// The session ended without a disconnect being requested.
    fn connection_closed(&self) {}
}
