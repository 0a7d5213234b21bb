//! Call-count instrumentation for the request and callback surfaces.
//!
//! [TracingSender] and [TracingWrapper] decorate a [Sender] and a [Wrapper] and share one
//! [CallStats]: how often each method was called, and per request id how many requests,
//! answers and errors were seen. Cancellations are counted under the negated request id.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use log::debug;

use crate::client::{Request, Sender};
use crate::contracts::{ContractDetails, OptionComputation, OptionParameters};
use crate::market_data::{MarketDataType, TickAttribute, TickType};
use crate::orders::OrderStatus;
use crate::wrapper::Wrapper;
use crate::Error;

#[cfg(test)]
mod tests;

/// Traffic seen for one request id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub requests: u32,
    pub answers: u32,
    pub errors: u32,
}

#[derive(Debug, Default)]
pub struct CallStats {
    calls: Mutex<BTreeMap<&'static str, u64>>,
    requests: Mutex<BTreeMap<i32, RequestCounts>>,
}

impl CallStats {
    pub fn new() -> Arc<CallStats> {
        Arc::new(CallStats::default())
    }

    fn count_call(&self, method: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(method).or_insert(0) += 1;
        }
    }

    fn count(&self, request_id: i32, update: impl FnOnce(&mut RequestCounts)) {
        if let Ok(mut requests) = self.requests.lock() {
            update(requests.entry(request_id).or_default());
        }
    }

    /// Number of times `method` was called.
    pub fn calls(&self, method: &str) -> u64 {
        self.calls.lock().map(|calls| calls.get(method).copied().unwrap_or(0)).unwrap_or(0)
    }

    pub fn request_counts(&self, request_id: i32) -> RequestCounts {
        self.requests
            .lock()
            .map(|requests| requests.get(&request_id).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn dump_call_counts(&self) {
        let Ok(calls) = self.calls.lock() else {
            return;
        };

        debug!("call counts:");
        for (method, count) in calls.iter() {
            debug!("  {method:<40} {count:>6}");
        }
    }

    pub fn dump_request_summary(&self) {
        let Ok(requests) = self.requests.lock() else {
            return;
        };

        debug!("{:>10} {:>6} {:>6} {:>6}", "request", "#Req", "#Ans", "#Err");
        for (request_id, counts) in requests.iter() {
            debug!("{request_id:>10} {:>6} {:>6} {:>6}", counts.requests, counts.answers, counts.errors);
        }
    }
}

/// Counts every request before handing it to the wrapped sender.
pub struct TracingSender<T: Sender> {
    inner: T,
    stats: Arc<CallStats>,
}

impl<T: Sender> TracingSender<T> {
    pub fn new(inner: T, stats: Arc<CallStats>) -> Self {
        Self { inner, stats }
    }
}

impl<T: Sender> Sender for TracingSender<T> {
    fn send(&self, request: &Request) -> Result<(), Error> {
        self.stats.count_call(request.method_name());

        if let Some(request_id) = request.request_id() {
            let key = if request.is_cancel() { -request_id } else { request_id };
            self.stats.count(key, |counts| counts.requests += 1);
        }

        self.inner.send(request)
    }
}

/// Counts every callback before forwarding it to the wrapped handler.
pub struct TracingWrapper<W: Wrapper> {
    inner: W,
    stats: Arc<CallStats>,
}

impl<W: Wrapper> TracingWrapper<W> {
    pub fn new(inner: W, stats: Arc<CallStats>) -> Self {
        Self { inner, stats }
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }

    fn answer(&self, method: &'static str, request_id: i32) {
        self.stats.count_call(method);
        self.stats.count(request_id, |counts| counts.answers += 1);
    }
}

impl<W: Wrapper> Wrapper for TracingWrapper<W> {
    fn next_valid_id(&self, order_id: i32) {
        self.stats.count_call("nextValidId");
        self.inner.next_valid_id(order_id);
    }

    fn managed_accounts(&self, accounts: &str) {
        self.stats.count_call("managedAccounts");
        self.inner.managed_accounts(accounts);
    }

    fn tick_price(&self, request_id: i32, tick_type: TickType, price: f64, attributes: TickAttribute) {
        self.answer("tickPrice", request_id);
        self.inner.tick_price(request_id, tick_type, price, attributes);
    }

    fn tick_size(&self, request_id: i32, tick_type: TickType, size: f64) {
        self.answer("tickSize", request_id);
        self.inner.tick_size(request_id, tick_type, size);
    }

    fn tick_generic(&self, request_id: i32, tick_type: TickType, value: f64) {
        self.answer("tickGeneric", request_id);
        self.inner.tick_generic(request_id, tick_type, value);
    }

    fn tick_string(&self, request_id: i32, tick_type: TickType, value: &str) {
        self.answer("tickString", request_id);
        self.inner.tick_string(request_id, tick_type, value);
    }

    fn tick_option_computation(&self, request_id: i32, computation: &OptionComputation) {
        self.answer("tickOptionComputation", request_id);
        self.inner.tick_option_computation(request_id, computation);
    }

    fn tick_snapshot_end(&self, request_id: i32) {
        self.answer("tickSnapshotEnd", request_id);
        self.inner.tick_snapshot_end(request_id);
    }

    fn market_data_type(&self, request_id: i32, market_data_type: MarketDataType) {
        self.answer("marketDataType", request_id);
        self.inner.market_data_type(request_id, market_data_type);
    }

    fn contract_details(&self, request_id: i32, details: &ContractDetails) {
        self.answer("contractDetails", request_id);
        self.inner.contract_details(request_id, details);
    }

    fn contract_details_end(&self, request_id: i32) {
        self.answer("contractDetailsEnd", request_id);
        self.inner.contract_details_end(request_id);
    }

    fn security_definition_option_parameter(&self, request_id: i32, parameters: &OptionParameters) {
        self.answer("securityDefinitionOptionParameter", request_id);
        self.inner.security_definition_option_parameter(request_id, parameters);
    }

    fn security_definition_option_parameter_end(&self, request_id: i32) {
        self.answer("securityDefinitionOptionParameterEnd", request_id);
        self.inner.security_definition_option_parameter_end(request_id);
    }

    fn order_status(&self, status: &OrderStatus) {
        self.answer("orderStatus", status.order_id);
        self.inner.order_status(status);
    }

    fn open_order(&self, order_id: i32) {
        self.answer("openOrder", order_id);
        self.inner.open_order(order_id);
    }

    fn open_order_end(&self) {
        self.stats.count_call("openOrderEnd");
        self.inner.open_order_end();
    }

    fn error(&self, request_id: i32, code: i32, message: &str) {
        self.stats.count_call("error");
        self.stats.count(request_id, |counts| counts.errors += 1);
        self.inner.error(request_id, code, message);
    }

    fn connection_closed(&self) {
        self.stats.count_call("connectionClosed");
        self.inner.connection_closed();
    }
}
