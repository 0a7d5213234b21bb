use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};

use super::store::CorrelationStore;
use crate::contracts::OptionParameters;

/// Everything one chain run has learned. Shared between the builder and the handler
/// through a [Monitor](crate::wait::Monitor).
#[derive(Debug, Default)]
pub struct ChainState {
    underlying_request_id: Option<i32>,
    underlying_price: Option<f64>,

    parameters_request_id: Option<i32>,
    parameters_done: bool,
    expirations: BTreeSet<String>,
    strikes: Vec<f64>,
    multiplier: Option<String>,
    trading_classes: BTreeSet<String>,

    details_end_count: usize,
    errors: BTreeMap<i32, (i32, String)>,
    store: CorrelationStore,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track_underlying(&mut self, request_id: i32) {
        self.underlying_request_id = Some(request_id);
    }

    pub(crate) fn track_parameters(&mut self, request_id: i32) {
        self.parameters_request_id = Some(request_id);
    }

    pub fn underlying_request_id(&self) -> Option<i32> {
        self.underlying_request_id
    }

    pub fn parameters_request_id(&self) -> Option<i32> {
        self.parameters_request_id
    }

    pub fn underlying_price(&self) -> Option<f64> {
        self.underlying_price
    }

    /// Records the underlying price if `request_id` is the underlying's subscription and no
    /// price has been recorded yet. Returns true when the price was taken.
    pub(crate) fn record_underlying_price(&mut self, request_id: i32, price: f64) -> bool {
        if self.underlying_request_id != Some(request_id) || self.underlying_price.is_some() {
            return false;
        }

        info!("underlying price: {price}");
        self.underlying_price = Some(price);
        true
    }

    /// Accumulates one option parameters answer.
    pub(crate) fn record_parameters(&mut self, request_id: i32, parameters: &OptionParameters) -> bool {
        if self.parameters_request_id != Some(request_id) || self.parameters_done {
            return false;
        }

        debug!(
            "option parameters: exchange={} trading class={} multiplier={} expirations={} strikes={}",
            parameters.exchange,
            parameters.trading_class,
            parameters.multiplier,
            parameters.expirations.len(),
            parameters.strikes.len()
        );

        self.expirations.extend(parameters.expirations.iter().cloned());
        self.strikes.extend(parameters.strikes.iter().copied());
        self.trading_classes.insert(parameters.trading_class.clone());
        if !parameters.multiplier.is_empty() {
            self.multiplier = Some(parameters.multiplier.clone());
        }
        true
    }

    pub(crate) fn record_parameters_end(&mut self, request_id: i32) -> bool {
        if self.parameters_request_id != Some(request_id) {
            return false;
        }
        !std::mem::replace(&mut self.parameters_done, true)
    }

    pub fn parameters_done(&self) -> bool {
        self.parameters_done
    }

    pub fn expirations(&self) -> &BTreeSet<String> {
        &self.expirations
    }

    /// Strikes as reported, duplicates included.
    pub fn strikes(&self) -> &[f64] {
        &self.strikes
    }

    pub fn multiplier(&self) -> Option<&str> {
        self.multiplier.as_deref()
    }

    pub fn trading_classes(&self) -> &BTreeSet<String> {
        &self.trading_classes
    }

    pub(crate) fn count_details_end(&mut self) {
        self.details_end_count += 1;
    }

    /// Contract details end markers received for tracked ids, repeats included.
    pub fn details_end_count(&self) -> usize {
        self.details_end_count
    }

    /// Keeps the first gateway error reported for `request_id`.
    pub(crate) fn record_error(&mut self, request_id: i32, code: i32, message: &str) {
        self.errors.entry(request_id).or_insert_with(|| (code, message.to_string()));
    }

    pub fn error(&self, request_id: i32) -> Option<&(i32, String)> {
        self.errors.get(&request_id)
    }

    pub fn store(&self) -> &CorrelationStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut CorrelationStore {
        &mut self.store
    }
}
