use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::debug;

use super::{ContractKey, EntryFailure, OptionChainEntry};
use crate::Error;

/// Greeks and prices from one model option computation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Greeks {
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub delta: Option<f64>,
    pub vega: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub option_price: Option<f64>,
    pub underlying_price: Option<f64>,
}

/// One answer destined for a tracked entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    ContractDetails {
        contract_id: i32,
        multiplier: Option<f64>,
        exchange: String,
    },
    DetailsEnd,
    /// Model option computation; closes the entry to further market data.
    Greeks(Greeks),
    /// Last traded price.
    OptionPrice(f64),
    Failure(EntryFailure),
}

/// Maps request ids to the chain entries they were issued for.
#[derive(Debug, Default)]
pub struct CorrelationStore {
    entries: BTreeMap<i32, OptionChainEntry>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `request_id` for `key`. Each id may be registered once.
    pub fn begin_tracking(&mut self, request_id: i32, key: ContractKey) -> Result<(), Error> {
        match self.entries.entry(request_id) {
            Entry::Occupied(_) => Err(Error::Simple(format!("request id {request_id} is already tracked"))),
            Entry::Vacant(slot) => {
                slot.insert(OptionChainEntry::new(request_id, key));
                Ok(())
            }
        }
    }

    pub fn is_tracked(&self, request_id: i32) -> bool {
        self.entries.contains_key(&request_id)
    }

    /// Records `field` against `request_id`. Returns whether the entry changed.
    ///
    /// Untracked ids are ignored. Every value is written at most once, and once the greeks
    /// are in, further market data for the entry is dropped.
    pub fn record_field(&mut self, request_id: i32, field: Field) -> bool {
        let Some(entry) = self.entries.get_mut(&request_id) else {
            debug!("ignoring answer for untracked request {request_id}: {field:?}");
            return false;
        };

        match field {
            Field::ContractDetails {
                contract_id,
                multiplier,
                exchange,
            } => {
                if entry.contract_id.is_some() {
                    return false;
                }
                entry.contract_id = Some(contract_id);
                entry.multiplier = multiplier;
                entry.exchange = Some(exchange);
                true
            }
            Field::DetailsEnd => !std::mem::replace(&mut entry.details_end, true),
            Field::Greeks(greeks) => {
                if entry.sampled {
                    return false;
                }
                set_once(&mut entry.gamma, greeks.gamma);
                set_once(&mut entry.theta, greeks.theta);
                set_once(&mut entry.delta, greeks.delta);
                set_once(&mut entry.vega, greeks.vega);
                set_once(&mut entry.implied_volatility, greeks.implied_volatility);
                set_once(&mut entry.option_price, greeks.option_price);
                set_once(&mut entry.underlying_price, greeks.underlying_price);
                entry.sampled = true;
                true
            }
            Field::OptionPrice(price) => !entry.sampled && set_once(&mut entry.option_price, Some(price)),
            Field::Failure(failure) => {
                if entry.failure.is_some() {
                    return false;
                }
                entry.failure = Some(failure);
                true
            }
        }
    }

    pub fn is_complete(&self, request_id: i32) -> bool {
        self.entries.get(&request_id).is_some_and(OptionChainEntry::is_complete)
    }

    pub fn entry(&self, request_id: i32) -> Option<&OptionChainEntry> {
        self.entries.get(&request_id)
    }

    /// Entries in request id order.
    pub fn entries(&self) -> impl Iterator<Item = &OptionChainEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids still waiting for the end of their contract details.
    pub fn pending_details(&self) -> Vec<i32> {
        self.entries
            .values()
            .filter(|entry| !entry.details_end && entry.failure.is_none())
            .map(|entry| entry.request_id)
            .collect()
    }

    /// Ids still waiting for greeks.
    pub fn unsampled(&self) -> Vec<i32> {
        self.entries
            .values()
            .filter(|entry| !entry.sampled && entry.failure.is_none())
            .map(|entry| entry.request_id)
            .collect()
    }
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    if slot.is_some() || value.is_none() {
        return false;
    }
    *slot = value;
    true
}
