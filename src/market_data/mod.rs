//! Streaming market data: requests, tick decoding and tick types.

use serde::{Deserialize, Serialize};

use crate::ToField;

pub(crate) mod decoders;
pub(crate) mod encoders;
mod tick_types;

pub use tick_types::TickType;

/// Market data type for switching between real-time and frozen/delayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarketDataType {
    #[default]
    Realtime = 1,
    /// Frozen market data (for when market is closed)
    Frozen = 2,
    /// Delayed market data (usually 15-20 minutes)
    Delayed = 3,
    DelayedFrozen = 4,
}

impl MarketDataType {
    pub fn from(value: i32) -> Option<MarketDataType> {
        match value {
            1 => Some(MarketDataType::Realtime),
            2 => Some(MarketDataType::Frozen),
            3 => Some(MarketDataType::Delayed),
            4 => Some(MarketDataType::DelayedFrozen),
            _ => None,
        }
    }
}

impl ToField for MarketDataType {
    fn to_field(&self) -> String {
        (*self as i32).to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickAttribute {
    pub can_auto_execute: bool,
    pub past_limit: bool,
    pub pre_open: bool,
}

/// A price tick, with the size of its paired size tick when the gateway sends one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickPrice {
    pub tick_type: TickType,
    pub price: f64,
    pub attributes: TickAttribute,
    pub size: Option<(TickType, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSize {
    pub tick_type: TickType,
    pub size: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickGeneric {
    pub tick_type: TickType,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickString {
    pub tick_type: TickType,
    pub value: String,
}
