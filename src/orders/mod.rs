//! Order placement and order status answers.
//!
//! Only limit and market orders on plain or BAG contracts are modelled. Every other order
//! attribute the gateway expects is sent with its neutral default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ToField;

pub(crate) mod decoders;
pub(crate) mod encoders;

/// Side of an order or combo leg.
#[derive(Clone, Debug, Default, PartialEq, Eq, Copy, Serialize, Deserialize)]
pub enum Action {
    #[default]
    Buy,
    Sell,
}

impl Action {
    /// Action for a leg holding `ratio` contracts; positive buys, negative sells.
    pub fn for_ratio(ratio: i32) -> Action {
        if ratio > 0 {
            Action::Buy
        } else {
            Action::Sell
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        };

        write!(f, "{text}")
    }
}

impl ToField for Action {
    fn to_field(&self) -> String {
        self.to_string()
    }
}

/// An order ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub action: Action,
    pub total_quantity: f64,
    /// LMT, MKT, ...
    pub order_type: String,
    pub limit_price: Option<f64>,
    pub aux_price: Option<f64>,
    /// Time in force: DAY, GTC, IOC ...
    pub tif: String,
    pub oca_group: String,
    pub account: String,
    pub open_close: String,
    /// 0 = customer, 1 = firm.
    pub origin: i32,
    pub order_ref: String,
    /// When false the order is staged in TWS but not sent to the exchange.
    pub transmit: bool,
    pub parent_id: i32,
    pub outside_rth: bool,
    pub hidden: bool,
    pub good_after_time: String,
    pub good_till_date: String,
    pub not_held: bool,
    /// Ask the gateway for margin impact only.
    pub what_if: bool,
}

impl Default for Order {
    fn default() -> Self {
        Self {
            action: Action::Buy,
            total_quantity: 0.0,
            order_type: String::new(),
            limit_price: None,
            aux_price: None,
            tif: "DAY".to_string(),
            oca_group: String::new(),
            account: String::new(),
            open_close: String::new(),
            origin: 0,
            order_ref: String::new(),
            transmit: true,
            parent_id: 0,
            outside_rth: false,
            hidden: false,
            good_after_time: String::new(),
            good_till_date: String::new(),
            not_held: false,
            what_if: false,
        }
    }
}

/// Order to buy or sell at `limit_price` or better.
pub fn limit_order(action: Action, quantity: f64, limit_price: f64) -> Order {
    Order {
        action,
        order_type: "LMT".to_string(),
        total_quantity: quantity,
        limit_price: Some(limit_price),
        ..Order::default()
    }
}

/// Status update for a placed order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderStatus {
    pub order_id: i32,
    /// PendingSubmit, PreSubmitted, Submitted, Cancelled, Filled, Inactive ...
    pub status: String,
    pub filled: f64,
    pub remaining: f64,
    pub average_fill_price: f64,
    pub perm_id: i32,
    pub parent_id: i32,
    pub last_fill_price: f64,
    pub client_id: i32,
    pub why_held: String,
    pub market_cap_price: f64,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "order {} {} filled={} remaining={} avg_price={}",
            self.order_id, self.status, self.filled, self.remaining, self.average_fill_price
        )
    }
}
