//! Selecting a gamma scalping combination from a collected option chain.
//!
//! Every complete chain entry is offered at each ratio in `-max_ratio..=max_ratio` (zero
//! excluded), with its delta, gamma and theta scaled by the ratio. The resulting binary
//! [Model] maximizes `sum(gamma + theta_weight * theta)` over the selected candidates subject to
//!
//! * at most `max_legs` selected candidates,
//! * `-delta_limit <= sum(delta) <= delta_limit`,
//! * `theta_floor <= sum(theta) <= theta_ceiling`.
//!
//! The selection becomes a BAG contract with one combo leg per selected candidate, bought
//! with a limit order at the combination's net price.

use std::fmt;

use log::{debug, info, warn};
use time::Date;

use crate::chain::{parse_date, OptionChain, OptionChainEntry, Right};
use crate::contracts::{ComboLeg, Contract, SecurityType};
use crate::orders::{limit_order, Action, Order};
use crate::Error;

mod lp;
mod model;
mod solver;

pub use lp::{export_lp, write_lp};
pub use model::{build_model, Constraint, Model};
pub use solver::{BranchAndBound, Solver};


/// Bounds and weights of the selection model.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizerSettings {
    pub max_ratio: i32,
    pub max_legs: u32,
    pub delta_limit: f64,
    pub theta_floor: f64,
    pub theta_ceiling: f64,
    pub theta_weight: f64,
    /// Number of combinations ordered.
    pub quantity: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            max_ratio: 15,
            max_legs: 3,
            delta_limit: 0.1,
            theta_floor: -5.0,
            theta_ceiling: 0.0,
            theta_weight: 10.0,
            quantity: 10.0,
        }
    }
}

/// One chain entry held at one ratio.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub request_id: i32,
    pub contract_id: i32,
    pub symbol: String,
    pub exchange: String,
    pub right: Right,
    pub expiration: String,
    /// Days from the reference date to expiration.
    pub duration: i64,
    pub strike: f64,
    /// Option price of a single contract, unscaled.
    pub price: f64,
    /// Signed number of contracts; positive buys.
    pub ratio: i32,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4} {} {:>4}d {:>9} @ {:<8} (delta {:.4}, gamma {:.6}, theta {:.4})",
            self.ratio, self.right, self.duration, self.strike, self.price, self.delta, self.gamma, self.theta
        )
    }
}

/// The inputs an entry needs to become a candidate, or the name of the first missing one.
struct Usable {
    contract_id: i32,
    delta: f64,
    gamma: f64,
    theta: f64,
    price: f64,
}

fn usable(entry: &OptionChainEntry) -> Result<Usable, &'static str> {
    fn require(value: Option<f64>, name: &'static str) -> Result<f64, &'static str> {
        value.filter(|value| value.is_finite()).ok_or(name)
    }

    let contract_id = entry.contract_id.ok_or("contract id")?;
    let gamma = require(entry.gamma, "gamma")?;
    let theta = require(entry.theta, "theta")?;
    let delta = require(entry.delta, "delta")?;
    let price = require(entry.option_price, "price")?;
    require(entry.multiplier, "multiplier")?;

    Ok(Usable {
        contract_id,
        delta,
        gamma,
        theta,
        price,
    })
}

/// Expands the chain's usable entries into candidates, ratio by ratio.
///
/// Entries missing any of contract id, gamma, theta, delta, price or multiplier are
/// dropped and logged.
pub fn candidates(chain: &OptionChain, today: Date, max_ratio: i32) -> Vec<Candidate> {
    let mut rows = Vec::new();

    for entry in &chain.entries {
        let usable = match usable(entry) {
            Ok(usable) => usable,
            Err(missing) => {
                warn!("dropping {} (request {}): no {missing}", entry.key, entry.request_id);
                continue;
            }
        };

        let duration = match parse_date(&entry.key.expiration) {
            Ok(expiration) => (expiration - today).whole_days(),
            Err(err) => {
                warn!("dropping {} (request {}): bad expiration: {err}", entry.key, entry.request_id);
                continue;
            }
        };

        rows.push((entry, usable, duration));
    }

    debug!("{} of {} chain entries usable", rows.len(), chain.entries.len());

    let mut candidates = Vec::with_capacity(rows.len() * (2 * max_ratio.max(0) as usize));
    for ratio in (-max_ratio..=max_ratio).filter(|ratio| *ratio != 0) {
        for (entry, usable, duration) in &rows {
            let scale = ratio as f64;
            candidates.push(Candidate {
                request_id: entry.request_id,
                contract_id: usable.contract_id,
                symbol: entry.key.symbol.clone(),
                exchange: entry.exchange.clone().unwrap_or_default(),
                right: entry.key.right,
                expiration: entry.key.expiration.clone(),
                duration: *duration,
                strike: entry.key.strike,
                price: usable.price,
                ratio,
                delta: usable.delta * scale,
                gamma: usable.gamma * scale,
                theta: usable.theta * scale,
            });
        }
    }

    candidates
}

/// Net greeks of a set of legs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Portfolio {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
}

impl Portfolio {
    pub fn of(legs: &[Candidate]) -> Portfolio {
        legs.iter().fold(Portfolio::default(), |total, leg| Portfolio {
            delta: total.delta + leg.delta,
            gamma: total.gamma + leg.gamma,
            theta: total.theta + leg.theta,
        })
    }

    /// `|gamma / theta|`, undefined without theta.
    pub fn alpha(&self) -> Option<f64> {
        (self.theta != 0.0).then(|| (self.gamma / self.theta).abs())
    }
}

/// The combination order built from a selection.
#[derive(Clone, Debug, PartialEq)]
pub struct ComboTrade {
    pub contract: Contract,
    pub order: Order,
    pub legs: Vec<Candidate>,
    pub portfolio: Portfolio,
}

impl ComboTrade {
    /// Builds the BAG contract and limit order for `legs`.
    pub fn new(legs: Vec<Candidate>, quantity: f64) -> Result<ComboTrade, Error> {
        let Some(first) = legs.first() else {
            return Err(Error::Infeasible("optimal selection is empty".into()));
        };

        let contract = Contract {
            symbol: first.symbol.clone(),
            security_type: SecurityType::Spread,
            currency: "USD".into(),
            exchange: first.exchange.clone(),
            combo_legs: legs
                .iter()
                .map(|leg| ComboLeg {
                    contract_id: leg.contract_id,
                    ratio: leg.ratio.abs(),
                    action: Action::for_ratio(leg.ratio).to_string(),
                    exchange: leg.exchange.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let net_price: f64 = legs.iter().map(|leg| leg.ratio as f64 * leg.price).sum();
        let order = limit_order(Action::Buy, quantity, round_to_tenth(net_price));
        let portfolio = Portfolio::of(&legs);

        Ok(ComboTrade {
            contract,
            order,
            legs,
            portfolio,
        })
    }

    /// Logs the legs, their net greeks, the order and the best single option alphas of `chain`.
    pub fn log_summary(&self, chain: &OptionChain) {
        info!("selected {} legs:", self.legs.len());
        for leg in &self.legs {
            info!("  {leg}");
        }
        info!(
            "portfolio delta {:.4}, gamma {:.6}, theta {:.4}, alpha {}",
            self.portfolio.delta,
            self.portfolio.gamma,
            self.portfolio.theta,
            self.portfolio.alpha().map_or_else(|| "n/a".to_string(), |alpha| format!("{alpha:.6}"))
        );

        info!("single option alphas:");
        for (entry, alpha) in single_option_alphas(chain, SINGLE_ALPHA_COUNT) {
            info!("  {:>6} {} {alpha:.6}", entry.request_id, entry.key);
        }

        info!(
            "{} {} {} @ {:?}",
            self.order.action, self.order.total_quantity, self.contract.symbol, self.order.limit_price
        );
    }
}

const SINGLE_ALPHA_COUNT: usize = 20;

/// `gamma / |theta|` of the complete entries, largest first, at most `count` of them.
///
/// Entries without gamma or with zero theta have no alpha; ties keep request id order.
pub fn single_option_alphas(chain: &OptionChain, count: usize) -> Vec<(&OptionChainEntry, f64)> {
    let mut alphas: Vec<(&OptionChainEntry, f64)> = chain
        .complete_entries()
        .filter_map(|entry| Some((entry, entry.gamma? / entry.theta?.abs())))
        .filter(|(_, alpha)| alpha.is_finite())
        .collect();

    alphas.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.request_id.cmp(&b.0.request_id)));
    alphas.truncate(count);
    alphas
}

/// Rounds to one decimal the way `{:.1}` prints: from the binary value, ties to even.
fn round_to_tenth(value: f64) -> f64 {
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Solves `model` over `candidates` and returns the selected ones.
pub fn select(candidates: &[Candidate], model: &Model, solver: &dyn Solver) -> Result<Vec<Candidate>, Error> {
    if candidates.is_empty() {
        return Err(Error::Infeasible("no usable option chain entries".into()));
    }

    let selection = solver.solve(model)?;
    if selection.len() != candidates.len() {
        return Err(Error::Simple(format!(
            "solver returned {} flags for {} candidates",
            selection.len(),
            candidates.len()
        )));
    }

    Ok(candidates
        .iter()
        .zip(selection)
        .filter(|(_, selected)| *selected)
        .map(|(candidate, _)| candidate.clone())
        .collect())
}

/// Candidates, model, solve and combination in one step.
pub fn optimize(chain: &OptionChain, today: Date, settings: &OptimizerSettings, solver: &dyn Solver) -> Result<ComboTrade, Error> {
    let candidates = candidates(chain, today, settings.max_ratio);
    let model = build_model(&candidates, settings);
    let legs = select(&candidates, &model, solver)?;
    ComboTrade::new(legs, settings.quantity)
}
