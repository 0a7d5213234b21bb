use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use time::{Date, OffsetDateTime};

use super::filters::{select_expirations, select_strikes};
use super::state::ChainState;
use super::store::Field;
use super::{ContractKey, EntryFailure, OptionChain, Right};
use crate::client::{Request, RequestIdAllocator, Sender};
use crate::contracts::{Contract, SecurityType};
use crate::wait::Monitor;
use crate::Error;

/// Generic tick list requested for the underlying.
const UNDERLYING_GENERIC_TICKS: &str = "221";

/// Where a [ChainBuilder] run currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingUnderlyingPrice,
    AwaitingOptionParameters,
    Filtering,
    FanningOutContracts,
    AwaitingContractJoin,
    AwaitingGreeks,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The underlying to explore and the window of contracts to take from it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainRequest {
    pub symbol: String,
    pub exchange: String,
    /// Security type of the underlying. Options on stocks are OPT, anything else FOP.
    pub security_type: SecurityType,
    pub contract_id: i32,
    pub currency: String,
    /// Reference date for the expiration window.
    pub today: Date,
    pub min_days: i64,
    pub max_days: i64,
    /// Strikes taken on each side of the underlying price.
    pub strike_half_width: usize,
}

impl ChainRequest {
    pub fn new(symbol: &str, exchange: &str, security_type: SecurityType, contract_id: i32) -> Self {
        Self {
            symbol: symbol.to_string(),
            exchange: exchange.to_string(),
            security_type,
            contract_id,
            currency: "USD".to_string(),
            today: today(),
            min_days: 7,
            max_days: 60,
            strike_half_width: 8,
        }
    }
}

/// Local date, falling back to UTC when the local offset cannot be determined.
pub(crate) fn today() -> Date {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()).date()
}

/// Drives one option chain run from the orchestration thread.
///
/// Requests go out through `sender`; answers are expected to land in `state` through a
/// [ChainHandler](super::ChainHandler) installed on the same session.
pub struct ChainBuilder {
    request: ChainRequest,
    state: Arc<Monitor<ChainState>>,
    sender: Arc<dyn Sender>,
    ids: Arc<RequestIdAllocator>,
    poll_interval: Duration,
    timeout: Duration,
    greeks_timeout: Duration,
    phase: Phase,
}

impl ChainBuilder {
    pub fn new(request: ChainRequest, state: Arc<Monitor<ChainState>>, sender: Arc<dyn Sender>, ids: Arc<RequestIdAllocator>) -> Self {
        Self {
            request,
            state,
            sender,
            ids,
            poll_interval: Duration::from_millis(250),
            timeout: Duration::from_secs(30),
            greeks_timeout: Duration::from_secs(30),
            phase: Phase::Idle,
        }
    }

    /// Upper bound between re-checks of a wait condition.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Bound on the underlying price, option parameters and per expiration details waits.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound on waiting for greeks once every contract has been requested.
    pub fn greeks_timeout(mut self, greeks_timeout: Duration) -> Self {
        self.greeks_timeout = greeks_timeout;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs the chain to completion.
    ///
    /// On failure every subscription still open is cancelled before the error is returned.
    pub fn run(&mut self) -> Result<OptionChain, Error> {
        if self.phase != Phase::Idle {
            return Err(Error::Simple(format!("chain builder already ran, phase {}", self.phase)));
        }

        match self.build() {
            Ok(chain) => Ok(chain),
            Err(err) => {
                warn!("chain run for {} failed in {}: {err}", self.request.symbol, self.phase);
                self.transition(Phase::Failed);
                self.cancel_outstanding();
                Err(err)
            }
        }
    }

    fn build(&mut self) -> Result<OptionChain, Error> {
        self.transition(Phase::AwaitingUnderlyingPrice);
        let underlying_id = self.request_underlying_price()?;
        let parameters_id = self.request_option_parameters()?;

        let price = self.await_underlying_price(underlying_id)?;

        self.transition(Phase::AwaitingOptionParameters);
        self.await_option_parameters(parameters_id)?;

        self.transition(Phase::Filtering);
        let (expirations, strikes) = self.filter(price)?;

        for expiration in &expirations {
            self.transition(Phase::FanningOutContracts);
            self.fan_out(expiration, &strikes)?;

            self.transition(Phase::AwaitingContractJoin);
            self.state.wait_until(
                &format!("contract details for {expiration}"),
                self.poll_interval,
                self.timeout,
                |state| state.store().pending_details().is_empty(),
            )?;
        }

        self.transition(Phase::AwaitingGreeks);
        self.await_greeks()?;

        self.transition(Phase::Done);
        let chain = self.state.read(|state| OptionChain {
            symbol: self.request.symbol.clone(),
            underlying_price: price,
            multiplier: state.multiplier().map(str::to_string),
            entries: state.store().entries().cloned().collect(),
        })?;

        info!(
            "option chain for {}: {} contracts, {} complete",
            chain.symbol,
            chain.entries.len(),
            chain.complete_entries().count()
        );

        Ok(chain)
    }

    fn transition(&mut self, phase: Phase) {
        debug!("chain {}: {} -> {}", self.request.symbol, self.phase, phase);
        self.phase = phase;
    }

    fn request_underlying_price(&self) -> Result<i32, Error> {
        let request_id = self.ids.next()?;
        self.state.update(|state| state.track_underlying(request_id))?;

        let contract = Contract {
            contract_id: self.request.contract_id,
            symbol: self.request.symbol.clone(),
            security_type: self.request.security_type.clone(),
            exchange: self.request.exchange.clone(),
            ..Default::default()
        };

        self.sender.send(&Request::MarketData {
            request_id,
            contract,
            generic_ticks: vec![UNDERLYING_GENERIC_TICKS.to_string()],
            snapshot: false,
            regulatory_snapshot: false,
        })?;

        Ok(request_id)
    }

    fn request_option_parameters(&self) -> Result<i32, Error> {
        let request_id = self.ids.next()?;
        self.state.update(|state| state.track_parameters(request_id))?;

        self.sender.send(&Request::OptionParameters {
            request_id,
            symbol: self.request.symbol.clone(),
            exchange: self.request.exchange.clone(),
            security_type: self.request.security_type.clone(),
            contract_id: self.request.contract_id,
        })?;

        Ok(request_id)
    }

    fn await_underlying_price(&self, request_id: i32) -> Result<f64, Error> {
        self.state.wait_for("underlying price", self.poll_interval, self.timeout, |state| {
            state
                .underlying_price()
                .map(Ok)
                .or_else(|| state.error(request_id).map(|(code, message)| Err(gateway_error(request_id, *code, message))))
        })?
    }

    fn await_option_parameters(&self, request_id: i32) -> Result<(), Error> {
        self.state.wait_for("option parameters", self.poll_interval, self.timeout, |state| {
            if state.parameters_done() {
                return Some(Ok(()));
            }
            state.error(request_id).map(|(code, message)| Err(gateway_error(request_id, *code, message)))
        })?
    }

    fn filter(&self, price: f64) -> Result<(Vec<String>, Vec<f64>), Error> {
        let request = &self.request;

        let (expirations, strikes) = self.state.read(|state| {
            (
                select_expirations(state.expirations(), request.today, request.min_days, request.max_days),
                select_strikes(state.strikes(), price, request.strike_half_width),
            )
        })?;

        info!("selected expirations {expirations:?} and strikes {strikes:?} around {price}");
        if expirations.is_empty() || strikes.is_empty() {
            warn!("no contracts selected for {}", request.symbol);
        }

        Ok((expirations, strikes))
    }

    fn fan_out(&self, expiration: &str, strikes: &[f64]) -> Result<(), Error> {
        let option_type = self.request.security_type.option_type();

        for strike in strikes {
            let request_id = self.ids.next()?;

            let key = ContractKey {
                symbol: self.request.symbol.clone(),
                security_type: option_type.clone(),
                expiration: expiration.to_string(),
                strike: *strike,
                right: Right::Call,
            };
            let contract = Contract {
                symbol: key.symbol.clone(),
                security_type: key.security_type.clone(),
                last_trade_date_or_contract_month: key.expiration.clone(),
                strike: key.strike,
                right: key.right.to_string(),
                exchange: self.request.exchange.clone(),
                currency: self.request.currency.clone(),
                ..Default::default()
            };

            self.state.update(|state| state.store_mut().begin_tracking(request_id, key))??;

            self.sender.send(&Request::MarketData {
                request_id,
                contract: contract.clone(),
                generic_ticks: Vec::new(),
                snapshot: false,
                regulatory_snapshot: false,
            })?;
            self.sender.send(&Request::ContractDetails { request_id, contract })?;
        }

        Ok(())
    }

    fn await_greeks(&self) -> Result<(), Error> {
        match self
            .state
            .wait_until("greeks", self.poll_interval, self.greeks_timeout, |state| state.store().unsampled().is_empty())
        {
            Ok(()) => Ok(()),
            Err(Error::Timeout(_)) => {
                let expired = self.state.update(|state| {
                    let expired = state.store().unsampled();
                    for request_id in &expired {
                        if let Some(entry) = state.store().entry(*request_id) {
                            warn!("no greeks for {} (request {request_id}), giving up", entry.key);
                        }
                        state.store_mut().record_field(*request_id, Field::Failure(EntryFailure::TimedOut));
                    }
                    expired
                })?;

                for request_id in expired {
                    self.cancel(request_id);
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn cancel(&self, request_id: i32) {
        if let Err(err) = self.sender.send(&Request::CancelMarketData { request_id }) {
            warn!("error cancelling market data for {request_id}: {err}");
        }
    }

    fn cancel_outstanding(&self) {
        let outstanding = self.state.read(|state| {
            let mut ids = state.store().unsampled();
            if let (Some(request_id), None) = (state.underlying_request_id(), state.underlying_price()) {
                ids.push(request_id);
            }
            ids
        });

        match outstanding {
            Ok(ids) => ids.into_iter().for_each(|request_id| self.cancel(request_id)),
            Err(err) => warn!("unable to cancel outstanding subscriptions: {err}"),
        }
    }
}

fn gateway_error(request_id: i32, code: i32, message: &str) -> Error {
    Error::Gateway {
        request_id,
        code,
        message: message.to_string(),
    }
}
