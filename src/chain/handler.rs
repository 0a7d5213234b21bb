use std::sync::Arc;

use log::{debug, error, info, warn};

use super::state::ChainState;
use super::store::{Field, Greeks};
use super::EntryFailure;
use crate::client::{Request, Sender};
use crate::contracts::{ContractDetails, OptionComputation, OptionParameters};
use crate::market_data::{MarketDataType, TickAttribute, TickType};
use crate::orders::OrderStatus;
use crate::wait::Monitor;
use crate::wrapper::Wrapper;

/// Gateway notices that never fail a request.
fn is_warning(code: i32) -> bool {
    (2100..=2169).contains(&code) || code == 10167 || code == 10090
}

/// Writes chain answers into the shared [ChainState]. Runs on the dispatcher thread.
///
/// Cancels the underlying subscription once its price is known, and each option's
/// subscription once its greeks are in.
pub struct ChainHandler {
    state: Arc<Monitor<ChainState>>,
    sender: Arc<dyn Sender>,
}

impl ChainHandler {
    pub fn new(state: Arc<Monitor<ChainState>>, sender: Arc<dyn Sender>) -> Self {
        Self { state, sender }
    }

    fn update<R: Default>(&self, f: impl FnOnce(&mut ChainState) -> R) -> R {
        match self.state.update(f) {
            Ok(result) => result,
            Err(err) => {
                error!("chain state unavailable: {err}");
                R::default()
            }
        }
    }

    fn cancel(&self, request_id: i32) {
        if let Err(err) = self.sender.send(&Request::CancelMarketData { request_id }) {
            warn!("error cancelling market data for {request_id}: {err}");
        }
    }
}

impl Wrapper for ChainHandler {
    fn next_valid_id(&self, order_id: i32) {
        debug!("next valid id: {order_id}");
    }

    fn managed_accounts(&self, accounts: &str) {
        debug!("managed accounts: {accounts}");
    }

    fn tick_price(&self, request_id: i32, tick_type: TickType, price: f64, _attributes: TickAttribute) {
        if price < 0.0 {
            return;
        }

        if tick_type.is_close() {
            if self.update(|state| state.record_underlying_price(request_id, price)) {
                self.cancel(request_id);
            }
        } else if tick_type.is_last() {
            self.update(|state| state.store_mut().record_field(request_id, Field::OptionPrice(price)));
        }
    }

    fn tick_option_computation(&self, request_id: i32, computation: &OptionComputation) {
        if !computation.field.is_model_option() {
            return;
        }

        let greeks = Greeks {
            gamma: computation.gamma,
            theta: computation.theta,
            delta: computation.delta,
            vega: computation.vega,
            implied_volatility: computation.implied_volatility,
            option_price: computation.option_price,
            underlying_price: computation.underlying_price,
        };

        if self.update(|state| state.store_mut().record_field(request_id, Field::Greeks(greeks))) {
            debug!("greeks for {request_id}: {greeks:?}");
            self.cancel(request_id);
        }
    }

    fn market_data_type(&self, request_id: i32, market_data_type: MarketDataType) {
        debug!("market data type for {request_id}: {market_data_type:?}");
    }

    fn contract_details(&self, request_id: i32, details: &ContractDetails) {
        let field = Field::ContractDetails {
            contract_id: details.contract.contract_id,
            multiplier: details.contract.multiplier.parse().ok(),
            exchange: details.contract.exchange.clone(),
        };
        self.update(|state| state.store_mut().record_field(request_id, field));
    }

    fn contract_details_end(&self, request_id: i32) {
        self.update(|state| {
            if state.store().is_tracked(request_id) {
                state.count_details_end();
            }
            state.store_mut().record_field(request_id, Field::DetailsEnd)
        });
    }

    fn security_definition_option_parameter(&self, request_id: i32, parameters: &OptionParameters) {
        self.update(|state| state.record_parameters(request_id, parameters));
    }

    fn security_definition_option_parameter_end(&self, request_id: i32) {
        self.update(|state| state.record_parameters_end(request_id));
    }

    fn order_status(&self, status: &OrderStatus) {
        info!("order status: {status}");
    }

    fn open_order(&self, order_id: i32) {
        info!("open order: {order_id}");
    }

    fn error(&self, request_id: i32, code: i32, message: &str) {
        if request_id < 0 || is_warning(code) {
            info!("gateway notice [{code}]: {message}");
            return;
        }

        warn!("gateway error for request {request_id}: [{code}] {message}");

        self.update(|state| {
            state.record_error(request_id, code, message);
            state.store_mut().record_field(
                request_id,
                Field::Failure(EntryFailure::Gateway {
                    code,
                    message: message.to_string(),
                }),
            )
        });
    }

    fn connection_closed(&self) {
        error!("connection to the gateway closed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chain::{ContractKey, Right};
    use crate::contracts::{Contract, SecurityType};
    use crate::Error;

    #[derive(Default)]
    struct Cancels(Mutex<Vec<i32>>);

    impl Sender for Cancels {
        fn send(&self, request: &Request) -> Result<(), Error> {
            if let Request::CancelMarketData { request_id } = request {
                self.0.lock().unwrap().push(*request_id);
            }
            Ok(())
        }
    }

    fn setup() -> (ChainHandler, Arc<Monitor<ChainState>>, Arc<Cancels>) {
        let state = Arc::new(Monitor::new(ChainState::new()));
        let cancels = Arc::new(Cancels::default());
        state
            .update(|state| {
                state.track_underlying(1);
                state.track_parameters(2);
                state
                    .store_mut()
                    .begin_tracking(
                        3,
                        ContractKey {
                            symbol: "ES".into(),
                            security_type: SecurityType::FuturesOption,
                            expiration: "20181109".into(),
                            strike: 2670.0,
                            right: Right::Call,
                        },
                    )
                    .unwrap();
            })
            .unwrap();

        let handler = ChainHandler::new(state.clone(), cancels.clone());
        (handler, state, cancels)
    }

    fn model_option(gamma: f64) -> OptionComputation {
        OptionComputation {
            field: TickType::ModelOption,
            gamma: Some(gamma),
            theta: Some(-1.2),
            delta: Some(0.5),
            option_price: Some(30.0),
            underlying_price: Some(2672.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_close_tick_sets_price_and_cancels_once() {
        let (handler, state, cancels) = setup();

        handler.tick_price(1, TickType::Last, 2671.0, TickAttribute::default());
        handler.tick_price(1, TickType::DelayedClose, 2672.0, TickAttribute::default());
        handler.tick_price(1, TickType::Close, 2690.0, TickAttribute::default());

        assert_eq!(state.read(|state| state.underlying_price()).unwrap(), Some(2672.0));
        assert_eq!(*cancels.0.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_model_option_records_greeks_and_cancels() {
        let (handler, state, cancels) = setup();

        let bid_option = OptionComputation {
            field: TickType::BidOption,
            ..model_option(9.0)
        };
        handler.tick_option_computation(3, &bid_option);
        handler.tick_price(3, TickType::Last, 29.5, TickAttribute::default());
        handler.tick_option_computation(3, &model_option(0.002));
        handler.tick_option_computation(3, &model_option(0.004));
        handler.tick_price(3, TickType::Last, 31.0, TickAttribute::default());

        let entry = state.read(|state| state.store().entry(3).cloned()).unwrap().unwrap();
        assert_eq!(entry.gamma, Some(0.002));
        assert_eq!(entry.option_price, Some(29.5));
        assert!(entry.sampled);
        assert_eq!(*cancels.0.lock().unwrap(), vec![3]);
    }

    #[test]
    fn test_contract_details_and_end() {
        let (handler, state, _) = setup();

        let details = ContractDetails {
            contract: Contract {
                contract_id: 346741382,
                multiplier: "50".into(),
                exchange: "GLOBEX".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        handler.contract_details(3, &details);
        handler.contract_details_end(3);
        handler.contract_details_end(3);
        handler.contract_details_end(44);

        state
            .read(|state| {
                let entry = state.store().entry(3).unwrap();
                assert_eq!(entry.contract_id, Some(346741382));
                assert_eq!(entry.multiplier, Some(50.0));
                assert!(entry.details_end);
                assert_eq!(state.details_end_count(), 2);
                assert!(state.store().pending_details().is_empty());
            })
            .unwrap();
    }

    #[test]
    fn test_errors_fail_tracked_requests_and_skip_warnings() {
        let (handler, state, _) = setup();

        handler.error(-1, 2104, "Market data farm connection is OK:usfarm");
        handler.error(3, 10167, "Requested market data is not subscribed. Displaying delayed market data.");
        assert!(state.read(|state| state.store().entry(3).unwrap().failure.is_none()).unwrap());

        handler.error(3, 200, "No security definition has been found for the request");
        handler.error(2, 321, "Error validating request");

        state
            .read(|state| {
                assert!(matches!(
                    state.store().entry(3).unwrap().failure,
                    Some(EntryFailure::Gateway { code: 200, .. })
                ));
                assert_eq!(state.error(2).map(|(code, _)| *code), Some(321));
            })
            .unwrap();
    }
}
