use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use pretty_assertions::assert_eq;
use time::macros::date;

use super::*;
use crate::client::{Request, RequestIdAllocator, Sender};
use crate::contracts::{Contract, ContractDetails, OptionComputation, OptionParameters};
use crate::market_data::{TickAttribute, TickType};
use crate::wait::Monitor;
use crate::wrapper::Wrapper;
use crate::Error;

const ES_CONTRACT_ID: i32 = 289128563;

/// What the scripted gateway reads: requests from the client, or the end of the test.
enum Message {
    Request(Request),
    Stop,
}

/// What the scripted gateway saw and did, in order.
#[derive(Clone, Debug, PartialEq)]
enum Event {
    Received(Request),
    /// Contract details and their end marker were delivered for this request id.
    DetailsEnded(i32),
}

/// Sends every request into a channel read by the scripted gateway.
struct ChannelSender(channel::Sender<Message>);

impl Sender for ChannelSender {
    fn send(&self, request: &Request) -> Result<(), Error> {
        self.0.send(Message::Request(request.clone())).map_err(|err| Error::Simple(err.to_string()))
    }
}

/// Quiet period after which deferred contract details are answered.
const DEFERRED_DETAILS_DELAY: Duration = Duration::from_millis(50);

/// How the scripted gateway answers.
#[derive(Clone, Default)]
struct Script {
    send_close: bool,
    parameters_error: bool,
    /// Hold contract details answers until no request has arrived for a while.
    defer_details: bool,
    /// (expiration, strike) pairs that never receive greeks.
    silent: Vec<(&'static str, f64)>,
    /// (expiration, strike) pairs whose contract details fail.
    unknown: Vec<(&'static str, f64)>,
    /// (expiration, strike) pairs whose contract details never arrive.
    no_details: Vec<(&'static str, f64)>,
}

struct Gateway {
    handle: JoinHandle<Vec<Event>>,
    messages: channel::Sender<Message>,
}

impl Gateway {
    fn stop(self) -> Vec<Event> {
        self.messages.send(Message::Stop).unwrap();
        self.handle.join().unwrap()
    }
}

fn matches(contract: &Contract, pairs: &[(&str, f64)]) -> bool {
    pairs
        .iter()
        .any(|(expiration, strike)| contract.last_trade_date_or_contract_month == *expiration && contract.strike == *strike)
}

fn answer_details(handler: &dyn Wrapper, request_id: i32, contract: Contract) {
    let details = ContractDetails {
        contract: Contract {
            contract_id: 300_000_000 + contract.strike as i32,
            multiplier: "50".into(),
            exchange: "GLOBEX".into(),
            ..contract
        },
        ..Default::default()
    };
    handler.contract_details(request_id, &details);
    handler.contract_details_end(request_id);
}

fn spawn_gateway(script: Script, handler: Arc<dyn Wrapper>, messages: channel::Sender<Message>, inbox: Receiver<Message>) -> Gateway {
    let handle = thread::spawn(move || {
        let mut events = Vec::new();
        let mut deferred: Vec<(i32, Contract)> = Vec::new();

        loop {
            let message = if deferred.is_empty() {
                inbox.recv().ok()
            } else {
                match inbox.recv_timeout(DEFERRED_DETAILS_DELAY) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => {
                        for (request_id, contract) in deferred.drain(..) {
                            answer_details(handler.as_ref(), request_id, contract);
                            events.push(Event::DetailsEnded(request_id));
                        }
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => None,
                }
            };

            let Some(Message::Request(request)) = message else {
                break;
            };
            events.push(Event::Received(request.clone()));

            match request {
                Request::MarketData { request_id, contract, .. } if contract.contract_id == ES_CONTRACT_ID => {
                    handler.tick_price(request_id, TickType::Last, 2671.0, TickAttribute::default());
                    if script.send_close {
                        handler.tick_price(request_id, TickType::Close, 2672.0, TickAttribute::default());
                    }
                }
                Request::MarketData { request_id, contract, .. } => {
                    if matches(&contract, &script.silent) {
                        continue;
                    }
                    handler.tick_price(request_id, TickType::Last, 12.5, TickAttribute::default());
                    handler.tick_option_computation(
                        request_id,
                        &OptionComputation {
                            field: TickType::ModelOption,
                            implied_volatility: Some(0.16),
                            delta: Some(0.5),
                            option_price: Some(13.0),
                            gamma: Some(contract.strike / 1_000_000.0),
                            vega: Some(3.0),
                            theta: Some(-1.0),
                            underlying_price: Some(2672.0),
                            ..Default::default()
                        },
                    );
                }
                Request::ContractDetails { request_id, contract } => {
                    if matches(&contract, &script.no_details) {
                        continue;
                    }
                    if matches(&contract, &script.unknown) {
                        handler.error(request_id, 200, "No security definition has been found for the request");
                        continue;
                    }
                    if script.defer_details {
                        deferred.push((request_id, contract));
                    } else {
                        answer_details(handler.as_ref(), request_id, contract);
                        events.push(Event::DetailsEnded(request_id));
                    }
                }
                Request::OptionParameters { request_id, .. } => {
                    if script.parameters_error {
                        handler.error(request_id, 321, "Error validating request");
                        continue;
                    }
                    for (trading_class, expirations) in [("ES", vec!["20181207", "20190301"]), ("EW2", vec!["20181102", "20181109"])] {
                        handler.security_definition_option_parameter(
                            request_id,
                            &OptionParameters {
                                exchange: "GLOBEX".into(),
                                underlying_contract_id: ES_CONTRACT_ID,
                                trading_class: trading_class.into(),
                                multiplier: "50".into(),
                                expirations: expirations.into_iter().map(String::from).collect(),
                                strikes: vec![2650.0, 2660.0, 2670.0, 2680.0, 2690.0],
                            },
                        );
                    }
                    handler.security_definition_option_parameter_end(request_id);
                }
                _ => {}
            }
        }

        events
    });

    Gateway { handle, messages }
}

fn run_chain(script: Script, timeout: Duration) -> (Result<OptionChain, Error>, Phase, Vec<Event>) {
    let (tx, rx) = channel::unbounded();
    let sender = Arc::new(ChannelSender(tx.clone()));
    let state = Arc::new(Monitor::new(ChainState::new()));
    let handler: Arc<dyn Wrapper> = Arc::new(ChainHandler::new(state.clone(), sender.clone()));
    let gateway = spawn_gateway(script, handler, tx, rx);

    let request = ChainRequest {
        today: date!(2018 - 10 - 28),
        strike_half_width: 2,
        ..ChainRequest::new("ES", "GLOBEX", SecurityType::Future, ES_CONTRACT_ID)
    };

    let mut builder = ChainBuilder::new(request, state, sender, Arc::new(RequestIdAllocator::seeded(100)))
        .poll_interval(Duration::from_millis(10))
        .timeout(timeout)
        .greeks_timeout(Duration::from_millis(200));

    let result = builder.run();
    let phase = builder.phase();
    (result, phase, gateway.stop())
}

fn requests(events: &[Event]) -> impl Iterator<Item = &Request> {
    events.iter().filter_map(|event| match event {
        Event::Received(request) => Some(request),
        Event::DetailsEnded(_) => None,
    })
}

fn cancels(events: &[Event]) -> HashSet<i32> {
    requests(events)
        .filter_map(|request| match request {
            Request::CancelMarketData { request_id } => Some(*request_id),
            _ => None,
        })
        .collect()
}

fn is_details_request_for(event: &Event, expiration: &str) -> bool {
    matches!(event, Event::Received(Request::ContractDetails { contract, .. }) if contract.last_trade_date_or_contract_month == expiration)
}

#[test]
fn test_chain_run_collects_entries() {
    let script = Script {
        send_close: true,
        silent: vec![("20181207", 2690.0)],
        unknown: vec![("20181109", 2660.0)],
        ..Default::default()
    };

    let (result, phase, events) = run_chain(script, Duration::from_secs(5));
    let chain = result.unwrap();

    assert_eq!(phase, Phase::Done);
    assert_eq!(chain.underlying_price, 2672.0);
    assert_eq!(chain.multiplier.as_deref(), Some("50"));

    let rows: Vec<(i32, &str, f64)> = chain
        .entries
        .iter()
        .map(|entry| (entry.request_id, entry.key.expiration.as_str(), entry.key.strike))
        .collect();
    assert_eq!(
        rows,
        vec![
            (102, "20181109", 2660.0),
            (103, "20181109", 2670.0),
            (104, "20181109", 2680.0),
            (105, "20181109", 2690.0),
            (106, "20181207", 2660.0),
            (107, "20181207", 2670.0),
            (108, "20181207", 2680.0),
            (109, "20181207", 2690.0),
        ]
    );

    assert_eq!(chain.complete_entries().count(), 6);
    assert!(matches!(chain.entries[0].failure, Some(EntryFailure::Gateway { code: 200, .. })));
    assert_eq!(chain.entries[7].failure, Some(EntryFailure::TimedOut));

    let entry = &chain.entries[1];
    assert_eq!(entry.contract_id, Some(300_002_670));
    assert_eq!(entry.multiplier, Some(50.0));
    assert_eq!(entry.exchange.as_deref(), Some("GLOBEX"));
    assert_eq!(entry.gamma, Some(0.00267));
    assert_eq!(entry.option_price, Some(12.5), "last price arrived before the greeks");
    assert_eq!(entry.key.security_type, SecurityType::FuturesOption);

    let cancelled = cancels(&events);
    assert!(cancelled.contains(&100), "underlying subscription is cancelled");
    for request_id in 102..=109 {
        assert!(cancelled.contains(&request_id), "subscription {request_id} left open");
    }

    let underlying = requests(&events)
        .find_map(|request| match request {
            Request::MarketData {
                request_id: 100,
                generic_ticks,
                ..
            } => Some(generic_ticks.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(underlying, vec!["221"]);
}

#[test]
fn test_chain_run_times_out_without_underlying_price() {
    let script = Script::default();

    let (result, phase, events) = run_chain(script, Duration::from_millis(100));

    assert!(matches!(result, Err(Error::Timeout(ref what)) if what == "underlying price"), "got {result:?}");
    assert_eq!(phase, Phase::Failed);
    assert!(cancels(&events).contains(&100), "underlying subscription is cancelled on failure");
}

#[test]
fn test_chain_run_fails_when_contract_details_never_end() {
    let script = Script {
        send_close: true,
        silent: vec![("20181109", 2680.0)],
        no_details: vec![("20181109", 2670.0)],
        ..Default::default()
    };

    let (result, phase, events) = run_chain(script, Duration::from_millis(200));

    assert!(
        matches!(result, Err(Error::Timeout(ref what)) if what == "contract details for 20181109"),
        "got {result:?}"
    );
    assert_eq!(phase, Phase::Failed);

    let cancelled = cancels(&events);
    for request_id in 102..=105 {
        assert!(cancelled.contains(&request_id), "subscription {request_id} left open");
    }
    assert!(
        !events.iter().any(|event| is_details_request_for(event, "20181207")),
        "second expiration requested after a failed join"
    );
    assert!(
        requests(&events).all(|request| request.request_id().map_or(true, |id| id < 106)),
        "no contract of the second expiration is tracked"
    );
}

#[test]
fn test_expirations_join_one_at_a_time() {
    let script = Script {
        send_close: true,
        defer_details: true,
        ..Default::default()
    };

    let (result, phase, events) = run_chain(script, Duration::from_secs(5));
    let chain = result.unwrap();

    assert_eq!(phase, Phase::Done);
    assert_eq!(chain.complete_entries().count(), 8);

    let first_answer = events.iter().position(|event| matches!(event, Event::DetailsEnded(_))).unwrap();
    let asked_before_answer = events[..first_answer]
        .iter()
        .filter(|event| is_details_request_for(event, "20181109"))
        .count();
    assert_eq!(asked_before_answer, 4, "details answers were held back");

    let first_joined = events
        .iter()
        .rposition(|event| matches!(event, Event::DetailsEnded(request_id) if (102..=105).contains(request_id)))
        .unwrap();
    let second_asked = events.iter().position(|event| is_details_request_for(event, "20181207")).unwrap();
    assert!(
        first_joined < second_asked,
        "details for 20181207 requested at {second_asked} before 20181109 joined at {first_joined}"
    );
}

#[test]
fn test_chain_run_fails_on_parameters_error() {
    let script = Script {
        send_close: true,
        parameters_error: true,
        ..Default::default()
    };

    let (result, _, _) = run_chain(script, Duration::from_secs(5));

    assert!(
        matches!(result, Err(Error::Gateway { request_id: 101, code: 321, .. })),
        "got {result:?}"
    );
}

#[test]
fn test_builder_runs_once() {
    let (tx, _rx) = channel::unbounded();
    let state = Arc::new(Monitor::new(ChainState::new()));
    let request = ChainRequest::new("ES", "GLOBEX", SecurityType::Future, ES_CONTRACT_ID);

    let mut builder = ChainBuilder::new(request, state, Arc::new(ChannelSender(tx)), Arc::new(RequestIdAllocator::new()));

    assert!(matches!(builder.run(), Err(Error::Sequencing(_))));
    assert_eq!(builder.phase(), Phase::Failed);
    assert!(builder.run().is_err());
}

#[test]
fn test_right_and_key_display() {
    let key = ContractKey {
        symbol: "ES".into(),
        security_type: SecurityType::FuturesOption,
        expiration: "20181109".into(),
        strike: 2670.0,
        right: Right::Call,
    };
    assert_eq!(key.to_string(), "ES FOP 20181109 2670C");
    assert_eq!(Right::Put.to_string(), "P");
}
