use std::sync::Mutex;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use super::*;
use crate::contracts::{Contract, SecurityType};
use crate::market_data::{MarketDataType, TickAttribute, TickType};
use crate::tests::assert_send_and_sync;
use crate::transport::memory::MemoryStream;

const HANDSHAKE: &[&str] = &["176|20230405 22:20:39 PST|", "9|1|90|", "15|1|DU1234567|"];

fn connect() -> Client<MemoryStream> {
    Client::with_stream(MemoryStream::with_responses(HANDSHAKE), 999, MessageRecorder::disabled()).expect("connect failed")
}

fn eventually(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[derive(Default)]
struct Ticks {
    prices: Mutex<Vec<(i32, TickType, f64)>>,
    closed: AtomicBool,
}

impl Wrapper for Ticks {
    fn tick_price(&self, request_id: i32, tick_type: TickType, price: f64, _attributes: TickAttribute) {
        self.prices.lock().unwrap().push((request_id, tick_type, price));
    }

    fn connection_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[test]
fn test_client_is_send_and_sync() {
    assert_send_and_sync::<Client>();
    assert_send_and_sync::<ClientSender>();
}

#[test]
fn test_connect_seeds_allocator_from_next_valid_id() {
    let client = connect();

    assert_eq!(client.server_version(), 176);
    assert_eq!(client.id_allocator().next().unwrap(), 90);
    assert_eq!(client.connection_metadata().unwrap().managed_accounts, "DU1234567");
}

#[test]
fn test_sender_encodes_with_server_version() {
    let client = connect();
    let sender = client.sender();

    let contract = Contract {
        contract_id: 289128563,
        symbol: "ES".into(),
        security_type: SecurityType::Future,
        exchange: "GLOBEX".into(),
        ..Default::default()
    };

    sender.send(&Request::MarketDataType(MarketDataType::Delayed)).unwrap();
    sender
        .clone()
        .send(&Request::ContractDetails {
            request_id: 90,
            contract,
        })
        .unwrap();

    let requests = client.connection.socket.requests();
    assert_eq!(requests[2], "59|1|3|");
    assert_eq!(requests[3], "9|8|90|289128563|ES|FUT||0|||GLOBEX|||||0||||");
}

#[test]
fn test_dispatcher_delivers_messages() {
    let client = connect();
    let ticks = Arc::new(Ticks::default());

    client.start(ticks.clone()).unwrap();

    client.connection.socket.push_response("1|6|9000|9|4521.25|0|0|");
    client.connection.socket.push_response("9|1|500|");

    eventually(|| client.id_allocator().current() == Some(500));
    eventually(|| !ticks.prices.lock().unwrap().is_empty());

    assert_eq!(*ticks.prices.lock().unwrap(), vec![(9000, TickType::Close, 4521.25)]);

    client.disconnect().unwrap();
    assert!(!ticks.closed.load(Ordering::SeqCst), "requested disconnects are not reported as closed");
}

#[test]
fn test_start_twice_fails() {
    let client = connect();

    client.start(Arc::new(Ticks::default())).unwrap();
    assert!(client.start(Arc::new(Ticks::default())).is_err());
}

#[test]
fn test_send_after_disconnect_fails() {
    let client = connect();
    let sender = client.sender();

    client.disconnect().unwrap();
    client.disconnect().unwrap();

    assert!(matches!(sender.send(&Request::CancelMarketData { request_id: 9000 }), Err(Error::Shutdown)));
}
