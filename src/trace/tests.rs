use std::sync::Mutex;

use pretty_assertions::assert_eq;

use super::*;
use crate::market_data::MarketDataType;

#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<String>>,
}

impl Sender for RecordingSender {
    fn send(&self, request: &Request) -> Result<(), Error> {
        self.sent.lock().unwrap().push(request.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct CountingWrapper {
    errors: Mutex<Vec<(i32, i32)>>,
}

impl Wrapper for CountingWrapper {
    fn error(&self, request_id: i32, code: i32, _message: &str) {
        self.errors.lock().unwrap().push((request_id, code));
    }
}

#[test]
fn test_tracing_sender_counts_requests_and_cancels() {
    let stats = CallStats::new();
    let sender = TracingSender::new(RecordingSender::default(), stats.clone());

    sender.send(&Request::CancelMarketData { request_id: 9000 }).unwrap();
    sender.send(&Request::MarketDataType(MarketDataType::Realtime)).unwrap();
    sender.send(&Request::CancelMarketData { request_id: 9001 }).unwrap();

    assert_eq!(stats.calls("cancelMktData"), 2);
    assert_eq!(stats.calls("reqMarketDataType"), 1);
    assert_eq!(stats.request_counts(-9000).requests, 1, "cancel counted under negated id");
    assert_eq!(stats.request_counts(9000).requests, 0);
    assert_eq!(
        *sender.inner.sent.lock().unwrap(),
        vec!["cancelMktData(9000)", "reqMarketDataType", "cancelMktData(9001)"]
    );
}

#[test]
fn test_tracing_wrapper_counts_answers_and_errors() {
    let stats = CallStats::new();
    let wrapper = TracingWrapper::new(CountingWrapper::default(), stats.clone());

    wrapper.tick_price(9000, TickType::Close, 4521.25, TickAttribute::default());
    wrapper.tick_size(9000, TickType::Volume, 10.0);
    wrapper.contract_details_end(9001);
    wrapper.error(9002, 200, "No security definition has been found for the request");

    assert_eq!(
        stats.request_counts(9000),
        RequestCounts {
            requests: 0,
            answers: 2,
            errors: 0,
        }
    );
    assert_eq!(stats.request_counts(9001).answers, 1);
    assert_eq!(stats.request_counts(9002).errors, 1);
    assert_eq!(stats.calls("tickPrice"), 1);
    assert_eq!(stats.calls("error"), 1);
    assert_eq!(*wrapper.inner().errors.lock().unwrap(), vec![(9002, 200)], "callbacks are forwarded");

    stats.dump_call_counts();
    stats.dump_request_summary();
}
