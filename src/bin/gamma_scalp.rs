use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{arg, value_parser, ArgMatches, Command};
use log::info;

use ibgamma::chain::{ChainBuilder, ChainHandler, ChainState};
use ibgamma::client::{Client, Request, Sender};
use ibgamma::config::Config;
use ibgamma::contracts::SecurityType;
use ibgamma::export::export_chain;
use ibgamma::market_data::MarketDataType;
use ibgamma::optimizer::{self, build_model, export_lp, select, BranchAndBound, ComboTrade};
use ibgamma::trace::{CallStats, TracingSender, TracingWrapper};
use ibgamma::wait::Monitor;

// Time given to order status callbacks after the order goes out.
const ORDER_STATUS_GRACE: Duration = Duration::from_secs(3);

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = Command::new("gamma_scalp")
        .version("1.0")
        .about("Builds an option chain, selects a gamma/theta combination and submits it as a combo order")
        .arg(arg!(--address <ADDRESS> "gateway host:port"))
        .arg(arg!(--client_id <ID> "client id").value_parser(value_parser!(i32)))
        .arg(arg!(--symbol <SYMBOL> "underlying symbol"))
        .arg(arg!(--exchange <EXCHANGE> "underlying exchange"))
        .arg(arg!(--security_type <TYPE> "underlying security type, e.g. FUT or STK"))
        .arg(arg!(--contract_id <ID> "underlying contract id").value_parser(value_parser!(i32)))
        .arg(arg!(--output <PATH> "CSV file for the option chain").value_parser(value_parser!(PathBuf)))
        .arg(arg!(--lp_output <PATH> "write the selection model in CPLEX LP format").value_parser(value_parser!(PathBuf)))
        .arg(arg!(--delayed "use delayed market data"))
        .arg(arg!(--dry_run "build, export and optimize without placing the order"))
        .get_matches();

    let config = apply_flags(Config::from_env()?, &matches);
    info!("{config:?}");

    let client = Client::connect(&config.address, config.client_id)?;
    info!("connected {client:?}");

    let stats = CallStats::new();
    let sender: Arc<dyn Sender> = Arc::new(TracingSender::new(client.sender(), stats.clone()));
    let state = Arc::new(Monitor::new(ChainState::new()));

    let handler = TracingWrapper::new(ChainHandler::new(state.clone(), sender.clone()), stats.clone());
    client.start(Arc::new(handler))?;

    sender.send(&Request::MarketDataType(config.market_data_type))?;

    let request = config.chain_request();
    let today = request.today;

    let chain = ChainBuilder::new(request, state, sender.clone(), client.id_allocator())
        .poll_interval(config.poll_interval)
        .timeout(config.timeout)
        .greeks_timeout(config.greeks_timeout)
        .run()?;

    export_chain(&chain, today, &config.output)?;

    let settings = config.optimizer_settings();
    let candidates = optimizer::candidates(&chain, today, settings.max_ratio);
    let model = build_model(&candidates, &settings);
    if let Some(path) = &config.lp_output {
        export_lp(&model, path)?;
    }

    let trade = ComboTrade::new(select(&candidates, &model, &BranchAndBound)?, settings.quantity)?;
    trade.log_summary(&chain);

    if config.dry_run {
        info!("dry run, order not placed");
    } else {
        let order_id = client.id_allocator().next()?;
        sender.send(&Request::PlaceOrder {
            order_id,
            contract: trade.contract.clone(),
            order: trade.order.clone(),
        })?;
        info!("placed order {order_id}");

        thread::sleep(ORDER_STATUS_GRACE);
    }

    stats.dump_call_counts();
    stats.dump_request_summary();

    client.disconnect()?;
    Ok(())
}

fn apply_flags(mut config: Config, matches: &ArgMatches) -> Config {
    if let Some(address) = matches.get_one::<String>("address") {
        config.address = address.clone();
    }
    if let Some(client_id) = matches.get_one::<i32>("client_id") {
        config.client_id = *client_id;
    }
    if let Some(symbol) = matches.get_one::<String>("symbol") {
        config.symbol = symbol.clone();
    }
    if let Some(exchange) = matches.get_one::<String>("exchange") {
        config.exchange = exchange.clone();
    }
    if let Some(security_type) = matches.get_one::<String>("security_type") {
        config.security_type = SecurityType::from(security_type);
    }
    if let Some(contract_id) = matches.get_one::<i32>("contract_id") {
        config.contract_id = *contract_id;
    }
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        config.output = output.clone();
    }
    if let Some(lp_output) = matches.get_one::<PathBuf>("lp_output") {
        config.lp_output = Some(lp_output.clone());
    }
    if matches.get_flag("delayed") {
        config.market_data_type = MarketDataType::Delayed;
    }
    if matches.get_flag("dry_run") {
        config.dry_run = true;
    }
    config
}
