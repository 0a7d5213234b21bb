//! CSV export of a collected option chain.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use log::info;
use serde::Serialize;
use time::Date;

use crate::chain::{parse_date, OptionChain, OptionChainEntry};
use crate::Error;

/// One CSV row. Missing values are written as empty cells.
#[derive(Debug, Serialize)]
struct ChainRow<'a> {
    request_id: i32,
    symbol: &'a str,
    /// C or P
    right: String,
    expiration: &'a str,
    duration_days: Option<i64>,
    strike: f64,
    contract_id: Option<i32>,
    multiplier: Option<f64>,
    exchange: Option<&'a str>,
    gamma: Option<f64>,
    theta: Option<f64>,
    delta: Option<f64>,
    vega: Option<f64>,
    implied_volatility: Option<f64>,
    option_price: Option<f64>,
    underlying_price: Option<f64>,
}

impl<'a> ChainRow<'a> {
    fn new(entry: &'a OptionChainEntry, today: Date) -> Self {
        let duration_days = parse_date(&entry.key.expiration).ok().map(|expiration| (expiration - today).whole_days());

        Self {
            request_id: entry.request_id,
            symbol: &entry.key.symbol,
            right: entry.key.right.to_string(),
            expiration: &entry.key.expiration,
            duration_days,
            strike: entry.key.strike,
            contract_id: entry.contract_id,
            multiplier: entry.multiplier,
            exchange: entry.exchange.as_deref(),
            gamma: entry.gamma,
            theta: entry.theta,
            delta: entry.delta,
            vega: entry.vega,
            implied_volatility: entry.implied_volatility,
            option_price: entry.option_price,
            underlying_price: entry.underlying_price,
        }
    }
}

/// Writes every chain entry, complete or not, with a header row.
pub fn write_chain<W: Write>(chain: &OptionChain, today: Date, out: W) -> Result<(), Error> {
    let mut writer = Writer::from_writer(out);

    for entry in &chain.entries {
        writer.serialize(ChainRow::new(entry, today))?;
    }

    writer.flush()?;
    Ok(())
}

pub fn export_chain(chain: &OptionChain, today: Date, path: &Path) -> Result<(), Error> {
    let file = File::create(path)?;
    write_chain(chain, today, file)?;

    info!("wrote {} option chain entries to {}", chain.entries.len(), path.display());
    Ok(())
}
