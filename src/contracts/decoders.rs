use super::{ContractDetails, OptionComputation, OptionParameters, SecurityType};
use crate::market_data::TickType;
use crate::messages::ResponseMessage;
use crate::{server_versions, Error};

/// Decodes a contract data message into its request id and details.
///
/// Fields after the time zone are not needed and are left unread.
pub(crate) fn decode_contract_details(server_version: i32, message: &mut ResponseMessage) -> Result<(i32, ContractDetails), Error> {
    message.skip(); // message type

    let mut message_version = 8;
    if server_version < server_versions::SIZE_RULES {
        message_version = message.next_int()?;
    }

    let request_id = if message_version >= 3 { message.next_int()? } else { -1 };

    let mut details = ContractDetails::default();

    details.contract.symbol = message.next_string()?;
    details.contract.security_type = SecurityType::from(&message.next_string()?);
    read_last_trade_date(&mut details, &message.next_string()?);
    details.contract.strike = message.next_double()?;
    details.contract.right = message.next_string()?;
    details.contract.exchange = message.next_string()?;
    details.contract.currency = message.next_string()?;
    details.contract.local_symbol = message.next_string()?;
    details.market_name = message.next_string()?;
    details.contract.trading_class = message.next_string()?;
    details.contract.contract_id = message.next_int()?;
    details.min_tick = message.next_double()?;
    if (server_versions::MD_SIZE_MULTIPLIER..server_versions::SIZE_RULES).contains(&server_version) {
        message.skip(); // md size multiplier, unused
    }
    details.contract.multiplier = message.next_string()?;
    details.order_types = split_to_vec(&message.next_string()?);
    details.valid_exchanges = split_to_vec(&message.next_string()?);
    if message_version >= 2 {
        details.price_magnifier = message.next_int()?;
    }
    if message_version >= 4 {
        details.under_contract_id = message.next_int()?;
    }
    if message_version >= 5 {
        details.long_name = message.next_string()?;
        details.contract.primary_exchange = message.next_string()?;
    }
    if message_version >= 6 {
        details.contract_month = message.next_string()?;
        message.skip(); // industry
        message.skip(); // category
        message.skip(); // subcategory
        details.time_zone_id = message.next_string()?;
    }

    Ok((request_id, details))
}

fn split_to_vec(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(|s| s.to_string()).collect()
}

// Expirations may arrive as "20181109" or "20181109 16:00 US/Central".
fn read_last_trade_date(details: &mut ContractDetails, last_trade_date_or_contract_month: &str) {
    if last_trade_date_or_contract_month.is_empty() {
        return;
    }

    let splitted: Vec<&str> = if last_trade_date_or_contract_month.contains('-') {
        last_trade_date_or_contract_month.split('-').collect()
    } else {
        last_trade_date_or_contract_month.split(' ').collect()
    };

    if let Some(date) = splitted.first() {
        details.contract.last_trade_date_or_contract_month = date.to_string();
    }
    if let Some(time) = splitted.get(1) {
        details.last_trade_time = time.to_string();
    }
}

pub(crate) fn decode_contract_details_end(message: &mut ResponseMessage) -> Result<i32, Error> {
    message.skip(); // message type
    message.skip(); // message version

    message.next_int()
}

pub(crate) fn decode_option_computation(server_version: i32, message: &mut ResponseMessage) -> Result<(i32, OptionComputation), Error> {
    message.skip(); // message type

    let message_version = if server_version >= server_versions::PRICE_BASED_VOLATILITY {
        i32::MAX
    } else {
        message.next_int()?
    };

    let request_id = message.next_int()?;

    let mut computation = OptionComputation {
        field: TickType::from(message.next_int()?),
        ..Default::default()
    };

    if server_version >= server_versions::PRICE_BASED_VOLATILITY {
        computation.tick_attribute = Some(message.next_int()?);
    }

    computation.implied_volatility = next_optional_double(message, -1.0)?;
    computation.delta = next_optional_double(message, -2.0)?;

    if message_version >= 6 || computation.field.is_model_option() {
        computation.option_price = next_optional_double(message, -1.0)?;
        computation.present_value_dividend = next_optional_double(message, -1.0)?;
    }

    if message_version >= 6 {
        computation.gamma = next_optional_double(message, -2.0)?;
        computation.vega = next_optional_double(message, -2.0)?;
        computation.theta = next_optional_double(message, -2.0)?;
        computation.underlying_price = next_optional_double(message, -1.0)?;
    }

    Ok((request_id, computation))
}

// The gateway marks values it could not compute with a sentinel or leaves them unset.
fn next_optional_double(message: &mut ResponseMessage, none_value: f64) -> Result<Option<f64>, Error> {
    match message.next_optional_double()? {
        Some(value) if value == none_value || value == f64::MAX => Ok(None),
        value => Ok(value),
    }
}

pub(crate) fn decode_option_parameters(message: &mut ResponseMessage) -> Result<(i32, OptionParameters), Error> {
    message.skip(); // message type

    let request_id = message.next_int()?;

    let mut parameters = OptionParameters {
        exchange: message.next_string()?,
        underlying_contract_id: message.next_int()?,
        trading_class: message.next_string()?,
        multiplier: message.next_string()?,
        ..Default::default()
    };

    let expirations_count = message.next_int()?;
    parameters.expirations.reserve(expirations_count.max(0) as usize);
    for _ in 0..expirations_count {
        parameters.expirations.push(message.next_string()?);
    }

    let strikes_count = message.next_int()?;
    parameters.strikes.reserve(strikes_count.max(0) as usize);
    for _ in 0..strikes_count {
        parameters.strikes.push(message.next_double()?);
    }

    Ok((request_id, parameters))
}

pub(crate) fn decode_option_parameters_end(message: &mut ResponseMessage) -> Result<i32, Error> {
    message.skip(); // message type

    message.next_int()
}
