use log::{debug, warn};

use super::id_generator::RequestIdAllocator;
use crate::contracts::decoders::{
    decode_contract_details, decode_contract_details_end, decode_option_computation, decode_option_parameters, decode_option_parameters_end,
};
use crate::market_data::decoders::{
    decode_market_data_type, decode_tick_generic, decode_tick_price, decode_tick_size, decode_tick_snapshot_end, decode_tick_string,
};
use crate::messages::{IncomingMessages, Notice, ResponseMessage};
use crate::orders::decoders::{decode_open_order_id, decode_order_status};
use crate::wrapper::Wrapper;
use crate::Error;

/// Decodes `message` and delivers it to `wrapper`.
///
/// A next valid id also re-seeds `allocator`.
pub(crate) fn dispatch(
    server_version: i32,
    message: &mut ResponseMessage,
    wrapper: &dyn Wrapper,
    allocator: &RequestIdAllocator,
) -> Result<(), Error> {
    match message.message_type() {
        IncomingMessages::TickPrice => {
            let (request_id, tick) = decode_tick_price(server_version, message)?;
            wrapper.tick_price(request_id, tick.tick_type, tick.price, tick.attributes);
            if let Some((size_tick_type, size)) = tick.size {
                wrapper.tick_size(request_id, size_tick_type, size);
            }
        }
        IncomingMessages::TickSize => {
            let (request_id, tick) = decode_tick_size(message)?;
            wrapper.tick_size(request_id, tick.tick_type, tick.size);
        }
        IncomingMessages::TickGeneric => {
            let (request_id, tick) = decode_tick_generic(message)?;
            wrapper.tick_generic(request_id, tick.tick_type, tick.value);
        }
        IncomingMessages::TickString => {
            let (request_id, tick) = decode_tick_string(message)?;
            wrapper.tick_string(request_id, tick.tick_type, &tick.value);
        }
        IncomingMessages::TickOptionComputation => {
            let (request_id, computation) = decode_option_computation(server_version, message)?;
            wrapper.tick_option_computation(request_id, &computation);
        }
        IncomingMessages::TickSnapshotEnd => {
            let request_id = decode_tick_snapshot_end(message)?;
            wrapper.tick_snapshot_end(request_id);
        }
        IncomingMessages::MarketDataType => match decode_market_data_type(message)? {
            (request_id, Some(market_data_type)) => wrapper.market_data_type(request_id, market_data_type),
            (request_id, None) => warn!("unknown market data type for request {request_id}: {message:?}"),
        },
        IncomingMessages::ContractData => {
            let (request_id, details) = decode_contract_details(server_version, message)?;
            wrapper.contract_details(request_id, &details);
        }
        IncomingMessages::ContractDataEnd => {
            let request_id = decode_contract_details_end(message)?;
            wrapper.contract_details_end(request_id);
        }
        IncomingMessages::SecurityDefinitionOptionParameter => {
            let (request_id, parameters) = decode_option_parameters(message)?;
            wrapper.security_definition_option_parameter(request_id, &parameters);
        }
        IncomingMessages::SecurityDefinitionOptionParameterEnd => {
            let request_id = decode_option_parameters_end(message)?;
            wrapper.security_definition_option_parameter_end(request_id);
        }
        IncomingMessages::OrderStatus => {
            let status = decode_order_status(server_version, message)?;
            wrapper.order_status(&status);
        }
        IncomingMessages::OpenOrder => {
            let order_id = decode_open_order_id(server_version, message)?;
            wrapper.open_order(order_id);
        }
        IncomingMessages::OpenOrderEnd => wrapper.open_order_end(),
        IncomingMessages::NextValidId => {
            message.skip(); // message type
            message.skip(); // message version
            let order_id = message.next_int()?;
            allocator.seed(order_id);
            wrapper.next_valid_id(order_id);
        }
        IncomingMessages::ManagedAccounts => {
            message.skip(); // message type
            message.skip(); // message version
            wrapper.managed_accounts(&message.next_string()?);
        }
        IncomingMessages::Error => {
            let request_id = message.request_id().unwrap_or(-1);
            let notice = Notice::from(message);
            wrapper.error(request_id, notice.code, &notice.message);
        }
        kind => debug!("ignoring {kind:?} message"),
    }

    Ok(())
}
