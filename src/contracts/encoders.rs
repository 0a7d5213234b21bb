use super::{Contract, SecurityType};
use crate::messages::{OutgoingMessages, RequestMessage};
use crate::{server_versions, Error};

pub(crate) fn encode_request_contract_data(server_version: i32, request_id: i32, contract: &Contract) -> Result<RequestMessage, Error> {
    const VERSION: i32 = 8;

    let mut packet = RequestMessage::default();

    packet.push_field(&OutgoingMessages::RequestContractData);
    packet.push_field(&VERSION);
    packet.push_field(&request_id);
    packet.push_field(&contract.contract_id);
    packet.push_field(&contract.symbol);
    packet.push_field(&contract.security_type);
    packet.push_field(&contract.last_trade_date_or_contract_month);
    packet.push_field(&contract.strike);
    packet.push_field(&contract.right);
    packet.push_field(&contract.multiplier);
    packet.push_field(&contract.exchange);
    packet.push_field(&contract.primary_exchange);
    packet.push_field(&contract.currency);
    packet.push_field(&contract.local_symbol);
    packet.push_field(&contract.trading_class);
    packet.push_field(&contract.include_expired);
    packet.push_field(&contract.security_id_type);
    packet.push_field(&contract.security_id);

    if server_version >= server_versions::BOND_ISSUERID {
        packet.push_field(&contract.issuer_id);
    }

    Ok(packet)
}

pub(crate) fn encode_request_option_parameters(
    request_id: i32,
    symbol: &str,
    exchange: &str,
    security_type: &SecurityType,
    contract_id: i32,
) -> Result<RequestMessage, Error> {
    let mut message = RequestMessage::default();

    message.push_field(&OutgoingMessages::RequestSecurityDefinitionOptionalParameters);
    message.push_field(&request_id);
    message.push_field(&symbol);
    message.push_field(&exchange);
    message.push_field(security_type);
    message.push_field(&contract_id);

    Ok(message)
}
