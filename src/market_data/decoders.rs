use super::{MarketDataType, TickAttribute, TickGeneric, TickPrice, TickSize, TickString, TickType};
use crate::messages::ResponseMessage;
use crate::{server_versions, Error};

pub(crate) fn decode_tick_price(server_version: i32, message: &mut ResponseMessage) -> Result<(i32, TickPrice), Error> {
    message.skip(); // message type
    let message_version = message.next_int()?;
    let request_id = message.next_int()?;

    let mut tick_price = TickPrice {
        tick_type: TickType::from(message.next_int()?),
        price: message.next_double()?,
        ..Default::default()
    };

    let size = if message_version >= 2 { Some(message.next_double()?) } else { None };

    if message_version >= 3 {
        tick_price.attributes = decode_attribute_mask(server_version, message.next_int()?);
    }

    if let (Some(size), Some(size_tick_type)) = (size, tick_price.tick_type.size_tick()) {
        tick_price.size = Some((size_tick_type, size));
    }

    Ok((request_id, tick_price))
}

fn decode_attribute_mask(server_version: i32, mask: i32) -> TickAttribute {
    let mut attributes = TickAttribute::default();

    if server_version >= server_versions::PAST_LIMIT {
        attributes.can_auto_execute = mask & 0x1 == 0x1;
        attributes.past_limit = mask & 0x2 == 0x2;

        if server_version >= server_versions::PRE_OPEN_BID_ASK {
            attributes.pre_open = mask & 0x4 == 0x4;
        }
    }

    attributes
}

pub(crate) fn decode_tick_size(message: &mut ResponseMessage) -> Result<(i32, TickSize), Error> {
    message.skip(); // message type
    message.skip(); // message version
    let request_id = message.next_int()?;

    Ok((
        request_id,
        TickSize {
            tick_type: TickType::from(message.next_int()?),
            size: message.next_double()?,
        },
    ))
}

pub(crate) fn decode_tick_string(message: &mut ResponseMessage) -> Result<(i32, TickString), Error> {
    message.skip(); // message type
    message.skip(); // message version
    let request_id = message.next_int()?;

    Ok((
        request_id,
        TickString {
            tick_type: TickType::from(message.next_int()?),
            value: message.next_string()?,
        },
    ))
}

pub(crate) fn decode_tick_generic(message: &mut ResponseMessage) -> Result<(i32, TickGeneric), Error> {
    message.skip(); // message type
    message.skip(); // message version
    let request_id = message.next_int()?;

    Ok((
        request_id,
        TickGeneric {
            tick_type: TickType::from(message.next_int()?),
            value: message.next_double()?,
        },
    ))
}

pub(crate) fn decode_tick_snapshot_end(message: &mut ResponseMessage) -> Result<i32, Error> {
    message.skip(); // message type
    message.skip(); // message version

    message.next_int()
}

pub(crate) fn decode_market_data_type(message: &mut ResponseMessage) -> Result<(i32, Option<MarketDataType>), Error> {
    message.skip(); // message type
    message.skip(); // message version
    let request_id = message.next_int()?;

    Ok((request_id, MarketDataType::from(message.next_int()?)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_decode_close_tick() {
        let mut message = ResponseMessage::from_simple("1|6|9000|9|4521.25|0|0|");

        let (request_id, tick) = decode_tick_price(server_versions::SIZE_RULES, &mut message).expect("error decoding tick price");

        assert_eq!(request_id, 9000, "request_id");
        assert_eq!(tick.tick_type, TickType::Close, "tick_type");
        assert_eq!(tick.price, 4521.25, "price");
        assert_eq!(tick.size, None, "close has no paired size");
    }

    #[test]
    fn test_decode_last_tick_with_size_and_attributes() {
        let mut message = ResponseMessage::from_simple("1|6|9003|4|7.25|12|6|");

        let (request_id, tick) = decode_tick_price(server_versions::SIZE_RULES, &mut message).expect("error decoding tick price");

        assert_eq!(request_id, 9003, "request_id");
        assert_eq!(tick.tick_type, TickType::Last, "tick_type");
        assert_eq!(tick.size, Some((TickType::LastSize, 12.0)), "size");
        assert_eq!(
            tick.attributes,
            TickAttribute {
                can_auto_execute: false,
                past_limit: true,
                pre_open: true,
            }
        );
    }

    #[test]
    fn test_attribute_mask_ignored_for_old_servers() {
        let attributes = decode_attribute_mask(server_versions::SEC_DEF_OPT_PARAMS_REQ, 0x7);
        assert_eq!(attributes, TickAttribute::default());

        let attributes = decode_attribute_mask(server_versions::PAST_LIMIT, 0x7);
        assert!(attributes.can_auto_execute);
        assert!(!attributes.pre_open, "pre open needs a newer server");
    }

    #[test]
    fn test_decode_tick_size() {
        let mut message = ResponseMessage::from_simple("2|6|9000|8|1500|");

        let (request_id, tick) = decode_tick_size(&mut message).expect("error decoding tick size");

        assert_eq!(request_id, 9000);
        assert_eq!(tick.tick_type, TickType::Volume);
        assert_eq!(tick.size, 1500.0);
    }

    #[test]
    fn test_decode_tick_generic_and_string() {
        let mut message = ResponseMessage::from_simple("45|6|9000|24|0.18|");
        let (request_id, tick) = decode_tick_generic(&mut message).expect("error decoding tick generic");
        assert_eq!(request_id, 9000);
        assert_eq!(tick.tick_type, TickType::OptionImpliedVol);
        assert_eq!(tick.value, 0.18);

        let mut message = ResponseMessage::from_simple("46|6|9000|45|1700000000|");
        let (request_id, tick) = decode_tick_string(&mut message).expect("error decoding tick string");
        assert_eq!(request_id, 9000);
        assert_eq!(tick.tick_type, TickType::Unknown);
        assert_eq!(tick.value, "1700000000");
    }

    #[test]
    fn test_decode_snapshot_end_and_market_data_type() {
        let mut message = ResponseMessage::from_simple("57|1|9004|");
        assert_eq!(decode_tick_snapshot_end(&mut message).unwrap(), 9004);

        let mut message = ResponseMessage::from_simple("58|1|9000|3|");
        assert_eq!(decode_market_data_type(&mut message).unwrap(), (9000, Some(MarketDataType::Delayed)));
    }
}
