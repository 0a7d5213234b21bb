use super::OrderStatus;
use crate::messages::ResponseMessage;
use crate::{server_versions, Error};

pub(crate) fn decode_order_status(server_version: i32, message: &mut ResponseMessage) -> Result<OrderStatus, Error> {
    message.skip(); // message type

    if server_version < server_versions::MARKET_CAP_PRICE {
        message.skip(); // message version
    };

    let mut order_status = OrderStatus {
        order_id: message.next_int()?,
        status: message.next_string()?,
        filled: message.next_double()?,
        remaining: message.next_double()?,
        average_fill_price: message.next_double()?,
        perm_id: message.next_int()?,
        parent_id: message.next_int()?,
        last_fill_price: message.next_double()?,
        client_id: message.next_int()?,
        why_held: message.next_string()?,
        ..Default::default()
    };

    if server_version >= server_versions::MARKET_CAP_PRICE {
        order_status.market_cap_price = message.next_double()?;
    }

    Ok(order_status)
}

/// Reads only the order id of an open order message; the rest is not used.
pub(crate) fn decode_open_order_id(server_version: i32, message: &mut ResponseMessage) -> Result<i32, Error> {
    message.skip(); // message type

    if server_version < server_versions::ORDER_CONTAINER {
        message.skip(); // message version
    }

    message.next_int()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_decode_order_status() {
        let mut message = ResponseMessage::from_simple("3|13|PreSubmitted|0|10|0|1376327563|0|0|100||0|");

        let status = decode_order_status(server_versions::SIZE_RULES, &mut message).expect("error decoding order status");

        assert_eq!(
            status,
            OrderStatus {
                order_id: 13,
                status: "PreSubmitted".into(),
                remaining: 10.0,
                perm_id: 1376327563,
                client_id: 100,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_decode_order_status_with_message_version() {
        let mut message = ResponseMessage::from_simple("3|6|13|Filled|10|0|2.5|1376327563|0|2.5|100||");

        let status = decode_order_status(server_versions::SEC_DEF_OPT_PARAMS_REQ, &mut message).expect("error decoding order status");

        assert_eq!(status.order_id, 13);
        assert_eq!(status.status, "Filled");
        assert_eq!(status.filled, 10.0);
        assert_eq!(status.average_fill_price, 2.5);
    }

    #[test]
    fn test_decode_open_order_id() {
        let mut message = ResponseMessage::from_simple("5|13|0|ES|BAG|");
        assert_eq!(decode_open_order_id(server_versions::SIZE_RULES, &mut message).unwrap(), 13);

        let mut message = ResponseMessage::from_simple("5|34|13|0|ES|BAG|");
        assert_eq!(decode_open_order_id(server_versions::MARKET_CAP_PRICE, &mut message).unwrap(), 13);
    }
}
