use super::Order;
use crate::contracts::Contract;
use crate::messages::{OutgoingMessages, RequestMessage};
use crate::{server_versions, Error};

const MESSAGE_VERSION: i32 = 45;

pub(crate) fn encode_place_order(server_version: i32, order_id: i32, contract: &Contract, order: &Order) -> Result<RequestMessage, Error> {
    let mut message = RequestMessage::default();

    message.push_field(&OutgoingMessages::PlaceOrder);

    if server_version < server_versions::ORDER_CONTAINER {
        message.push_field(&MESSAGE_VERSION);
    }

    message.push_field(&order_id);

    message.push_field(&contract.contract_id);
    message.push_field(&contract.symbol);
    message.push_field(&contract.security_type);
    message.push_field(&contract.last_trade_date_or_contract_month);
    message.push_field(&contract.strike);
    message.push_field(&contract.right);
    message.push_field(&contract.multiplier);
    message.push_field(&contract.exchange);
    message.push_field(&contract.primary_exchange);
    message.push_field(&contract.currency);
    message.push_field(&contract.local_symbol);
    message.push_field(&contract.trading_class);
    message.push_field(&contract.security_id_type);
    message.push_field(&contract.security_id);

    message.push_field(&order.action);
    message.push_field(&order.total_quantity);
    message.push_field(&order.order_type);
    message.push_field(&order.limit_price);
    message.push_field(&order.aux_price);

    message.push_field(&order.tif);
    message.push_field(&order.oca_group);
    message.push_field(&order.account);
    message.push_field(&order.open_close);
    message.push_field(&order.origin);
    message.push_field(&order.order_ref);
    message.push_field(&order.transmit);
    message.push_field(&order.parent_id);

    message.push_field(&false); // block order
    message.push_field(&false); // sweep to fill
    message.push_field(&Option::<i32>::None); // display size
    message.push_field(&0); // trigger method
    message.push_field(&order.outside_rth);
    message.push_field(&order.hidden);

    if contract.is_bag() {
        message.push_field(&contract.combo_legs.len());

        for combo_leg in &contract.combo_legs {
            message.push_field(&combo_leg.contract_id);
            message.push_field(&combo_leg.ratio);
            message.push_field(&combo_leg.action);
            message.push_field(&combo_leg.exchange);
            message.push_field(&combo_leg.open_close);
            message.push_field(&combo_leg.short_sale_slot);
            message.push_field(&combo_leg.designated_location);
            message.push_field(&combo_leg.exempt_code);
        }

        message.push_field(&0_usize); // per-leg prices
        message.push_field(&0_usize); // smart combo routing params
    }

    message.push_field(&""); // deprecated shares allocation

    message.push_field(&0.0); // discretionary amount
    message.push_field(&order.good_after_time);
    message.push_field(&order.good_till_date);

    // financial advisor allocation
    message.push_field(&"");
    message.push_field(&"");
    message.push_field(&"");
    message.push_field(&"");

    message.push_field(&""); // model code

    message.push_field(&0); // short sale slot
    message.push_field(&""); // designated location
    message.push_field(&-1); // exempt code

    message.push_field(&0); // oca type
    message.push_field(&""); // rule 80A
    message.push_field(&""); // settling firm
    message.push_field(&false); // all or none
    message.push_field(&Option::<i32>::None); // min quantity
    message.push_field(&Option::<f64>::None); // percent offset
    message.push_field(&false);
    message.push_field(&false);
    message.push_field(&Option::<f64>::None);
    message.push_field(&0); // auction strategy
    message.push_field(&Option::<f64>::None); // starting price
    message.push_field(&Option::<f64>::None); // stock reference price
    message.push_field(&Option::<f64>::None); // delta
    message.push_field(&Option::<f64>::None); // stock range lower
    message.push_field(&Option::<f64>::None); // stock range upper
    message.push_field(&false); // override percentage constraints

    // volatility orders
    message.push_field(&Option::<f64>::None);
    message.push_field(&Option::<i32>::None);
    message.push_field(&""); // delta neutral order type
    message.push_field(&Option::<f64>::None); // delta neutral aux price
    message.push_field(&false); // continuous update
    message.push_field(&Option::<i32>::None); // reference price type

    message.push_field(&Option::<f64>::None); // trail stop price
    message.push_field(&Option::<f64>::None); // trailing percent

    // scale orders
    message.push_field(&Option::<i32>::None);
    message.push_field(&Option::<i32>::None);
    message.push_field(&Option::<f64>::None);
    message.push_field(&""); // scale table
    message.push_field(&""); // active start time
    message.push_field(&""); // active stop time

    message.push_field(&""); // hedge type
    message.push_field(&false); // opt out smart routing
    message.push_field(&""); // clearing account
    message.push_field(&""); // clearing intent
    message.push_field(&order.not_held);
    message.push_field(&false); // no delta neutral contract

    message.push_field(&""); // algo strategy
    message.push_field(&""); // algo id
    message.push_field(&order.what_if);
    message.push_field(&""); // misc options
    message.push_field(&false); // solicited
    message.push_field(&false); // randomize size
    message.push_field(&false); // randomize price

    if server_version >= server_versions::PEGGED_TO_BENCHMARK {
        message.push_field(&0_usize); // conditions

        message.push_field(&""); // adjusted order type
        message.push_field(&Option::<f64>::None); // trigger price
        message.push_field(&Option::<f64>::None); // limit price offset
        message.push_field(&Option::<f64>::None); // adjusted stop price
        message.push_field(&Option::<f64>::None); // adjusted stop limit price
        message.push_field(&Option::<f64>::None); // adjusted trailing amount
        message.push_field(&0); // adjustable trailing unit
    }

    if server_version >= server_versions::EXT_OPERATOR {
        message.push_field(&"");
    }

    if server_version >= server_versions::SOFT_DOLLAR_TIER {
        message.push_field(&"");
        message.push_field(&"");
    }

    if server_version >= server_versions::CASH_QTY {
        message.push_field(&Option::<f64>::None);
    }

    if server_version >= server_versions::DECISION_MAKER {
        message.push_field(&"");
        message.push_field(&"");
    }

    if server_version >= server_versions::MIFID_EXECUTION {
        message.push_field(&"");
        message.push_field(&"");
    }

    if server_version >= server_versions::AUTO_PRICE_FOR_HEDGE {
        message.push_field(&false);
    }

    if server_version >= server_versions::ORDER_CONTAINER {
        message.push_field(&false); // oms container
    }

    if server_version >= server_versions::D_PEG_ORDERS {
        message.push_field(&false); // discretionary up to limit price
    }

    if server_version >= server_versions::PRICE_MGMT_ALGO {
        message.push_field(&""); // price management algo, gateway default
    }

    if server_version >= server_versions::DURATION {
        message.push_field(&Option::<i32>::None);
    }

    if server_version >= server_versions::POST_TO_ATS {
        message.push_field(&Option::<i32>::None);
    }

    if server_version >= server_versions::AUTO_CANCEL_PARENT {
        message.push_field(&false);
    }

    if server_version >= server_versions::ADVANCED_ORDER_REJECT {
        message.push_field(&""); // advanced error override
    }

    if server_version >= server_versions::MANUAL_ORDER_TIME {
        message.push_field(&""); // manual order time
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{ComboLeg, SecurityType};
    use crate::orders::{limit_order, Action};

    fn spread() -> Contract {
        Contract {
            symbol: "ES".into(),
            security_type: SecurityType::Spread,
            currency: "USD".into(),
            exchange: "GLOBEX".into(),
            combo_legs: vec![
                ComboLeg {
                    contract_id: 330412345,
                    ratio: 3,
                    action: "BUY".into(),
                    exchange: "GLOBEX".into(),
                    ..Default::default()
                },
                ComboLeg {
                    contract_id: 330412346,
                    ratio: 2,
                    action: "SELL".into(),
                    exchange: "GLOBEX".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_encode_place_order_for_spread() {
        let order = limit_order(Action::Buy, 10.0, 12.5);

        let message = encode_place_order(server_versions::SIZE_RULES, 13, &spread(), &order).expect("encode failed");

        assert_eq!(message[0], "3", "message type");
        assert_eq!(message[1], "13", "order id");
        assert_eq!(message[4], "BAG", "security type");
        assert_eq!(message[11], "USD", "currency");
        assert_eq!(message[16], "BUY", "action");
        assert_eq!(message[17], "10", "total quantity");
        assert_eq!(message[18], "LMT", "order type");
        assert_eq!(message[19], "12.5", "limit price");
        assert_eq!(message[20], "", "aux price");
        assert_eq!(message[21], "DAY", "tif");
        assert_eq!(message[27], "1", "transmit");
        assert_eq!(message[35], "2", "combo leg count");
        assert_eq!(message[36], "330412345", "first leg contract id");
        assert_eq!(message[37], "3", "first leg ratio");
        assert_eq!(message[38], "BUY", "first leg action");
        assert_eq!(message[46], "SELL", "second leg action");
        assert_eq!(message[43], "0", "first leg exempt code");
        assert_eq!(message[52], "0", "per-leg prices");
        assert_eq!(message[53], "0", "smart combo routing params");
        assert_eq!(message[54], "", "shares allocation");
    }

    #[test]
    fn test_encode_place_order_with_message_version() {
        let order = limit_order(Action::Sell, 1.0, 3.0);
        let contract = Contract {
            contract_id: 330412345,
            security_type: SecurityType::FuturesOption,
            ..Default::default()
        };

        let old = encode_place_order(server_versions::MARKET_CAP_PRICE, 7, &contract, &order).expect("encode failed");
        let new = encode_place_order(server_versions::SIZE_RULES, 7, &contract, &order).expect("encode failed");

        assert_eq!(old[1], "45", "message version");
        assert_eq!(old[2], "7", "order id");
        assert_eq!(new[1], "7", "order id");
        assert_eq!(old[17], "SELL", "action");
        assert_eq!(new[16], "SELL", "action");
    }
}
