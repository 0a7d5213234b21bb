//! Server version gates for the messages this crate speaks.
//!
//! Versions below [SEC_DEF_OPT_PARAMS_REQ] are refused at connect time, so every
//! older feature gate is assumed to hold and is not listed here.

/// Handshake lower bound.
pub const MIN_CLIENT_VERSION: i32 = 100;
pub const OPTIONAL_CAPABILITIES: i32 = 72;
pub const PEGGED_TO_BENCHMARK: i32 = 102;
/// Option parameter requests. The oldest gateway this crate accepts.
pub const SEC_DEF_OPT_PARAMS_REQ: i32 = 104;
pub const EXT_OPERATOR: i32 = 105;
pub const SOFT_DOLLAR_TIER: i32 = 106;
pub const PAST_LIMIT: i32 = 109;
pub const MD_SIZE_MULTIPLIER: i32 = 110;
pub const CASH_QTY: i32 = 111;
pub const REQ_SMART_COMPONENTS: i32 = 114;
pub const MARKET_CAP_PRICE: i32 = 131;
pub const PRE_OPEN_BID_ASK: i32 = 132;
pub const DECISION_MAKER: i32 = 138;
pub const MIFID_EXECUTION: i32 = 139;
pub const AUTO_PRICE_FOR_HEDGE: i32 = 141;
pub const ORDER_CONTAINER: i32 = 145;
pub const D_PEG_ORDERS: i32 = 148;
pub const PRICE_MGMT_ALGO: i32 = 151;
pub const STOCK_TYPE: i32 = 152;
/// Option computation messages drop their version field and gain a tick attribute.
pub const PRICE_BASED_VOLATILITY: i32 = 156;
pub const DURATION: i32 = 158;
pub const POST_TO_ATS: i32 = 160;
pub const AUTO_CANCEL_PARENT: i32 = 162;
pub const SIZE_RULES: i32 = 164;
pub const ADVANCED_ORDER_REJECT: i32 = 166;
pub const MANUAL_ORDER_TIME: i32 = 169;
pub const BOND_ISSUERID: i32 = 176;
/// Handshake upper bound.
pub const MAX_CLIENT_VERSION: i32 = BOND_ISSUERID;
