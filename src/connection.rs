//! Session setup with the gateway: handshake, start API and the initial account info.

use time::OffsetDateTime;
use time_tz::Tz;

pub(crate) mod common;
pub(crate) mod sync;

pub(crate) use sync::Connection;

/// What the gateway told us while the session was established.
#[derive(Default, Clone, Debug)]
pub struct ConnectionMetadata {
    /// First order id the gateway will accept.
    pub next_order_id: i32,
    pub client_id: i32,
    pub server_version: i32,
    /// Comma-separated list of managed accounts
    pub managed_accounts: String,
    pub connection_time: Option<OffsetDateTime>,
    pub time_zone: Option<&'static Tz>,
}
