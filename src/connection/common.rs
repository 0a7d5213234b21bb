use log::{debug, error, warn};
use time::macros::format_description;
use time::OffsetDateTime;
use time_tz::{timezones, OffsetResult, PrimitiveDateTimeExt, Tz};

use crate::errors::Error;
use crate::messages::{encode_length, IncomingMessages, Notice, OutgoingMessages, RequestMessage, ResponseMessage, CLIENT_ID_IN_USE_CODE};
use crate::server_versions;

/// Server answer to the version handshake.
#[derive(Debug, Clone)]
pub(crate) struct HandshakeData {
    pub server_version: i32,
    pub server_time: String,
}

/// Account information received right after the API is started.
#[derive(Debug, Clone, Default)]
pub(crate) struct AccountInfo {
    pub next_order_id: Option<i32>,
    pub managed_accounts: Option<String>,
}

#[derive(Debug)]
pub(crate) struct ConnectionHandler {
    pub min_version: i32,
    pub max_version: i32,
}

impl Default for ConnectionHandler {
    fn default() -> Self {
        Self {
            min_version: server_versions::MIN_CLIENT_VERSION,
            max_version: server_versions::MAX_CLIENT_VERSION,
        }
    }
}

impl ConnectionHandler {
    pub fn format_handshake(&self) -> Vec<u8> {
        let version_string = format!("v{}..{}", self.min_version, self.max_version);
        debug!("handshake version: {version_string}");

        let mut handshake = Vec::from(b"API\0");
        handshake.extend_from_slice(&encode_length(&version_string));
        handshake
    }

    pub fn parse_handshake_response(&self, response: &mut ResponseMessage) -> Result<HandshakeData, Error> {
        let server_version = response.next_int()?;
        let server_time = response.next_string()?;

        if server_version < server_versions::SEC_DEF_OPT_PARAMS_REQ {
            return Err(Error::ServerVersion(
                server_versions::SEC_DEF_OPT_PARAMS_REQ,
                server_version,
                "option chain requests".into(),
            ));
        }

        Ok(HandshakeData { server_version, server_time })
    }

    pub fn format_start_api(&self, client_id: i32, server_version: i32) -> RequestMessage {
        const VERSION: i32 = 2;

        let mut message = RequestMessage::default();
        message.push_field(&OutgoingMessages::StartApi);
        message.push_field(&VERSION);
        message.push_field(&client_id);

        if server_version > server_versions::OPTIONAL_CAPABILITIES {
            message.push_field(&"");
        }

        message
    }

    /// Extracts whatever account info `message` carries.
    ///
    /// A client id clash is the one error the gateway reports here that ends the session.
    pub fn parse_account_info(&self, message: &mut ResponseMessage) -> Result<AccountInfo, Error> {
        let mut info = AccountInfo::default();

        match message.message_type() {
            IncomingMessages::NextValidId => {
                message.skip(); // message type
                message.skip(); // message version
                info.next_order_id = Some(message.next_int()?);
            }
            IncomingMessages::ManagedAccounts => {
                message.skip(); // message type
                message.skip(); // message version
                info.managed_accounts = Some(message.next_string()?);
            }
            IncomingMessages::Error => {
                let notice = Notice::from(message);
                if notice.code == CLIENT_ID_IN_USE_CODE {
                    return Err(Error::ConnectionRejected(notice.code, notice.message));
                }
                if notice.is_informational() {
                    debug!("notice during connection setup: {notice}");
                } else {
                    error!("error during connection setup: {notice}");
                }
            }
            kind => {
                warn!("dropping {kind:?} received during connection setup");
            }
        }

        Ok(info)
    }
}

/// Parses the handshake time stamp, e.g. "20230405 22:20:39 PST".
pub(crate) fn parse_connection_time(connection_time: &str) -> (Option<OffsetDateTime>, Option<&'static Tz>) {
    let parts: Vec<&str> = connection_time.split(' ').collect();

    if parts.len() < 3 {
        error!("invalid connection time format: {connection_time}");
        return (None, None);
    }

    let zones = timezones::find_by_name(parts[2]);

    if zones.is_empty() {
        error!("time zone not found for {}", parts[2]);
        return (None, None);
    }

    let timezone = zones[0];

    let format = format_description!("[year][month][day] [hour]:[minute]:[second]");
    let date_str = format!("{} {}", parts[0], parts[1]);
    let date = time::PrimitiveDateTime::parse(date_str.as_str(), format);

    match date {
        Ok(connected_at) => match connected_at.assume_timezone(timezone) {
            OffsetResult::Some(date) => (Some(date), Some(timezone)),
            _ => {
                warn!("error setting timezone");
                (None, Some(timezone))
            }
        },
        Err(err) => {
            warn!("could not parse connection time from {date_str}: {err}");
            (None, Some(timezone))
        }
    }
}
