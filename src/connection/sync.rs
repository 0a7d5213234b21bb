use std::sync::Mutex;

use log::{debug, info};

use super::common::{parse_connection_time, AccountInfo, ConnectionHandler};
use super::ConnectionMetadata;
use crate::errors::Error;
use crate::messages::{encode_length, RequestMessage, ResponseMessage};
use crate::transport::recorder::MessageRecorder;
use crate::transport::Stream;

// Upper bound on messages inspected while waiting for the next valid id and account list.
const MAX_ACCOUNT_INFO_MESSAGES: i32 = 100;

/// An established session with the gateway.
#[derive(Debug)]
pub(crate) struct Connection<S: Stream> {
    pub(crate) client_id: i32,
    pub(crate) socket: S,
    pub(crate) connection_metadata: Mutex<ConnectionMetadata>,
    pub(crate) recorder: MessageRecorder,
    pub(crate) connection_handler: ConnectionHandler,
}

impl<S: Stream> Connection<S> {
    /// Runs the handshake on `socket` and waits for the initial account info.
    pub fn connect(socket: S, client_id: i32) -> Result<Self, Error> {
        Self::connect_with_recorder(socket, client_id, MessageRecorder::from_env())
    }

    pub(crate) fn connect_with_recorder(socket: S, client_id: i32, recorder: MessageRecorder) -> Result<Self, Error> {
        let connection = Self {
            client_id,
            socket,
            connection_metadata: Mutex::new(ConnectionMetadata {
                client_id,
                ..Default::default()
            }),
            recorder,
            connection_handler: ConnectionHandler::default(),
        };

        connection.establish_connection()?;

        Ok(connection)
    }

    pub fn connection_metadata(&self) -> Result<ConnectionMetadata, Error> {
        let metadata = self.connection_metadata.lock()?;
        Ok(metadata.clone())
    }

    pub(crate) fn server_version(&self) -> Result<i32, Error> {
        let metadata = self.connection_metadata.lock()?;
        Ok(metadata.server_version)
    }

    fn establish_connection(&self) -> Result<(), Error> {
        self.handshake()?;
        self.start_api()?;
        self.receive_account_info()?;
        Ok(())
    }

    pub(crate) fn write_message(&self, message: &RequestMessage) -> Result<(), Error> {
        self.recorder.record_request(message);
        let encoded = message.encode();
        debug!("-> {encoded:?}");
        self.socket.write_all(&encode_length(&encoded))?;
        Ok(())
    }

    pub(crate) fn read_message(&self) -> Result<ResponseMessage, Error> {
        let data = self.socket.read_message()?;
        let raw_string = String::from_utf8_lossy(&data).into_owned();
        debug!("<- {raw_string:?}");

        let message = ResponseMessage::from(&raw_string);

        self.recorder.record_response(&message);

        Ok(message)
    }

    pub(crate) fn shutdown(&self) -> Result<(), Error> {
        self.socket.shutdown()
    }

    fn handshake(&self) -> Result<(), Error> {
        let handshake = self.connection_handler.format_handshake();
        debug!("-> handshake: {handshake:?}");

        self.socket.write_all(&handshake)?;

        let mut response = match self.read_message() {
            Ok(response) => response,
            Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(Error::ConnectionFailed(format!("the server may be rejecting connections from this host: {err}")));
            }
            Err(err) => return Err(err),
        };

        let handshake_data = self.connection_handler.parse_handshake_response(&mut response)?;

        let mut connection_metadata = self.connection_metadata.lock()?;
        connection_metadata.server_version = handshake_data.server_version;

        let (time, tz) = parse_connection_time(&handshake_data.server_time);
        connection_metadata.connection_time = time;
        connection_metadata.time_zone = tz;

        info!("connected to server version {}", handshake_data.server_version);

        Ok(())
    }

    fn start_api(&self) -> Result<(), Error> {
        let server_version = self.server_version()?;
        let message = self.connection_handler.format_start_api(self.client_id, server_version);
        self.write_message(&message)
    }

    fn receive_account_info(&self) -> Result<(), Error> {
        let mut account_info = AccountInfo::default();

        for _ in 0..MAX_ACCOUNT_INFO_MESSAGES {
            let mut message = match self.read_message() {
                Ok(message) => message,
                Err(Error::Io(err)) if matches!(err.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) => continue,
                Err(err) => return Err(err),
            };

            let info = self.connection_handler.parse_account_info(&mut message)?;

            if info.next_order_id.is_some() {
                account_info.next_order_id = info.next_order_id;
            }
            if info.managed_accounts.is_some() {
                account_info.managed_accounts = info.managed_accounts;
            }

            if account_info.next_order_id.is_some() && account_info.managed_accounts.is_some() {
                break;
            }
        }

        let mut connection_metadata = self.connection_metadata.lock()?;
        if let Some(next_order_id) = account_info.next_order_id {
            connection_metadata.next_order_id = next_order_id;
        }
        if let Some(managed_accounts) = account_info.managed_accounts {
            connection_metadata.managed_accounts = managed_accounts;
        }

        Ok(())
    }
}
