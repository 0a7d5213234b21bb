//! Gateway client: owns the session, sends requests and runs the dispatcher thread.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ibgamma::client::Client;
//! use ibgamma::wrapper::Wrapper;
//!
//! struct Printer;
//! impl Wrapper for Printer {}
//!
//! let client = Client::connect("127.0.0.1:7497", 999).expect("connection failed");
//! client.start(Arc::new(Printer)).expect("dispatcher failed to start");
//! ```

use std::fmt;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{debug, error, info};

use crate::connection::Connection;
use crate::transport::recorder::MessageRecorder;
use crate::wrapper::Wrapper;
use crate::Error;

pub(crate) mod dispatcher;
mod id_generator;
mod requests;

pub use crate::connection::ConnectionMetadata;
pub use crate::transport::{Io, Stream, TcpSocket};
pub use id_generator::RequestIdAllocator;
pub use requests::Request;

/// Anything requests can be sent through.
pub trait Sender: Send + Sync {
    fn send(&self, request: &Request) -> Result<(), Error>;
}

/// Connection to TWS or IB Gateway.
pub struct Client<S: Stream = TcpSocket> {
    connection: Arc<Connection<S>>,
    server_version: i32,
    id_allocator: Arc<RequestIdAllocator>,
    shutdown: Arc<AtomicBool>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Client<TcpSocket> {
    /// Connects to the gateway at `address` (e.g. `127.0.0.1:7497`) as `client_id`.
    ///
    /// Returns once the gateway has reported its first valid id and the managed accounts.
    pub fn connect(address: &str, client_id: i32) -> Result<Client<TcpSocket>, Error> {
        info!("connecting to {address} as client {client_id}");
        let socket = TcpSocket::connect(address)?;
        Self::with_stream(socket, client_id, MessageRecorder::from_env())
    }
}

impl<S: Stream> Client<S> {
    pub(crate) fn with_stream(stream: S, client_id: i32, recorder: MessageRecorder) -> Result<Client<S>, Error> {
        let connection = Connection::connect_with_recorder(stream, client_id, recorder)?;
        let metadata = connection.connection_metadata()?;

        let id_allocator = RequestIdAllocator::new();
        if metadata.next_order_id > 0 {
            id_allocator.seed(metadata.next_order_id);
        }

        Ok(Client {
            connection: Arc::new(connection),
            server_version: metadata.server_version,
            id_allocator: Arc::new(id_allocator),
            shutdown: Arc::new(AtomicBool::new(false)),
            dispatcher: Mutex::new(None),
        })
    }

    pub fn server_version(&self) -> i32 {
        self.server_version
    }

    pub fn connection_metadata(&self) -> Result<ConnectionMetadata, Error> {
        self.connection.connection_metadata()
    }

    /// Shared id allocator; re-seeded whenever the gateway reports a next valid id.
    pub fn id_allocator(&self) -> Arc<RequestIdAllocator> {
        Arc::clone(&self.id_allocator)
    }

    /// A cloneable handle for sending requests from any thread.
    pub fn sender(&self) -> ClientSender<S> {
        ClientSender {
            connection: Arc::clone(&self.connection),
            server_version: self.server_version,
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Starts the dispatcher thread delivering inbound messages to `wrapper`.
    pub fn start(&self, wrapper: Arc<dyn Wrapper>) -> Result<(), Error> {
        let mut dispatcher = self.dispatcher.lock()?;
        if dispatcher.is_some() {
            return Err(Error::Simple("dispatcher already started".into()));
        }

        let connection = Arc::clone(&self.connection);
        let allocator = Arc::clone(&self.id_allocator);
        let shutdown = Arc::clone(&self.shutdown);
        let server_version = self.server_version;

        let handle = thread::Builder::new()
            .name("ibgamma-dispatcher".into())
            .spawn(move || run_dispatcher(server_version, &connection, wrapper.as_ref(), &allocator, &shutdown))?;

        *dispatcher = Some(handle);
        Ok(())
    }

    /// Stops the dispatcher thread and closes the session. Safe to call more than once.
    pub fn disconnect(&self) -> Result<(), Error> {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        debug!("disconnect requested");

        if let Err(err) = self.connection.shutdown() {
            debug!("error closing socket: {err}");
        }

        let handle = self.dispatcher.lock()?.take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("dispatcher thread panicked");
            }
        }

        info!("disconnected");
        Ok(())
    }
}

impl<S: Stream> Drop for Client<S> {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            error!("error disconnecting: {err}");
        }
    }
}

impl<S: Stream> fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("server_version", &self.server_version)
            .field("next_id", &self.id_allocator.current())
            .finish()
    }
}

fn run_dispatcher<S: Stream>(
    server_version: i32,
    connection: &Connection<S>,
    wrapper: &dyn Wrapper,
    allocator: &RequestIdAllocator,
    shutdown: &AtomicBool,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        match connection.read_message() {
            Ok(mut message) => {
                if let Err(err) = dispatcher::dispatch(server_version, &mut message, wrapper, allocator) {
                    error!("error decoding message {message:?}: {err}");
                }
            }
            Err(ref err) if is_timeout_error(err) => continue,
            Err(err) => {
                if !shutdown.load(Ordering::SeqCst) {
                    error!("error reading next message, closing session: {err}");
                    shutdown.store(true, Ordering::SeqCst);
                    wrapper.connection_closed();
                }
                break;
            }
        }
    }

    debug!("dispatcher thread finished");
}

fn is_timeout_error(err: &Error) -> bool {
    matches!(err, Error::Io(io) if matches!(io.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut))
}

/// Sends requests over a client's connection. Cheap to clone.
pub struct ClientSender<S: Stream = TcpSocket> {
    connection: Arc<Connection<S>>,
    server_version: i32,
    shutdown: Arc<AtomicBool>,
}

impl<S: Stream> Clone for ClientSender<S> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            server_version: self.server_version,
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<S: Stream> Sender for ClientSender<S> {
    fn send(&self, request: &Request) -> Result<(), Error> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(Error::Shutdown);
        }

        let message = request.encode(self.server_version)?;
        self.connection.write_message(&message)
    }
}

#[cfg(test)]
mod tests;
