use std::{num::ParseIntError, string::FromUtf8Error};

#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    // Errors from external libraries
    Io(std::io::Error),
    ParseInt(ParseIntError),
    FromUtf8(FromUtf8Error),
    ParseTime(time::error::Parse),
    Csv(csv::Error),
    Poison(String),

    // Errors raised by this crate
    Parse(usize, String, String),
    ServerVersion(i32, i32, String),
    Simple(String),
    ConnectionFailed(String),
    ConnectionRejected(i32, String),
    /// An id-bearing request was attempted before the gateway supplied its first valid id.
    Sequencing(String),
    /// A readiness wait exceeded its bound.
    Timeout(String),
    /// The gateway answered a request with an error notice.
    Gateway {
        request_id: i32,
        code: i32,
        message: String,
    },
    /// The optimizer found no usable selection.
    Infeasible(String),
    Shutdown,
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Io(ref err) => err.fmt(f),
            Error::ParseInt(ref err) => err.fmt(f),
            Error::FromUtf8(ref err) => err.fmt(f),
            Error::ParseTime(ref err) => err.fmt(f),
            Error::Csv(ref err) => err.fmt(f),
            Error::Poison(ref err) => write!(f, "{err}"),

            Error::Parse(i, value, message) => write!(f, "parse error: {i} - {value} - {message}"),
            Error::ServerVersion(wanted, have, message) => write!(f, "server version {wanted} required, got {have}: {message}"),
            Error::Simple(ref err) => write!(f, "error occurred: {err}"),
            Error::ConnectionFailed(ref reason) => write!(f, "connection failed: {reason}"),
            Error::ConnectionRejected(code, message) => write!(f, "connection rejected by gateway: [{code}] {message}"),
            Error::Sequencing(ref err) => write!(f, "request issued out of sequence: {err}"),
            Error::Timeout(ref waiting_for) => write!(f, "timed out waiting for {waiting_for}"),
            Error::Gateway {
                request_id,
                code,
                message,
            } => write!(f, "gateway error for request {request_id}: [{code}] {message}"),
            Error::Infeasible(ref reason) => write!(f, "no feasible selection: {reason}"),
            Error::Shutdown => write!(f, "client is shutting down"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseIntError> for Error {
    fn from(err: ParseIntError) -> Error {
        Error::ParseInt(err)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(err: FromUtf8Error) -> Error {
        Error::FromUtf8(err)
    }
}

impl From<time::error::Parse> for Error {
    fn from(err: time::error::Parse) -> Error {
        Error::ParseTime(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Error {
        Error::Csv(err)
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Error {
        Error::Poison(format!("Mutex poison error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_gateway_error() {
        let err = Error::Gateway {
            request_id: 9001,
            code: 200,
            message: "No security definition has been found for the request".into(),
        };

        assert_eq!(
            err.to_string(),
            "gateway error for request 9001: [200] No security definition has been found for the request"
        );
    }

    #[test]
    fn test_display_timeout() {
        let err = Error::Timeout("underlying price".into());
        assert_eq!(err.to_string(), "timed out waiting for underlying price");
    }

    #[test]
    fn test_from_poison_error() {
        let lock = std::sync::Arc::new(std::sync::Mutex::new(0));
        let cloned = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = cloned.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let err: Error = lock.lock().unwrap_err().into();
        assert!(matches!(err, Error::Poison(_)), "expected poison error, got {err:?}");
    }
}
