//! Framed byte transport to the gateway.

use std::io::{Cursor, Read, Write};
use std::net::TcpStream;
use std::sync::Mutex;
use std::time::Duration;

use byteorder::{BigEndian, ReadBytesExt};

use crate::Error;

pub(crate) mod recorder;

// Bounds how long the dispatcher blocks before it re-checks for shutdown.
const TWS_READ_TIMEOUT: Duration = Duration::from_secs(1);

pub trait Io {
    /// Reads one length-prefixed frame and returns its payload.
    fn read_message(&self) -> Result<Vec<u8>, Error>;
    fn write_all(&self, buf: &[u8]) -> Result<(), Error>;
}

pub trait Stream: Io + Sync + Send + 'static + std::fmt::Debug {
    /// Closes both halves of the stream. Pending reads return promptly.
    fn shutdown(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct TcpSocket {
    reader: Mutex<TcpStream>,
    writer: Mutex<TcpStream>,
}

impl TcpSocket {
    pub fn connect(address: &str) -> Result<Self, Error> {
        let stream = TcpStream::connect(address).map_err(|err| Error::ConnectionFailed(format!("{address}: {err}")))?;
        Self::new(stream)
    }

    pub fn new(stream: TcpStream) -> Result<Self, Error> {
        let writer = stream.try_clone()?;

        stream.set_read_timeout(Some(TWS_READ_TIMEOUT))?;

        Ok(Self {
            reader: Mutex::new(stream),
            writer: Mutex::new(writer),
        })
    }
}

impl Io for TcpSocket {
    fn read_message(&self) -> Result<Vec<u8>, Error> {
        let mut reader = self.reader.lock()?;
        read_message(&mut *reader)
    }

    fn write_all(&self, buf: &[u8]) -> Result<(), Error> {
        let mut writer = self.writer.lock()?;
        writer.write_all(buf)?;
        Ok(())
    }
}

impl Stream for TcpSocket {
    fn shutdown(&self) -> Result<(), Error> {
        let writer = self.writer.lock()?;
        writer.shutdown(std::net::Shutdown::Both)?;
        Ok(())
    }
}

fn read_header(reader: &mut impl Read) -> Result<usize, Error> {
    let buffer = &mut [0_u8; 4];
    reader.read_exact(buffer)?;
    let mut reader = Cursor::new(buffer);
    let count = reader.read_u32::<BigEndian>()?;
    Ok(count as usize)
}

pub(crate) fn read_message(reader: &mut impl Read) -> Result<Vec<u8>, Error> {
    let message_size = read_header(reader)?;
    let mut data = vec![0_u8; message_size];
    reader.read_exact(&mut data)?;
    Ok(data)
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory stream used to drive connections and clients in tests.

    use std::collections::VecDeque;
    use std::io::ErrorKind;
    use std::sync::Mutex;

    use super::{Io, Stream};
    use crate::messages::encode_length;
    use crate::Error;

    /// Serves queued frames to readers and captures everything written.
    ///
    /// Reads on an empty queue fail with `WouldBlock`, which is what a timed out socket read looks like.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryStream {
        inbound: Mutex<VecDeque<Vec<u8>>>,
        outbound: Mutex<Vec<Vec<u8>>>,
    }

    impl MemoryStream {
        /// Builds a stream serving `responses`, written with `|` as the field separator.
        pub fn with_responses(responses: &[&str]) -> Self {
            let stream = Self::default();
            for response in responses {
                stream.push_response(response);
            }
            stream
        }

        pub fn push_response(&self, response: &str) {
            let payload = response.replace('|', "\0");
            if let Ok(mut inbound) = self.inbound.lock() {
                inbound.push_back(payload.into_bytes());
            }
        }

        /// Frames written so far, with `|` as the field separator and the length prefix removed.
        pub fn requests(&self) -> Vec<String> {
            let outbound = self.outbound.lock().expect("poisoned");
            outbound
                .iter()
                .map(|frame| String::from_utf8_lossy(&frame[4..]).replace('\0', "|"))
                .collect()
        }

        pub fn raw_writes(&self) -> Vec<Vec<u8>> {
            self.outbound.lock().expect("poisoned").clone()
        }
    }

    impl Io for MemoryStream {
        fn read_message(&self) -> Result<Vec<u8>, Error> {
            let mut inbound = self.inbound.lock()?;
            match inbound.pop_front() {
                Some(frame) => Ok(frame),
                None => {
                    drop(inbound);
                    std::thread::sleep(std::time::Duration::from_millis(2));
                    Err(Error::Io(std::io::Error::new(ErrorKind::WouldBlock, "no data queued")))
                }
            }
        }

        fn write_all(&self, buf: &[u8]) -> Result<(), Error> {
            self.outbound.lock()?.push(buf.to_vec());
            Ok(())
        }
    }

    impl Stream for MemoryStream {}

    #[test]
    fn test_memory_stream_frames() {
        let stream = MemoryStream::with_responses(&["9|1|42|"]);

        assert_eq!(stream.read_message().unwrap(), b"9\x001\x0042\x00".to_vec());
        assert!(matches!(stream.read_message(), Err(Error::Io(ref err)) if err.kind() == ErrorKind::WouldBlock));

        stream.write_all(&encode_length("2\x001\x009000\x00")).unwrap();
        assert_eq!(stream.requests(), vec!["2|1|9000|"]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::encode_length;
    use crate::tests::assert_send_and_sync;

    #[test]
    fn test_read_message_splits_frames() {
        let mut bytes = encode_length("176\020230405 22:20:39 PST\0");
        bytes.extend(encode_length("9\x001\x0090\x00"));

        let mut reader = Cursor::new(bytes);

        assert_eq!(read_message(&mut reader).unwrap(), b"176\x0020230405 22:20:39 PST\x00".to_vec());
        assert_eq!(read_message(&mut reader).unwrap(), b"9\x001\x0090\x00".to_vec());
        assert!(read_message(&mut reader).is_err(), "no more frames");
    }

    #[test]
    fn test_read_message_truncated_payload() {
        let mut bytes = encode_length("9\x001\x0090\x00");
        bytes.truncate(6);

        let mut reader = Cursor::new(bytes);
        let result = read_message(&mut reader);

        assert!(matches!(result, Err(Error::Io(ref err)) if err.kind() == std::io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_tcp_socket_is_send_and_sync() {
        assert_send_and_sync::<TcpSocket>();
    }
}
