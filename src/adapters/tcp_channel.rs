//! TCP implementation of the channel port.
//!
//! Frames are length-prefixed (big-endian u32) over a plain TCP stream.
//! Bounded waits map onto the socket read timeout: a timeout surfaces as
//! [`Received::TimedOut`], a clean EOF as [`Received::Closed`].

use std::{
    io::{ErrorKind, Read, Write},
    net::{Shutdown, TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::{
    Result,
    error::Error,
    ports::{Channel, Received},
};

/// Length-prefixed frame channel over TCP.
pub struct TcpChannel {
    stream: TcpStream,
    closed: bool,
}

impl TcpChannel {
    /// Connect to the simulator at `address` (e.g. `"localhost:8765"`).
    pub fn connect<A: ToSocketAddrs>(address: A) -> Result<Self> {
        let stream = TcpStream::connect(address).map_err(|source| Error::Io {
            operation: "connect to simulator".to_string(),
            source,
        })?;
        stream.set_nodelay(true).map_err(|source| Error::Io {
            operation: "configure socket".to_string(),
            source,
        })?;
        Ok(Self {
            stream,
            closed: false,
        })
    }

    fn read_exact_frame(&mut self, buf: &mut [u8]) -> Result<Received> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.closed = true;
                    return Ok(Received::Closed);
                }
                Ok(n) => filled += n,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    // Timing out mid-frame only happens on the first read of
                    // the length prefix; a peer never stalls inside a frame.
                    if filled == 0 {
                        return Ok(Received::TimedOut);
                    }
                    return Err(Error::Io {
                        operation: "read frame body".to_string(),
                        source: e,
                    });
                }
                Err(e) => {
                    return Err(Error::Io {
                        operation: "read frame".to_string(),
                        source: e,
                    });
                }
            }
        }
        Ok(Received::Frame(Vec::new()))
    }
}

impl Channel for TcpChannel {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        let prefix = (frame.len() as u32).to_be_bytes();
        self.stream
            .write_all(&prefix)
            .and_then(|()| self.stream.write_all(frame))
            .map_err(|source| Error::Io {
                operation: "send frame".to_string(),
                source,
            })
    }

    fn receive(&mut self, timeout: Option<Duration>) -> Result<Received> {
        if self.closed {
            return Ok(Received::Closed);
        }
        self.stream
            .set_read_timeout(timeout)
            .map_err(|source| Error::Io {
                operation: "set read timeout".to_string(),
                source,
            })?;

        let mut prefix = [0u8; 4];
        match self.read_exact_frame(&mut prefix)? {
            Received::Frame(_) => {}
            other => return Ok(other),
        }

        let len = u32::from_be_bytes(prefix) as usize;
        let mut body = vec![0u8; len];
        match self.read_exact_frame(&mut body)? {
            Received::Frame(_) => Ok(Received::Frame(body)),
            other => Ok(other),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // The peer may already have gone away; teardown stays quiet.
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(source) => Err(Error::Io {
                operation: "shutdown channel".to_string(),
                source,
            }),
        }
    }
}
