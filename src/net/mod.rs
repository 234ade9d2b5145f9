//! Blocking network helpers
//!
//! Both RAOP channels are plain TCP connections from the standard library,
//! created here so that timeouts and error mapping are applied uniformly.

pub mod local_addr;


use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{RaopError, Result};

pub use local_addr::{detect_local_address, select_local_address};

/// Socket timeouts; `None` blocks indefinitely
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketTimeouts {
    /// TCP connect timeout (per resolved address)
    pub connect: Option<Duration>,
    /// Read timeout on the established stream
    pub read: Option<Duration>,
    /// Write timeout on the established stream
    pub write: Option<Duration>,
}

impl SocketTimeouts {
    /// Default timeout for every operation
    pub const DEFAULT: Duration = Duration::from_secs(10);

    /// Timeouts disabled
    pub const NONE: Self = Self {
        connect: None,
        read: None,
        write: None,
    };
}

impl Default for SocketTimeouts {
    fn default() -> Self {
        Self {
            connect: Some(Self::DEFAULT),
            read: Some(Self::DEFAULT),
            write: Some(Self::DEFAULT),
        }
    }
}

/// Open a TCP connection to `host:port`
///
/// Every resolved address is tried in turn; the last failure is reported.
///
/// # Errors
///
/// Returns `RaopError::Connection` if resolution fails, no address accepts
/// the connection, or the socket options cannot be applied.
pub fn connect_tcp(host: &str, port: u16, timeouts: &SocketTimeouts) -> Result<TcpStream> {
    let addr = format!("{host}:{port}");
    let connection_error = |source| RaopError::Connection {
        addr: addr.clone(),
        source,
    };

    let candidates = (host, port).to_socket_addrs().map_err(connection_error)?;

    let mut last_error = std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "host resolved to no addresses",
    );
    for candidate in candidates {
        let attempt = match timeouts.connect {
            Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(stream) => {
                stream
                    .set_read_timeout(timeouts.read)
                    .and_then(|()| stream.set_write_timeout(timeouts.write))
                    .and_then(|()| stream.set_nodelay(true))
                    .map_err(connection_error)?;
                tracing::debug!(%candidate, "TCP connected");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%candidate, error = %e, "TCP connect attempt failed");
                last_error = e;
            }
        }
    }

    Err(connection_error(last_error))
}
