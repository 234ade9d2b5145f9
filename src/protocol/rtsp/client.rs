//! Blocking RTSP control connection

use std::io::{self, BufReader, Write};
use std::net::{Shutdown, TcpStream};

use super::codec;
use super::headers::names;
use super::transport::{RAOP_TCP_RECORD, TransportHeader};
use super::{Headers, Method, RtspSession};
use crate::error::{RaopError, Result};
use crate::net::{SocketTimeouts, connect_tcp};

/// Content type of the ANNOUNCE body
const SDP_CONTENT_TYPE: &str = "application/sdp";
/// Content type of `SET_PARAMETER` bodies
const PARAMETERS_CONTENT_TYPE: &str = "text/parameters";
/// Range sent with RECORD
const RECORD_RANGE: &str = "npt=0-";
/// RTP-Info sent with RECORD and FLUSH
const RTP_INFO_START: &str = "seq=0;rtptime=0";

/// Connection options for a [`ControlSession`]
#[derive(Debug, Clone)]
pub struct ControlSessionOptions {
    /// Value of the `User-Agent` header
    pub user_agent: String,
    /// Socket timeouts
    pub timeouts: SocketTimeouts,
}

/// Result of a successful SETUP
#[derive(Debug, Clone)]
pub struct SetupResponse {
    /// Session token assigned by the receiver
    pub session: String,
    /// Data port from the Transport header
    pub server_port: u16,
    /// All response headers
    pub headers: Headers,
}

struct ControlStream {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

/// RTSP control session over one TCP connection
///
/// One request is in flight at a time; every method takes `&mut self`.
pub struct ControlSession {
    host: String,
    port: u16,
    options: ControlSessionOptions,
    rtsp: RtspSession,
    stream: Option<ControlStream>,
    server_port: u16,
}

impl ControlSession {
    /// Create a session for `host:port`; requests target `url`
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        url: impl Into<String>,
        options: ControlSessionOptions,
    ) -> Self {
        let rtsp = RtspSession::new(url, options.user_agent.clone());
        Self {
            host: host.into(),
            port,
            options,
            rtsp,
            stream: None,
            server_port: 0,
        }
    }

    /// Open the TCP connection
    ///
    /// # Errors
    ///
    /// Returns `RaopError::Connection` if the receiver cannot be reached.
    pub fn connect(&mut self) -> Result<()> {
        let writer = connect_tcp(&self.host, self.port, &self.options.timeouts)?;
        let reader = writer.try_clone().map_err(|source| RaopError::Connection {
            addr: format!("{}:{}", self.host, self.port),
            source,
        })?;

        tracing::debug!(host = %self.host, port = self.port, "control channel connected");
        self.stream = Some(ControlStream {
            writer,
            reader: BufReader::new(reader),
        });
        Ok(())
    }

    /// Send a request and optionally read its response
    ///
    /// A body is sent only when both `content_type` and `content` are given.
    /// `headers` replace same-named protocol headers instead of repeating
    /// them; see [`RtspSession::build_request`].
    /// Returns the response headers, or `None` when `expect_response` is
    /// false.
    ///
    /// # Errors
    ///
    /// - `RaopError::Io` if not connected or the socket fails
    /// - `RaopError::UnexpectedStatus` unless the receiver answers `200`
    /// - `RaopError::Protocol` for an unreadable response
    pub fn execute(
        &mut self,
        method: Method,
        content_type: Option<&str>,
        content: Option<&[u8]>,
        headers: Option<&Headers>,
        expect_response: bool,
    ) -> Result<Option<Headers>> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::from(io::ErrorKind::NotConnected).into());
        };

        let request = self
            .rtsp
            .build_request(method, content_type, content, headers);
        tracing::debug!(cseq = self.rtsp.cseq(), "{} {}", method, request.uri);

        stream.writer.write_all(&request.encode())?;
        stream.writer.flush()?;

        if !expect_response {
            return Ok(None);
        }

        let response = codec::read_response(&mut stream.reader)?;
        Ok(Some(response.headers))
    }

    /// Send a request whose response must be read
    fn request(
        &mut self,
        method: Method,
        content_type: Option<&str>,
        content: Option<&[u8]>,
        headers: Option<&Headers>,
    ) -> Result<Headers> {
        self.execute(method, content_type, content, headers, true)?
            .ok_or_else(|| RaopError::protocol("read error"))
    }

    /// ANNOUNCE the stream description
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn announce(&mut self, sdp: &str) -> Result<Headers> {
        self.request(
            Method::Announce,
            Some(SDP_CONTENT_TYPE),
            Some(sdp.as_bytes()),
            None,
        )
    }

    /// SETUP the interleaved TCP transport
    ///
    /// Stores the session token and data port.
    ///
    /// # Errors
    ///
    /// Returns `RaopError::Protocol` if the response lacks a `Session`,
    /// `Transport` or non-zero `server_port`.
    pub fn setup(&mut self) -> Result<SetupResponse> {
        let mut headers = Headers::new();
        headers.insert(names::TRANSPORT, RAOP_TCP_RECORD);

        let response = self.request(Method::Setup, None, None, Some(&headers))?;

        let session = response
            .session()
            .ok_or_else(|| RaopError::protocol("no session in SETUP response"))?
            .to_string();
        self.rtsp.set_session(session.clone());

        let transport = response
            .get(names::TRANSPORT)
            .ok_or_else(|| RaopError::protocol("no transport in SETUP response"))?;
        let server_port = TransportHeader::parse(transport)
            .data_port()
            .ok_or_else(|| RaopError::protocol("no server port in SETUP response"))?;
        self.server_port = server_port;

        tracing::debug!(%session, server_port, "SETUP complete");
        Ok(SetupResponse {
            session,
            server_port,
            headers: response,
        })
    }

    /// Start streaming
    ///
    /// # Errors
    ///
    /// Returns `RaopError::Protocol` if SETUP has not assigned a session.
    pub fn record(&mut self) -> Result<Headers> {
        if self.rtsp.session().is_none() {
            return Err(RaopError::protocol("RECORD requires a session"));
        }

        let mut headers = Headers::new();
        headers.insert(names::RANGE, RECORD_RANGE);
        headers.insert(names::RTP_INFO, RTP_INFO_START);

        self.request(Method::Record, None, None, Some(&headers))
    }

    /// Send a `text/parameters` body
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn set_parameter(&mut self, body: &str) -> Result<Headers> {
        self.request(
            Method::SetParameter,
            Some(PARAMETERS_CONTENT_TYPE),
            Some(body.as_bytes()),
            None,
        )
    }

    /// Ask the receiver to drop buffered audio
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn flush(&mut self) -> Result<Headers> {
        let mut headers = Headers::new();
        headers.insert(names::RTP_INFO, RTP_INFO_START);

        self.request(Method::Flush, None, None, Some(&headers))
    }

    /// Send TEARDOWN without waiting for a response
    ///
    /// # Errors
    ///
    /// Returns `RaopError::Io` if the request cannot be written.
    pub fn teardown(&mut self) -> Result<()> {
        self.execute(Method::Teardown, None, None, None, false)?;
        Ok(())
    }

    /// Close the connection
    ///
    /// Idempotent; never fails.
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            // Peer may already be gone
            let _ = stream.writer.shutdown(Shutdown::Both);
            tracing::debug!(host = %self.host, "control channel closed");
        }
    }

    /// Headers sent with every request
    pub fn extra_headers_mut(&mut self) -> &mut Headers {
        self.rtsp.extra_headers_mut()
    }

    /// `CSeq` of the most recent request
    #[must_use]
    pub fn cseq(&self) -> u32 {
        self.rtsp.cseq()
    }

    /// Session token, once SETUP has succeeded
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.rtsp.session()
    }

    /// Data port learned from SETUP (0 before)
    #[must_use]
    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    /// Request target
    #[must_use]
    pub fn url(&self) -> &str {
        self.rtsp.url()
    }

    /// Check if the TCP connection is open
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

impl std::fmt::Debug for ControlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSession")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cseq", &self.rtsp.cseq())
            .field("session", &self.rtsp.session())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
