use std::io::{self, BufRead, Read};

use thiserror::Error;

use super::{Headers, RtspResponse, StatusLine};
use crate::error::RaopError;

/// Errors while parsing an RTSP response
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RtspCodecError {
    /// Stream ended (or sent an empty line) where a status line was expected
    #[error("read error")]
    UnexpectedEof,

    /// Status line did not have the `VERSION CODE REASON` shape
    #[error("invalid status line: {0}")]
    InvalidStatusLine(String),

    /// Header line without a colon, or a continuation with nothing to continue
    #[error("bad header: {0}")]
    InvalidHeader(String),

    /// `Content-Length` present but not a number
    #[error("invalid content length: {0}")]
    InvalidContentLength(String),

    /// Request line named a method we do not speak
    #[error("unknown method: {0}")]
    UnknownMethod(String),
}

/// Incremental header block parser
///
/// Tracks the most recently inserted header so that continuation lines
/// (starting with whitespace) can be appended to its value.
#[derive(Debug, Default)]
pub struct HeaderParser {
    headers: Headers,
    last: Option<String>,
}

impl HeaderParser {
    /// Create an empty parser
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one header line, without its line terminator
    ///
    /// # Errors
    ///
    /// Returns `RtspCodecError::InvalidHeader` for a line with no colon or a
    /// continuation before any header.
    pub fn feed_line(&mut self, line: &str) -> Result<(), RtspCodecError> {
        if line.starts_with(char::is_whitespace) {
            let value = self
                .last
                .as_deref()
                .and_then(|name| self.headers.get_mut(name))
                .ok_or_else(|| RtspCodecError::InvalidHeader(line.to_string()))?;
            value.push_str(line);
            return Ok(());
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| RtspCodecError::InvalidHeader(line.to_string()))?;
        let name = name.trim();

        self.headers.insert(name, value.trim());
        self.last = Some(name.to_string());
        Ok(())
    }

    /// Finish parsing and return the collected headers
    #[must_use]
    pub fn finish(self) -> Headers {
        self.headers
    }
}

/// Read one line, stripping the trailing `\n` / `\r\n`
///
/// Returns `None` at end of stream.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Read one complete response from `reader`
///
/// Reads the status line, then headers until a blank line or end of stream.
/// A `Content-Length` body is consumed and discarded so the next response
/// starts at the right place.
///
/// # Errors
///
/// - `RaopError::Protocol` on end of stream before the status line, a
///   malformed header or a bad `Content-Length`
/// - `RaopError::UnexpectedStatus` unless the status is exactly `200`
/// - `RaopError::Io` if reading fails (including timeouts)
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<RtspResponse, RaopError> {
    let mut buf = Vec::with_capacity(256);

    let line = read_line(reader, &mut buf)?.unwrap_or_default();
    let status = StatusLine::parse(&line)?;
    tracing::debug!(status = %line, "RTSP response");
    if !status.is_success() {
        return Err(RaopError::UnexpectedStatus { status_line: line });
    }

    let mut parser = HeaderParser::new();
    while let Some(line) = read_line(reader, &mut buf)? {
        if line.is_empty() {
            break;
        }
        parser.feed_line(&line)?;
    }
    let headers = parser.finish();

    if let Some(raw) = headers.get(super::headers::names::CONTENT_LENGTH) {
        let len: u64 = raw
            .trim()
            .parse()
            .map_err(|_| RtspCodecError::InvalidContentLength(raw.to_string()))?;
        let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
        if skipped < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
    }

    Ok(RtspResponse { status, headers })
}
