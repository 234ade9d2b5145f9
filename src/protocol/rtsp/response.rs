use super::{Headers, RtspCodecError};

/// Success status code; anything else fails the request
pub const STATUS_OK: &str = "200";

/// Parsed response status line, e.g. `RTSP/1.0 200 OK`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Protocol version
    pub version: String,
    /// Status code as sent
    pub code: String,
    /// Reason phrase
    pub reason: String,
}

impl StatusLine {
    /// Parse a status line
    ///
    /// The line must split on single spaces into exactly three tokens.
    ///
    /// # Errors
    ///
    /// Returns `RtspCodecError::UnexpectedEof` for an empty line and
    /// `RtspCodecError::InvalidStatusLine` for any other shape.
    pub fn parse(line: &str) -> Result<Self, RtspCodecError> {
        if line.is_empty() {
            return Err(RtspCodecError::UnexpectedEof);
        }

        let tokens: Vec<&str> = line.split(' ').collect();
        match tokens.as_slice() {
            [version, code, reason] => Ok(Self {
                version: (*version).to_string(),
                code: (*code).to_string(),
                reason: (*reason).to_string(),
            }),
            _ => Err(RtspCodecError::InvalidStatusLine(line.to_string())),
        }
    }

    /// Check if the status is exactly `200`
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == STATUS_OK
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.version, self.code, self.reason)
    }
}

/// An RTSP response message
///
/// The body, if any, is consumed by the reader but not kept.
#[derive(Debug, Clone)]
pub struct RtspResponse {
    /// Status line
    pub status: StatusLine,
    /// Response headers
    pub headers: Headers,
}

impl RtspResponse {
    /// Check if response indicates success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get `CSeq` from response
    #[must_use]
    pub fn cseq(&self) -> Option<u32> {
        self.headers.cseq()
    }

    /// Get session token from response
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.headers.session()
    }
}
