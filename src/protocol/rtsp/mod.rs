//! RTSP control channel for RAOP
//!
//! Request encoding, response parsing and session bookkeeping are sans-IO;
//! [`ControlSession`] drives them over a blocking TCP connection.

pub mod client;
pub mod codec;
pub mod headers;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;

#[cfg(test)]
mod headers_tests;

pub use client::{ControlSession, ControlSessionOptions, SetupResponse};
pub use codec::{HeaderParser, RtspCodecError};
pub use headers::Headers;
pub use request::{RtspRequest, RtspRequestBuilder};
pub use response::{RtspResponse, StatusLine};
pub use session::RtspSession;
pub use transport::TransportHeader;

/// RTSP methods used by a RAOP sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Announce stream information (SDP)
    Announce,
    /// Set up transport and session
    Setup,
    /// Start streaming
    Record,
    /// Set parameter (volume)
    SetParameter,
    /// Flush buffered audio
    Flush,
    /// Tear down session
    Teardown,
}

impl Method {
    /// All methods, in handshake order
    pub const ALL: [Method; 6] = [
        Method::Announce,
        Method::Setup,
        Method::Record,
        Method::SetParameter,
        Method::Flush,
        Method::Teardown,
    ];

    /// Convert to RTSP method string
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Announce => "ANNOUNCE",
            Method::Setup => "SETUP",
            Method::Record => "RECORD",
            Method::SetParameter => "SET_PARAMETER",
            Method::Flush => "FLUSH",
            Method::Teardown => "TEARDOWN",
        }
    }
}

impl std::str::FromStr for Method {
    type Err = RtspCodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RtspCodecError::UnknownMethod(s.to_string()))
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
