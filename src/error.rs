use std::io;
use thiserror::Error;

use crate::audio::AudioError;
use crate::protocol::crypto::CryptoError;
use crate::protocol::rtsp::RtspCodecError;

/// Broad category of a [`RaopError`]
///
/// Callers that only need to decide how to react (retry the connection,
/// report a broken receiver, stop streaming) branch on this instead of on
/// the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// TCP connect to the control or data port failed
    Connection,
    /// Malformed or unexpected response, or a request the protocol forbids
    Protocol,
    /// Key wrapping or cipher setup failed
    Crypto,
    /// Read or write on an established socket failed
    Io,
}

/// Errors that can occur while talking to a RAOP receiver
#[derive(Debug, Error)]
pub enum RaopError {
    /// Failed to establish a TCP connection
    #[error("connection to {addr} failed: {source}")]
    Connection {
        /// Address that was dialled
        addr: String,
        /// Underlying socket error
        source: io::Error,
    },

    /// Receiver answered with something other than `200`
    #[error("request failed, status: {status_line}")]
    UnexpectedStatus {
        /// Status line as received
        status_line: String,
    },

    /// Malformed response or missing required header
    #[error("protocol error: {message}")]
    Protocol {
        /// Description of the violation
        message: String,
    },

    /// Cryptographic failure
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Network I/O error on an established connection
    #[error("network error: {0}")]
    Io(#[from] io::Error),

    /// Audio framing error
    #[error("audio error: {0}")]
    Audio(#[from] AudioError),
}

impl RaopError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Category of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::UnexpectedStatus { .. } | Self::Protocol { .. } | Self::Audio(_) => {
                ErrorKind::Protocol
            }
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Check if the receiver closed or timed out the connection
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}

impl From<RtspCodecError> for RaopError {
    fn from(err: RtspCodecError) -> Self {
        match err {
            RtspCodecError::InvalidStatusLine(status_line) => Self::UnexpectedStatus { status_line },
            other => Self::protocol(other.to_string()),
        }
    }
}

/// Result type for RAOP operations
pub type Result<T> = std::result::Result<T, RaopError>;
