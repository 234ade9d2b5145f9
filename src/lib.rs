//! # raop-client
//!
//! A pure Rust sender for RAOP (`AirPlay` 1) receivers such as the
//! AirPort Express.
//!
//! ## Features
//!
//! - RTSP control session (ANNOUNCE, SETUP, RECORD, `SET_PARAMETER`,
//!   FLUSH, TEARDOWN)
//! - RSA-wrapped AES-128 session keys
//! - Uncompressed ALAC framing of 16-bit stereo PCM
//! - Encrypted audio over the TCP data channel
//! - Volume control in dB
//!
//! ## Example
//!
//! ```rust,no_run
//! use raop_client::{RaopConfig, RaopSession};
//!
//! # fn example() -> Result<(), raop_client::RaopError> {
//! let mut session = RaopSession::new(RaopConfig::new("192.168.1.50"));
//! session.connect()?;
//!
//! let mut encoder = raop_client::AlacEncoder::with_capacity(16384);
//! let pcm = vec![0u8; 16384];
//! let frame = encoder.encode(&pcm)?;
//! session.send_sample(frame, 0, frame.len())?;
//!
//! session.disconnect();
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **High-level**: [`Player`] - start/stop, PCM in, events out
//! - **Mid-level**: [`RaopSession`] - one handshake and stream
//! - **Low-level**: Protocol modules - RTSP, SDP, crypto and framing

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Core types
pub mod types;

/// Testing utilities
pub mod testing;

pub mod audio;
pub mod control;
pub mod net;
mod player;
pub mod protocol;

// Re-exports
pub use audio::{AlacEncoder, AudioError};
pub use control::volume::Volume;
pub use error::{ErrorKind, RaopError};
pub use player::{
    ChannelObserver, ErrorCategory, NoopObserver, Player, PlayerConfig, PlayerEvent,
    PlayerObserver,
};
pub use protocol::crypto::KeyWrapPadding;
pub use protocol::raop::{JackStatus, RaopSession, RaopSessionState};
pub use types::{RaopConfig, RaopConfigBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    pub use crate::{
        AlacEncoder, JackStatus, Player, PlayerEvent, PlayerObserver, RaopConfig, RaopError,
        RaopSession, RaopSessionState, Volume,
    };
}
