use std::time::Duration;

use crate::control::Volume;
use crate::net::SocketTimeouts;
use crate::protocol::crypto::{AppleRsaPublicKey, KeyWrapPadding};

/// Default RTSP control port of a RAOP receiver
pub const DEFAULT_CONTROL_PORT: u16 = 5000;

/// User agent the receivers expect
pub const DEFAULT_USER_AGENT: &str = "iTunes/4.6 (Macintosh; U; PPC Mac OS X 10.3)";

/// Capture buffer size in bytes (4096 stereo 16-bit frames)
const DEFAULT_FRAME_BYTES: usize = 16384;

/// Configuration for a RAOP session
#[derive(Debug, Clone)]
pub struct RaopConfig {
    /// Receiver host name or address
    pub host: String,

    /// Receiver RTSP port (default: 5000)
    pub control_port: u16,

    /// Initial volume in dB (default: -30)
    pub volume: f64,

    /// `User-Agent` header value
    pub user_agent: String,

    /// TCP connect timeout (default: 10 seconds, `None` = OS default)
    pub connect_timeout: Option<Duration>,

    /// Socket read timeout (default: 10 seconds, `None` = block)
    pub read_timeout: Option<Duration>,

    /// Socket write timeout (default: 10 seconds, `None` = block)
    pub write_timeout: Option<Duration>,

    /// RSA padding used to wrap the AES key (default: PKCS#1 v1.5)
    pub key_wrap: KeyWrapPadding,

    /// Fail SETUP when the receiver omits `Audio-Jack-Status` (default: true)
    pub require_jack_status: bool,

    /// Expected capture buffer size in bytes, used to pre-size buffers
    pub frame_bytes: usize,

    /// Key used to wrap the AES key (default: the fixed Apple key)
    pub public_key: Option<AppleRsaPublicKey>,
}

impl Default for RaopConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            control_port: DEFAULT_CONTROL_PORT,
            volume: Volume::DEFAULT.as_db(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Some(SocketTimeouts::DEFAULT),
            read_timeout: Some(SocketTimeouts::DEFAULT),
            write_timeout: Some(SocketTimeouts::DEFAULT),
            key_wrap: KeyWrapPadding::default(),
            require_jack_status: true,
            frame_bytes: DEFAULT_FRAME_BYTES,
            public_key: None,
        }
    }
}

impl RaopConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> RaopConfigBuilder {
        RaopConfigBuilder::default()
    }

    /// Default config for `host`
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Socket timeouts for both channels
    #[must_use]
    pub fn timeouts(&self) -> SocketTimeouts {
        SocketTimeouts {
            connect: self.connect_timeout,
            read: self.read_timeout,
            write: self.write_timeout,
        }
    }

    /// Initial volume, falling back to the default when out of range
    #[must_use]
    pub fn initial_volume(&self) -> Volume {
        Volume::new(self.volume).unwrap_or_else(|| {
            tracing::warn!(volume = self.volume, "configured volume out of range, using default");
            Volume::DEFAULT
        })
    }
}

/// Builder for `RaopConfig`
#[derive(Debug, Clone, Default)]
pub struct RaopConfigBuilder {
    config: RaopConfig,
}

impl RaopConfigBuilder {
    /// Set receiver host
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set receiver RTSP port
    #[must_use]
    pub fn control_port(mut self, port: u16) -> Self {
        self.config.control_port = port;
        self
    }

    /// Set initial volume in dB
    #[must_use]
    pub fn volume(mut self, volume: f64) -> Self {
        self.config.volume = volume;
        self
    }

    /// Set `User-Agent`
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set connect timeout
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set read timeout
    #[must_use]
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set write timeout
    #[must_use]
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Set the RSA padding for the key exchange
    #[must_use]
    pub fn key_wrap(mut self, padding: KeyWrapPadding) -> Self {
        self.config.key_wrap = padding;
        self
    }

    /// Require the `Audio-Jack-Status` header in SETUP
    #[must_use]
    pub fn require_jack_status(mut self, require: bool) -> Self {
        self.config.require_jack_status = require;
        self
    }

    /// Set expected capture buffer size in bytes
    #[must_use]
    pub fn frame_bytes(mut self, bytes: usize) -> Self {
        self.config.frame_bytes = bytes;
        self
    }

    /// Wrap the AES key with `key` instead of the Apple key
    #[must_use]
    pub fn public_key(mut self, key: AppleRsaPublicKey) -> Self {
        self.config.public_key = Some(key);
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> RaopConfig {
        self.config
    }
}
