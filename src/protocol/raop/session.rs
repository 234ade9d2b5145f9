//! RAOP session: handshake, control and audio data channel

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Mutex, PoisonError};

use super::identity::SessionIdentity;
use super::jack::JackStatus;
use super::key_exchange::RaopSessionKeys;
use super::packet::{self, PacketBuffer};
use crate::audio::alac;
use crate::control::Volume;
use crate::error::{RaopError, Result};
use crate::net::{connect_tcp, detect_local_address};
use crate::protocol::crypto::AesCbcPacketCipher;
use crate::protocol::rtsp::headers::raop;
use crate::protocol::rtsp::{ControlSession, ControlSessionOptions};
use crate::protocol::sdp::create_raop_announce_sdp;
use crate::types::RaopConfig;

/// RAOP session states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaopSessionState {
    /// Not connected
    Idle,
    /// Handshake in progress
    Connecting,
    /// ANNOUNCE accepted
    Announced,
    /// SETUP accepted, session token and data port known
    SetUp,
    /// RECORD accepted and data channel open
    Recording,
    /// Torn down
    Disconnected,
}

/// Open audio data connection
pub(crate) struct DataChannel {
    stream: TcpStream,
    cipher: AesCbcPacketCipher,
    packet: PacketBuffer,
}

impl DataChannel {
    pub(crate) fn new(stream: TcpStream, cipher: AesCbcPacketCipher, payload_capacity: usize) -> Self {
        Self {
            stream,
            cipher,
            packet: PacketBuffer::with_capacity(payload_capacity),
        }
    }

    /// Frame, encrypt and write one payload
    pub(crate) fn send(&mut self, payload: &[u8]) -> Result<()> {
        let body = self
            .packet
            .frame(payload)
            .map_err(|e| RaopError::protocol(e.to_string()))?;
        self.cipher.encrypt_in_place(body);

        self.stream.write_all(self.packet.as_bytes())?;
        tracing::trace!(bytes = payload.len(), "audio packet sent");
        Ok(())
    }

    fn close(self) {
        // Peer may already be gone
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// A RAOP streaming session with one receiver
///
/// `connect` runs the full handshake; afterwards `send_sample` may be called
/// from any thread while the owner adjusts volume or disconnects.
pub struct RaopSession {
    config: RaopConfig,
    state: RaopSessionState,
    volume: Volume,
    jack: JackStatus,
    identity: Option<SessionIdentity>,
    server_port: u16,
    control: Option<ControlSession>,
    data: Mutex<Option<DataChannel>>,
}

impl RaopSession {
    /// Create an idle session
    ///
    /// An out-of-range configured volume falls back to the default.
    #[must_use]
    pub fn new(config: RaopConfig) -> Self {
        let volume = config.initial_volume();
        Self {
            config,
            state: RaopSessionState::Idle,
            volume,
            jack: JackStatus::default(),
            identity: None,
            server_port: 0,
            control: None,
            data: Mutex::new(None),
        }
    }

    /// Connect to the receiver and start recording
    ///
    /// On failure every socket opened so far is closed and the session
    /// returns to `Idle`.
    ///
    /// # Errors
    ///
    /// - `RaopError::Connection` if either channel cannot be opened
    /// - `RaopError::UnexpectedStatus` / `RaopError::Protocol` if the
    ///   receiver rejects a request or answers without a required header
    /// - `RaopError::Crypto` if key generation fails
    /// - `RaopError::Io` on socket failure mid-handshake
    pub fn connect(&mut self) -> Result<()> {
        if !matches!(
            self.state,
            RaopSessionState::Idle | RaopSessionState::Disconnected
        ) {
            return Err(RaopError::protocol("session already connected"));
        }

        tracing::info!(
            host = %self.config.host,
            port = self.config.control_port,
            "connecting to RAOP receiver"
        );
        self.state = RaopSessionState::Connecting;

        match self.handshake() {
            Ok(()) => {
                self.state = RaopSessionState::Recording;
                tracing::info!(
                    server_port = self.server_port,
                    jack = %self.jack,
                    "recording"
                );
                Ok(())
            }
            Err(e) => {
                tracing::debug!(error = %e, state = ?self.state, "handshake failed");
                self.release();
                self.state = RaopSessionState::Idle;
                Err(e)
            }
        }
    }

    fn handshake(&mut self) -> Result<()> {
        let host = self.config.host.clone();
        let timeouts = self.config.timeouts();

        let local = detect_local_address(&host);
        let identity = SessionIdentity::generate(&host, self.config.control_port, local)?;

        let options = ControlSessionOptions {
            user_agent: self.config.user_agent.clone(),
            timeouts,
        };
        let control = self.control.insert(ControlSession::new(
            host.as_str(),
            self.config.control_port,
            identity.url(),
            options,
        ));
        control
            .extra_headers_mut()
            .insert(raop::CLIENT_INSTANCE, identity.client_instance.as_str());
        control.connect()?;

        let keys = match self.config.public_key {
            Some(ref key) => RaopSessionKeys::generate_with_key(key, self.config.key_wrap)?,
            None => RaopSessionKeys::generate(self.config.key_wrap)?,
        };
        let sdp = create_raop_announce_sdp(
            &identity.session_id,
            &identity.local_address,
            &host,
            &keys.rsaaeskey(),
            &keys.aesiv(),
        );

        control
            .extra_headers_mut()
            .insert(raop::APPLE_CHALLENGE, identity.challenge.as_str());
        let announced = control.announce(&sdp);
        control.extra_headers_mut().remove(raop::APPLE_CHALLENGE);
        announced?;
        self.state = RaopSessionState::Announced;

        let setup = control.setup()?;
        self.jack = match setup.headers.get(raop::AUDIO_JACK_STATUS) {
            Some(value) => JackStatus::parse(value),
            None if self.config.require_jack_status => {
                return Err(RaopError::protocol("no Audio-Jack-Status in SETUP response"));
            }
            None => {
                tracing::warn!("receiver sent no Audio-Jack-Status, assuming disconnected analog");
                JackStatus::default()
            }
        };
        self.server_port = setup.server_port;
        self.state = RaopSessionState::SetUp;

        control.record()?;
        control.set_parameter(&self.volume.to_parameter())?;

        let stream = connect_tcp(&host, self.server_port, &timeouts)?;
        let capacity = alac::encoded_len(self.config.frame_bytes);
        *self.data.get_mut().unwrap_or_else(PoisonError::into_inner) =
            Some(DataChannel::new(stream, keys.cipher(), capacity));

        self.identity = Some(identity);
        Ok(())
    }

    /// Close both channels without TEARDOWN
    fn release(&mut self) {
        if let Some(data) = self
            .data
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            data.close();
        }
        if let Some(mut control) = self.control.take() {
            control.disconnect();
        }
    }

    /// Set the receiver volume in dB
    ///
    /// Returns `Ok(false)` without changing anything if `db` is outside
    /// `[-144, 0]` or NaN. Otherwise stores the value and, once SETUP has
    /// completed, sends it to the receiver.
    ///
    /// # Errors
    ///
    /// Returns an error if the update request fails; the new value is kept.
    pub fn set_volume(&mut self, db: f64) -> Result<bool> {
        let Some(volume) = Volume::new(db) else {
            tracing::debug!(volume = db, "rejected out-of-range volume");
            return Ok(false);
        };
        self.volume = volume;

        if matches!(
            self.state,
            RaopSessionState::SetUp | RaopSessionState::Recording
        ) {
            if let Some(ref mut control) = self.control {
                control.set_parameter(&volume.to_parameter())?;
                tracing::debug!(%volume, "volume updated");
            }
        }
        Ok(true)
    }

    /// Ask the receiver to drop buffered audio
    ///
    /// # Errors
    ///
    /// Returns `RaopError::Io` (`NotConnected`) unless recording, or any
    /// error from the FLUSH request.
    pub fn flush(&mut self) -> Result<()> {
        match self.control {
            Some(ref mut control) if self.state == RaopSessionState::Recording => {
                control.flush()?;
                Ok(())
            }
            _ => Err(not_recording()),
        }
    }

    /// Encrypt and send `buffer[offset..offset + count]` as one packet
    ///
    /// The buffer should hold one encoded ALAC frame. Calls are serialised
    /// internally, so this is safe from any thread.
    ///
    /// # Errors
    ///
    /// - `RaopError::Protocol` if the range is outside `buffer` or too large
    ///   for one packet
    /// - `RaopError::Io` if not recording or the write fails
    pub fn send_sample(&self, buffer: &[u8], offset: usize, count: usize) -> Result<()> {
        let end = offset
            .checked_add(count)
            .filter(|&end| end <= buffer.len())
            .ok_or_else(|| {
                RaopError::protocol(format!(
                    "sample range {offset}+{count} outside buffer of {} bytes",
                    buffer.len()
                ))
            })?;
        if count > packet::MAX_PAYLOAD {
            return Err(RaopError::protocol(
                packet::PayloadTooLarge(count).to_string(),
            ));
        }

        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        let channel = data.as_mut().ok_or_else(not_recording)?;
        channel.send(&buffer[offset..end])
    }

    /// Tear down the session
    ///
    /// Closes the data channel, sends TEARDOWN (failures are logged and
    /// ignored) and closes the control channel. Always succeeds.
    pub fn disconnect(&mut self) {
        if let Some(data) = self
            .data
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            data.close();
        }

        if let Some(mut control) = self.control.take() {
            if let Err(e) = control.teardown() {
                tracing::warn!(error = %e, "TEARDOWN failed");
            }
            control.disconnect();
        }

        if self.state != RaopSessionState::Disconnected {
            tracing::info!(host = %self.config.host, "disconnected");
        }
        self.state = RaopSessionState::Disconnected;
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> RaopSessionState {
        self.state
    }

    /// Check if audio can be sent
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.state == RaopSessionState::Recording
    }

    /// Current volume
    #[must_use]
    pub fn volume(&self) -> Volume {
        self.volume
    }

    /// Jack status reported during SETUP
    #[must_use]
    pub fn jack_status(&self) -> JackStatus {
        self.jack
    }

    /// Data port reported during SETUP (0 before)
    #[must_use]
    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    /// Identifiers of the current session
    #[must_use]
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    /// `CSeq` of the latest control request (0 if not connected)
    #[must_use]
    pub fn cseq(&self) -> u32 {
        self.control.as_ref().map_or(0, ControlSession::cseq)
    }

    /// Session configuration
    #[must_use]
    pub fn config(&self) -> &RaopConfig {
        &self.config
    }
}

fn not_recording() -> RaopError {
    io::Error::new(io::ErrorKind::NotConnected, "session is not recording").into()
}

impl Drop for RaopSession {
    fn drop(&mut self) {
        if self.control.is_some() {
            tracing::debug!(host = %self.config.host, "session dropped while connected");
        }
        self.release();
    }
}

impl std::fmt::Debug for RaopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaopSession")
            .field("host", &self.config.host)
            .field("state", &self.state)
            .field("volume", &self.volume)
            .field("jack", &self.jack)
            .field("server_port", &self.server_port)
            .finish_non_exhaustive()
    }
}
