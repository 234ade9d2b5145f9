//! High-level player API
//!
//! The boundary between the protocol engine and its host: a UI calls
//! `start`/`stop`/`set_volume`, the audio capture callback calls
//! `on_audio`, and both learn about state changes through a
//! [`PlayerObserver`].

mod events;


use std::sync::{Arc, Mutex, PoisonError};

pub use events::{ChannelObserver, ErrorCategory, NoopObserver, PlayerEvent, PlayerObserver};

use crate::audio::AlacEncoder;
use crate::control::Volume;
use crate::error::{RaopError, Result};
use crate::protocol::raop::RaopSession;
use crate::types::RaopConfig;

/// Player configuration
pub type PlayerConfig = RaopConfig;

/// Streams captured PCM to one RAOP receiver
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use raop_client::{ChannelObserver, Player, RaopConfig};
///
/// # fn example() -> Result<(), raop_client::RaopError> {
/// let (observer, events) = ChannelObserver::new();
/// let player = Player::new(RaopConfig::new("192.168.1.50"), Arc::new(observer));
///
/// player.start()?;
/// player.set_volume(-20.0)?;
///
/// // From the capture callback: 16-bit stereo little-endian PCM
/// let pcm = vec![0u8; 16384];
/// player.on_audio(&pcm)?;
///
/// player.stop();
/// for event in events.try_iter() {
///     println!("{event:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Player {
    config: Mutex<RaopConfig>,
    session: Mutex<Option<RaopSession>>,
    encoder: Mutex<AlacEncoder>,
    observer: Arc<dyn PlayerObserver>,
}

impl Player {
    /// Create a stopped player
    #[must_use]
    pub fn new(config: RaopConfig, observer: Arc<dyn PlayerObserver>) -> Self {
        let encoder = AlacEncoder::with_capacity(config.frame_bytes);
        Self {
            config: Mutex::new(config),
            session: Mutex::new(None),
            encoder: Mutex::new(encoder),
            observer,
        }
    }

    fn notify(&self, event: &PlayerEvent) {
        self.observer.on_event(event);
    }

    fn notify_error(&self, category: ErrorCategory, error: &RaopError) {
        tracing::error!(?category, %error, "player error");
        self.notify(&PlayerEvent::Error {
            category,
            message: error.to_string(),
        });
    }

    /// Connect to the configured receiver
    ///
    /// Any running session is stopped first. Emits `Connected` on success
    /// and `Error { Connecting }` on failure.
    ///
    /// # Errors
    ///
    /// Returns the handshake error.
    pub fn start(&self) -> Result<()> {
        self.stop();

        let config = self.config().clone();
        let mut session = RaopSession::new(config);
        if let Err(e) = session.connect() {
            self.notify_error(ErrorCategory::Connecting, &e);
            return Err(e);
        }

        let jack = session.jack_status();
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
        self.notify(&PlayerEvent::Connected { jack });
        Ok(())
    }

    /// Disconnect from the receiver
    ///
    /// Emits `Disconnected` if a session was running.
    pub fn stop(&self) {
        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(mut session) = session {
            session.disconnect();
            self.notify(&PlayerEvent::Disconnected);
        }
    }

    /// Set the volume in dB
    ///
    /// Returns `Ok(false)` for values outside `[-144, 0]`. Valid values are
    /// kept for the next `start` and applied to the running session.
    ///
    /// # Errors
    ///
    /// Returns the update error from the running session; also emits
    /// `Error { Recording }`.
    pub fn set_volume(&self, db: f64) -> Result<bool> {
        if Volume::new(db).is_none() {
            return Ok(false);
        }
        self.config().volume = db;

        let updated = match self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            Some(session) => session.set_volume(db),
            None => return Ok(true),
        };
        updated.inspect_err(|e| self.notify_error(ErrorCategory::Recording, e))
    }

    /// Ask the receiver to drop buffered audio
    ///
    /// Does nothing when stopped.
    ///
    /// # Errors
    ///
    /// Returns the FLUSH error; also emits `Error { Recording }`.
    pub fn flush(&self) -> Result<()> {
        let flushed = match self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            Some(session) => session.flush(),
            None => return Ok(()),
        };
        flushed.inspect_err(|e| self.notify_error(ErrorCategory::Recording, e))
    }

    /// Encode and send one buffer of interleaved 16-bit LE stereo PCM
    ///
    /// Audio arriving while stopped is dropped. A send failure emits
    /// `Error { Sending }` and stops the player.
    ///
    /// # Errors
    ///
    /// Returns `RaopError::Audio` for an odd-length buffer or the send error.
    pub fn on_audio(&self, pcm: &[u8]) -> Result<()> {
        let mut encoder = self.encoder.lock().unwrap_or_else(PoisonError::into_inner);
        let frame = encoder.encode(pcm)?;

        let sent = {
            let guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(session) => session.send_sample(frame, 0, frame.len()),
                None => {
                    tracing::trace!(bytes = pcm.len(), "player stopped, dropping audio");
                    return Ok(());
                }
            }
        };

        sent.inspect_err(|e| {
            self.notify_error(ErrorCategory::Sending, e);
            self.stop();
        })
    }

    /// Check if a session is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Check if the receiver reported something plugged into its output
    #[must_use]
    pub fn is_jack_connected(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|s| s.jack_status().is_connected())
    }

    /// Volume in dB applied on the next `start`
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.config().volume
    }

    /// Change the receiver host for the next `start`
    pub fn set_host(&self, host: impl Into<String>) {
        self.config().host = host.into();
    }

    fn config(&self) -> std::sync::MutexGuard<'_, RaopConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
