//! Player notifications

use std::sync::mpsc;

use crate::protocol::raop::JackStatus;

/// Stage at which an error stopped the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Handshake with the receiver failed
    Connecting,
    /// Control request failed on an established session
    Recording,
    /// Audio could not be sent
    Sending,
}

/// Player events
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Session established and recording
    Connected {
        /// Receiver's output jack
        jack: JackStatus,
    },
    /// Session closed
    Disconnected,
    /// Error occurred
    Error {
        /// Where it failed
        category: ErrorCategory,
        /// Error message
        message: String,
    },
}

/// Receives player events
///
/// Called synchronously on the thread that caused the event, which may be
/// the audio capture thread.
pub trait PlayerObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &PlayerEvent);
}

impl<F> PlayerObserver for F
where
    F: Fn(&PlayerEvent) + Send + Sync,
{
    fn on_event(&self, event: &PlayerEvent) {
        self(event);
    }
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PlayerObserver for NoopObserver {
    fn on_event(&self, _event: &PlayerEvent) {}
}

/// Observer forwarding events into a channel
#[derive(Debug)]
pub struct ChannelObserver {
    tx: mpsc::Sender<PlayerEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<PlayerEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl PlayerObserver for ChannelObserver {
    fn on_event(&self, event: &PlayerEvent) {
        // Ignore error if the receiver is gone
        let _ = self.tx.send(event.clone());
    }
}
