//! Audio jack status reported by the receiver during SETUP

/// Whether something is plugged into the receiver's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JackConnection {
    /// Nothing plugged in (or not reported)
    #[default]
    Disconnected,
    /// Output connected
    Connected,
}

/// Kind of output jack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JackType {
    /// Analog line out
    #[default]
    Analog,
    /// Optical / digital out
    Digital,
}

/// Parsed `Audio-Jack-Status` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JackStatus {
    /// Connection state
    pub connection: JackConnection,
    /// Jack type
    pub jack_type: JackType,
}

impl JackStatus {
    /// Parse a header value such as `connected; type=analog`
    ///
    /// Unknown tokens are ignored; anything not recognised keeps the
    /// disconnected / analog defaults.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut status = Self::default();

        for token in value.split(';') {
            match token.split_once('=') {
                None if token.trim() == "connected" => {
                    status.connection = JackConnection::Connected;
                }
                Some((key, value)) if key.trim() == "type" && value.trim() == "digital" => {
                    status.jack_type = JackType::Digital;
                }
                _ => {}
            }
        }

        status
    }

    /// Check if the output is connected
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection == JackConnection::Connected
    }
}

impl std::fmt::Display for JackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connection = match self.connection {
            JackConnection::Connected => "connected",
            JackConnection::Disconnected => "disconnected",
        };
        let jack_type = match self.jack_type {
            JackType::Analog => "analog",
            JackType::Digital => "digital",
        };
        write!(f, "{connection}, {jack_type}")
    }
}
