//! RTSP Transport header
//!
//! RAOP streams over TCP, interleaved:
//! `RTP/AVP/TCP;unicast;interleaved=0-1;mode=record`. The receiver answers
//! with the same parameters plus `server_port=N` in any position.

/// Transport requested by the sender during SETUP
pub const RAOP_TCP_RECORD: &str = "RTP/AVP/TCP;unicast;interleaved=0-1;mode=record";

/// Parsed Transport header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportHeader {
    /// Protocol specification (e.g. "RTP/AVP/TCP")
    pub protocol: String,
    /// Mode (usually "record" for RAOP)
    pub mode: Option<String>,
    /// Interleaved channel pair
    pub interleaved: Option<(u8, u8)>,
    /// Receiver's data port
    pub server_port: Option<u16>,
}

impl TransportHeader {
    /// Parse a Transport header value
    ///
    /// Parameters are `;`-separated `key` or `key=value` pairs and are
    /// matched by key, never by position. Unknown or malformed parameters
    /// are ignored. The protocol is the first bare token containing `/`,
    /// wherever it appears.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut transport = TransportHeader::default();

        for part in value.split(';').map(str::trim) {
            let Some((key, value)) = part.split_once('=') else {
                if transport.protocol.is_empty() && part.contains('/') {
                    transport.protocol = part.to_string();
                }
                continue;
            };
            match key {
                "mode" => transport.mode = Some(value.to_string()),
                "server_port" => transport.server_port = value.parse().ok(),
                "interleaved" => transport.interleaved = Self::parse_interleaved(value),
                _ => {}
            }
        }

        transport
    }

    fn parse_interleaved(value: &str) -> Option<(u8, u8)> {
        let (start, end) = value.split_once('-')?;
        Some((start.parse().ok()?, end.parse().ok()?))
    }

    /// Data port announced by the receiver, if present and non-zero
    #[must_use]
    pub fn data_port(&self) -> Option<u16> {
        self.server_port.filter(|&port| port != 0)
    }
}
