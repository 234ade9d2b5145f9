use std::fmt;

use super::{Attributes, MediaDescription, SdpConnection, SdpOrigin, SessionDescription};
use crate::audio::alac;

fn addr_type(addr: &str) -> &'static str {
    if addr.contains(':') { "IP6" } else { "IP4" }
}

/// Builder for SDP session descriptions
///
/// Attributes are emitted in the order they are added.
pub struct SdpBuilder {
    sdp: SessionDescription,
    current_media: Option<MediaDescription>,
}

impl Default for SdpBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SdpBuilder {
    /// Create a new SDP builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            sdp: SessionDescription::default(),
            current_media: None,
        }
    }

    /// Set origin
    #[must_use]
    pub fn origin(
        mut self,
        username: &str,
        session_id: &str,
        session_version: &str,
        addr: &str,
    ) -> Self {
        self.sdp.origin = Some(SdpOrigin {
            username: username.to_string(),
            session_id: session_id.to_string(),
            session_version: session_version.to_string(),
            net_type: "IN".to_string(),
            addr_type: addr_type(addr).to_string(),
            unicast_address: addr.to_string(),
        });
        self
    }

    /// Set session name
    #[must_use]
    pub fn session_name(mut self, name: &str) -> Self {
        self.sdp.session_name = name.to_string();
        self
    }

    /// Set connection info
    #[must_use]
    pub fn connection(mut self, addr: &str) -> Self {
        self.sdp.connection = Some(SdpConnection {
            net_type: "IN".to_string(),
            addr_type: addr_type(addr).to_string(),
            address: addr.to_string(),
        });
        self
    }

    /// Set timing (0 0 for live streams)
    #[must_use]
    pub fn timing(mut self, start: u64, stop: u64) -> Self {
        self.sdp.timing = Some((start, stop));
        self
    }

    /// Add session-level attribute
    #[must_use]
    pub fn attribute(mut self, name: &str, value: Option<&str>) -> Self {
        self.sdp
            .attributes
            .push((name.to_string(), value.map(String::from)));
        self
    }

    /// Start a media section
    #[must_use]
    pub fn media(mut self, media_type: &str, port: u16, protocol: &str, formats: &[&str]) -> Self {
        if let Some(media) = self.current_media.take() {
            self.sdp.media.push(media);
        }

        self.current_media = Some(MediaDescription {
            media_type: media_type.to_string(),
            port,
            protocol: protocol.to_string(),
            formats: formats.iter().map(ToString::to_string).collect(),
            attributes: Attributes::new(),
        });

        self
    }

    /// Add media-level attribute
    ///
    /// Ignored if no media section has been started.
    #[must_use]
    pub fn media_attribute(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(ref mut media) = self.current_media {
            media
                .attributes
                .push((name.to_string(), value.map(String::from)));
        }
        self
    }

    /// Build the SDP
    #[must_use]
    pub fn build(mut self) -> SessionDescription {
        if let Some(media) = self.current_media.take() {
            self.sdp.media.push(media);
        }
        self.sdp
    }

    /// Build and encode as string
    #[must_use]
    pub fn encode(self) -> String {
        self.build().to_string()
    }
}

fn write_attributes(f: &mut fmt::Formatter<'_>, attributes: &Attributes) -> fmt::Result {
    for (name, value) in attributes {
        match value {
            Some(v) => write!(f, "a={name}:{v}\r\n")?,
            None => write!(f, "a={name}\r\n")?,
        }
    }
    Ok(())
}

/// Encodes with CRLF line endings
impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v={}\r\n", self.version)?;

        if let Some(ref o) = self.origin {
            write!(
                f,
                "o={} {} {} {} {} {}\r\n",
                o.username, o.session_id, o.session_version, o.net_type, o.addr_type, o.unicast_address
            )?;
        }

        write!(f, "s={}\r\n", self.session_name)?;

        if let Some(ref c) = self.connection {
            write!(f, "c={} {} {}\r\n", c.net_type, c.addr_type, c.address)?;
        }

        if let Some((start, stop)) = self.timing {
            write!(f, "t={start} {stop}\r\n")?;
        }

        write_attributes(f, &self.attributes)?;

        for media in &self.media {
            write!(
                f,
                "m={} {} {} {}\r\n",
                media.media_type,
                media.port,
                media.protocol,
                media.formats.join(" ")
            )?;
            write_attributes(f, &media.attributes)?;
        }

        Ok(())
    }
}

/// Create RAOP ANNOUNCE SDP for uncompressed Apple Lossless audio
///
/// `client_ip` is the sender's address (origin), `server_ip` the
/// receiver's (connection).
#[must_use]
pub fn create_raop_announce_sdp(
    session_id: &str,
    client_ip: &str,
    server_ip: &str,
    rsaaeskey: &str,
    aesiv: &str,
) -> String {
    let fmtp = format!("96 {}", alac::fmtp());

    SdpBuilder::new()
        .origin("iTunes", session_id, "0", client_ip)
        .session_name("iTunes")
        .connection(server_ip)
        .timing(0, 0)
        .media("audio", 0, "RTP/AVP", &["96"])
        .media_attribute("rtpmap", Some("96 AppleLossless"))
        .media_attribute("fmtp", Some(fmtp.as_str()))
        .media_attribute("rsaaeskey", Some(rsaaeskey))
        .media_attribute("aesiv", Some(aesiv))
        .encode()
}
