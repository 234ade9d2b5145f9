use thiserror::Error;

use super::{Attributes, MediaDescription, SdpConnection, SdpOrigin, SessionDescription};

#[derive(Debug, Error)]
pub enum SdpParseError {
    #[error("invalid version line")]
    InvalidVersion,
    #[error("invalid origin line: {0}")]
    InvalidOrigin(String),
    #[error("invalid connection line: {0}")]
    InvalidConnection(String),
    #[error("invalid media line: {0}")]
    InvalidMedia(String),
}

/// SDP parser
pub struct SdpParser;

impl SdpParser {
    /// Parse SDP from string
    ///
    /// Accepts CRLF or LF line endings; unknown line types are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SdpParseError` if a known line is malformed.
    pub fn parse(input: &str) -> Result<SessionDescription, SdpParseError> {
        let mut sdp = SessionDescription::default();
        let mut current_media: Option<MediaDescription> = None;

        for line in input.lines() {
            let line = line.trim();
            let Some((kind, value)) = line.split_once('=') else {
                continue;
            };

            match kind {
                "v" => {
                    sdp.version = value.parse().map_err(|_| SdpParseError::InvalidVersion)?;
                }
                "o" => sdp.origin = Some(Self::parse_origin(value)?),
                "s" => sdp.session_name = value.to_string(),
                "c" => {
                    let conn = Self::parse_connection(value)?;
                    // Media-level connections are not used by RAOP
                    if current_media.is_none() {
                        sdp.connection = Some(conn);
                    }
                }
                "t" => {
                    let mut parts = value.split_whitespace().map(|p| p.parse().unwrap_or(0));
                    if let (Some(start), Some(stop)) = (parts.next(), parts.next()) {
                        sdp.timing = Some((start, stop));
                    }
                }
                "m" => {
                    if let Some(media) = current_media.take() {
                        sdp.media.push(media);
                    }
                    current_media = Some(Self::parse_media(value)?);
                }
                "a" => {
                    let attribute = Self::parse_attribute(value);
                    match current_media {
                        Some(ref mut media) => media.attributes.push(attribute),
                        None => sdp.attributes.push(attribute),
                    }
                }
                _ => {}
            }
        }

        if let Some(media) = current_media {
            sdp.media.push(media);
        }

        Ok(sdp)
    }

    fn parse_origin(value: &str) -> Result<SdpOrigin, SdpParseError> {
        let parts: Vec<&str> = value.split_whitespace().collect();
        let [username, session_id, session_version, net_type, addr_type, addr, ..] =
            parts.as_slice()
        else {
            return Err(SdpParseError::InvalidOrigin(value.to_string()));
        };

        Ok(SdpOrigin {
            username: (*username).to_string(),
            session_id: (*session_id).to_string(),
            session_version: (*session_version).to_string(),
            net_type: (*net_type).to_string(),
            addr_type: (*addr_type).to_string(),
            unicast_address: (*addr).to_string(),
        })
    }

    fn parse_connection(value: &str) -> Result<SdpConnection, SdpParseError> {
        let parts: Vec<&str> = value.split_whitespace().collect();
        let [net_type, addr_type, address, ..] = parts.as_slice() else {
            return Err(SdpParseError::InvalidConnection(value.to_string()));
        };

        Ok(SdpConnection {
            net_type: (*net_type).to_string(),
            addr_type: (*addr_type).to_string(),
            address: (*address).to_string(),
        })
    }

    fn parse_media(value: &str) -> Result<MediaDescription, SdpParseError> {
        let parts: Vec<&str> = value.split_whitespace().collect();
        let [media_type, port, protocol, formats @ ..] = parts.as_slice() else {
            return Err(SdpParseError::InvalidMedia(value.to_string()));
        };
        if formats.is_empty() {
            return Err(SdpParseError::InvalidMedia(value.to_string()));
        }

        Ok(MediaDescription {
            media_type: (*media_type).to_string(),
            port: port.parse().unwrap_or(0),
            protocol: (*protocol).to_string(),
            formats: formats.iter().map(ToString::to_string).collect(),
            attributes: Attributes::new(),
        })
    }

    fn parse_attribute(value: &str) -> (String, Option<String>) {
        match value.split_once(':') {
            Some((name, attr_value)) => (name.to_string(), Some(attr_value.to_string())),
            None => (value.to_string(), None),
        }
    }
}
