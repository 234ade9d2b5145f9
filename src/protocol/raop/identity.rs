//! Per-session identifiers sent to the receiver

use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD as BASE64};

use super::super::crypto::CryptoError;

/// Size of the random `Apple-Challenge` value in bytes
pub const CHALLENGE_SIZE: usize = 16;

/// Identifiers generated once at connect time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Receiver host
    pub host: String,
    /// Receiver control (RTSP) port
    pub control_port: u16,
    /// 10-digit decimal session id, used in the URL and SDP origin
    pub session_id: String,
    /// 16-digit hex `Client-Instance` value
    pub client_instance: String,
    /// Base64 `Apple-Challenge` value, padding stripped
    pub challenge: String,
    /// Local address announced to the receiver
    pub local_address: String,
}

impl SessionIdentity {
    /// Draw fresh identifiers from the OS random source
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::RngError` if the OS random source fails.
    pub fn generate(
        host: &str,
        control_port: u16,
        local_address: impl Into<String>,
    ) -> Result<Self, CryptoError> {
        use rand::RngCore;

        let mut random = [0u8; 4 + 8 + CHALLENGE_SIZE];
        rand::rngs::OsRng
            .try_fill_bytes(&mut random)
            .map_err(|_| CryptoError::RngError)?;

        Ok(Self::from_random(host, control_port, local_address, &random))
    }

    /// Derive identifiers from 28 caller-supplied random bytes
    ///
    /// Bytes 0..4 form the session id, 4..12 the client instance and
    /// 12..28 the challenge.
    #[must_use]
    pub fn from_random(
        host: &str,
        control_port: u16,
        local_address: impl Into<String>,
        random: &[u8; 4 + 8 + CHALLENGE_SIZE],
    ) -> Self {
        let sid = u32::from_le_bytes([random[0], random[1], random[2], random[3]]);
        let mut instance = [0u8; 8];
        instance.copy_from_slice(&random[4..12]);
        let instance = u64::from_le_bytes(instance);

        Self {
            host: host.to_string(),
            control_port,
            session_id: format!("{sid:010}"),
            client_instance: format!("{instance:016X}"),
            challenge: BASE64.encode(&random[12..]),
            local_address: local_address.into(),
        }
    }

    /// Session URL used as the request target
    #[must_use]
    pub fn url(&self) -> String {
        format!("rtsp://{}/{}", self.local_address, self.session_id)
    }
}
