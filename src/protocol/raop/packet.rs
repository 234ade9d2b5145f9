//! Data channel packet framing
//!
//! Each audio packet on the data connection is a 16-byte header followed by
//! the (partially) encrypted ALAC frame:
//!
//! ```text
//! 0      2      4      6                    16
//! | 24 00 | len  | F0 FF | 00 00 00 00 00 00 00 00 | payload...
//! ```
//!
//! `len` is big-endian and equals the payload length plus 12.

/// Size of the packet header
pub const HEADER_SIZE: usize = 16;

/// Value added to the payload length in the length field
pub const LENGTH_OFFSET: usize = 12;

/// Largest payload whose length still fits the 16-bit length field
pub const MAX_PAYLOAD: usize = u16::MAX as usize - LENGTH_OFFSET;

const MAGIC: [u8; 2] = [0x24, 0x00];
const FLAGS: [u8; 2] = [0xF0, 0xFF];

/// Error returned when a payload does not fit the length field
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("payload of {0} bytes exceeds the {MAX_PAYLOAD} byte packet limit")]
pub struct PayloadTooLarge(pub usize);

/// Fill `header` for a payload of `count` bytes
///
/// # Errors
///
/// Returns [`PayloadTooLarge`] if `count + 12` does not fit in 16 bits.
pub fn write_header(header: &mut [u8; HEADER_SIZE], count: usize) -> Result<(), PayloadTooLarge> {
    let len = u16::try_from(count + LENGTH_OFFSET).map_err(|_| PayloadTooLarge(count))?;

    header[0..2].copy_from_slice(&MAGIC);
    header[2..4].copy_from_slice(&len.to_be_bytes());
    header[4..6].copy_from_slice(&FLAGS);
    header[6..].fill(0);
    Ok(())
}

/// Build a header for a payload of `count` bytes
///
/// # Errors
///
/// Returns [`PayloadTooLarge`] if `count + 12` does not fit in 16 bits.
pub fn header(count: usize) -> Result<[u8; HEADER_SIZE], PayloadTooLarge> {
    let mut header = [0u8; HEADER_SIZE];
    write_header(&mut header, count)?;
    Ok(header)
}

/// Payload length announced by a header
#[must_use]
pub fn payload_len(header: &[u8; HEADER_SIZE]) -> Option<usize> {
    if header[0..2] != MAGIC || header[4..6] != FLAGS {
        return None;
    }
    let len = usize::from(u16::from_be_bytes([header[2], header[3]]));
    len.checked_sub(LENGTH_OFFSET)
}

/// Reusable buffer holding one framed packet
///
/// Owned by the data channel so the header and payload can be assembled in
/// place and written with a single call.
#[derive(Debug, Default)]
pub struct PacketBuffer {
    buf: Vec<u8>,
}

impl PacketBuffer {
    /// Create a buffer sized for payloads up to `payload_capacity` bytes
    #[must_use]
    pub fn with_capacity(payload_capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(HEADER_SIZE + payload_capacity),
        }
    }

    /// Frame `payload`, returning the header and payload regions
    ///
    /// The payload region holds a copy of `payload` and may be modified
    /// (encrypted) in place before the packet is sent.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadTooLarge`] if the payload does not fit the length field.
    pub fn frame(&mut self, payload: &[u8]) -> Result<&mut [u8], PayloadTooLarge> {
        let mut header = [0u8; HEADER_SIZE];
        write_header(&mut header, payload.len())?;

        self.buf.clear();
        self.buf.extend_from_slice(&header);
        self.buf.extend_from_slice(payload);
        Ok(&mut self.buf[HEADER_SIZE..])
    }

    /// The complete framed packet
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}
