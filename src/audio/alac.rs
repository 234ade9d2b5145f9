//! Uncompressed Apple Lossless framing
//!
//! The receiver expects its audio as ALAC. Rather than compressing, each
//! capture buffer is wrapped in an ALAC frame with the "not compressed" flag
//! set, so the payload is big-endian PCM packed straight after a 23-bit
//! header. Samples are not byte aligned: the first sample's MSB lands in bit
//! 0 of byte 2 and the last bit of the frame is padding.

use super::bit_writer::BitWriter;

/// Bytes the frame header adds to the PCM length
pub const HEADER_LEN: usize = 3;

/// Width of the uncompressed frame header in bits
pub const HEADER_BITS: usize = 23;

/// Sample rate of the stream
pub const SAMPLE_RATE: u32 = 44_100;
/// Channel count of the stream
pub const CHANNELS: u8 = 2;
/// Bits per sample
pub const BIT_DEPTH: u8 = 16;
/// Samples per channel announced in the SDP `fmtp` line
pub const FRAMES_PER_PACKET: u32 = 4096;

/// Audio encoding errors
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// Input does not contain a whole number of 16-bit samples
    #[error("PCM buffer of {0} bytes is not a whole number of 16-bit samples")]
    OddLength(usize),
}

/// Write the fixed header of an uncompressed stereo frame
pub fn write_frame_header(writer: &mut BitWriter<'_>) {
    writer.write_bits(1, 3); // channels: 0 mono, 1 stereo
    writer.write_bits(0, 4);
    writer.write_bits(0, 12);
    writer.write_bits(0, 1); // has size
    writer.write_bits(0, 2);
    writer.write_bits(1, 1); // not compressed
}

/// ALAC `fmtp` parameters for the announced stream
///
/// Order: frames per packet, compatible version, bit depth, rice history
/// mult, rice initial history, rice limit, channels, max run, max frame
/// bytes, average bit rate, sample rate.
#[must_use]
pub fn fmtp() -> String {
    format!("{FRAMES_PER_PACKET} 0 {BIT_DEPTH} 40 10 14 {CHANNELS} 255 0 0 {SAMPLE_RATE}")
}

/// Encoded frame length for a PCM buffer of `pcm_len` bytes
#[must_use]
pub fn encoded_len(pcm_len: usize) -> usize {
    pcm_len + HEADER_LEN
}

/// Turns interleaved 16-bit little-endian stereo PCM into ALAC frames
///
/// The output buffer is kept between calls and only grows when a larger
/// capture buffer arrives, so steady-state encoding does not allocate.
#[derive(Debug, Default)]
pub struct AlacEncoder {
    buffer: Vec<u8>,
}

impl AlacEncoder {
    /// Create an encoder with an empty output buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder pre-sized for capture buffers of `pcm_bytes`
    #[must_use]
    pub fn with_capacity(pcm_bytes: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(encoded_len(pcm_bytes)),
        }
    }

    /// Encode one capture buffer
    ///
    /// The returned slice is exactly `pcm.len() + 3` bytes and stays valid
    /// until the next call.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::OddLength`] if `pcm` has an odd byte count.
    pub fn encode(&mut self, pcm: &[u8]) -> Result<&[u8], AudioError> {
        if pcm.len() % 2 != 0 {
            return Err(AudioError::OddLength(pcm.len()));
        }

        let len = encoded_len(pcm.len());
        self.buffer.resize(len, 0);

        let mut writer = BitWriter::new(&mut self.buffer[..len]);
        write_frame_header(&mut writer);
        for sample in pcm.chunks_exact(2) {
            // little-endian in, high byte first out
            writer.write_bits(u32::from(u16::from_le_bytes([sample[0], sample[1]])), 16);
        }
        debug_assert_eq!(writer.bytes_written(), len);

        Ok(&self.buffer[..len])
    }

    /// Current capacity of the output buffer in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}
