//! Audio framing for the RAOP data channel
//!
//! The stream format is fixed: 44.1 kHz, 16-bit, stereo, interleaved
//! little-endian PCM in, uncompressed ALAC frames out.

pub mod alac;
pub mod bit_writer;

pub use alac::{AlacEncoder, AudioError};
pub use bit_writer::BitWriter;
