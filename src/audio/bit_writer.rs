//! MSB-first bit packing into a fixed byte buffer

/// Writes arbitrary-width integers into a pre-sized byte buffer,
/// most significant bit first.
///
/// The buffer is never resized. A byte is overwritten (not OR-ed) when the
/// writer first enters it, so a buffer may be reused between frames without
/// clearing it.
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    /// Index of the byte currently being filled
    byte: usize,
    /// Bits already used in `buf[byte]` (0..8)
    bit: u32,
}

impl<'a> BitWriter<'a> {
    /// Create a writer positioned at the start of `buf`
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            byte: 0,
            bit: 0,
        }
    }

    /// Append the low `bits` bits of `value`
    ///
    /// Writes spanning a byte boundary are split into a partial write that
    /// completes the current byte, zero or more whole bytes, and a trailing
    /// partial write.
    ///
    /// # Panics
    ///
    /// Panics if `bits > 32` or if the write runs past the end of the buffer.
    pub fn write_bits(&mut self, value: u32, bits: u32) {
        assert!(bits <= 32, "cannot write {bits} bits at once");

        let mut remaining = bits;
        while remaining > 0 {
            let free = 8 - self.bit;
            let take = free.min(remaining);
            let chunk = (value >> (remaining - take)) & ((1u32 << take) - 1);
            #[allow(clippy::cast_possible_truncation, reason = "chunk fits in one byte")]
            let shifted = (chunk << (free - take)) as u8;

            if self.bit == 0 {
                self.buf[self.byte] = shifted;
            } else {
                self.buf[self.byte] |= shifted;
            }

            self.bit += take;
            remaining -= take;
            if self.bit == 8 {
                self.bit = 0;
                self.byte += 1;
            }
        }
    }

    /// Total bits written so far
    #[must_use]
    pub fn position_bits(&self) -> usize {
        self.byte * 8 + self.bit as usize
    }

    /// Number of bytes touched, including a trailing partial byte
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.byte + usize::from(self.bit != 0)
    }

    /// Release the underlying buffer
    #[must_use]
    pub fn into_inner(self) -> &'a mut [u8] {
        self.buf
    }
}
