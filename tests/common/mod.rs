//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging once per test binary
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("raop_client=debug")
            .with_test_writer()
            .try_init();
    });
}

/// 16-bit stereo little-endian PCM: a ramp on the left, its negation on the right
pub fn pcm_ramp(frames: usize) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(frames * 4);
    for i in 0..frames {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let left = (i as i32 * 37 - 20_000) as i16;
        pcm.extend_from_slice(&left.to_le_bytes());
        pcm.extend_from_slice(&left.wrapping_neg().to_le_bytes());
    }
    pcm
}
