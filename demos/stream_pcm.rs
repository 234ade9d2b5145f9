//! Example: Stream a sine wave to a RAOP receiver
//!
//! Usage: `cargo run --example stream_pcm -- <host> [seconds] [volume-db]`
//!
//! Set `RUST_LOG=raop_client=debug` to see the RTSP exchange.

use std::f32::consts::PI;
use std::sync::Arc;
use std::time::{Duration, Instant};

use raop_client::{Player, PlayerEvent, RaopConfig};
use tracing_subscriber::EnvFilter;

/// Bytes per capture buffer (4096 stereo 16-bit frames)
const BUFFER_BYTES: usize = 16384;
const SAMPLE_RATE: f32 = 44_100.0;

/// Simple sine wave generator producing 16-bit LE stereo PCM
struct SineWaveSource {
    phase: f32,
    frequency: f32,
}

impl SineWaveSource {
    fn new(frequency: f32) -> Self {
        Self {
            phase: 0.0,
            frequency,
        }
    }

    fn fill(&mut self, buffer: &mut [u8]) {
        for chunk in buffer.chunks_exact_mut(4) {
            let sample = (self.phase * 2.0 * PI).sin();
            #[allow(clippy::cast_possible_truncation)]
            let value = (sample * f32::from(i16::MAX) * 0.5) as i16; // 50% volume
            let bytes = value.to_le_bytes();

            chunk[..2].copy_from_slice(&bytes);
            chunk[2..].copy_from_slice(&bytes);

            self.phase += self.frequency / SAMPLE_RATE;
            if self.phase > 1.0 {
                self.phase -= 1.0;
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().ok_or("usage: stream_pcm <host> [seconds] [volume-db]")?;
    let seconds: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(10);
    let volume: f64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(-20.0);

    let config = RaopConfig::builder().host(host).volume(volume).build();
    let observer = |event: &PlayerEvent| tracing::info!(?event, "player event");
    let player = Player::new(config, Arc::new(observer));

    player.start()?;
    println!("Streaming 440 Hz for {seconds}s (jack connected: {})", player.is_jack_connected());

    let mut source = SineWaveSource::new(440.0);
    let mut buffer = vec![0u8; BUFFER_BYTES];
    let buffer_duration = Duration::from_secs_f32((BUFFER_BYTES / 4) as f32 / SAMPLE_RATE);

    let start = Instant::now();
    let mut next = start;
    while start.elapsed() < Duration::from_secs(seconds) && player.is_running() {
        source.fill(&mut buffer);
        player.on_audio(&buffer)?;

        // Pace like a capture callback
        next += buffer_duration;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
    }

    player.stop();
    println!("Done");
    Ok(())
}
