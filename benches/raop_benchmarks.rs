use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use raop_client::audio::AlacEncoder;
use raop_client::protocol::crypto::KeyWrapPadding;
use raop_client::protocol::raop::{PacketBuffer, RaopSessionKeys};

/// One capture buffer: 4096 stereo 16-bit frames
const PCM_BYTES: usize = 16384;

fn raop_encoding_benchmark(c: &mut Criterion) {
    // 1. Setup
    let keys =
        RaopSessionKeys::generate(KeyWrapPadding::Pkcs1v15).expect("Failed to generate session keys");
    let cipher = keys.cipher();
    let mut encoder = AlacEncoder::with_capacity(PCM_BYTES);
    let mut packet = PacketBuffer::with_capacity(PCM_BYTES + 3);

    let pcm: Vec<u8> = (0..PCM_BYTES).map(|i| (i * 31 % 251) as u8).collect();

    let mut group = c.benchmark_group("raop_encoding");
    group.throughput(Throughput::Bytes(PCM_BYTES as u64));

    group.bench_function("alac_encode", |b| {
        b.iter(|| {
            let _ = encoder.encode(black_box(&pcm));
        })
    });

    group.bench_function("encode_frame_encrypt", |b| {
        b.iter(|| {
            // ALAC framing, packet header and AES-CBC over the aligned prefix
            let frame = encoder.encode(black_box(&pcm)).unwrap();
            let body = packet.frame(frame).unwrap();
            cipher.encrypt_in_place(body);
            black_box(packet.as_bytes());
        })
    });

    group.finish();
}

fn key_wrap_benchmark(c: &mut Criterion) {
    c.bench_function("session_keys_generate", |b| {
        b.iter(|| RaopSessionKeys::generate(black_box(KeyWrapPadding::Pkcs1v15)))
    });
}

criterion_group!(benches, raop_encoding_benchmark, key_wrap_benchmark);
criterion_main!(benches);
