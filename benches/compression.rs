use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringlz::{decode_blocks, encode_blocks, Decoder, Encoder, StreamConfig};
use std::io::{Read, Write};

fn generate_test_data(size: usize, pattern: &str) -> Vec<u8> {
    match pattern {
        "random" => {
            let mut x = 0x9e3779b9u32;
            (0..size)
                .map(|_| {
                    x ^= x << 13;
                    x ^= x >> 17;
                    x ^= x << 5;
                    (x >> 24) as u8
                })
                .collect()
        }
        "repeated" => vec![b'a'; size],
        "text" => {
            let text = b"The quick brown fox jumps over the lazy dog. ";
            text.iter().cycle().take(size).copied().collect()
        }
        "sequential" => (0..size).map(|i| (i % 256) as u8).collect(),
        _ => vec![0; size],
    }
}

fn split_blocks(data: &[u8], block_size: usize) -> Vec<&[u8]> {
    data.chunks(block_size).collect()
}

fn bench_encode_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_blocks");
    let total = 1024 * 1024;
    group.throughput(Throughput::Bytes(total as u64));

    for block_size in [1024, 16 * 1024, 64 * 1024] {
        let config = StreamConfig::new(block_size).unwrap();
        for pattern in ["random", "repeated", "text", "sequential"] {
            let data = generate_test_data(total, pattern);
            let blocks = split_blocks(&data, block_size);
            group.bench_with_input(
                BenchmarkId::new(pattern, block_size),
                &blocks,
                |b, blocks| {
                    b.iter(|| encode_blocks(black_box(blocks), &config).unwrap());
                },
            );
        }
    }
    group.finish();
}

fn bench_decode_blocks(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_blocks");
    let total = 1024 * 1024;
    group.throughput(Throughput::Bytes(total as u64));

    for block_size in [1024, 16 * 1024, 64 * 1024] {
        let config = StreamConfig::new(block_size).unwrap();
        for pattern in ["random", "repeated", "text"] {
            let data = generate_test_data(total, pattern);
            let stream = encode_blocks(&split_blocks(&data, block_size), &config).unwrap();
            group.bench_with_input(
                BenchmarkId::new(pattern, block_size),
                &stream,
                |b, stream| {
                    b.iter(|| decode_blocks(black_box(stream), &config).unwrap());
                },
            );
        }
    }
    group.finish();
}

fn bench_ring_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_capacity");
    let total = 1024 * 1024;
    let block_size = 16 * 1024;
    group.throughput(Throughput::Bytes(total as u64));

    let data = generate_test_data(total, "text");
    let blocks = split_blocks(&data, block_size);
    for ring in [2 * block_size, 4 * block_size, 128 * 1024 + block_size] {
        let config = StreamConfig::new(block_size)
            .unwrap()
            .with_ring_capacity(ring)
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(ring), &blocks, |b, blocks| {
            b.iter(|| encode_blocks(black_box(blocks), &config).unwrap());
        });
    }
    group.finish();
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");
    let size = 1024 * 1024;
    group.throughput(Throughput::Bytes(size as u64));

    let data = generate_test_data(size, "text");
    group.bench_function("write_read", |b| {
        b.iter(|| {
            let mut encoder = Encoder::new(Vec::new()).unwrap();
            for chunk in data.chunks(4000) {
                encoder.write_all(black_box(chunk)).unwrap();
            }
            let (stream, _) = encoder.finish().unwrap();

            let mut decoder = Decoder::new(&stream[..]).unwrap();
            let mut out = Vec::with_capacity(size);
            decoder.read_to_end(&mut out).unwrap();
            out
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_encode_blocks,
    bench_decode_blocks,
    bench_ring_capacity,
    bench_stream
);
criterion_main!(benches);
