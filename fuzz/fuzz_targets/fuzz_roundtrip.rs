#![no_main]

use libfuzzer_sys::fuzz_target;
use ringlz::{decode_blocks, encode_blocks, StreamConfig};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 || data.len() > 1_000_000 {
        return;
    }

    // First byte picks the block size, the rest is cut into blocks of
    // varying length so the ring wraps at different offsets
    let max = 16 + data[0] as usize * 8;
    let config = StreamConfig::new(max)
        .unwrap()
        .with_ring_capacity(2 * max + data[0] as usize)
        .unwrap();

    let mut blocks = Vec::new();
    let mut rest = &data[1..];
    while !rest.is_empty() {
        let len = (1 + rest[0] as usize * 3).min(max).min(rest.len());
        let (block, tail) = rest.split_at(len);
        blocks.push(block);
        rest = tail;
    }

    let stream = encode_blocks(&blocks, &config).expect("encode failed");
    let decoded = decode_blocks(&stream, &config).expect("decode failed");
    assert_eq!(decoded.len(), blocks.len(), "block count changed");
    for (want, got) in blocks.iter().zip(decoded.iter()) {
        assert_eq!(*want, &got[..], "roundtrip failed");
    }
});
