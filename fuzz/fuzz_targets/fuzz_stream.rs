#![no_main]

use libfuzzer_sys::fuzz_target;
use ringlz::{Decoder, Encoder, StreamConfig};
use std::io::{Read, Write};

fuzz_target!(|data: &[u8]| {
    // Skip very large inputs
    if data.len() > 1_000_000 {
        return;
    }

    let config = StreamConfig::new(1024).unwrap();

    // Stream interface roundtrip
    let mut encoder = Encoder::with_config(Vec::new(), config).unwrap();
    encoder.write_all(data).unwrap();
    let (compressed, _) = encoder.finish().unwrap();

    let mut decoder = Decoder::with_config(&compressed[..], config).unwrap();
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).unwrap();
    assert_eq!(data, &decompressed[..]);

    // Also read arbitrary stream data - should not panic
    let mut decoder = Decoder::with_config(data, config).unwrap();
    let mut buf = Vec::new();
    let _ = decoder.read_to_end(&mut buf);
});
