#![no_main]

use libfuzzer_sys::fuzz_target;
use ringlz::{decode_blocks, StreamConfig};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a framed stream: blocks or an error, never a panic
    let config = StreamConfig::new(4096).unwrap();
    let _ = decode_blocks(data, &config);
});
