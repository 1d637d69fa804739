#![no_main]
use libfuzzer_sys::fuzz_target;
use lzo1z::{decompress, decompress_safe};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First two bytes pick the destination size.
    let dst_len = u16::from_le_bytes([data[0], data[1]]) as usize;
    let stream = &data[2..];

    let mut fast = vec![0u8; dst_len];
    let mut safe = vec![0u8; dst_len];
    let a = decompress(stream, &mut fast);
    let b = decompress_safe(stream, &mut safe);
    assert_eq!(a, b);
    if let Ok(n) = a {
        assert_eq!(fast[..n], safe[..n]);
    }
});
