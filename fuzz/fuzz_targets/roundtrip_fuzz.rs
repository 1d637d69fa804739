#![no_main]
use libfuzzer_sys::fuzz_target;
use lzo1z::{compress, decompress, max_compressed_size};

fuzz_target!(|data: &[u8]| {
    let mut packed = vec![0u8; max_compressed_size(data.len())];
    let n = compress(data, &mut packed).unwrap();

    let mut out = vec![0u8; data.len()];
    let m = decompress(&packed[..n], &mut out).unwrap();
    assert_eq!(m, data.len());
    assert_eq!(out, data);
});
