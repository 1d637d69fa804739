#![no_main]
use libfuzzer_sys::fuzz_target;
use lzo1z::io::decompress_to_vec;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must only ever produce errors, never panics.
    let _ = decompress_to_vec(data, None);

    // Also with a tiny starting buffer so the growth path runs.
    let _ = decompress_to_vec(data, Some(1));
});
