use lzo1z::io::{compress_file, decompress_file};
use std::io::{Seek, Write};
use tempfile::NamedTempFile;

#[test]
#[ignore = "large-file test is opt-in due runtime and disk requirements"]
fn large_sparse_file_roundtrip() {
    let mut input = NamedTempFile::new().unwrap();
    let packed = NamedTempFile::new().unwrap();
    let output = NamedTempFile::new().unwrap();

    // 256 MiB of mostly zeros with a few marked blocks.
    let len = 256 * 1024 * 1024u64;
    input.as_file_mut().set_len(len).unwrap();
    for (offset, marker) in [
        (64 * 1024, &b"first-block"[..]),
        (len / 2, b"middle-chunk"),
        (len - 16, b"tail-marker"),
    ] {
        input
            .as_file_mut()
            .seek(std::io::SeekFrom::Start(offset))
            .unwrap();
        input.as_file_mut().write_all(marker).unwrap();
    }
    input.as_file_mut().flush().unwrap();

    let c = compress_file(input.path(), packed.path()).unwrap();
    assert_eq!(c.input_size, len);
    assert!(c.output_size < len / 32);

    let d = decompress_file(packed.path(), output.path(), Some(len as usize)).unwrap();
    assert_eq!(d.output_size, len);
    assert_eq!(
        std::fs::read(output.path()).unwrap(),
        std::fs::read(input.path()).unwrap()
    );
}
