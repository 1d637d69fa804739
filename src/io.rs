// Vec and file convenience wrappers around the LZO1Z codec.
//
// The codec itself only works on caller buffers.  This layer sizes those
// buffers: compression allocates the worst-case bound up front, while
// decompression (the stream carries no length header) starts from a hint
// and doubles on `OutputOverrun` until a hard ceiling.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Error;
use crate::lzo1z::{compress, decompress, max_compressed_size};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Sizes reported by `compress_file()` and `decompress_file()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    /// Bytes read from the input file.
    pub input_size: u64,
    /// Bytes written to the output file.
    pub output_size: u64,
}

impl FileStats {
    /// Output size over input size (0.0 for empty input).
    pub fn ratio(&self) -> f64 {
        if self.input_size == 0 {
            0.0
        } else {
            self.output_size as f64 / self.input_size as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file-level operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The codec rejected the data.
    #[error("codec error: {0}")]
    Codec(#[from] Error),
}

// ---------------------------------------------------------------------------
// Default sizes
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Smallest buffer tried when growing a decompression target.
const MIN_GROW: usize = 64;

/// Ceiling for `decompress_to_vec` growth.  A single M4 extension byte
/// stands for 255 output bytes, so no valid stream expands further.
fn decompress_ceiling(src_len: usize) -> usize {
    src_len.saturating_mul(256).saturating_add(MIN_GROW)
}

// ---------------------------------------------------------------------------
// In-memory helpers
// ---------------------------------------------------------------------------

/// Compress `src` into a freshly allocated, exactly sized vector.
pub fn compress_to_vec(src: &[u8]) -> Result<Vec<u8>, Error> {
    let mut dst = vec![0u8; max_compressed_size(src.len())];
    let n = compress(src, &mut dst)?;
    dst.truncate(n);
    Ok(dst)
}

/// Decompress `src` into a freshly allocated vector.
///
/// `size_hint` is the initial buffer size (defaults to `4 * src.len()`).
/// On [`Error::OutputOverrun`] the buffer doubles and decoding restarts,
/// up to `256 * src.len() + 64` bytes; any other error is returned as is.
pub fn decompress_to_vec(src: &[u8], size_hint: Option<usize>) -> Result<Vec<u8>, Error> {
    let ceiling = decompress_ceiling(src.len()).max(size_hint.unwrap_or(0));
    let mut cap = size_hint
        .unwrap_or_else(|| src.len().saturating_mul(4))
        .min(ceiling);
    let mut dst = Vec::new();

    loop {
        dst.resize(cap, 0);
        match decompress(src, &mut dst) {
            Ok(n) => {
                dst.truncate(n);
                return Ok(dst);
            }
            Err(Error::OutputOverrun) if cap < ceiling => {
                let next = cap.saturating_mul(2).max(MIN_GROW).min(ceiling);
                log::debug!("lzo1z: output overrun at {cap} bytes, retrying with {next}");
                cap = next;
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn write_output(path: &Path, data: &[u8]) -> Result<u64, IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
    writer.write_all(data)?;
    writer.flush()?;
    Ok(data.len() as u64)
}

/// Compress the file at `input_path` into `output_path`.
///
/// The whole input is read into memory: LZO1Z is a block format with no
/// framing, so one file is one block.
pub fn compress_file(input_path: &Path, output_path: &Path) -> Result<FileStats, IoError> {
    let input = std::fs::read(input_path)?;
    let packed = compress_to_vec(&input)?;
    let stats = FileStats {
        input_size: input.len() as u64,
        output_size: write_output(output_path, &packed)?,
    };
    log::debug!(
        "lzo1z: compressed {} -> {} bytes",
        stats.input_size,
        stats.output_size
    );
    Ok(stats)
}

/// Decompress the file at `input_path` into `output_path`.
///
/// `size_hint` is forwarded to [`decompress_to_vec`].
pub fn decompress_file(
    input_path: &Path,
    output_path: &Path,
    size_hint: Option<usize>,
) -> Result<FileStats, IoError> {
    let input = std::fs::read(input_path)?;
    let output = decompress_to_vec(&input, size_hint)?;
    let stats = FileStats {
        input_size: input.len() as u64,
        output_size: write_output(output_path, &output)?,
    };
    log::debug!(
        "lzo1z: decompressed {} -> {} bytes",
        stats.input_size,
        stats.output_size
    );
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
