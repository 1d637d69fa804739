// Error taxonomy shared by the encoder and decoder.
//
// Every failure is detected before the offending read or write happens, so
// an `Err` never follows an out-of-bounds access.  Callers must treat any
// error as "no valid output produced by this call".

/// Codec error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The compressed stream ended before an opcode, length extension,
    /// offset, or literal run could be read in full.
    #[error("input overrun: compressed stream is truncated")]
    InputOverrun,
    /// The destination buffer cannot hold the bytes the stream produces
    /// (decode), or is smaller than `max_compressed_size` (encode).
    #[error("output overrun: destination buffer is too small")]
    OutputOverrun,
    /// A match references output before the start of the buffer, or uses a
    /// zero distance.
    #[error("lookbehind overrun: match distance reaches before the output start")]
    LookbehindOverrun,
}

impl Error {
    /// Whether retrying with a larger destination buffer can succeed.
    pub fn is_output_overrun(&self) -> bool {
        matches!(self, Self::OutputOverrun)
    }
}
