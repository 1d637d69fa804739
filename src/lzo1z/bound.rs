// Worst-case compressed size.
//
// Same bound liblzo2 documents for the LZO1X family: incompressible input
// grows by at most 1/16 plus a constant (literal run headers, the first
// literal opcode and the 3-byte end marker).

/// Upper bound on the compressed size of `input_len` bytes.
///
/// `compress` never writes more than this many bytes and refuses
/// destinations smaller than it.
#[inline]
pub const fn max_compressed_size(input_len: usize) -> usize {
    input_len
        .saturating_add(input_len / 16)
        .saturating_add(64 + 3)
}
