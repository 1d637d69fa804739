// LZO1Z format implementation.
//
// This module provides compression and decompression of raw LZO1Z streams,
// byte-for-byte compatible with liblzo2.
//
// # Modules
//
// - `opcode`  : wire constants and per-class bit layouts
// - `decoder` : opcode state machine (`decompress`, `decompress_safe`)
// - `encoder` : greedy match finder and emitter (`compress`)
// - `bound`   : worst-case compressed size

pub mod bound;
pub mod decoder;
pub mod encoder;
pub mod opcode;

// Re-export key types for convenience.
pub use bound::max_compressed_size;
pub use decoder::{Decoder, LiteralState, Step, decompress, decompress_safe};
pub use encoder::{compress, compress_with_dict};
pub use opcode::MatchClass;
