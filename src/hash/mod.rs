// Hashing for the LZO1Z match finder.
//
// This module provides:
// - A 4-byte multiplicative hash (`bucket`)
// - The fixed-size position dictionary (`Dictionary`)

pub mod table;

pub use table::{DICT_SIZE, Dictionary, bucket};
