//! Lzo1z: LZO1Z compression and decompression in pure Rust.
//!
//! Streams are bit-compatible with liblzo2's LZO1Z variant.  The stream
//! carries no header, length, or checksum: callers track the decompressed
//! size themselves.
//!
//! The crate provides:
//! - The codec engine (`lzo1z`): allocation-free `compress`, `decompress`
//!   and `decompress_safe` over caller-owned buffers
//! - Vec and file helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! All entry points are stateless; concurrent calls on disjoint buffers need
//! no synchronization.
//!
//! # Quick Start
//!
//! ```
//! let input = b"Hello, World! Hello, World! Hello, World!";
//!
//! let mut packed = vec![0u8; lzo1z::max_compressed_size(input.len())];
//! let n = lzo1z::compress(input, &mut packed).unwrap();
//! assert_eq!(n, 21);
//!
//! let mut output = vec![0u8; input.len()];
//! let m = lzo1z::decompress(&packed[..n], &mut output).unwrap();
//! assert_eq!(&output[..m], input);
//! ```

pub mod error;
pub mod hash;
pub mod io;
pub mod lzo1z;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::Error;
pub use hash::Dictionary;
pub use lzo1z::{compress, compress_with_dict, decompress, decompress_safe, max_compressed_size};
