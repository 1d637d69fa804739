// Position dictionary for the LZO1Z match finder.
//
// A fixed-size, single-slot hash table keyed by the 4 bytes at a position:
// last write wins, so a lookup yields the most recent (nearest) earlier
// occurrence.  Stored values carry HASH_CKOFFSET so that 0 means "empty",
// which lets `reset` be a plain fill.
//
// The table lives inline (no heap); `compress` keeps one on its stack and
// `compress_with_dict` lets callers amortize the zeroing across calls.

/// log2 of the bucket count.
pub const DICT_BITS: u32 = 14;

/// Number of buckets.
pub const DICT_SIZE: usize = 1 << DICT_BITS;

/// Offset added to stored positions so 0 means "empty bucket".
pub const HASH_CKOFFSET: usize = 1;

/// LCG multiplier for 32-bit multiplicative hashing.
pub const HASH_MULT_32: u32 = 1_597_334_677;

/// Bucket index for the 4-byte key at the start of `base`.
///
/// The key is read little-endian so the bucket choice (and therefore the
/// compressed output) does not depend on the host.
#[inline(always)]
pub fn bucket(base: &[u8]) -> usize {
    let key = u32::from_le_bytes([base[0], base[1], base[2], base[3]]);
    (key.wrapping_mul(HASH_MULT_32) >> (32 - DICT_BITS)) as usize
}

/// Match-finder scratch table.
///
/// Not shared between concurrent `compress_with_dict` calls: each call needs
/// exclusive access (`&mut`), so reuse across threads requires one
/// dictionary per thread or external locking.
#[derive(Clone)]
pub struct Dictionary {
    table: [usize; DICT_SIZE],
}

impl Dictionary {
    /// An empty dictionary.
    pub const fn new() -> Self {
        Self {
            table: [0; DICT_SIZE],
        }
    }

    /// Forget every stored position.
    pub fn reset(&mut self) {
        self.table.fill(0);
    }

    /// Most recent position stored in `bucket`, if any.
    #[inline(always)]
    pub fn lookup(&self, bucket: usize) -> Option<usize> {
        match self.table[bucket] {
            0 => None,
            v => Some(v - HASH_CKOFFSET),
        }
    }

    /// Store `pos` in `bucket`, overwriting the previous entry.
    #[inline(always)]
    pub fn insert(&mut self, bucket: usize, pos: usize) {
        self.table[bucket] = pos + HASH_CKOFFSET;
    }

    /// Store `pos` in `bucket` and return the position it displaced.
    #[inline(always)]
    pub fn replace(&mut self, bucket: usize, pos: usize) -> Option<usize> {
        let prev = self.lookup(bucket);
        self.insert(bucket, pos);
        prev
    }

    /// Bucket count.
    pub fn size(&self) -> usize {
        DICT_SIZE
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.table.iter().filter(|&&v| v != 0).count();
        f.debug_struct("Dictionary")
            .field("size", &DICT_SIZE)
            .field("used", &used)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
