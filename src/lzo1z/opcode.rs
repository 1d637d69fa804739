// LZO1Z opcode layout.
//
// Byte-for-byte compatible with liblzo2 built for LZO1Z (`config1x.h` with
// `LZO1Z` defined).  LZO1Z shares the LZO1X opcode classes but stores every
// 14-bit offset high bits first:
//
//     byte 0 = off >> 6
//     byte 1 = (off << 2) & 0xff      (low 2 bits: trailing literal count)
//
// and keeps the trailing-literal count in the *last* byte of each match.
// M2 offset fields 0x1c..=0x1f reuse the previous match distance.

// ---------------------------------------------------------------------------
// Format constants
// ---------------------------------------------------------------------------

pub const M1_MAX_OFFSET: usize = 0x0400;
pub const M2_MAX_OFFSET: usize = 0x0700;
pub const MX_MAX_OFFSET: usize = M1_MAX_OFFSET + M2_MAX_OFFSET;
pub const M3_MAX_OFFSET: usize = 0x4000;
pub const M4_MAX_OFFSET: usize = 0xbfff;

/// Distance bias of M4 matches (and of the end marker test).
pub const M4_BASE: usize = 0x4000;

pub const M2_MIN_LEN: usize = 3;
pub const M2_MAX_LEN: usize = 8;
pub const M3_MAX_LEN: usize = 33;
pub const M4_MAX_LEN: usize = 9;

pub const M2_MARKER: u8 = 64;
pub const M3_MARKER: u8 = 32;
pub const M4_MARKER: u8 = 16;

/// M2 offset fields at or above this value repeat the last distance.
pub const M2_REPEAT_FIELD: u8 = (M2_MAX_OFFSET >> 6) as u8; // 0x1c

/// Opcodes above this value at stream start introduce a literal run.
pub const FIRST_LITERAL_BIAS: u8 = 17;

/// Longest literal run the first-byte form (`17 + len`) can express.
pub const FIRST_LITERAL_MAX: usize = 238;

/// Literal runs up to this length fit in the opcode (`len - 3`).
pub const LITERAL_INLINE_MAX: usize = 18;

/// The terminating instruction: an M4 with a zero offset field.
pub const END_MARKER: [u8; 3] = [M4_MARKER | 1, 0, 0];

// ---------------------------------------------------------------------------
// Offset fields
// ---------------------------------------------------------------------------

/// Split a 14-bit offset field into its two wire bytes.
#[inline(always)]
pub fn encode_offset(field: usize) -> [u8; 2] {
    debug_assert!(field < 1 << 14);
    [(field >> 6) as u8, (field << 2) as u8]
}

/// Recombine the two wire bytes of an offset field.
#[inline(always)]
pub fn decode_offset(b0: u8, b1: u8) -> usize {
    ((b0 as usize) << 6) + ((b1 as usize) >> 2)
}

// ---------------------------------------------------------------------------
// Length extension
// ---------------------------------------------------------------------------

/// Bytes needed to extend a length by `excess` (zero bytes worth 255 each,
/// then one non-zero terminator).
#[inline]
pub fn extension_len(excess: usize) -> usize {
    debug_assert!(excess > 0);
    1 + (excess - 1) / 255
}

/// Write a length extension for `excess` at `dst[pos..]`, returning the new
/// position.
#[inline]
pub fn write_extension(dst: &mut [u8], mut pos: usize, mut excess: usize) -> usize {
    debug_assert!(excess > 0);
    while excess > 255 {
        dst[pos] = 0;
        pos += 1;
        excess -= 255;
    }
    dst[pos] = excess as u8;
    pos + 1
}

// ---------------------------------------------------------------------------
// Match classes (encoder side)
// ---------------------------------------------------------------------------

/// Encoding chosen for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchClass {
    /// One byte: M2 length with the previous match distance.
    M2Repeat,
    /// Two bytes: length 3..=8, distance <= 0x700.
    M2,
    /// Opcode (+ extension) + 2 offset bytes, distance <= 0x4000.
    M3,
    /// Opcode (+ extension) + 2 offset bytes, distance 0x4001..=0xbfff.
    M4,
}

impl MatchClass {
    /// Smallest class able to encode `len` bytes at `distance`, given the
    /// distance of the previous match (0 when none).
    ///
    /// Returns `None` when the distance is out of range.
    pub fn select(len: usize, distance: usize, last_distance: usize) -> Option<Self> {
        debug_assert!(len >= M2_MIN_LEN && distance > 0);
        if len <= M2_MAX_LEN && distance == last_distance {
            Some(Self::M2Repeat)
        } else if len <= M2_MAX_LEN && distance <= M2_MAX_OFFSET {
            Some(Self::M2)
        } else if distance <= M3_MAX_OFFSET {
            Some(Self::M3)
        } else if distance <= M4_MAX_OFFSET {
            Some(Self::M4)
        } else {
            None
        }
    }

    /// Encoded size in bytes of a `len`-byte match in this class.
    pub fn encoded_len(self, len: usize) -> usize {
        match self {
            Self::M2Repeat => 1,
            Self::M2 => 2,
            Self::M3 if len > M3_MAX_LEN => 3 + extension_len(len - M3_MAX_LEN),
            Self::M4 if len > M4_MAX_LEN => 3 + extension_len(len - M4_MAX_LEN),
            Self::M3 | Self::M4 => 3,
        }
    }

    /// Write the match at `dst[pos..]` and return the new position.
    ///
    /// The trailing-literal bits of the last byte are left clear.
    pub fn write(self, dst: &mut [u8], mut pos: usize, len: usize, distance: usize) -> usize {
        let field = match self {
            Self::M2Repeat => {
                dst[pos] = (((len - 1) << 5) as u8) | M2_REPEAT_FIELD;
                return pos + 1;
            }
            Self::M2 => {
                let field = distance - 1;
                dst[pos] = (((len - 1) << 5) | (field >> 6)) as u8;
                dst[pos + 1] = (field << 2) as u8;
                return pos + 2;
            }
            Self::M3 => {
                if len <= M3_MAX_LEN {
                    dst[pos] = M3_MARKER | (len - 2) as u8;
                    pos += 1;
                } else {
                    dst[pos] = M3_MARKER;
                    pos = write_extension(dst, pos + 1, len - M3_MAX_LEN);
                }
                distance - 1
            }
            Self::M4 => {
                let field = distance - M4_BASE;
                let high = ((field & 0x4000) >> 11) as u8;
                if len <= M4_MAX_LEN {
                    dst[pos] = M4_MARKER | high | (len - 2) as u8;
                    pos += 1;
                } else {
                    dst[pos] = M4_MARKER | high;
                    pos = write_extension(dst, pos + 1, len - M4_MAX_LEN);
                }
                field & 0x3fff
            }
        };
        let [b0, b1] = encode_offset(field);
        dst[pos] = b0;
        dst[pos + 1] = b1;
        pos + 2
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
