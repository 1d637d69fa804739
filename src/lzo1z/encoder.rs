// LZO1Z encoder: greedy match finder and opcode emitter.
//
// Each position is probed once against the dictionary (most recent earlier
// occurrence of the same 4 bytes).  A verified candidate is extended
// forward, and the match is emitted when its encoding is smaller than the
// bytes it replaces; otherwise the position joins the pending literal run.
//
// The emitter mirrors the decoder's literal-state rules:
//   - the first literal run of the stream uses the `17 + n` first-byte form
//   - runs of 1..=3 literals after a match ride in the low two bits of that
//     match's last byte
//   - longer runs get their own opcode (`n - 3`, or `0` + extension)
//
// Output never exceeds `max_compressed_size(src.len())`; the destination is
// checked against that bound before anything is written.

use super::bound::max_compressed_size;
use super::opcode::{
    END_MARKER, FIRST_LITERAL_BIAS, FIRST_LITERAL_MAX, LITERAL_INLINE_MAX, M4_MAX_OFFSET,
    MatchClass, write_extension,
};
use crate::error::Error;
use crate::hash::table::{self, Dictionary};

/// Shortest match the finder reports (the dictionary key width).
pub const MIN_MATCH: usize = 4;

/// Longest match the finder reports.  Any M3/M4 match up to this length
/// needs at most one extension byte.
pub const MAX_MATCH: usize = 264;

// ---------------------------------------------------------------------------
// Match finding
// ---------------------------------------------------------------------------

/// A back-reference candidate at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Bytes covered.
    pub len: usize,
    /// Distance back from the current position.
    pub distance: usize,
}

/// Verify and extend the candidate at `cand` for position `pos`.
///
/// Returns `None` if the distance is out of range or fewer than
/// `MIN_MATCH` bytes agree.
#[inline]
fn extend_match(src: &[u8], cand: usize, pos: usize) -> Option<Match> {
    debug_assert!(cand < pos);
    let distance = pos - cand;
    if distance > M4_MAX_OFFSET {
        return None;
    }
    let limit = (src.len() - pos).min(MAX_MATCH);
    let len = src[cand..cand + limit]
        .iter()
        .zip(&src[pos..pos + limit])
        .take_while(|(a, b)| a == b)
        .count();
    (len >= MIN_MATCH).then_some(Match { len, distance })
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Write cursor over the destination plus the state the format threads
/// between instructions.
struct Emitter<'d> {
    dst: &'d mut [u8],
    pos: usize,
    /// Distance of the previous match (0 before the first one).
    last_distance: usize,
}

impl<'d> Emitter<'d> {
    fn new(dst: &'d mut [u8]) -> Self {
        Self {
            dst,
            pos: 0,
            last_distance: 0,
        }
    }

    /// Flush a pending literal run.
    fn literals(&mut self, lits: &[u8]) {
        let n = lits.len();
        if n == 0 {
            return;
        }
        if self.pos == 0 && n <= FIRST_LITERAL_MAX {
            self.dst[0] = FIRST_LITERAL_BIAS + n as u8;
            self.pos = 1;
        } else if n <= 3 {
            // Only reachable right after a match: its last byte has free
            // trailing-literal bits.
            debug_assert!(self.pos > 0);
            self.dst[self.pos - 1] |= n as u8;
        } else if n <= LITERAL_INLINE_MAX {
            self.dst[self.pos] = (n - 3) as u8;
            self.pos += 1;
        } else {
            self.dst[self.pos] = 0;
            self.pos = write_extension(self.dst, self.pos + 1, n - LITERAL_INLINE_MAX);
        }
        self.dst[self.pos..self.pos + n].copy_from_slice(lits);
        self.pos += n;
    }

    /// Class and size the match would be written with, if encodable.
    fn plan(&self, m: Match) -> Option<(MatchClass, usize)> {
        let class = MatchClass::select(m.len, m.distance, self.last_distance)?;
        Some((class, class.encoded_len(m.len)))
    }

    fn back_reference(&mut self, class: MatchClass, m: Match) {
        self.pos = class.write(self.dst, self.pos, m.len, m.distance);
        self.last_distance = m.distance;
    }

    fn finish(self) -> usize {
        self.dst[self.pos..self.pos + END_MARKER.len()].copy_from_slice(&END_MARKER);
        self.pos + END_MARKER.len()
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Compress `src` into `dst`, returning the compressed length.
///
/// `dst` must be at least [`max_compressed_size`]`(src.len())` bytes;
/// a smaller buffer is rejected with [`Error::OutputOverrun`] before any
/// byte is written.  Uses a stack-local dictionary.
pub fn compress(src: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
    let mut dict = Dictionary::new();
    compress_with_dict(src, dst, &mut dict)
}

/// [`compress`] with caller-provided match-finder scratch.
///
/// The dictionary is reset on entry, so output depends only on `src`.
pub fn compress_with_dict(
    src: &[u8],
    dst: &mut [u8],
    dict: &mut Dictionary,
) -> Result<usize, Error> {
    let needed = max_compressed_size(src.len());
    if dst.len() < needed {
        log::trace!("lzo1z: compress destination {} < bound {needed}", dst.len());
        return Err(Error::OutputOverrun);
    }
    dict.reset();

    let mut out = Emitter::new(dst);
    let mut pos = 0;
    let mut lit_start = 0;

    while pos + MIN_MATCH <= src.len() {
        let bucket = table::bucket(&src[pos..]);
        let found = dict
            .replace(bucket, pos)
            .and_then(|cand| extend_match(src, cand, pos))
            .and_then(|m| out.plan(m).map(|plan| (m, plan)));

        match found {
            Some((m, (class, cost))) if cost < m.len => {
                out.literals(&src[lit_start..pos]);
                out.back_reference(class, m);
                pos += m.len;
                lit_start = pos;
            }
            _ => pos += 1,
        }
    }
    out.literals(&src[lit_start..]);
    let written = out.finish();

    log::trace!("lzo1z: compress {} -> {written} bytes", src.len());
    Ok(written)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
