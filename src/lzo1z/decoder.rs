// LZO1Z decoder: opcode state machine and match/literal copying.
//
// Byte-for-byte compatible with liblzo2's `lzo1z_decompress_safe`.  The
// state machine is written once and parameterized by a `CopyStrategy`:
//
//   - `Bulk`: `copy_from_slice` / `copy_within`, overlapping matches
//     expanded by doubling chunks (used by `decompress`)
//   - `Bytewise`: one checked byte at a time (used by `decompress_safe`)
//
// All bounds are classified by the state machine before a strategy runs, so
// both entry points return the same `Result` for every input.  Check order
// follows liblzo2: output before input for literal copies, lookbehind
// before output for matches.

use super::opcode::{
    FIRST_LITERAL_BIAS, LITERAL_INLINE_MAX, M2_MARKER, M2_MAX_OFFSET, M2_REPEAT_FIELD, M3_MARKER,
    M3_MAX_LEN, M4_BASE, M4_MARKER, M4_MAX_LEN, decode_offset,
};
use crate::error::Error;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// How many literals the previous instruction produced.
///
/// Opcodes 0..=15 mean different things depending on this bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralState {
    /// No literals (stream start, or a match without trailing literals):
    /// opcodes 0..=15 start a literal run.
    None,
    /// 1..=3 literals: opcodes 0..=15 are 2-byte M1 matches (distance <= 0x400).
    Short(u8),
    /// 4 or more literals: opcodes 0..=15 are 3-byte M1 matches at
    /// distance 0x701..=0xb00.
    Long,
}

impl LiteralState {
    /// Bucket for an instruction that produced `count` literals.
    #[inline]
    pub fn after_literals(count: usize) -> Self {
        match count {
            0 => Self::None,
            1..=3 => Self::Short(count as u8),
            _ => Self::Long,
        }
    }
}

/// Result of decoding one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// More instructions follow; carries the state for the next one.
    Continue(LiteralState),
    /// The end marker was decoded.
    End,
}

// ---------------------------------------------------------------------------
// Copy strategies
// ---------------------------------------------------------------------------

/// Moves bytes into the output once the state machine has validated bounds.
pub trait CopyStrategy {
    /// Write `lits` at `dst[op..]`.
    fn copy_literals(dst: &mut [u8], op: usize, lits: &[u8]) -> Result<(), Error>;

    /// Copy `len` bytes from `dst[op - distance..]` to `dst[op..]`, front to
    /// back, so that a distance shorter than `len` repeats the pattern.
    fn copy_match(dst: &mut [u8], op: usize, distance: usize, len: usize) -> Result<(), Error>;
}

/// Slice-level copies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bulk;

impl CopyStrategy for Bulk {
    #[inline(always)]
    fn copy_literals(dst: &mut [u8], op: usize, lits: &[u8]) -> Result<(), Error> {
        dst[op..op + lits.len()].copy_from_slice(lits);
        Ok(())
    }

    #[inline(always)]
    fn copy_match(dst: &mut [u8], op: usize, distance: usize, len: usize) -> Result<(), Error> {
        let from = op - distance;
        if distance >= len {
            dst.copy_within(from..from + len, op);
            return Ok(());
        }
        // Everything in [from, op + done) already repeats with period
        // `distance`, so each pass can copy twice as much as the last.
        let mut done = 0;
        while done < len {
            let chunk = (len - done).min(distance + done);
            dst.copy_within(from..from + chunk, op + done);
            done += chunk;
        }
        Ok(())
    }
}

/// Byte-at-a-time copies through checked indexing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bytewise;

impl CopyStrategy for Bytewise {
    fn copy_literals(dst: &mut [u8], op: usize, lits: &[u8]) -> Result<(), Error> {
        for (i, &b) in lits.iter().enumerate() {
            *dst.get_mut(op + i).ok_or(Error::OutputOverrun)? = b;
        }
        Ok(())
    }

    fn copy_match(dst: &mut [u8], op: usize, distance: usize, len: usize) -> Result<(), Error> {
        let from = op.checked_sub(distance).ok_or(Error::LookbehindOverrun)?;
        for i in 0..len {
            let b = *dst.get(from + i).ok_or(Error::LookbehindOverrun)?;
            *dst.get_mut(op + i).ok_or(Error::OutputOverrun)? = b;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Cursor pair over one compressed stream and its destination.
pub struct Decoder<'s, 'd> {
    src: &'s [u8],
    dst: &'d mut [u8],
    ip: usize,
    op: usize,
    /// Distance of the previous match, reused by M2 repeat opcodes.
    last_distance: usize,
}

impl<'s, 'd> Decoder<'s, 'd> {
    pub fn new(src: &'s [u8], dst: &'d mut [u8]) -> Self {
        Self {
            src,
            dst,
            ip: 0,
            op: 0,
            last_distance: 0,
        }
    }

    /// Compressed bytes consumed so far.
    pub fn input_position(&self) -> usize {
        self.ip
    }

    /// Decompressed bytes produced so far.
    pub fn output_position(&self) -> usize {
        self.op
    }

    /// Decode the whole stream and return the decompressed length.
    pub fn run<C: CopyStrategy>(mut self) -> Result<usize, Error> {
        if self.src.is_empty() {
            return Ok(0);
        }
        let mut state = self.start::<C>()?;
        loop {
            match self.step::<C>(state)? {
                Step::Continue(next) => state = next,
                Step::End => return Ok(self.op),
            }
        }
    }

    /// Handle the optional first-byte literal run (`17 + len`).
    pub fn start<C: CopyStrategy>(&mut self) -> Result<LiteralState, Error> {
        debug_assert_eq!(self.ip, 0);
        match self.src.first() {
            Some(&t) if t > FIRST_LITERAL_BIAS => {
                self.ip = 1;
                let len = (t - FIRST_LITERAL_BIAS) as usize;
                self.literals::<C>(len)?;
                Ok(LiteralState::after_literals(len))
            }
            _ => Ok(LiteralState::None),
        }
    }

    /// Decode one instruction given the previous instruction's literal state.
    pub fn step<C: CopyStrategy>(&mut self, state: LiteralState) -> Result<Step, Error> {
        let t = self.next_byte()?;
        let (distance, len) = if t >= M2_MARKER {
            // 0bLLLOOOOO [0bOOOOOOSS]
            let field = t & 0x1f;
            let distance = if field >= M2_REPEAT_FIELD {
                self.last_distance
            } else {
                1 + decode_offset(field, self.next_byte()?)
            };
            (distance, (t >> 5) as usize + 1)
        } else if t >= M3_MARKER {
            // 0b001LLLLL [ext..] 0bOOOOOOOO 0bOOOOOOSS
            let len = match t & 0x1f {
                0 => self.extended_length(M3_MAX_LEN)?,
                n => n as usize + 2,
            };
            (1 + self.offset_field()?, len)
        } else if t >= M4_MARKER {
            // 0b0001HLLL [ext..] 0bOOOOOOOO 0bOOOOOOSS
            let len = match t & 0x07 {
                0 => self.extended_length(M4_MAX_LEN)?,
                n => n as usize + 2,
            };
            let field = (((t & 0x08) as usize) << 11) + self.offset_field()?;
            if field == 0 {
                return Ok(Step::End);
            }
            (M4_BASE + field, len)
        } else {
            match state {
                LiteralState::None => {
                    let len = match t {
                        0 => self.extended_length(LITERAL_INLINE_MAX)?,
                        n => n as usize + 3,
                    };
                    self.literals::<C>(len)?;
                    return Ok(Step::Continue(LiteralState::Long));
                }
                LiteralState::Short(_) => (1 + decode_offset(t, self.next_byte()?), 2),
                LiteralState::Long => (
                    1 + M2_MAX_OFFSET + decode_offset(t, self.next_byte()?),
                    3,
                ),
            }
        };

        self.back_reference::<C>(distance, len)?;

        // Trailing literal count lives in the last byte of the match.
        let trailing = (self.src[self.ip - 1] & 3) as usize;
        self.literals::<C>(trailing)?;
        Ok(Step::Continue(LiteralState::after_literals(trailing)))
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Result<u8, Error> {
        let b = *self.src.get(self.ip).ok_or(Error::InputOverrun)?;
        self.ip += 1;
        Ok(b)
    }

    #[inline(always)]
    fn offset_field(&mut self) -> Result<usize, Error> {
        let b0 = self.next_byte()?;
        let b1 = self.next_byte()?;
        Ok(decode_offset(b0, b1))
    }

    /// Read a length extension: each zero byte adds 255, the first non-zero
    /// byte adds its value and ends the sequence.
    fn extended_length(&mut self, base: usize) -> Result<usize, Error> {
        let mut len = base;
        loop {
            match self.next_byte()? {
                0 => len = len.checked_add(255).ok_or(Error::InputOverrun)?,
                b => return len.checked_add(b as usize).ok_or(Error::InputOverrun),
            }
        }
    }

    fn literals<C: CopyStrategy>(&mut self, len: usize) -> Result<(), Error> {
        if len == 0 {
            return Ok(());
        }
        let out_end = self
            .op
            .checked_add(len)
            .filter(|&end| end <= self.dst.len())
            .ok_or(Error::OutputOverrun)?;
        let in_end = self
            .ip
            .checked_add(len)
            .filter(|&end| end <= self.src.len())
            .ok_or(Error::InputOverrun)?;
        let src = self.src;
        C::copy_literals(self.dst, self.op, &src[self.ip..in_end])?;
        self.ip = in_end;
        self.op = out_end;
        Ok(())
    }

    fn back_reference<C: CopyStrategy>(
        &mut self,
        distance: usize,
        len: usize,
    ) -> Result<(), Error> {
        if distance == 0 || distance > self.op {
            return Err(Error::LookbehindOverrun);
        }
        let out_end = self
            .op
            .checked_add(len)
            .filter(|&end| end <= self.dst.len())
            .ok_or(Error::OutputOverrun)?;
        C::copy_match(self.dst, self.op, distance, len)?;
        self.op = out_end;
        self.last_distance = distance;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Decompress an LZO1Z stream into `dst`, returning the number of bytes
/// written.
///
/// `dst` must hold the whole decompressed output; the stream carries no
/// length.  An empty `src` decodes to nothing.  Bytes after the end marker
/// are ignored.  On error, `dst` may hold partial output that must be
/// discarded.
pub fn decompress(src: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
    let result = Decoder::new(src, dst).run::<Bulk>();
    log::trace!("lzo1z: decompress {} bytes -> {:?}", src.len(), result);
    result
}

/// Same contract and results as [`decompress`], copying one checked byte at
/// a time.
pub fn decompress_safe(src: &[u8], dst: &mut [u8]) -> Result<usize, Error> {
    let result = Decoder::new(src, dst).run::<Bytewise>();
    log::trace!("lzo1z: decompress_safe {} bytes -> {:?}", src.len(), result);
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn both(src: &[u8], cap: usize) -> Result<Vec<u8>, Error> {
        let mut fast = vec![0u8; cap];
        let mut safe = vec![0u8; cap];
        let a = decompress(src, &mut fast);
        let b = decompress_safe(src, &mut safe);
        assert_eq!(a, b, "fast/safe disagree on {src:02x?}");
        a.map(|n| {
            assert_eq!(fast[..n], safe[..n]);
            fast[..n].to_vec()
        })
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(both(&[], 100), Ok(vec![]));
        assert_eq!(both(&[], 0), Ok(vec![]));
    }

    #[test]
    fn end_marker_only() {
        assert_eq!(both(&[0x11, 0x00, 0x00], 0), Ok(vec![]));
    }

    #[test]
    fn first_literal_run() {
        let src = [
            0x1b, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41, 0x41, 0x11, 0x00, 0x00,
        ];
        assert_eq!(both(&src, 20), Ok(b"AAAAAAAAAA".to_vec()));
        // exact capacity is enough
        assert_eq!(both(&src, 10), Ok(b"AAAAAAAAAA".to_vec()));
    }

    #[test]
    fn overlapping_m3_match() {
        let src = [0x12, 0x41, 0x20, 0x06, 0x00, 0x00, 0x11, 0x00, 0x00];
        assert_eq!(both(&src, 50), Ok(vec![b'A'; 40]));
    }

    #[test]
    fn overlapping_copy_with_period_three() {
        // "abc" then M3 len 20 at distance 3
        let src = [0x14, b'a', b'b', b'c', 0x32, 0x00, 0x08, 0x11, 0x00, 0x00];
        let out = both(&src, 64).unwrap();
        assert_eq!(out, b"abcabcabcabcabcabcabcab");
    }

    #[test]
    fn m1_short_after_few_literals() {
        // two literals, then opcode 0x00 is a 2-byte match at distance 2
        let src = [0x13, b'A', b'B', 0x00, 0x04, 0x11, 0x00, 0x00];
        assert_eq!(both(&src, 10), Ok(b"ABAB".to_vec()));
    }

    #[test]
    fn m1_long_after_literal_run() {
        let data: Vec<u8> = (0..2000u32).map(|i| (i * 7 + 3) as u8).collect();
        // literal run of 2000 = 18 + 7 * 255 + 197
        let mut src = vec![0x00];
        src.extend_from_slice(&[0x00; 7]);
        src.push(0xc5);
        src.extend_from_slice(&data);
        // 3-byte match at distance 2000 = 1 + 0x700 + (3 << 6) + 15
        src.extend_from_slice(&[0x03, 0x3c, 0x11, 0x00, 0x00]);
        let out = both(&src, 3000).unwrap();
        assert_eq!(out.len(), 2003);
        assert_eq!(&out[..2000], &data[..]);
        assert_eq!(&out[2000..], &data[..3]);
    }

    #[test]
    fn m2_repeat_uses_previous_distance() {
        let src = [
            0x16, b'A', b'B', b'C', b'D', b'E', // 5 literals
            0x40, 0x11, // M2 len 3, distance 5, 1 trailing literal
            b'X', //
            0x7c, // M2 len 4, repeat distance 5
            0x11, 0x00, 0x00,
        ];
        assert_eq!(both(&src, 100), Ok(b"ABCDEABCXEABC".to_vec()));
    }

    #[test]
    fn m2_repeat_before_any_match_is_lookbehind() {
        let src = [0x16, b'A', b'B', b'C', b'D', b'E', 0x5c, 0x11, 0x00, 0x00];
        assert_eq!(both(&src, 100), Err(Error::LookbehindOverrun));
    }

    #[test]
    fn m4_far_match() {
        // 0x4001 literal bytes, then a 3-byte M4 match at distance 0x4001
        let data: Vec<u8> = (0..0x4001u32).map(|i| (i % 251) as u8).collect();
        let mut src = vec![0x00];
        let mut excess = data.len() - 18;
        while excess > 255 {
            src.push(0);
            excess -= 255;
        }
        src.push(excess as u8);
        src.extend_from_slice(&data);
        src.extend_from_slice(&[0x11, 0x00, 0x04, 0x11, 0x00, 0x00]);
        let out = both(&src, 0x5000).unwrap();
        assert_eq!(out.len(), 0x4004);
        assert_eq!(&out[0x4001..], &data[..3]);
    }

    #[test]
    fn trailing_bytes_after_end_marker_are_ignored() {
        let src = [0x15, b'a', b'b', b'c', b'd', 0x11, 0x00, 0x00, 0xde, 0xad];
        assert_eq!(both(&src, 4), Ok(b"abcd".to_vec()));
    }

    #[test]
    fn truncated_literals() {
        assert_eq!(both(&[0x18, 0x41, 0x42, 0x43, 0x11], 100), Err(Error::InputOverrun));
    }

    #[test]
    fn truncated_m3_offset() {
        // starts with a literal run so 0x20 is read as an opcode
        let src = [0x15, b'a', b'b', b'c', b'd', 0x20];
        assert_eq!(both(&src, 100), Err(Error::InputOverrun));
        let src = [0x15, b'a', b'b', b'c', b'd', 0x23, 0x00];
        assert_eq!(both(&src, 100), Err(Error::InputOverrun));
    }

    #[test]
    fn missing_end_marker() {
        assert_eq!(both(&[0x15, b'a', b'b', b'c', b'd'], 100), Err(Error::InputOverrun));
    }

    #[test]
    fn output_too_small_for_literals() {
        assert_eq!(both(&[0x15, 0x41, 0x42, 0x43, 0x44], 2), Err(Error::OutputOverrun));
    }

    #[test]
    fn output_checked_before_input_for_literals() {
        // 7 literals announced, 3 present, room for 2
        assert_eq!(both(&[0x18, 0x41, 0x42, 0x43], 2), Err(Error::OutputOverrun));
    }

    #[test]
    fn output_too_small_for_match() {
        let src = [0x12, 0x41, 0x20, 0x06, 0x00, 0x00, 0x11, 0x00, 0x00];
        assert_eq!(both(&src, 39), Err(Error::OutputOverrun));
    }

    #[test]
    fn match_before_output_start() {
        // one literal, then M3 at distance 2
        let src = [0x12, 0x41, 0x21, 0x00, 0x04, 0x11, 0x00, 0x00];
        assert_eq!(both(&src, 100), Err(Error::LookbehindOverrun));
        // a match as the very first instruction
        assert_eq!(both(&[0x11, 0x00, 0x04], 100), Err(Error::LookbehindOverrun));
    }

    #[test]
    fn endless_length_extension_is_input_overrun() {
        let mut src = vec![0x15, b'a', b'b', b'c', b'd', 0x20];
        src.extend_from_slice(&[0u8; 64]);
        assert_eq!(both(&src, 100), Err(Error::InputOverrun));
    }

    #[test]
    fn literal_state_buckets() {
        assert_eq!(LiteralState::after_literals(0), LiteralState::None);
        assert_eq!(LiteralState::after_literals(1), LiteralState::Short(1));
        assert_eq!(LiteralState::after_literals(3), LiteralState::Short(3));
        assert_eq!(LiteralState::after_literals(4), LiteralState::Long);
        assert_eq!(LiteralState::after_literals(1000), LiteralState::Long);
    }

    #[test]
    fn low_opcode_meaning_depends_on_state() {
        let src = [0x01, b'w', b'x', b'y', b'z'];

        let mut out = [0u8; 8];
        let mut d = Decoder::new(&src, &mut out);
        assert_eq!(d.step::<Bulk>(LiteralState::None), Ok(Step::Continue(LiteralState::Long)));
        assert_eq!((d.input_position(), d.output_position()), (5, 4));

        // as a match opcode there is no output to reach back into
        for state in [LiteralState::Short(2), LiteralState::Long] {
            let mut out = [0u8; 8];
            let mut d = Decoder::new(&src, &mut out);
            assert_eq!(d.step::<Bulk>(state), Err(Error::LookbehindOverrun));
            assert_eq!(d.input_position(), 2);
        }
    }

    #[test]
    fn start_without_first_literal() {
        let src = [0x11, 0x00, 0x00];
        let mut out = [0u8; 0];
        let mut d = Decoder::new(&src, &mut out);
        assert_eq!(d.start::<Bytewise>(), Ok(LiteralState::None));
        assert_eq!(d.input_position(), 0);
        assert_eq!(d.step::<Bytewise>(LiteralState::None), Ok(Step::End));
    }

    #[test]
    fn truncations_and_capacities_agree() {
        let src = [
            0x16, b'A', b'B', b'C', b'D', b'E', 0x40, 0x11, b'X', 0x7c, 0x20, 0x06, 0x00, 0x00,
            0x11, 0x00, 0x00,
        ];
        for cut in 0..=src.len() {
            for cap in 0..64 {
                let _ = both(&src[..cut], cap);
            }
        }
    }
}
