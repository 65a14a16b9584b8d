//! Bit-granular cursor over a byte stream
//!
//! [`BitStream`] layers a sub-byte position on top of a [`Stream`] and
//! extracts fields of 0 to 40 bits in either bit order. Assembly happens
//! in a 64-bit accumulator, so the 33-40 bit tail needs no special
//! arithmetic; 40 bits remains the documented ceiling.

use crate::error::{Result, StreamError};
use crate::stream::Stream;

/// Widest supported bit read
pub const MAX_BITS: u32 = 40;

/// A bit cursor wrapping a [`Stream`]
#[derive(Debug, Clone)]
pub struct BitStream {
    stream: Stream,
    bit_position: u8,
}

impl BitStream {
    /// Wrap a byte stream, starting at its current position
    pub fn new(stream: Stream) -> Self {
        Self {
            stream,
            bit_position: 0,
        }
    }

    /// The wrapped byte stream
    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    /// Unwrap into the underlying byte stream
    pub fn into_inner(self) -> Stream {
        self.stream
    }

    /// Sub-byte offset in `[0, 8)`
    pub fn bit_position(&self) -> u8 {
        self.bit_position
    }

    /// Global bit offset: `8 * byte_offset + bit_position`
    pub fn bit_offset(&self) -> u64 {
        8 * self.stream.offset() as u64 + self.bit_position as u64
    }

    /// Whether at least `bits` bits remain, by the byte-granular rule
    /// `(bits + 8 - bit_position) / 8` bytes
    pub fn available(&self, bits: u32) -> bool {
        let needed = bits as usize + 8 - self.bit_position as usize;
        self.stream.remaining_bytes() * 8 >= needed
    }

    /// Duplicate the cursor; storage is shared, position is not
    pub fn copy(&self) -> BitStream {
        self.clone()
    }

    /// Move forward by `bits`, delegating whole bytes to the stream
    pub fn advance(&mut self, bits: usize) -> Result<()> {
        let pos = self.bit_position as usize + bits;
        self.stream.advance(pos >> 3)?;
        self.bit_position = (pos & 7) as u8;
        Ok(())
    }

    /// Move backward by `bits`
    pub fn rewind(&mut self, bits: usize) -> Result<()> {
        let pos = self.bit_position as i64 - bits as i64;
        self.stream.rewind(pos.div_euclid(8).unsigned_abs() as usize)?;
        self.bit_position = pos.rem_euclid(8) as u8;
        Ok(())
    }

    /// Jump to an absolute bit offset
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        let current = self.bit_offset();
        if offset > current {
            self.advance((offset - current) as usize)
        } else if offset < current {
            self.rewind((current - offset) as usize)
        } else {
            Ok(())
        }
    }

    /// Discard any partial byte, advancing to the next byte boundary
    pub fn align(&mut self) -> Result<()> {
        if self.bit_position != 0 {
            self.stream.advance(1)?;
            self.bit_position = 0;
        }
        Ok(())
    }

    /// Peek `bits` bits, most significant bit first
    ///
    /// Peeks the minimal covering byte window, shifts out the
    /// `bit_position` leading bits, and keeps exactly `bits` bits. The
    /// window may not extend past 40 bits from the current byte, so
    /// `bits + bit_position > 40` fails with `TooManyBits`.
    pub fn peek(&self, bits: u32) -> Result<u64> {
        if bits == 0 {
            return Ok(0);
        }
        let total = bits + self.bit_position as u32;
        if total > MAX_BITS {
            return Err(StreamError::TooManyBits);
        }
        let nbytes = total.div_ceil(8) as usize;
        let mut acc = 0u64;
        for i in 0..nbytes {
            acc = (acc << 8) | self.stream.peek_u8(i)? as u64;
        }
        Ok((acc >> (nbytes * 8 - total as usize)) & bit_mask(bits))
    }

    /// Read `bits` bits MSB-first and advance
    pub fn read(&mut self, bits: u32) -> Result<u64> {
        let value = self.peek(bits)?;
        self.advance(bits as usize)?;
        Ok(value)
    }

    /// Peek `bits` bits MSB-first as a signed value
    pub fn peek_signed(&self, bits: u32) -> Result<i64> {
        Ok(to_signed(self.peek(bits)?, bits))
    }

    /// Read `bits` bits MSB-first as a signed value and advance
    pub fn read_signed(&mut self, bits: u32) -> Result<i64> {
        let value = self.peek_signed(bits)?;
        self.advance(bits as usize)?;
        Ok(value)
    }

    /// Peek `bits` bits, least significant byte first
    ///
    /// Each subsequent byte contributes at a higher shift; the result is
    /// the accumulator shifted down by `bit_position` and masked to
    /// `bits`. Fails with `TooManyBits` beyond 40 bits.
    pub fn peek_lsb(&self, bits: u32) -> Result<u64> {
        if bits == 0 {
            return Ok(0);
        }
        if bits > MAX_BITS {
            return Err(StreamError::TooManyBits);
        }
        let total = bits + self.bit_position as u32;
        let nbytes = total.div_ceil(8) as usize;
        let mut acc = 0u64;
        for i in 0..nbytes {
            acc |= (self.stream.peek_u8(i)? as u64) << (8 * i);
        }
        Ok((acc >> self.bit_position) & bit_mask(bits))
    }

    /// Read `bits` bits LSB-first and advance
    pub fn read_lsb(&mut self, bits: u32) -> Result<u64> {
        let value = self.peek_lsb(bits)?;
        self.advance(bits as usize)?;
        Ok(value)
    }

    /// Peek `bits` bits LSB-first as a signed value
    pub fn peek_lsb_signed(&self, bits: u32) -> Result<i64> {
        Ok(to_signed(self.peek_lsb(bits)?, bits))
    }

    /// Read `bits` bits LSB-first as a signed value and advance
    pub fn read_lsb_signed(&mut self, bits: u32) -> Result<i64> {
        let value = self.peek_lsb_signed(bits)?;
        self.advance(bits as usize)?;
        Ok(value)
    }
}

fn bit_mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

// Two's complement: a set top bit means value - 2^bits
fn to_signed(value: u64, bits: u32) -> i64 {
    if bits > 0 && (value >> (bits - 1)) & 1 == 1 {
        value as i64 - (1i64 << bits)
    } else {
        value as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use alloc::vec::Vec;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const BYTES: [u8; 8] = [0xb5, 0x27, 0x9c, 0x11, 0xf0, 0x3a, 0x55, 0xe6];

    fn bit_stream(bytes: &[u8]) -> BitStream {
        BitStream::new(Stream::from_buffer(Buffer::from_slice(bytes)))
    }

    // value of `bits` bits starting at absolute bit `pos`, MSB-first
    fn reference_msb(bytes: &[u8], pos: usize, bits: u32) -> u64 {
        let mut acc = 0u64;
        for j in 0..bits as usize {
            let bit = (bytes[(pos + j) / 8] >> (7 - (pos + j) % 8)) & 1;
            acc = (acc << 1) | bit as u64;
        }
        acc
    }

    // value of `bits` bits starting at absolute bit `pos`, LSB-first
    fn reference_lsb(bytes: &[u8], pos: usize, bits: u32) -> u64 {
        let mut acc = 0u64;
        for j in 0..bits as usize {
            let bit = (bytes[(pos + j) / 8] >> ((pos + j) % 8)) & 1;
            acc |= (bit as u64) << j;
        }
        acc
    }

    fn reference_signed(value: u64, bits: u32) -> i64 {
        if bits > 0 && value >> (bits - 1) & 1 == 1 {
            value as i64 - (1i64 << bits)
        } else {
            value as i64
        }
    }

    #[test]
    fn test_msb_reads_match_reference() {
        for start in 0..8usize {
            for bits in 0..=MAX_BITS {
                if bits + start as u32 > MAX_BITS {
                    continue;
                }
                let mut bs = bit_stream(&BYTES);
                bs.advance(start).unwrap();
                let expected = reference_msb(&BYTES, start, bits);
                assert_eq!(bs.peek(bits).unwrap(), expected, "start {start} bits {bits}");
                assert_eq!(
                    bs.peek_signed(bits).unwrap(),
                    reference_signed(expected, bits)
                );
                assert_eq!(bs.read(bits).unwrap(), expected);
                assert_eq!(bs.bit_offset(), (start as u64) + bits as u64);
            }
        }
    }

    #[test]
    fn test_lsb_reads_match_reference() {
        for start in 0..8usize {
            for bits in 0..=MAX_BITS {
                if (start as u32 + bits).div_ceil(8) as usize > BYTES.len() {
                    continue;
                }
                let mut bs = bit_stream(&BYTES);
                bs.advance(start).unwrap();
                let expected = reference_lsb(&BYTES, start, bits);
                assert_eq!(
                    bs.peek_lsb(bits).unwrap(),
                    expected,
                    "start {start} bits {bits}"
                );
                assert_eq!(
                    bs.peek_lsb_signed(bits).unwrap(),
                    reference_signed(expected, bits)
                );
                assert_eq!(bs.read_lsb(bits).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_sequential_reads_track_position() {
        let mut rng = StdRng::seed_from_u64(0xb17);
        let bytes: Vec<u8> = (0..64).map(|_| rng.gen()).collect();

        let mut bs = bit_stream(&bytes);
        let mut pos = 0usize;
        loop {
            let bits = rng.gen_range(0..=12u32);
            if !bs.available(bits) || pos + bits as usize > bytes.len() * 8 {
                break;
            }
            assert_eq!(bs.read(bits).unwrap(), reference_msb(&bytes, pos, bits));
            pos += bits as usize;
            assert_eq!(bs.bit_offset(), pos as u64);
        }
    }

    #[test]
    fn test_reads_cross_segment_boundaries() {
        let mut list = crate::buffer_list::BufferList::new();
        list.append(Buffer::from_slice(&BYTES[..3]));
        list.append(Buffer::from_slice(&BYTES[3..5]));
        list.append(Buffer::from_slice(&BYTES[5..]));
        let mut bs = BitStream::new(Stream::new(list));

        bs.advance(5).unwrap();
        assert_eq!(bs.read(35).unwrap(), reference_msb(&BYTES, 5, 35));
        assert_eq!(bs.read_lsb(17).unwrap(), reference_lsb(&BYTES, 40, 17));
    }

    #[test]
    fn test_too_many_bits() {
        let mut bs = bit_stream(&BYTES);
        assert_eq!(bs.peek(41), Err(StreamError::TooManyBits));
        assert_eq!(bs.read_lsb(41), Err(StreamError::TooManyBits));

        // MSB reads are bounded by bits + bit_position
        bs.advance(1).unwrap();
        assert_eq!(bs.peek(40), Err(StreamError::TooManyBits));
        assert_eq!(bs.peek(39).unwrap(), reference_msb(&BYTES, 1, 39));

        // LSB reads are bounded by bits alone
        assert_eq!(bs.peek_lsb(40).unwrap(), reference_lsb(&BYTES, 1, 40));
    }

    #[test]
    fn test_advance_rewind_round_trip() {
        let mut bs = bit_stream(&BYTES);
        bs.advance(11).unwrap();
        let before = bs.bit_offset();
        for bits in [0usize, 1, 7, 8, 9, 23, 40] {
            bs.advance(bits).unwrap();
            bs.rewind(bits).unwrap();
            assert_eq!(bs.bit_offset(), before, "bits {bits}");
        }
        bs.rewind(11).unwrap();
        assert_eq!(bs.bit_offset(), 0);
        assert_eq!(bs.rewind(1), Err(StreamError::Underflow));
    }

    #[test]
    fn test_align_and_seek() {
        let mut bs = bit_stream(&BYTES);
        bs.advance(3).unwrap();
        bs.align().unwrap();
        assert_eq!(bs.bit_offset(), 8);
        // already aligned: no movement
        bs.align().unwrap();
        assert_eq!(bs.bit_offset(), 8);

        bs.seek(21).unwrap();
        assert_eq!(bs.bit_offset(), 21);
        assert_eq!(bs.peek(7).unwrap(), reference_msb(&BYTES, 21, 7));
        bs.seek(2).unwrap();
        assert_eq!(bs.bit_offset(), 2);
    }

    #[test]
    fn test_available() {
        let bs = bit_stream(&[0xff, 0x00]);
        assert!(bs.available(8));
        assert!(!bs.available(9));

        let mut bs = bit_stream(&[0xff, 0x00]);
        bs.advance(3).unwrap();
        assert!(bs.available(11));
        assert!(!bs.available(12));
    }

    #[test]
    fn test_underflow() {
        let bs = bit_stream(&[0xab]);
        assert_eq!(bs.peek(9), Err(StreamError::Underflow));
        let mut bs = bit_stream(&[0xab]);
        bs.advance(6).unwrap();
        assert_eq!(bs.peek(5), Err(StreamError::Underflow));
    }
}
