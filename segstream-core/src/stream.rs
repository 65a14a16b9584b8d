//! Byte-granular cursor over segmented storage
//!
//! [`Stream`] walks a [`BufferList`] one byte at a time, crossing segment
//! boundaries in both directions. `read_u8`/`peek_u8` are the only
//! primitive accessors; every wider read peeks successive bytes into a
//! fixed-width window and reassembles the target type explicitly, so no
//! memory is ever reinterpreted under a different static type.

use alloc::string::String;
use alloc::vec::Vec;

use crate::buffer::Buffer;
use crate::buffer_list::BufferList;
use crate::encoding::{Endian, TextEncoding};
use crate::error::{Result, StreamError};

/// A byte cursor over a [`BufferList`]
#[derive(Debug, Clone)]
pub struct Stream {
    list: BufferList,
    local_offset: usize,
    offset: usize,
}

impl Stream {
    /// Create a stream positioned at the head of a list
    pub fn new(list: BufferList) -> Self {
        Self {
            list,
            local_offset: 0,
            offset: 0,
        }
    }

    /// Create a stream over a single buffer
    pub fn from_buffer(buffer: Buffer) -> Self {
        let mut list = BufferList::new();
        list.append(buffer);
        Self::new(list)
    }

    /// Global byte offset since the stream was created
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left between the cursor and the end of the reachable segments
    pub fn remaining_bytes(&self) -> usize {
        self.list.available_bytes() - self.local_offset
    }

    /// Whether at least `bytes` bytes remain
    pub fn available(&self, bytes: usize) -> bool {
        bytes <= self.remaining_bytes()
    }

    /// The underlying list, for appending more input
    pub fn list_mut(&mut self) -> &mut BufferList {
        &mut self.list
    }

    /// Duplicate the cursor; segment storage is shared, cursor state is not
    pub fn copy(&self) -> Stream {
        Stream {
            list: self.list.copy(),
            local_offset: self.local_offset,
            offset: self.offset,
        }
    }

    /// Move the cursor forward, dropping fully consumed head segments
    pub fn advance(&mut self, bytes: usize) -> Result<()> {
        if !self.available(bytes) {
            return Err(StreamError::Underflow);
        }
        self.local_offset += bytes;
        self.offset += bytes;
        loop {
            let first_len = match self.list.first() {
                Some(first) => first.len(),
                None => break,
            };
            if self.local_offset < first_len {
                break;
            }
            self.local_offset -= first_len;
            self.list.advance();
        }
        Ok(())
    }

    /// Move the cursor backward, restoring earlier segments as needed
    pub fn rewind(&mut self, bytes: usize) -> Result<()> {
        if bytes > self.offset {
            return Err(StreamError::Underflow);
        }
        let mut local = self.local_offset as i64;
        // a drained list parks the cursor at the end of the last segment
        if self.list.first().is_none() && self.list.rewind() {
            if let Some(first) = self.list.first() {
                local = first.len() as i64;
            }
        }
        self.offset -= bytes;
        local -= bytes as i64;
        while local < 0 && self.list.rewind() {
            if let Some(first) = self.list.first() {
                local += first.len() as i64;
            }
        }
        self.local_offset = local.max(0) as usize;
        Ok(())
    }

    /// Jump to an absolute offset by advancing or rewinding the delta
    pub fn seek(&mut self, position: usize) -> Result<()> {
        use core::cmp::Ordering;
        match position.cmp(&self.offset) {
            Ordering::Greater => self.advance(position - self.offset),
            Ordering::Less => self.rewind(self.offset - position),
            Ordering::Equal => Ok(()),
        }
    }

    /// Read one byte and advance
    pub fn read_u8(&mut self) -> Result<u8> {
        let value = self.peek_u8(0)?;
        self.advance(1)?;
        Ok(value)
    }

    /// Look at the byte `offset` positions ahead without moving
    pub fn peek_u8(&self, offset: usize) -> Result<u8> {
        let needed = offset.checked_add(1).ok_or(StreamError::Underflow)?;
        if !self.available(needed) {
            return Err(StreamError::Underflow);
        }
        let mut pos = self.local_offset + offset;
        for segment in self.list.iter() {
            if pos < segment.len() {
                return Ok(segment.as_slice()[pos]);
            }
            pos -= segment.len();
        }
        Err(StreamError::Underflow)
    }

    fn peek_window<const N: usize>(&self, offset: usize, endian: Endian) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.peek_u8(offset + i)?;
        }
        if endian == Endian::Little {
            bytes.reverse();
        }
        Ok(bytes)
    }

    fn read_window<const N: usize>(&mut self, endian: Endian) -> Result<[u8; N]> {
        let bytes = self.peek_window::<N>(0, endian)?;
        self.advance(N)?;
        Ok(bytes)
    }

    /// Read a signed byte
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Peek a signed byte
    pub fn peek_i8(&self, offset: usize) -> Result<i8> {
        Ok(self.peek_u8(offset)? as i8)
    }

    /// Read a 16-bit unsigned integer
    pub fn read_u16(&mut self, endian: Endian) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_window(endian)?))
    }

    /// Peek a 16-bit unsigned integer
    pub fn peek_u16(&self, offset: usize, endian: Endian) -> Result<u16> {
        Ok(u16::from_be_bytes(self.peek_window(offset, endian)?))
    }

    /// Read a 16-bit signed integer
    pub fn read_i16(&mut self, endian: Endian) -> Result<i16> {
        Ok(self.read_u16(endian)? as i16)
    }

    /// Peek a 16-bit signed integer
    pub fn peek_i16(&self, offset: usize, endian: Endian) -> Result<i16> {
        Ok(self.peek_u16(offset, endian)? as i16)
    }

    /// Read a 24-bit unsigned integer, widened to u32
    pub fn read_u24(&mut self, endian: Endian) -> Result<u32> {
        let b: [u8; 3] = self.read_window(endian)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Peek a 24-bit unsigned integer, widened to u32
    pub fn peek_u24(&self, offset: usize, endian: Endian) -> Result<u32> {
        let b: [u8; 3] = self.peek_window(offset, endian)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Read a 24-bit signed integer, sign-extended to i32
    pub fn read_i24(&mut self, endian: Endian) -> Result<i32> {
        Ok(sign_extend_24(self.read_u24(endian)?))
    }

    /// Peek a 24-bit signed integer, sign-extended to i32
    pub fn peek_i24(&self, offset: usize, endian: Endian) -> Result<i32> {
        Ok(sign_extend_24(self.peek_u24(offset, endian)?))
    }

    /// Read a 32-bit unsigned integer
    pub fn read_u32(&mut self, endian: Endian) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_window(endian)?))
    }

    /// Peek a 32-bit unsigned integer
    pub fn peek_u32(&self, offset: usize, endian: Endian) -> Result<u32> {
        Ok(u32::from_be_bytes(self.peek_window(offset, endian)?))
    }

    /// Read a 32-bit signed integer
    pub fn read_i32(&mut self, endian: Endian) -> Result<i32> {
        Ok(self.read_u32(endian)? as i32)
    }

    /// Peek a 32-bit signed integer
    pub fn peek_i32(&self, offset: usize, endian: Endian) -> Result<i32> {
        Ok(self.peek_u32(offset, endian)? as i32)
    }

    /// Read a 32-bit float
    pub fn read_f32(&mut self, endian: Endian) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32(endian)?))
    }

    /// Peek a 32-bit float
    pub fn peek_f32(&self, offset: usize, endian: Endian) -> Result<f32> {
        Ok(f32::from_bits(self.peek_u32(offset, endian)?))
    }

    /// Read a 64-bit float
    pub fn read_f64(&mut self, endian: Endian) -> Result<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(self.read_window(endian)?)))
    }

    /// Peek a 64-bit float
    pub fn peek_f64(&self, offset: usize, endian: Endian) -> Result<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(
            self.peek_window(offset, endian)?,
        )))
    }

    /// Read an 80-bit extended float, decoded to f64
    pub fn read_f80(&mut self, endian: Endian) -> Result<f64> {
        Ok(decode_f80(self.read_window(endian)?))
    }

    /// Peek an 80-bit extended float, decoded to f64
    pub fn peek_f80(&self, offset: usize, endian: Endian) -> Result<f64> {
        Ok(decode_f80(self.peek_window(offset, endian)?))
    }

    /// Read `length` bytes into an independently owned buffer
    ///
    /// Copies byte-by-byte, so the result is fully detached from the
    /// source list no matter how many segments the span crosses.
    pub fn read_buffer(&mut self, length: usize) -> Result<Buffer> {
        if !self.available(length) {
            return Err(StreamError::Underflow);
        }
        let mut data = Vec::with_capacity(length);
        for _ in 0..length {
            data.push(self.read_u8()?);
        }
        Ok(Buffer::from_vec(data))
    }

    /// Peek `length` bytes into an independently owned buffer
    pub fn peek_buffer(&self, offset: usize, length: usize) -> Result<Buffer> {
        let needed = offset.checked_add(length).ok_or(StreamError::Underflow)?;
        if !self.available(needed) {
            return Err(StreamError::Underflow);
        }
        let mut data = Vec::with_capacity(length);
        for i in 0..length {
            data.push(self.peek_u8(offset + i)?);
        }
        Ok(Buffer::from_vec(data))
    }

    /// Zero-copy slice of the current head segment, then advance past it
    ///
    /// Cheaper than [`Stream::read_buffer`] but clamped at the segment
    /// boundary: the result may be shorter than `length`, and callers must
    /// not rely on it spanning segments.
    pub fn read_single_buffer(&mut self, length: usize) -> Result<Buffer> {
        let buffer = self.peek_single_buffer(length)?;
        self.advance(buffer.len())?;
        Ok(buffer)
    }

    /// Zero-copy slice of the current head segment without advancing
    pub fn peek_single_buffer(&self, length: usize) -> Result<Buffer> {
        let first = self.list.first().ok_or(StreamError::Underflow)?;
        let take = length.min(first.len() - self.local_offset);
        first.slice(self.local_offset, take)
    }

    /// Read a string of `length` bytes (or to the terminator when `None`)
    pub fn read_string(&mut self, length: Option<usize>, encoding: TextEncoding) -> Result<String> {
        let (result, consumed) = self.decode_string(0, length, encoding)?;
        self.advance(consumed)?;
        Ok(result)
    }

    /// Decode a string `offset` bytes ahead without moving the cursor
    pub fn peek_string(
        &self,
        offset: usize,
        length: Option<usize>,
        encoding: TextEncoding,
    ) -> Result<String> {
        Ok(self.decode_string(offset, length, encoding)?.0)
    }

    // Shared decode driver. Returns the decoded string and the final byte
    // offset, which read_string turns into an advance. Terminator handling
    // differs per family: ascii/latin1 and utf16 consume the NUL, utf8
    // leaves it in place.
    fn decode_string(
        &self,
        offset: usize,
        length: Option<usize>,
        encoding: TextEncoding,
    ) -> Result<(String, usize)> {
        let terminated = length.is_none();
        let end = match length {
            Some(n) => offset.checked_add(n).ok_or(StreamError::Underflow)?,
            None => usize::MAX,
        };
        let mut off = offset;
        let mut result = String::new();

        match encoding {
            TextEncoding::Ascii | TextEncoding::Latin1 => {
                while off < end && self.available(off + 1) {
                    let byte = self.peek_u8(off)?;
                    off += 1;
                    if terminated && byte == 0 {
                        break;
                    }
                    result.push(byte as char);
                }
            }
            TextEncoding::Utf8 => {
                while off < end && self.available(off + 1) {
                    let b1 = self.peek_u8(off)?;
                    if terminated && b1 == 0 {
                        break;
                    }
                    if b1 & 0x80 == 0 {
                        result.push(b1 as char);
                        off += 1;
                    } else if b1 & 0xe0 == 0xc0 {
                        let b2 = continuation(self.peek_u8(off + 1)?)?;
                        let cp = (((b1 & 0x1f) as u32) << 6) | b2;
                        result.push(char::from_u32(cp).ok_or(StreamError::InvalidSequence)?);
                        off += 2;
                    } else if b1 & 0xf0 == 0xe0 {
                        let b2 = continuation(self.peek_u8(off + 1)?)?;
                        let b3 = continuation(self.peek_u8(off + 2)?)?;
                        let cp = (((b1 & 0x0f) as u32) << 12) | (b2 << 6) | b3;
                        result.push(char::from_u32(cp).ok_or(StreamError::InvalidSequence)?);
                        off += 3;
                    } else if b1 & 0xf8 == 0xf0 {
                        let b2 = continuation(self.peek_u8(off + 1)?)?;
                        let b3 = continuation(self.peek_u8(off + 2)?)?;
                        let b4 = continuation(self.peek_u8(off + 3)?)?;
                        let cp = (((b1 & 0x07) as u32) << 18) | (b2 << 12) | (b3 << 6) | b4;
                        result.push(char::from_u32(cp).ok_or(StreamError::InvalidSequence)?);
                        off += 4;
                    } else {
                        return Err(StreamError::InvalidSequence);
                    }
                }
            }
            TextEncoding::Utf16Be | TextEncoding::Utf16Le | TextEncoding::Utf16Bom => {
                let mut endian = match encoding {
                    TextEncoding::Utf16Le => Endian::Little,
                    _ => Endian::Big,
                };
                if encoding == TextEncoding::Utf16Bom && self.available(off + 2) {
                    // the wire value 0xFFFE is a byte-swapped BOM
                    match self.peek_u16(off, Endian::Big)? {
                        0xfeff => {
                            endian = Endian::Big;
                            off += 2;
                        }
                        0xfffe => {
                            endian = Endian::Little;
                            off += 2;
                        }
                        _ => {}
                    }
                }
                while off < end && self.available(off + 2) {
                    let w1 = self.peek_u16(off, endian)?;
                    off += 2;
                    if terminated && w1 == 0 {
                        break;
                    }
                    if (0xd800..0xdc00).contains(&w1) {
                        let w2 = self.peek_u16(off, endian)?;
                        if !(0xdc00..0xe000).contains(&w2) {
                            return Err(StreamError::InvalidSequence);
                        }
                        off += 2;
                        let cp =
                            0x10000 + (((w1 - 0xd800) as u32) << 10) + (w2 - 0xdc00) as u32;
                        result.push(char::from_u32(cp).ok_or(StreamError::InvalidSequence)?);
                    } else {
                        // a lone low surrogate has no scalar value
                        result
                            .push(char::from_u32(w1 as u32).ok_or(StreamError::InvalidSequence)?);
                    }
                }
            }
        }

        Ok((result, off))
    }
}

fn sign_extend_24(value: u32) -> i32 {
    ((value << 8) as i32) >> 8
}

fn continuation(byte: u8) -> Result<u32> {
    if byte & 0xc0 != 0x80 {
        return Err(StreamError::InvalidSequence);
    }
    Ok((byte & 0x3f) as u32)
}

// 2^exp as f64, covering the subnormal range without std float math
fn pow2(exp: i32) -> f64 {
    if exp >= 1024 {
        f64::INFINITY
    } else if exp >= -1022 {
        f64::from_bits(((exp + 1023) as u64) << 52)
    } else if exp >= -1074 {
        f64::from_bits(1u64 << (exp + 1074))
    } else {
        0.0
    }
}

// Extended-precision layout: 1 sign bit, 15-bit exponent biased by 16383,
// 64-bit mantissa with an explicit integer bit. Bytes arrive already
// normalized to big-endian order.
fn decode_f80(bytes: [u8; 10]) -> f64 {
    let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
    let exponent = (((bytes[0] & 0x7f) as u32) << 8) | bytes[1] as u32;
    let mantissa = u64::from_be_bytes([
        bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7], bytes[8], bytes[9],
    ]);

    if exponent == 0 && mantissa == 0 {
        return sign * 0.0;
    }
    if exponent == 0x7fff {
        if mantissa == 0 {
            return sign * f64::INFINITY;
        }
        return f64::NAN;
    }

    // scale in two steps so values near the f64 subnormal range survive
    // even though 2^exp alone would underflow
    let exp = exponent as i32 - 16383 - 63;
    let coarse = exp.clamp(-1000, 1000);
    sign * (mantissa as f64) * pow2(coarse) * pow2(exp - coarse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn stream_of(parts: &[&[u8]]) -> Stream {
        let mut list = BufferList::new();
        for part in parts {
            list.append(Buffer::from_slice(part));
        }
        Stream::new(list)
    }

    #[test]
    fn test_read_u8_across_segments() {
        let mut stream = stream_of(&[&[1, 2], &[], &[3], &[4, 5, 6]]);
        let mut out = Vec::new();
        while stream.available(1) {
            out.push(stream.read_u8().unwrap());
        }
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(stream.read_u8(), Err(StreamError::Underflow));
    }

    #[test]
    fn test_random_splits_reproduce_sequence() {
        let mut rng = StdRng::seed_from_u64(0x5e65);
        let bytes: Vec<u8> = (0..256).map(|_| rng.gen()).collect();

        for _ in 0..32 {
            let mut list = BufferList::new();
            let mut pos = 0;
            while pos < bytes.len() {
                let take = rng.gen_range(0..=bytes.len() - pos);
                list.append(Buffer::from_slice(&bytes[pos..pos + take]));
                pos += take;
                if take == 0 {
                    // zero-length segments are legal; make sure we still finish
                    list.append(Buffer::from_slice(&bytes[pos..]));
                    pos = bytes.len();
                }
            }
            let mut stream = Stream::new(list);
            for &expected in &bytes {
                assert_eq!(stream.read_u8().unwrap(), expected);
            }
            assert!(!stream.available(1));
        }
    }

    #[test]
    fn test_peek_is_idempotent() {
        let stream = stream_of(&[&[0xaa, 0xbb], &[0xcc, 0xdd]]);
        assert_eq!(stream.peek_u8(0).unwrap(), 0xaa);
        assert_eq!(stream.peek_u8(0).unwrap(), 0xaa);
        assert_eq!(stream.peek_u8(3).unwrap(), 0xdd);
        assert_eq!(stream.offset(), 0);

        let mut stream = stream;
        let peeked = stream.peek_u32(0, Endian::Big).unwrap();
        assert_eq!(stream.read_u32(Endian::Big).unwrap(), peeked);
    }

    #[test]
    fn test_advance_rewind_round_trip() {
        let data = [&[1u8, 2, 3][..], &[4, 5][..], &[6, 7, 8, 9][..]];
        for n in 0..=9 {
            let mut stream = stream_of(&data);
            stream.advance(2).unwrap();
            let before = (stream.offset, stream.local_offset);
            if stream.available(n) {
                stream.advance(n).unwrap();
                stream.rewind(n).unwrap();
                assert_eq!((stream.offset, stream.local_offset), before, "n = {n}");
            }
        }
    }

    #[test]
    fn test_rewind_from_drained_list() {
        let mut stream = stream_of(&[&[1, 2, 3, 4]]);
        stream.advance(4).unwrap();
        assert!(!stream.available(1));
        stream.rewind(3).unwrap();
        assert_eq!(stream.offset(), 1);
        assert_eq!(stream.read_u8().unwrap(), 2);
    }

    #[test]
    fn test_seek() {
        let mut stream = stream_of(&[&[10, 11], &[12, 13, 14]]);
        stream.seek(3).unwrap();
        assert_eq!(stream.peek_u8(0).unwrap(), 13);
        stream.seek(1).unwrap();
        assert_eq!(stream.peek_u8(0).unwrap(), 11);
        stream.seek(1).unwrap();
        assert_eq!(stream.offset(), 1);
        assert_eq!(stream.seek(9), Err(StreamError::Underflow));
    }

    #[test]
    fn test_underflow_leaves_cursor_alone() {
        let mut stream = stream_of(&[&[1, 2]]);
        stream.advance(1).unwrap();
        assert_eq!(stream.advance(5), Err(StreamError::Underflow));
        assert_eq!(stream.rewind(2), Err(StreamError::Underflow));
        assert_eq!(stream.offset(), 1);
        assert_eq!(stream.read_u8().unwrap(), 2);
    }

    #[test]
    fn test_integer_endianness() {
        let bytes = [&[0x12, 0x34][..], &[0x56, 0x78, 0x9a][..]];

        let mut s = stream_of(&bytes);
        assert_eq!(s.read_u16(Endian::Big).unwrap(), 0x1234);
        let mut s = stream_of(&bytes);
        assert_eq!(s.read_u16(Endian::Little).unwrap(), 0x3412);

        let s = stream_of(&bytes);
        assert_eq!(s.peek_u24(1, Endian::Big).unwrap(), 0x345678);
        assert_eq!(s.peek_u24(1, Endian::Little).unwrap(), 0x785634);

        let mut s = stream_of(&bytes);
        assert_eq!(s.read_u32(Endian::Big).unwrap(), 0x12345678);
        let mut s = stream_of(&bytes);
        assert_eq!(s.read_u32(Endian::Little).unwrap(), 0x78563412);
    }

    #[test]
    fn test_signed_integers() {
        let mut s = stream_of(&[&[0xff, 0xfe]]);
        assert_eq!(s.read_i16(Endian::Big).unwrap(), -2);

        let mut s = stream_of(&[&[0xff, 0xff, 0xfd]]);
        assert_eq!(s.read_i24(Endian::Big).unwrap(), -3);
        let s = stream_of(&[&[0x7f, 0xff, 0xff]]);
        assert_eq!(s.peek_i24(0, Endian::Big).unwrap(), 0x7fffff);

        let mut s = stream_of(&[&[0x80]]);
        assert_eq!(s.read_i8().unwrap(), -128);

        let mut s = stream_of(&[&[0xff, 0xff, 0xff, 0xff]]);
        assert_eq!(s.read_i32(Endian::Big).unwrap(), -1);
    }

    #[test]
    fn test_floats() {
        let mut s = stream_of(&[&1.5f32.to_be_bytes()]);
        assert_eq!(s.read_f32(Endian::Big).unwrap(), 1.5);

        let mut s = stream_of(&[&(-0.25f64).to_le_bytes()]);
        assert_eq!(s.read_f64(Endian::Little).unwrap(), -0.25);
    }

    #[test]
    fn test_float80() {
        // 1.0: exponent 16383, mantissa with only the integer bit set
        let one = [0x3f, 0xff, 0x80, 0, 0, 0, 0, 0, 0, 0];
        let mut s = stream_of(&[&one]);
        assert_eq!(s.read_f80(Endian::Big).unwrap(), 1.0);

        // 1.5 and sign handling
        let minus_1_5 = [0xbf, 0xff, 0xc0, 0, 0, 0, 0, 0, 0, 0];
        let mut s = stream_of(&[&minus_1_5]);
        assert_eq!(s.read_f80(Endian::Big).unwrap(), -1.5);

        // little-endian wire order is the byte reversal
        let mut le = minus_1_5;
        le.reverse();
        let mut s = stream_of(&[&le]);
        assert_eq!(s.read_f80(Endian::Little).unwrap(), -1.5);

        // signed zero, infinities, and NaN
        let mut s = stream_of(&[&[0x80, 0, 0, 0, 0, 0, 0, 0, 0, 0]]);
        let z = s.read_f80(Endian::Big).unwrap();
        assert_eq!(z, 0.0);
        assert!(z.is_sign_negative());

        let mut s = stream_of(&[&[0x7f, 0xff, 0, 0, 0, 0, 0, 0, 0, 0]]);
        assert_eq!(s.read_f80(Endian::Big).unwrap(), f64::INFINITY);
        let mut s = stream_of(&[&[0xff, 0xff, 0, 0, 0, 0, 0, 0, 0, 0]]);
        assert_eq!(s.read_f80(Endian::Big).unwrap(), f64::NEG_INFINITY);
        let mut s = stream_of(&[&[0x7f, 0xff, 0x80, 0, 0, 0, 0, 0, 0, 1]]);
        assert!(s.read_f80(Endian::Big).unwrap().is_nan());

        // 80-bit 'pi' from an AIFF sample-rate field: 44100.0
        let rate = [0x40, 0x0e, 0xac, 0x44, 0, 0, 0, 0, 0, 0];
        let mut s = stream_of(&[&rate]);
        assert_eq!(s.read_f80(Endian::Big).unwrap(), 44100.0);
    }

    #[test]
    fn test_read_buffer_detaches() {
        let mut stream = stream_of(&[&[1, 2], &[3, 4, 5]]);
        let head = stream.peek_single_buffer(1).unwrap();
        let buf = stream.read_buffer(4).unwrap();
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
        assert!(!buf.shares_storage(&head));
        assert_eq!(stream.offset(), 4);
        assert_eq!(stream.read_buffer(2), Err(StreamError::Underflow));
    }

    #[test]
    fn test_peek_buffer() {
        let stream = stream_of(&[&[1, 2], &[3, 4]]);
        let buf = stream.peek_buffer(1, 3).unwrap();
        assert_eq!(buf.as_slice(), &[2, 3, 4]);
        assert_eq!(stream.offset(), 0);
        assert_eq!(stream.peek_buffer(2, 3), Err(StreamError::Underflow));
    }

    #[test]
    fn test_single_buffer_clamps_to_segment() {
        let mut stream = stream_of(&[&[1, 2, 3], &[4, 5]]);
        stream.advance(1).unwrap();

        let peeked = stream.peek_single_buffer(10).unwrap();
        assert_eq!(peeked.as_slice(), &[2, 3]);

        let read = stream.read_single_buffer(10).unwrap();
        assert_eq!(read.as_slice(), &[2, 3]);
        assert_eq!(stream.offset(), 3);
        // the next call serves from the following segment
        assert_eq!(stream.read_single_buffer(10).unwrap().as_slice(), &[4, 5]);
    }

    #[test]
    fn test_ascii_and_latin1_strings() {
        let mut s = stream_of(&[b"hel", b"lo world"]);
        assert_eq!(s.read_string(Some(5), TextEncoding::Ascii).unwrap(), "hello");
        assert_eq!(s.offset(), 5);

        // NUL-terminated read consumes the terminator
        let mut s = stream_of(&[b"abc\0def"]);
        assert_eq!(s.read_string(None, TextEncoding::Ascii).unwrap(), "abc");
        assert_eq!(s.offset(), 4);
        assert_eq!(s.read_u8().unwrap(), b'd');

        // latin1 maps every byte to its code point
        let mut s = stream_of(&[&[0x63, 0x61, 0x66, 0xe9]]);
        assert_eq!(s.read_string(Some(4), TextEncoding::Latin1).unwrap(), "café");

        // reading to the end without a terminator just stops
        let s = stream_of(&[b"xy"]);
        assert_eq!(s.peek_string(0, None, TextEncoding::Ascii).unwrap(), "xy");
    }

    #[test]
    fn test_utf8_strings() {
        let text = "héllo \u{1f980}";
        let mut s = stream_of(&[text.as_bytes()]);
        assert_eq!(
            s.read_string(Some(text.len()), TextEncoding::Utf8).unwrap(),
            text
        );

        // utf8 stops at a NUL but does not consume it
        let mut s = stream_of(&[b"ab\0cd"]);
        assert_eq!(s.read_string(None, TextEncoding::Utf8).unwrap(), "ab");
        assert_eq!(s.offset(), 2);
        assert_eq!(s.read_u8().unwrap(), 0);

        // stray continuation byte
        let s = stream_of(&[&[0x80]]);
        assert_eq!(
            s.peek_string(0, Some(1), TextEncoding::Utf8),
            Err(StreamError::InvalidSequence)
        );

        // truncated multi-byte sequence underflows
        let s = stream_of(&[&[0xc3]]);
        assert_eq!(
            s.peek_string(0, None, TextEncoding::Utf8),
            Err(StreamError::Underflow)
        );
    }

    #[test]
    fn test_utf16_strings() {
        // "hi" in both byte orders
        let mut s = stream_of(&[&[0x00, b'h', 0x00, b'i']]);
        assert_eq!(s.read_string(Some(4), TextEncoding::Utf16Be).unwrap(), "hi");

        let mut s = stream_of(&[&[b'h', 0x00, b'i', 0x00]]);
        assert_eq!(s.read_string(Some(4), TextEncoding::Utf16Le).unwrap(), "hi");

        // surrogate pair across a segment boundary
        let crab = "\u{1f980}";
        let units: Vec<u8> = crab.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        let mut s = stream_of(&[&units[..3], &units[3..]]);
        assert_eq!(s.read_string(Some(4), TextEncoding::Utf16Be).unwrap(), crab);

        // NUL code unit terminates and is consumed
        let mut s = stream_of(&[&[0x00, b'a', 0x00, 0x00, 0x00, b'b']]);
        assert_eq!(s.read_string(None, TextEncoding::Utf16Be).unwrap(), "a");
        assert_eq!(s.offset(), 4);
    }

    #[test]
    fn test_utf16_bom() {
        let mut s = stream_of(&[&[0xfe, 0xff, 0x00, b'A']]);
        assert_eq!(s.read_string(None, TextEncoding::Utf16Bom).unwrap(), "A");
        assert_eq!(s.offset(), 4);

        // 0xFFFE on the wire selects little-endian
        let mut s = stream_of(&[&[0xff, 0xfe, b'A', 0x00]]);
        assert_eq!(s.read_string(None, TextEncoding::Utf16Bom).unwrap(), "A");

        // no marker: default big-endian, nothing consumed for a BOM
        let mut s = stream_of(&[&[0x00, b'B']]);
        assert_eq!(s.read_string(None, TextEncoding::Utf16Bom).unwrap(), "B");
    }

    #[test]
    fn test_unpaired_surrogate() {
        // high surrogate followed by a normal unit
        let s = stream_of(&[&[0xd8, 0x01, 0x00, b'x']]);
        assert_eq!(
            s.peek_string(0, Some(4), TextEncoding::Utf16Be),
            Err(StreamError::InvalidSequence)
        );

        // lone low surrogate
        let s = stream_of(&[&[0xdc, 0x00]]);
        assert_eq!(
            s.peek_string(0, Some(2), TextEncoding::Utf16Be),
            Err(StreamError::InvalidSequence)
        );
    }

    #[test]
    fn test_copy_has_independent_cursor() {
        let mut stream = stream_of(&[&[1, 2], &[3]]);
        stream.advance(1).unwrap();
        let mut copy = stream.copy();
        copy.advance(2).unwrap();
        assert_eq!(stream.offset(), 1);
        assert_eq!(copy.offset(), 3);
        assert_eq!(stream.read_u8().unwrap(), 2);
    }
}
