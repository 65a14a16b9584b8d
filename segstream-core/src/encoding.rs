//! Byte order and text encoding selectors

use crate::error::{Result, StreamError};

/// Byte order for multi-byte reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endian {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

impl Endian {
    /// Byte order of the compilation target
    #[cfg(target_endian = "little")]
    pub const NATIVE: Endian = Endian::Little;

    /// Byte order of the compilation target
    #[cfg(target_endian = "big")]
    pub const NATIVE: Endian = Endian::Big;
}

impl core::fmt::Display for Endian {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Endian::Big => write!(f, "big-endian"),
            Endian::Little => write!(f, "little-endian"),
        }
    }
}

/// Text encodings understood by the stream's string reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextEncoding {
    /// One byte per code point, 0x00-0x7F
    Ascii,
    /// One byte per code point, 0x00-0xFF
    Latin1,
    /// 1-4 byte sequences
    Utf8,
    /// 16-bit code units, most significant byte first
    Utf16Be,
    /// 16-bit code units, least significant byte first
    Utf16Le,
    /// 16-bit code units, byte order sniffed from a leading BOM
    Utf16Bom,
}

impl TextEncoding {
    /// Resolve an encoding from its conventional name
    ///
    /// Accepts the dashed and dashless spellings for the UTF variants.
    /// Anything else fails with `UnknownEncoding`.
    pub fn from_name(name: &str) -> Result<TextEncoding> {
        // ASCII case folding is enough for the names we accept
        let mut lower = [0u8; 16];
        if name.len() > lower.len() {
            return Err(StreamError::UnknownEncoding);
        }
        for (dst, src) in lower.iter_mut().zip(name.bytes()) {
            *dst = src.to_ascii_lowercase();
        }
        match &lower[..name.len()] {
            b"ascii" => Ok(TextEncoding::Ascii),
            b"latin1" => Ok(TextEncoding::Latin1),
            b"utf8" | b"utf-8" => Ok(TextEncoding::Utf8),
            b"utf16be" | b"utf16-be" => Ok(TextEncoding::Utf16Be),
            b"utf16le" | b"utf16-le" => Ok(TextEncoding::Utf16Le),
            b"utf16bom" | b"utf16-bom" => Ok(TextEncoding::Utf16Bom),
            _ => Err(StreamError::UnknownEncoding),
        }
    }
}

impl core::str::FromStr for TextEncoding {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<TextEncoding> {
        TextEncoding::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(TextEncoding::from_name("ascii"), Ok(TextEncoding::Ascii));
        assert_eq!(TextEncoding::from_name("UTF-8"), Ok(TextEncoding::Utf8));
        assert_eq!(TextEncoding::from_name("utf16-bom"), Ok(TextEncoding::Utf16Bom));
        assert_eq!(TextEncoding::from_name("utf16LE"), Ok(TextEncoding::Utf16Le));
        assert_eq!(
            TextEncoding::from_name("shift-jis"),
            Err(StreamError::UnknownEncoding)
        );
        assert_eq!(
            TextEncoding::from_name("a-very-long-encoding-name"),
            Err(StreamError::UnknownEncoding)
        );
    }

    #[test]
    fn test_native_endian_is_consistent() {
        let probe: u16 = 0x1234;
        let first = probe.to_ne_bytes()[0];
        match Endian::NATIVE {
            Endian::Little => assert_eq!(first, 0x34),
            Endian::Big => assert_eq!(first, 0x12),
        }
    }
}
