//! Chunk-based PNG decoder
//!
//! Parses the chunk structure (length, 4-byte type, payload, CRC), keeps
//! the six handled chunk types (IHDR, PLTE, IDAT, tRNS, pHYs, IEND), and
//! reconstructs pixels from the DEFLATE-compressed scanline stream. CRCs
//! are read and trace-logged but never verified. Unknown chunk types are
//! skipped; Adam7 interlacing is rejected at decode time.

use miniz_oxide::inflate::decompress_to_vec_zlib;
use segstream_core::{Buffer, BufferList, Endian, Result, Stream, StreamError, TextEncoding};

/// The fixed 8-byte PNG magic sequence
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

const FILTER_NONE: u8 = 0;
const FILTER_SUB: u8 = 1;
const FILTER_UP: u8 = 2;
const FILTER_AVERAGE: u8 = 3;
const FILTER_PAETH: u8 = 4;

/// Color interpretation of a pixel, from the IHDR chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ColorType {
    /// One grayscale sample
    Grayscale = 0,
    /// Red, green, blue samples
    Truecolor = 2,
    /// One palette index
    Indexed = 3,
    /// Grayscale plus alpha
    GrayscaleAlpha = 4,
    /// Red, green, blue plus alpha
    TruecolorAlpha = 6,
}

impl ColorType {
    /// Resolve the IHDR color-type byte, failing on anything outside
    /// {0, 2, 3, 4, 6}
    pub fn from_u8(value: u8) -> Result<ColorType> {
        match value {
            0 => Ok(ColorType::Grayscale),
            2 => Ok(ColorType::Truecolor),
            3 => Ok(ColorType::Indexed),
            4 => Ok(ColorType::GrayscaleAlpha),
            6 => Ok(ColorType::TruecolorAlpha),
            _ => Err(StreamError::InvalidField),
        }
    }

    /// Samples per pixel, alpha included
    pub const fn channels(&self) -> u8 {
        match self {
            ColorType::Grayscale | ColorType::Indexed => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Truecolor => 3,
            ColorType::TruecolorAlpha => 4,
        }
    }

    /// Whether the last sample is an alpha channel
    pub const fn has_alpha(&self) -> bool {
        matches!(self, ColorType::GrayscaleAlpha | ColorType::TruecolorAlpha)
    }
}

impl core::fmt::Display for ColorType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ColorType::Grayscale => write!(f, "grayscale"),
            ColorType::Truecolor => write!(f, "truecolor"),
            ColorType::Indexed => write!(f, "indexed"),
            ColorType::GrayscaleAlpha => write!(f, "grayscale+alpha"),
            ColorType::TruecolorAlpha => write!(f, "truecolor+alpha"),
        }
    }
}

/// Pixel density from a pHYs chunk
///
/// Unit 1 (pixels per meter) is converted to an approximate
/// pixels-per-inch figure via the fixed 0.0254 factor with truncation;
/// unit 0 values pass through unconverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalDimensions {
    /// Horizontal pixel density
    pub x: u32,
    /// Vertical pixel density
    pub y: u32,
    /// Unit byte as stored in the chunk
    pub unit: u8,
}

/// Serializable summary of a parsed image header
#[cfg(feature = "serde")]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub channels: u8,
    pub has_alpha: bool,
    pub interlaced: bool,
    pub physical_dimensions: Option<PhysicalDimensions>,
}

/// Chunk-based PNG decoder
///
/// Construction parses the chunk structure and collects image state;
/// [`PngDecoder::decode_pixels`] is the explicit second step that
/// inflates and reconstructs the pixel bytes.
#[derive(Debug)]
pub struct PngDecoder {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: ColorType,
    interlace_method: u8,
    palette: Option<Buffer>,
    transparency: Option<Buffer>,
    physical_dimensions: Option<PhysicalDimensions>,
    data_chunks: Vec<Buffer>,
    pixels: Option<Vec<u8>>,
}

impl PngDecoder {
    /// Parse a PNG from a single buffer
    pub fn from_buffer(buffer: Buffer) -> Result<PngDecoder> {
        Self::from_stream(Stream::from_buffer(buffer))
    }

    /// Parse a PNG from a segmented list
    pub fn from_list(list: BufferList) -> Result<PngDecoder> {
        Self::from_stream(Stream::new(list))
    }

    /// Parse a PNG file loaded through the mmap backend
    #[cfg(feature = "mmap")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<PngDecoder> {
        Self::from_buffer(crate::file_backend::read_file(path)?)
    }

    /// Parse a PNG from a stream positioned at the signature
    pub fn from_stream(mut stream: Stream) -> Result<PngDecoder> {
        let signature = stream.read_buffer(PNG_SIGNATURE.len())?;
        if !signature.compare(&Buffer::from_slice(&PNG_SIGNATURE), 0) {
            return Err(StreamError::InvalidHeader);
        }

        // IHDR carries every field the later chunks depend on
        let ihdr_len = stream.read_u32(Endian::Big)? as usize;
        let ihdr_type = stream.read_string(Some(4), TextEncoding::Ascii)?;
        if ihdr_type != "IHDR" || ihdr_len < 13 {
            return Err(StreamError::InvalidHeader);
        }

        let width = stream.read_u32(Endian::Big)?;
        let height = stream.read_u32(Endian::Big)?;
        let bit_depth = stream.read_u8()?;
        if !matches!(bit_depth, 1 | 2 | 4 | 8 | 16) {
            return Err(StreamError::InvalidField);
        }
        let color_type = ColorType::from_u8(stream.read_u8()?)?;
        let compression_method = stream.read_u8()?;
        if compression_method != 0 {
            return Err(StreamError::InvalidField);
        }
        let filter_method = stream.read_u8()?;
        if filter_method != 0 {
            return Err(StreamError::InvalidField);
        }
        let interlace_method = stream.read_u8()?;
        if !matches!(interlace_method, 0 | 1) {
            return Err(StreamError::InvalidField);
        }
        if ihdr_len > 13 {
            stream.advance(ihdr_len - 13)?;
        }
        let crc = stream.read_u32(Endian::Big)?;
        log::trace!("chunk IHDR ({ihdr_len} bytes, crc {crc:08x})");

        let mut decoder = PngDecoder {
            width,
            height,
            bit_depth,
            color_type,
            interlace_method,
            palette: None,
            transparency: None,
            physical_dimensions: None,
            data_chunks: Vec::new(),
            pixels: None,
        };

        loop {
            let chunk_len = stream.read_u32(Endian::Big)? as usize;
            let chunk_type = stream.read_string(Some(4), TextEncoding::Ascii)?;
            let mut ended = false;

            match chunk_type.as_str() {
                "PLTE" => {
                    let capacity = (1usize << decoder.bit_depth) * 3;
                    if chunk_len == 0 || chunk_len > capacity {
                        return Err(StreamError::InvalidField);
                    }
                    decoder.palette = Some(stream.read_buffer(chunk_len)?);
                }
                "IDAT" => {
                    // multiple IDAT chunks concatenate in order
                    decoder.data_chunks.push(stream.read_buffer(chunk_len)?);
                }
                "tRNS" => {
                    decoder.transparency = Some(stream.read_buffer(chunk_len)?);
                }
                "pHYs" => {
                    let mut x = stream.read_u32(Endian::Big)?;
                    let mut y = stream.read_u32(Endian::Big)?;
                    let unit = stream.read_u8()?;
                    if unit == 1 {
                        // pixels per meter to pixels per inch, truncated
                        x = (x as f64 * 0.0254) as u32;
                        y = (y as f64 * 0.0254) as u32;
                    }
                    if chunk_len > 9 {
                        stream.advance(chunk_len - 9)?;
                    }
                    decoder.physical_dimensions = Some(PhysicalDimensions { x, y, unit });
                }
                "IEND" => {
                    stream.advance(chunk_len)?;
                    ended = true;
                }
                _ => {
                    log::debug!("skipping unhandled chunk {chunk_type} ({chunk_len} bytes)");
                    stream.advance(chunk_len)?;
                }
            }

            let crc = stream.read_u32(Endian::Big)?;
            log::trace!("chunk {chunk_type} ({chunk_len} bytes, crc {crc:08x})");

            if ended {
                break;
            }
        }

        if stream.available(1) {
            log::debug!(
                "{} trailing bytes after IEND ignored",
                stream.remaining_bytes()
            );
        }

        Ok(decoder)
    }

    /// Image width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bits per sample
    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    /// Color interpretation
    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    /// Interlace method byte (1 means Adam7, which decode rejects)
    pub fn interlace_method(&self) -> u8 {
        self.interlace_method
    }

    /// Raw PLTE payload, three bytes per entry
    pub fn palette(&self) -> Option<&Buffer> {
        self.palette.as_ref()
    }

    /// Raw tRNS payload, stored as-is
    pub fn transparency(&self) -> Option<&Buffer> {
        self.transparency.as_ref()
    }

    /// Pixel density from a pHYs chunk
    pub fn physical_dimensions(&self) -> Option<PhysicalDimensions> {
        self.physical_dimensions
    }

    /// Reconstructed pixel bytes, once decoded
    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    /// Serializable header summary
    #[cfg(feature = "serde")]
    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width,
            height: self.height,
            bit_depth: self.bit_depth,
            color_type: self.color_type,
            channels: self.color_type.channels(),
            has_alpha: self.color_type.has_alpha(),
            interlaced: self.interlace_method == 1,
            physical_dimensions: self.physical_dimensions,
        }
    }

    /// Inflate the accumulated IDAT payloads and reconstruct pixel bytes
    ///
    /// Explicit second step; fails with `MissingData` when no IDAT chunk
    /// was seen and `UnsupportedFeature` for interlaced images.
    pub fn decode_pixels(&mut self) -> Result<()> {
        if self.data_chunks.is_empty() {
            return Err(StreamError::MissingData);
        }
        let total: usize = self.data_chunks.iter().map(Buffer::len).sum();
        let mut compressed = Vec::with_capacity(total);
        for chunk in &self.data_chunks {
            compressed.extend_from_slice(chunk.as_slice());
        }

        let data = decompress_to_vec_zlib(&compressed).map_err(|err| {
            log::debug!("inflate failed: {err}");
            StreamError::DecompressionError
        })?;

        if self.interlace_method != 0 {
            return Err(StreamError::UnsupportedFeature);
        }

        self.pixels = Some(self.reconstruct_scanlines(&data)?);
        Ok(())
    }

    // Undo the per-row filter, writing raw bytes into the flat pixel
    // array. All arithmetic wraps modulo 256.
    fn reconstruct_scanlines(&self, data: &[u8]) -> Result<Vec<u8>> {
        let channels = self.color_type.channels() as usize;
        let bpp = (channels * self.bit_depth as usize / 8).max(1);
        let row_bytes = bpp * self.width as usize;
        let height = self.height as usize;
        let mut pixels = vec![0u8; row_bytes * height];

        let mut pos = 0;
        let mut row = 0;
        while row < height && pos < data.len() {
            let filter = data[pos];
            pos += 1;
            let take = row_bytes.min(data.len() - pos);
            let row_start = row * row_bytes;

            match filter {
                FILTER_NONE => {
                    pixels[row_start..row_start + take].copy_from_slice(&data[pos..pos + take]);
                }
                FILTER_SUB => {
                    for x in 0..take {
                        let left = if x >= bpp { pixels[row_start + x - bpp] } else { 0 };
                        pixels[row_start + x] = data[pos + x].wrapping_add(left);
                    }
                }
                FILTER_UP => {
                    for x in 0..take {
                        let above = if row > 0 { pixels[row_start - row_bytes + x] } else { 0 };
                        pixels[row_start + x] = data[pos + x].wrapping_add(above);
                    }
                }
                FILTER_AVERAGE => {
                    for x in 0..take {
                        let left = if x >= bpp { pixels[row_start + x - bpp] } else { 0 };
                        let above = if row > 0 { pixels[row_start - row_bytes + x] } else { 0 };
                        let average = ((left as u16 + above as u16) / 2) as u8;
                        pixels[row_start + x] = data[pos + x].wrapping_add(average);
                    }
                }
                FILTER_PAETH => {
                    for x in 0..take {
                        let left = if x >= bpp { pixels[row_start + x - bpp] } else { 0 };
                        let above = if row > 0 { pixels[row_start - row_bytes + x] } else { 0 };
                        let upper_left = if row > 0 && x >= bpp {
                            pixels[row_start - row_bytes + x - bpp]
                        } else {
                            0
                        };
                        pixels[row_start + x] =
                            data[pos + x].wrapping_add(paeth(left, above, upper_left));
                    }
                }
                _ => return Err(StreamError::InvalidField),
            }

            pos += take;
            row += 1;
        }

        if row < height {
            log::warn!("expected {height} scanlines, got {row}");
        }
        Ok(pixels)
    }

    /// Normalized RGBA value of the pixel at `(x, y)`
    ///
    /// Requires [`PngDecoder::decode_pixels`] to have run. For 16-bit
    /// channels the second byte of each sample pair is the significant
    /// one. Sub-byte depths collapse the byte stride to zero and are not
    /// addressable per pixel through this accessor.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<[u8; 4]> {
        let pixels = self.pixels.as_ref().ok_or(StreamError::NotDecoded)?;
        if x >= self.width || y >= self.height {
            return Err(StreamError::OutOfRange);
        }

        let channels = self.color_type.channels() as usize;
        let stride = channels * self.bit_depth as usize / 8;
        let base = stride * (y as usize * self.width as usize + x as usize);
        let sixteen = self.bit_depth == 16;
        let sample = |k: usize| {
            if sixteen {
                pixels[base + 2 * k + 1]
            } else {
                pixels[base + k]
            }
        };

        match self.color_type {
            ColorType::Grayscale => {
                let v = sample(0);
                Ok([v, v, v, 255])
            }
            ColorType::Truecolor => Ok([sample(0), sample(1), sample(2), 255]),
            ColorType::Indexed => {
                let palette = self.palette.as_ref().ok_or(StreamError::InvalidField)?;
                let entries = palette.as_slice();
                let index = sample(0) as usize;
                let r = entries.get(3 * index).copied().unwrap_or(0);
                let g = entries.get(3 * index + 1).copied().unwrap_or(0);
                let b = entries.get(3 * index + 2).copied().unwrap_or(0);
                let a = self
                    .transparency
                    .as_ref()
                    .and_then(|t| t.as_slice().get(index).copied())
                    .unwrap_or(255);
                Ok([r, g, b, a])
            }
            ColorType::GrayscaleAlpha => {
                let v = sample(0);
                Ok([v, v, v, sample(1)])
            }
            ColorType::TruecolorAlpha => Ok([sample(0), sample(1), sample(2), sample(3)]),
        }
    }
}

fn paeth(left: u8, above: u8, upper_left: u8) -> u8 {
    let a = left as i16;
    let b = above as i16;
    let c = upper_left as i16;
    let p = a + b - c;
    let pa = (p - a).unsigned_abs();
    let pb = (p - b).unsigned_abs();
    let pc = (p - c).unsigned_abs();
    // ties resolve in order left, above, upper-left
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}
