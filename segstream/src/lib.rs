//! Segstream - Segmented Binary Stream Engine
//!
//! This library provides cursor-based reading over segmented byte storage
//! and a chunk-based PNG decoder built on top of it.
//!
//! ## Architecture
//!
//! Segstream follows a clean definitions/implementation separation:
//!
//! - **segstream-core**: Buffers, the segmented list, byte and bit
//!   cursors, and error types (no I/O)
//! - **segstream**: The PNG decoder, DEFLATE inflation, and file loading
//!   backends
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use segstream::{PngDecoder, Result};
//!
//! fn example() -> Result<()> {
//!     let mut image = PngDecoder::from_file("photo.png")?;
//!     image.decode_pixels()?;
//!
//!     let [r, g, b, a] = image.get_pixel(0, 0)?;
//!     println!("{}x{} {} corner: {r},{g},{b},{a}",
//!         image.width(), image.height(), image.color_type());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Segmented input**: bytes can be appended as they arrive; nothing
//!   requires one flat allocation
//! - **Bit-exact extraction**: signed and unsigned reads up to 40 bits in
//!   both bit orders
//! - **Multi-encoding text**: ascii, latin1, utf8, and the utf16 family
//!   with BOM sniffing
//! - **Memory-mapped loading**: `mmap` feature for whole-file reads

// Re-export the stream engine
pub use segstream_core::{
    // Layered cursors
    BitStream, Buffer, BufferList, Stream,
    // Read parameters
    Endian, TextEncoding,
    // Error handling
    ErrorCategory, Result, StreamError,
};

// Implementation modules
pub mod file_backend;
pub mod png;

// Public exports
pub use file_backend::read_file_segmented;
pub use png::{ColorType, PhysicalDimensions, PngDecoder, PNG_SIGNATURE};

// Memory mapping features
#[cfg(feature = "mmap")]
pub use file_backend::read_file;

// Metadata features
#[cfg(feature = "serde")]
pub use png::ImageInfo;
