#![no_std]

//! Segstream Core - Segmented Binary Stream Definitions
//!
//! This crate provides the layered binary-stream engine: shared byte
//! buffers, a segmented buffer list, a byte-granular cursor, and a
//! bit-granular cursor, with no I/O dependencies.
//!
//! Data flows one direction: raw bytes become [`Buffer`] segments, a
//! [`BufferList`] strings segments together as they arrive, a [`Stream`]
//! reads typed scalars and strings across segment boundaries, and a
//! [`BitStream`] layers sub-byte extraction on top.

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod bit_stream;
pub mod buffer;
pub mod buffer_list;
pub mod encoding;
pub mod error;
pub mod stream;

pub use bit_stream::*;
pub use buffer::*;
pub use buffer_list::*;
pub use encoding::*;
pub use error::*;
pub use stream::*;
