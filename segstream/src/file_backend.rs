//! File loading backends
//!
//! Two ways to get file contents into the stream engine: a memory-mapped
//! whole-file read (cheapest for files already on disk) and a segmented
//! read that feeds fixed-size pieces into a [`BufferList`] the same way a
//! network caller would append payloads as they arrive.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use segstream_core::{Buffer, BufferList, Result, StreamError};

/// Read a whole file into one owned buffer via a memory map
///
/// The mapping is transient: bytes are copied into owned storage before
/// the map is dropped, so the returned buffer is independent of the file.
/// Open and map failures surface as `InvalidInput`.
#[cfg(feature = "mmap")]
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Buffer> {
    let file = File::open(path).map_err(|_| StreamError::InvalidInput)?;
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|_| StreamError::InvalidInput)?;
    Ok(Buffer::from_slice(&mmap))
}

/// Read a file into a list of fixed-size segments
///
/// Exercises the same incremental-assembly path a streaming caller uses:
/// each read becomes one appended segment, and no flat whole-file
/// allocation is made. `segment_size` must be nonzero.
pub fn read_file_segmented<P: AsRef<Path>>(path: P, segment_size: usize) -> Result<BufferList> {
    if segment_size == 0 {
        return Err(StreamError::InvalidInput);
    }
    let mut file = File::open(path).map_err(|_| StreamError::InvalidInput)?;
    let mut list = BufferList::new();
    let mut segment = vec![0u8; segment_size];
    loop {
        let n = file.read(&mut segment).map_err(|_| StreamError::InvalidInput)?;
        if n == 0 {
            break;
        }
        list.append(Buffer::from_slice(&segment[..n]));
    }
    Ok(list)
}
