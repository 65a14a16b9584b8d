//! Segmented byte storage
//!
//! A [`BufferList`] is an append-only arena of [`Buffer`] segments with a
//! movable head index. Advancing past a segment does not free it: earlier
//! segments stay in the arena so the head can be rewound, and storage is
//! released only when the owner drops the list (or every clone of a
//! segment's storage). This is what lets a stream consume input
//! incrementally as it arrives without holding one flat allocation.

use alloc::vec::Vec;

use crate::buffer::Buffer;

/// A queue of buffers with running totals of the reachable window
#[derive(Debug, Clone, Default)]
pub struct BufferList {
    segments: Vec<Buffer>,
    head: usize,
    available_bytes: usize,
}

impl BufferList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of segments ever appended (never decreases)
    pub fn num_buffers(&self) -> usize {
        self.segments.len()
    }

    /// Number of segments in the reachable window `[head..]`
    pub fn available_buffers(&self) -> usize {
        self.segments.len() - self.head
    }

    /// Number of bytes in the reachable window `[head..]`
    pub fn available_bytes(&self) -> usize {
        self.available_bytes
    }

    /// The current head segment, if the list is not drained
    pub fn first(&self) -> Option<&Buffer> {
        self.segments.get(self.head)
    }

    /// Iterate over the reachable segments, head first
    pub fn iter(&self) -> core::slice::Iter<'_, Buffer> {
        self.segments[self.head..].iter()
    }

    /// Append a segment to the tail
    ///
    /// O(1); returns the segment count before this append.
    pub fn append(&mut self, buffer: Buffer) -> usize {
        let count = self.segments.len();
        self.available_bytes += buffer.len();
        self.segments.push(buffer);
        count
    }

    /// Drop the current head segment
    ///
    /// Returns whether a new head exists afterwards. A drained list is
    /// left unchanged and reports failure.
    pub fn advance(&mut self) -> bool {
        match self.segments.get(self.head) {
            Some(first) => {
                self.available_bytes -= first.len();
                self.head += 1;
                self.head < self.segments.len()
            }
            None => false,
        }
    }

    /// Move the head back to the previous segment
    ///
    /// Restores the byte and segment totals for the restored segment.
    /// Returns false when already at the earliest retained segment. Also
    /// recovers from the fully drained state by restoring the last
    /// segment.
    pub fn rewind(&mut self) -> bool {
        if self.head == 0 {
            return false;
        }
        self.head -= 1;
        self.available_bytes += self.segments[self.head].len();
        true
    }

    /// Rewind repeatedly until no earlier segment remains
    pub fn reset(&mut self) {
        while self.rewind() {}
    }

    /// Shallow copy: same segment storage and counts, independent head
    pub fn copy(&self) -> BufferList {
        self.clone()
    }
}
