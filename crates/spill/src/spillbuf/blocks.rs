//! In-memory block FIFO.
//!
//! Blocks are immutable once enqueued. Each block remembers the stream
//! offset it was written at so the spill buffer can interleave memory
//! blocks with spilled extents in exact write order.

use std::collections::VecDeque;

/// A contiguous run of bytes held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Stream offset of the first byte of this block.
    pub offset: u64,
    /// Block contents.
    pub data: Vec<u8>,
}

impl Block {
    /// Returns the number of bytes in the block.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the block holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered queue of in-memory blocks with byte accounting.
#[derive(Debug, Default)]
pub struct BlockQueue {
    blocks: VecDeque<Block>,
    memory_bytes: usize,
}

impl BlockQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block written at `offset`.
    ///
    /// Empty blocks are ignored.
    pub fn enqueue(&mut self, offset: u64, data: Vec<u8>) {
        if data.is_empty() {
            return;
        }
        debug_assert!(
            self.blocks
                .back()
                .map_or(true, |b| b.offset + b.len() as u64 <= offset),
            "blocks must be enqueued in stream order"
        );
        self.memory_bytes += data.len();
        self.blocks.push_back(Block { offset, data });
    }

    /// Returns the earliest block without removing it.
    pub fn peek_head(&self) -> Option<&Block> {
        self.blocks.front()
    }

    /// Removes and returns the earliest block.
    pub fn pop_head(&mut self) -> Option<Block> {
        let block = self.blocks.pop_front()?;
        self.memory_bytes -= block.len();
        Some(block)
    }

    /// Returns the total number of bytes held in memory.
    pub fn memory_bytes(&self) -> usize {
        self.memory_bytes
    }

    /// Returns the number of queued blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns true if no blocks are queued.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
