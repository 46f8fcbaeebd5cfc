use std::collections::VecDeque;

use bytes::{Buf, BytesMut};
use sigmux_value::Value;

use crate::error::{MuxError, Result};

/// Positional metadata attached to an item offset within a stream.
///
/// Offsets are absolute item indices counted from the start of the
/// stream, not from the current queue head.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Absolute item offset the tag describes.
    pub offset: u64,
    /// Attached opaque value.
    pub value: Value,
}

impl Tag {
    /// Create a tag at an absolute item offset.
    pub fn new(offset: u64, value: Value) -> Self {
        Self { offset, value }
    }
}

/// Per-stream configuration fixed at topology setup.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Size of one sample item in bytes.
    pub item_size: usize,
}

impl StreamConfig {
    /// Configuration for a stream of `item_size`-byte items.
    ///
    /// # Panics
    ///
    /// Panics if `item_size` is zero.
    pub fn new(item_size: usize) -> Self {
        assert!(item_size > 0, "item size must be non-zero");
        Self { item_size }
    }
}

/// State owned by one logical input stream: queued sample bytes,
/// pending tags and messages, the running consumed-item index, and the
/// stream's sequence counter.
#[derive(Debug)]
pub(crate) struct Stream {
    item_size: usize,
    queued: BytesMut,
    tags: VecDeque<Tag>,
    messages: VecDeque<Value>,
    consumed: u64,
    seq: u32,
}

impl Stream {
    pub(crate) fn new(config: &StreamConfig) -> Self {
        Self {
            item_size: config.item_size,
            queued: BytesMut::new(),
            tags: VecDeque::new(),
            messages: VecDeque::new(),
            consumed: 0,
            seq: 0,
        }
    }

    pub(crate) fn item_size(&self) -> usize {
        self.item_size
    }

    /// Whole items currently queued.
    pub(crate) fn available_items(&self) -> usize {
        self.queued.len() / self.item_size
    }

    /// Items consumed since topology setup.
    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }

    pub(crate) fn seq(&self) -> u32 {
        self.seq
    }

    /// Take the next sequence number for this stream.
    pub(crate) fn next_seq(&mut self) -> u32 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    pub(crate) fn push_samples(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() % self.item_size != 0 {
            return Err(MuxError::PartialItem {
                len: bytes.len(),
                item_size: self.item_size,
            });
        }
        self.queued.extend_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn push_tag(&mut self, tag: Tag) {
        self.tags.push_back(tag);
    }

    pub(crate) fn push_message(&mut self, value: Value) {
        self.messages.push_back(value);
    }

    pub(crate) fn pop_message(&mut self) -> Option<Value> {
        self.messages.pop_front()
    }

    pub(crate) fn has_pending_message(&self) -> bool {
        !self.messages.is_empty()
    }

    /// The queued sample bytes, starting at the next unconsumed item.
    pub(crate) fn queued(&self) -> &[u8] {
        &self.queued
    }

    /// Advance past `items` consumed items.
    pub(crate) fn consume(&mut self, items: usize) {
        self.queued.advance(items * self.item_size);
        self.consumed += items as u64;
    }

    /// Remove and return, in arrival order, every pending tag whose
    /// offset is strictly below `max_index`. Later tags stay queued.
    pub(crate) fn take_tags_below(&mut self, max_index: u64) -> Vec<Tag> {
        let mut flushed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.tags.len());
        for tag in self.tags.drain(..) {
            if tag.offset < max_index {
                flushed.push(tag);
            } else {
                kept.push_back(tag);
            }
        }
        self.tags = kept;
        flushed
    }
}
