//! Animation frame queue

use std::mem;

/// Unkeyed single-shot callbacks, consumed one batch per tick
#[derive(Debug)]
pub struct FrameQueue<T> {
    pending: Vec<T>,
}

impl<T> FrameQueue<T> {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    pub fn push(&mut self, callback: T) {
        self.pending.push(callback);
    }

    /// Take the whole queue, leaving an empty one behind. Callbacks queued
    /// while the batch runs land in the fresh queue.
    pub fn take_batch(&mut self) -> Vec<T> {
        mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<T> Default for FrameQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
