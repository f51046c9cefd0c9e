//! FIFO queue of work waiting on a protocol signal.

use std::collections::VecDeque;

/// Continuations waiting for the next occurrence of a signal (engine ready,
/// search stopped). Draining hands back a snapshot, so anything enqueued
/// while the caller runs the drained items waits for the next signal.
#[derive(Debug)]
pub struct ContinuationQueue<C> {
    items: VecDeque<C>,
}

impl<C> Default for ContinuationQueue<C> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<C> ContinuationQueue<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: C) {
        self.items.push_back(item);
    }

    /// Take everything queued so far, in enqueue order.
    pub fn drain(&mut self) -> Vec<C> {
        std::mem::take(&mut self.items).into()
    }

    /// Move all of `other` ahead of this queue's own items.
    pub fn absorb_front(&mut self, other: &mut ContinuationQueue<C>) {
        let mut merged = std::mem::take(&mut other.items);
        merged.append(&mut self.items);
        self.items = merged;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
