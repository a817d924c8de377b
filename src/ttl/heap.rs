//! TTL Heap
//!
//! Min-heap of pending expirations, earliest first.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// One pending expiration
///
/// Ordered by timestamp, then key, then generation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TtlEntry {
    /// Absolute expiry (unix seconds)
    pub expires_at: u32,
    pub key: Vec<u8>,
    /// Generation of the record this entry was pushed for
    pub generation: u64,
}

/// Binary min-heap keyed by absolute expiry
#[derive(Debug, Default)]
pub struct TtlHeap {
    entries: BinaryHeap<Reverse<TtlEntry>>,
}

impl TtlHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TtlEntry) {
        self.entries.push(Reverse(entry));
    }

    /// Earliest entry without removing it
    pub fn peek(&self) -> Option<&TtlEntry> {
        self.entries.peek().map(|Reverse(entry)| entry)
    }

    /// Remove and return the earliest entry
    pub fn pop(&mut self) -> Option<TtlEntry> {
        self.entries.pop().map(|Reverse(entry)| entry)
    }

    /// Pop the earliest entry only if its timestamp has passed at `now`
    pub fn pop_due(&mut self, now: u32) -> Option<TtlEntry> {
        match self.peek() {
            Some(entry) if super::is_passed(entry.expires_at, now) => self.pop(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
