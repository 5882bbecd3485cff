//! LRU Tracker Module
//!
//! Keeps object cache keys in access order so eviction can find the
//! least recently touched entry without comparing timestamps that may tie.

use std::collections::VecDeque;

// == LRU Tracker ==
/// Tracks access order for capacity eviction and tie-breaking.
///
/// Keys are stored in a VecDeque where:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug, Default)]
pub struct LruTracker {
    order: VecDeque<String>,
}

impl LruTracker {
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if new.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn oldest(&self) -> Option<&str> {
        self.order.back().map(String::as_str)
    }

    // == Iterate Oldest First ==
    /// Walks keys from least to most recently used.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &str> {
        self.order.iter().rev().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
