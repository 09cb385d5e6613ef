//! Block Cache
//!
//! A small LRU cache of recently read blocks. It is a pure optimization:
//! the store behaves identically with capacity 0. Writers must call
//! [`BlockCache::invalidate`] for every block they write.

use std::collections::{HashMap, VecDeque};

use super::Block;

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// LRU cache keyed by (table, block number)
#[derive(Debug)]
pub struct BlockCache {
    capacity: usize,
    entries: HashMap<(String, u64), Block>,
    /// Least recently used at the front
    order: VecDeque<(String, u64)>,
    stats: CacheStats,
}

impl BlockCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Look up a block, marking it most recently used
    pub fn get(&mut self, table: &str, block: u64) -> Option<Block> {
        let key = (table.to_string(), block);
        match self.entries.get(&key) {
            Some(found) => {
                let found = found.clone();
                self.touch(&key);
                self.stats.hits += 1;
                Some(found)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a freshly read block, evicting the least recently used entry
    pub fn put(&mut self, table: &str, block: u64, data: Block) {
        if self.capacity == 0 {
            return;
        }
        let key = (table.to_string(), block);
        if self.entries.insert(key.clone(), data).is_some() {
            self.touch(&key);
            return;
        }
        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                }
                None => break,
            }
        }
    }

    /// Drop a single block
    pub fn invalidate(&mut self, table: &str, block: u64) {
        let key = (table.to_string(), block);
        if self.entries.remove(&key).is_some() {
            self.order.retain(|k| k != &key);
            self.stats.invalidations += 1;
        }
    }

    /// Drop every block of a table
    pub fn invalidate_table(&mut self, table: &str) {
        let before = self.entries.len();
        self.entries.retain(|(t, _), _| t != table);
        self.order.retain(|(t, _)| t != table);
        self.stats.invalidations += (before - self.entries.len()) as u64;
    }

    fn touch(&mut self, key: &(String, u64)) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}
