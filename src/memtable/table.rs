//! MemTable implementation
//!
//! BTreeMap-based memtable behind a parking_lot RwLock.

use std::collections::BTreeMap;
use std::mem;

use parking_lot::RwLock;

/// In-memory table of buffered puts
pub struct MemTable {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Sum of key and value lengths currently held
    size: usize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Get a buffered value
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().data.get(key).cloned()
    }

    /// Buffer a put; returns the new approximate size in bytes
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) -> usize {
        let mut inner = self.inner.write();
        let key_len = key.len();
        let value_len = value.len();

        match inner.data.insert(key, value) {
            // Key already counted; only the value length changes
            Some(old) => inner.size = inner.size - old.len() + value_len,
            None => inner.size += key_len + value_len,
        }
        inner.size
    }

    /// Approximate size in bytes
    pub fn size(&self) -> usize {
        self.inner.read().size
    }

    /// Number of distinct keys buffered
    pub fn entry_count(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }

    /// Take all entries in key order, leaving the table empty
    pub fn drain(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut inner = self.inner.write();
        inner.size = 0;
        mem::take(&mut inner.data).into_iter().collect()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
