use std::collections::VecDeque;
use std::sync::Arc;

use agentrt_core::{ByteStore, CoreError};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Read-through LRU cache in front of another [`ByteStore`].
///
/// Writes and deletes always go to the inner store first, then update the
/// cache; reads check the cache before falling through to the inner store.
/// Eviction is a simple bounded-size least-recently-used policy tracked
/// with an order deque, since no LRU crate appears anywhere in the
/// retrieved corpus to borrow from.
pub struct CachedStore {
    inner: Arc<dyn ByteStore>,
    capacity: usize,
    state: Mutex<LruState>,
}

#[derive(Default)]
struct LruState {
    entries: FxHashMap<Vec<u8>, Vec<u8>>,
    order: VecDeque<Vec<u8>>,
}

impl LruState {
    fn touch(&mut self, key: &[u8]) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            let k = self.order.remove(pos).unwrap();
            self.order.push_back(k);
        }
    }

    fn insert(&mut self, key: Vec<u8>, value: Vec<u8>, capacity: usize) {
        if self.entries.contains_key(&key) {
            self.touch(&key);
        } else {
            self.order.push_back(key.clone());
        }
        self.entries.insert(key, value);
        while self.entries.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    fn remove(&mut self, key: &[u8]) {
        self.entries.remove(key);
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }
}

impl CachedStore {
    /// Wrap `inner`, caching up to `capacity` entries.
    pub fn new(inner: Arc<dyn ByteStore>, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            state: Mutex::new(LruState::default()),
        }
    }

    /// Number of entries currently cached.
    pub fn cached_len(&self) -> usize {
        self.state.lock().entries.len()
    }
}

impl ByteStore for CachedStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, CoreError> {
        {
            let mut state = self.state.lock();
            if let Some(value) = state.entries.get(key).cloned() {
                state.touch(key);
                return Ok(Some(value));
            }
        }
        let fetched = self.inner.get(key)?;
        if let Some(ref value) = fetched {
            self.state
                .lock()
                .insert(key.to_vec(), value.clone(), self.capacity);
        }
        Ok(fetched)
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), CoreError> {
        self.inner.put(key, value.clone())?;
        self.state.lock().insert(key.to_vec(), value, self.capacity);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), CoreError> {
        self.inner.delete(key)?;
        self.state.lock().remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, CoreError> {
        self.inner.scan_prefix(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use agentrt_core::Limits;

    #[test]
    fn reads_populate_the_cache() {
        let inner: Arc<dyn ByteStore> = Arc::new(MemoryStore::new(Limits::default()));
        inner.put(b"a", vec![1]).unwrap();
        let cached = CachedStore::new(inner, 4);
        assert_eq!(cached.cached_len(), 0);
        assert_eq!(cached.get(b"a").unwrap(), Some(vec![1]));
        assert_eq!(cached.cached_len(), 1);
    }

    #[test]
    fn eviction_respects_capacity() {
        let inner: Arc<dyn ByteStore> = Arc::new(MemoryStore::new(Limits::default()));
        let cached = CachedStore::new(inner, 2);
        cached.put(b"a", vec![1]).unwrap();
        cached.put(b"b", vec![2]).unwrap();
        cached.put(b"c", vec![3]).unwrap();
        assert!(cached.cached_len() <= 2);
    }

    #[test]
    fn delete_invalidates_cache_entry() {
        let inner: Arc<dyn ByteStore> = Arc::new(MemoryStore::new(Limits::default()));
        let cached = CachedStore::new(inner, 4);
        cached.put(b"a", vec![1]).unwrap();
        cached.delete(b"a").unwrap();
        assert_eq!(cached.get(b"a").unwrap(), None);
    }
}
