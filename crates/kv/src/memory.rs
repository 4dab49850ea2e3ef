use agentrt_core::{CoreError, Limits};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::KvError;
use crate::Stats;

/// In-memory byte KV backend. Not durable; intended for the live store and
/// for tests.
pub struct MemoryStore {
    limits: Limits,
    entries: RwLock<FxHashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Construct an empty store with the given size limits.
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    fn check_key(&self, key: &[u8]) -> Result<(), KvError> {
        if key.len() > self.limits.max_key_bytes {
            return Err(KvError::KeyTooLong {
                    len: key.len(),
                    limit: self.limits.max_key_bytes,
            });
        }
        Ok(())
    }

    fn check_value(&self, value: &[u8]) -> Result<(), KvError> {
        if value.len() > self.limits.max_value_bytes {
            return Err(KvError::ValueTooLarge {
                    len: value.len(),
                    limit: self.limits.max_value_bytes,
            });
        }
        Ok(())
    }

    /// Entry count and total stored bytes, for operator introspection.
    pub fn stats(&self) -> Stats {
        let entries = self.entries.read();
        let total_bytes = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
        Stats {
            entry_count: entries.len(),
            total_bytes,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Limits::default())
    }
}

impl agentrt_core::ByteStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, CoreError> {
        self.check_key(key).map_err(Into::<CoreError>::into)?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), CoreError> {
        self.check_key(key).map_err(Into::<CoreError>::into)?;
        self.check_value(&value).map_err(Into::<CoreError>::into)?;
        self.entries.write().insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), CoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, CoreError> {
        Ok(self
                .entries
                .read()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_core::ByteStore;

    #[test]
    fn put_then_get_roundtrips() {
        let store = MemoryStore::default();
        store.put(b"a", vec![1, 2, 3]).unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn delete_removes_entry() {
        let store = MemoryStore::default();
        store.put(b"a", vec![1]).unwrap();
        store.delete(b"a").unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);
    }

    #[test]
    fn scan_prefix_filters_keys() {
        let store = MemoryStore::default();
        store.put(b"ns/a", vec![1]).unwrap();
        store.put(b"ns/b", vec![2]).unwrap();
        store.put(b"other/c", vec![3]).unwrap();
        let mut got = store.scan_prefix(b"ns/").unwrap();
        got.sort();
        assert_eq!(got, vec![b"ns/a".to_vec(), b"ns/b".to_vec()]);
    }

    #[test]
    fn oversized_key_is_rejected() {
        let limits = Limits::new().with_max_key_bytes(4);
        let store = MemoryStore::new(limits);
        let err = store.put(b"too-long-key", vec![1]).unwrap_err();
        assert!(matches!(err, CoreError::CapacityExceeded {.. }));
    }

    #[test]
    fn stats_reports_entry_count_and_bytes() {
        let store = MemoryStore::default();
        store.put(b"a", vec![1, 2, 3]).unwrap();
        let stats = store.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_bytes, 1 + 3);
    }
}
