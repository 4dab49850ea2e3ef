use std::collections::BTreeMap;
use std::sync::Arc;

use agentrt_core::{ByteStore, CommitHash, Namespace, Timestamp, Value};
use parking_lot::RwLock;
use tracing::debug;

use crate::commit::Commit;
use crate::error::StoreError;

const COMMIT_KEY_PREFIX: &str = "commit/";

/// Content-addressed, copy-on-write versioned key-value store.
///
/// Every [`VersionedStore::commit`] call produces a brand new [`Commit`]
/// addressed by [`Commit::content_hash`]; nothing already committed is ever
/// mutated in place. Commits form a DAG via parent pointers — in practice a
/// tree, since this runtime never merges two lineages.
pub struct VersionedStore {
    backing: Arc<dyn ByteStore>,
    cache: RwLock<std::collections::HashMap<CommitHash, Arc<Commit>>>,
    root: CommitHash,
}

impl VersionedStore {
    /// Open a versioned store over `backing`, creating (and caching) the
    /// empty root commit if this is a fresh backing store.
    pub fn new(backing: Arc<dyn ByteStore>) -> Result<Self, StoreError> {
        let root_commit = Commit {
            parent: None,
            author_namespace: Namespace::root(),
            created_at: Timestamp::tick(),
            state: BTreeMap::new(),
        };
        let root = root_commit.content_hash()?;
        let store = Self {
            backing,
            cache: RwLock::new(std::collections::HashMap::new()),
            root,
        };
        store.persist(&root, &root_commit)?;
        Ok(store)
    }

    /// Hash of the empty root commit every lineage starts from.
    pub fn root(&self) -> CommitHash {
        self.root
    }

    fn backing_key(hash: &CommitHash) -> Vec<u8> {
        format!("{COMMIT_KEY_PREFIX}{}", hash.to_hex()).into_bytes()
    }

    fn persist(&self, hash: &CommitHash, commit: &Commit) -> Result<(), StoreError> {
        let encoded = bincode::serialize(commit)?;
        self.backing.put(&Self::backing_key(hash), encoded)?;
        self.cache.write().insert(*hash, Arc::new(commit.clone()));
        Ok(())
    }

    /// Load the commit addressed by `hash`.
    pub fn checkout(&self, hash: CommitHash) -> Result<Arc<Commit>, StoreError> {
        if let Some(commit) = self.cache.read().get(&hash) {
            return Ok(commit.clone());
        }
        let raw = self
            .backing
            .get(&Self::backing_key(&hash))?
            .ok_or_else(|| StoreError::UnknownCommit { hash: hash.to_hex() })?;
        let commit: Commit = bincode::deserialize(&raw)?;
        let commit = Arc::new(commit);
        self.cache.write().insert(hash, commit.clone());
        Ok(commit)
    }

    /// Apply `writes` (`None` value means delete) atop the state at `base`,
    /// returning the hash of the resulting commit. If the resulting state
    /// is unchanged from `base`, returns `base` itself without creating a
    /// new commit (idempotent no-op write).
    pub fn commit(
        &self,
        base: CommitHash,
        author_namespace: Namespace,
        writes: BTreeMap<String, Option<Value>>,
    ) -> Result<CommitHash, StoreError> {
        let base_commit = self.checkout(base)?;
        let mut state = base_commit.state.clone();
        let mut changed = false;
        for (key, value) in writes {
            match value {
                Some(v) => {
                    if state.get(&key) != Some(&v) {
                        state.insert(key, v);
                        changed = true;
                    }
                }
                None => {
                    if state.remove(&key).is_some() {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return Ok(base);
        }
        let new_commit = Commit {
            parent: Some(base),
            author_namespace,
            created_at: Timestamp::tick(),
            state,
        };
        let hash = new_commit.content_hash()?;
        if self.cache.read().contains_key(&hash) {
            return Ok(hash);
        }
        debug!(commit = %hash, parent = %base, "new commit");
        self.persist(&hash, &new_commit)?;
        Ok(hash)
    }

    /// Commits along the ancestry of `from` (inclusive, newest first) at
    /// which `key`'s bound value changed relative to their parent.
    pub fn history(&self, from: CommitHash, key: &str) -> Result<Vec<CommitHash>, StoreError> {
        // Walk the ancestry oldest-first so each commit can be compared
        // against its own parent, then report newest-first.
        let mut chain = Vec::new();
        let mut cursor = Some(from);
        while let Some(hash) = cursor {
            let commit = self.checkout(hash)?;
            let parent = commit.parent;
            chain.push((hash, commit.state.get(key).cloned()));
            cursor = parent;
        }
        chain.reverse();

        let mut out = Vec::new();
        let mut previous: Option<Value> = None;
        for (hash, value) in &chain {
            if *value != previous {
                out.push(*hash);
            }
            previous = value.clone();
        }
        out.reverse();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_kv::MemoryStore;

    fn store() -> VersionedStore {
        VersionedStore::new(Arc::new(MemoryStore::default())).unwrap()
    }

    #[test]
    fn commit_then_checkout_roundtrips() {
        let s = store();
        let mut writes = BTreeMap::new();
        writes.insert("a".to_string(), Some(Value::Int(1)));
        let h = s.commit(s.root(), Namespace::root(), writes).unwrap();
        let commit = s.checkout(h).unwrap();
        assert_eq!(commit.state.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn no_op_write_returns_same_hash() {
        let s = store();
        let writes = BTreeMap::new();
        let h = s.commit(s.root(), Namespace::root(), writes).unwrap();
        assert_eq!(h, s.root());
    }

    #[test]
    fn identical_resulting_state_converges_to_same_hash() {
        let s = store();
        let mut w1 = BTreeMap::new();
        w1.insert("a".to_string(), Some(Value::Int(1)));
        let h1 = s.commit(s.root(), Namespace::root(), w1).unwrap();

        let mut w2 = BTreeMap::new();
        w2.insert("a".to_string(), Some(Value::Int(1)));
        let h2 = s.commit(s.root(), Namespace::for_agent("other"), w2).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn history_tracks_value_changes_only() {
        let s = store();
        let mut w1 = BTreeMap::new();
        w1.insert("a".to_string(), Some(Value::Int(1)));
        let h1 = s.commit(s.root(), Namespace::root(), w1).unwrap();

        let mut w2 = BTreeMap::new();
        w2.insert("b".to_string(), Some(Value::Int(99)));
        let h2 = s.commit(h1, Namespace::root(), w2).unwrap();

        let mut w3 = BTreeMap::new();
        w3.insert("a".to_string(), Some(Value::Int(2)));
        let h3 = s.commit(h2, Namespace::root(), w3).unwrap();

        let history = s.history(h3, "a").unwrap();
        assert_eq!(history, vec![h3, h1]);
    }

    #[test]
    fn unknown_commit_is_an_error() {
        let s = store();
        let bogus = CommitHash::of(b"nonexistent");
        assert!(matches!(s.checkout(bogus), Err(StoreError::UnknownCommit {.. })));
    }
}
