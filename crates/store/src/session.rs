use std::collections::BTreeMap;
use std::sync::Arc;

use agentrt_core::{CommitHash, Namespace, Value};
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::namespaced::NamespacedView;
use crate::versioned::VersionedStore;

/// The mutable, "current state" interface layered on top of the immutable
/// [`VersionedStore`].
///
/// Every agent task loop iteration running in Versioned mode reads and
/// writes through a `VersionedSession`; each write advances the session's
/// `current` commit pointer, giving callers ordinary get/put ergonomics
/// while still recording every state transition as an addressable commit.
pub struct VersionedSession {
    store: Arc<VersionedStore>,
    current: Mutex<CommitHash>,
}

impl VersionedSession {
    /// Open a session atop `store`, starting at its empty root commit.
    pub fn new(store: Arc<VersionedStore>) -> Self {
        let root = store.root();
        Self {
            store,
            current: Mutex::new(root),
        }
    }

    /// Open a session pinned to an existing commit (e.g. resuming a prior
    /// top-level task at the commit its last turn produced).
    pub fn at(store: Arc<VersionedStore>, commit: CommitHash) -> Self {
        Self {
            store,
            current: Mutex::new(commit),
        }
    }

    /// The commit hash the session currently reflects.
    pub fn snapshot(&self) -> CommitHash {
        *self.current.lock()
    }

    /// Reset the session's pointer to an arbitrary previously-taken
    /// snapshot (e.g. rolling back a failed turn;"Transaction
    /// scope": "on evaluator panic, the overlay is discarded").
    pub fn checkout(&self, commit: CommitHash) -> Result<(), StoreError> {
        self.store.checkout(commit)?;
        *self.current.lock() = commit;
        Ok(())
    }

    /// Fetch the value bound to `key` within `namespace` as of the current
    /// commit.
    pub fn get(&self, namespace: &Namespace, key: &str) -> Result<Option<Value>, StoreError> {
        let view = NamespacedView::new(&self.store, self.snapshot(), namespace.clone());
        view.get(key)
    }

    /// Bind `key` to `value` within `namespace`, advancing the session's
    /// pointer to the resulting commit. Rejects values that refuse snapshot
    /// degradation with `StoreError::NonPersistable`.
    pub fn put(&self, namespace: &Namespace, key: &str, value: Value) -> Result<CommitHash, StoreError> {
        if !value.is_snapshot_safe() {
            return Err(StoreError::NonPersistable {
                    key: key.to_string(),
                    reason: format!("value of type {} refuses snapshot degradation", value.type_name()),
            });
        }
        let mut current = self.current.lock();
        let full_key = namespaced_key(namespace, key);
        let mut writes = BTreeMap::new();
        writes.insert(full_key, Some(value));
        let next = self.store.commit(*current, namespace.clone(), writes)?;
        *current = next;
        Ok(next)
    }

    /// Apply a batch of writes (`None` deletes) atomically, as a single
    /// commit. Used by the agent loop to flush an entire turn's dirty keys
    /// in one snapshot rather than one commit per key.
    pub fn put_many(
        &self,
        namespace: &Namespace,
        writes: BTreeMap<String, Option<Value>>,
    ) -> Result<CommitHash, StoreError> {
        for value in writes.values().flatten() {
            if !value.is_snapshot_safe() {
                return Err(StoreError::NonPersistable {
                        key: "<batch>".to_string(),
                        reason: format!("value of type {} refuses snapshot degradation", value.type_name()),
                });
            }
        }
        let mut current = self.current.lock();
        let full_writes = writes
            .into_iter()
            .map(|(k, v)| (namespaced_key(namespace, &k), v))
            .collect();
        let next = self.store.commit(*current, namespace.clone(), full_writes)?;
        *current = next;
        Ok(next)
    }

    /// Remove the binding for `key` within `namespace`, advancing the
    /// session's pointer.
    pub fn delete(&self, namespace: &Namespace, key: &str) -> Result<CommitHash, StoreError> {
        let mut current = self.current.lock();
        let full_key = namespaced_key(namespace, key);
        let mut writes = BTreeMap::new();
        writes.insert(full_key, None);
        let next = self.store.commit(*current, namespace.clone(), writes)?;
        *current = next;
        Ok(next)
    }

    /// A read-only view scoped to `namespace`, pinned to the current
    /// commit at the moment this is called.
    pub fn view(&self, namespace: Namespace) -> NamespacedView<'_> {
        NamespacedView::new(&self.store, self.snapshot(), namespace)
    }

    /// Commits along the ancestry of the current commit at which `key`
    /// (absolute, not namespace-relative) changed.
    pub fn history(&self, namespace: &Namespace, key: &str) -> Result<Vec<CommitHash>, StoreError> {
        self.store.history(self.snapshot(), &namespaced_key(namespace, key))
    }

    /// The underlying versioned store, for callers that need direct commit
    /// DAG access (e.g. the agent loop recording a turn's resulting hash in
    /// its event log, or a child session parenting off the parent's latest
    /// commit).
    pub fn backing(&self) -> &Arc<VersionedStore> {
        &self.store
    }
}

fn namespaced_key(namespace: &Namespace, key: &str) -> String {
    if namespace.segments().is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", namespace.path(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_kv::MemoryStore;

    fn session() -> VersionedSession {
        VersionedSession::new(Arc::new(VersionedStore::new(Arc::new(MemoryStore::default())).unwrap()))
    }

    #[test]
    fn put_then_get_through_namespace() {
        let s = session();
        let ns = Namespace::for_agent("orchestrator");
        s.put(&ns, "status", Value::Str("running".into())).unwrap();
        assert_eq!(s.get(&ns, "status").unwrap(), Some(Value::Str("running".into())));
    }

    #[test]
    fn checkout_rolls_back_visible_state() {
        let s = session();
        let ns = Namespace::for_agent("a");
        let before = s.snapshot();
        s.put(&ns, "x", Value::Int(1)).unwrap();
        assert_eq!(s.get(&ns, "x").unwrap(), Some(Value::Int(1)));
        s.checkout(before).unwrap();
        assert_eq!(s.get(&ns, "x").unwrap(), None);
    }

    #[test]
    fn non_persistable_value_is_rejected() {
        use agentrt_core::HostHandle;
        let s = session();
        let ns = Namespace::for_agent("a");
        let handle = Value::Host(HostHandle {
                kind: "instance".into(),
                registered_name: "conn".into(),
                type_tag: "Connection".into(),
                live: None,
        })
            .mark_non_persistable();
        let err = s.put(&ns, "conn", handle).unwrap_err();
        assert!(matches!(err, StoreError::NonPersistable {.. }));
    }

    #[test]
    fn put_many_commits_a_single_turn_atomically() {
        let s = session();
        let ns = Namespace::for_agent("a");
        let mut writes = BTreeMap::new();
        writes.insert("x".to_string(), Some(Value::Int(1)));
        writes.insert("y".to_string(), Some(Value::Int(2)));
        s.put_many(&ns, writes).unwrap();
        assert_eq!(s.get(&ns, "x").unwrap(), Some(Value::Int(1)));
        assert_eq!(s.get(&ns, "y").unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn view_reflects_snapshot_at_call_time() {
        let s = session();
        let ns = Namespace::for_agent("a");
        s.put(&ns, "x", Value::Int(1)).unwrap();
        let view = s.view(ns.clone());
        s.put(&ns, "x", Value::Int(2)).unwrap();
        assert_eq!(view.get("x").unwrap(), Some(Value::Int(1)));
        assert_eq!(s.get(&ns, "x").unwrap(), Some(Value::Int(2)));
    }
}
