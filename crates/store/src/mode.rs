use std::sync::Arc;

use agentrt_core::{CommitHash, Namespace, Value};

use crate::error::StoreError;
use crate::live::LiveStore;
use crate::session::VersionedSession;

/// Unifies the three state modes a task invocation may run under.
///
/// The sandbox evaluator and agent task loop program against this enum
/// rather than against `VersionedSession`/`LiveStore` directly, so a single
/// call site works unmodified regardless of which persistence mode the
/// caller chose for a task.
pub enum StateHandle {
    /// No persistence at all: every write is discarded at turn end, reads
    /// always see `None`. Used for tasks with no memory requirement.
    None,
    /// Non-versioned in-process map (C4): no rollback, accepts any value.
    Live(Arc<LiveStore>),
    /// Content-addressed versioned store (C2): every write is a commit.
    Versioned(Arc<VersionedSession>),
}

impl StateHandle {
    /// Fetch the value bound to `key` within `namespace`.
    pub fn get(&self, namespace: &Namespace, key: &str) -> Result<Option<Value>, StoreError> {
        match self {
            StateHandle::None => Ok(None),
            StateHandle::Live(live) => Ok(live.get(namespace, key)),
            StateHandle::Versioned(session) => session.get(namespace, key),
        }
    }

    /// Bind `key` to `value` within `namespace`.
    pub fn put(&self, namespace: &Namespace, key: &str, value: Value) -> Result<(), StoreError> {
        match self {
            StateHandle::None => Ok(()),
            StateHandle::Live(live) => {
                live.put(namespace, key, value);
                Ok(())
            }
            StateHandle::Versioned(session) => session.put(namespace, key, value).map(|_| ()),
        }
    }

    /// Remove the binding for `key` within `namespace`.
    pub fn delete(&self, namespace: &Namespace, key: &str) -> Result<(), StoreError> {
        match self {
            StateHandle::None => Ok(()),
            StateHandle::Live(live) => {
                live.delete(namespace, key);
                Ok(())
            }
            StateHandle::Versioned(session) => session.delete(namespace, key).map(|_| ()),
        }
    }

    /// List keys (relative to `namespace`) beginning with `prefix`.
    pub fn keys(&self, namespace: &Namespace, prefix: &str) -> Result<Vec<String>, StoreError> {
        match self {
            StateHandle::None => Ok(Vec::new()),
            StateHandle::Live(live) => Ok(live.keys(namespace, prefix)),
            StateHandle::Versioned(session) => session.view(namespace.clone()).scan_prefix(prefix),
        }
    }

    /// The commit hash this turn produced, if running in Versioned mode.
    /// `None` for No-state and Live modes, which never produce commits
    ///.
    pub fn commit_hash(&self) -> Option<CommitHash> {
        match self {
            StateHandle::Versioned(session) => Some(session.snapshot()),
            StateHandle::None | StateHandle::Live(_) => None,
        }
    }

    /// Whether this handle is the Versioned mode (affects persistability
    /// enforcement: only Versioned mode rejects non-snapshot-safe values).
    pub fn is_versioned(&self) -> bool {
        matches!(self, StateHandle::Versioned(_))
    }
}

impl Clone for StateHandle {
    fn clone(&self) -> Self {
        match self {
            StateHandle::None => StateHandle::None,
            StateHandle::Live(live) => StateHandle::Live(live.clone()),
            StateHandle::Versioned(session) => StateHandle::Versioned(session.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_kv::MemoryStore;
    use agentrt_core::HostHandle;
    use crate::versioned::VersionedStore;

    #[test]
    fn none_mode_discards_everything() {
        let h = StateHandle::None;
        let ns = Namespace::for_agent("a");
        h.put(&ns, "x", Value::Int(1)).unwrap();
        assert_eq!(h.get(&ns, "x").unwrap(), None);
        assert_eq!(h.commit_hash(), None);
    }

    #[test]
    fn live_mode_accepts_non_persistable_values() {
        let h = StateHandle::Live(Arc::new(LiveStore::new()));
        let ns = Namespace::for_agent("a");
        let handle = Value::Host(HostHandle {
                kind: "instance".into(),
                registered_name: "conn".into(),
                type_tag: "Connection".into(),
                live: None,
        })
            .mark_non_persistable();
        h.put(&ns, "conn", handle).unwrap();
        assert_eq!(h.commit_hash(), None);
        assert!(!h.is_versioned());
    }

    #[test]
    fn versioned_mode_produces_commit_hashes() {
        let vs = Arc::new(VersionedStore::new(Arc::new(MemoryStore::default())).unwrap());
        let h = StateHandle::Versioned(Arc::new(VersionedSession::new(vs)));
        let ns = Namespace::for_agent("a");
        h.put(&ns, "x", Value::Int(1)).unwrap();
        assert!(h.commit_hash().is_some());
        assert!(h.is_versioned());
    }
}
