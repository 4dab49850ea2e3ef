use std::collections::BTreeMap;

use agentrt_core::{CommitHash, Namespace, Timestamp, Value};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A single immutable point in the commit DAG: the full materialized
/// key-to-value state at that point, plus a pointer to its parent.
///
/// Storing the full state (rather than a delta chain) keeps `checkout`
/// O(1) after the commit is loaded, at the cost of O(state size) work per
/// `commit()` call — the tradeoff the current design's "no metadata file is
/// required" note leaves open, resolved here in favor of read-path
/// simplicity since the task loop checks out far more often than it writes
/// more than a handful of keys per turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    /// Parent commit, or `None` for the root (empty) commit.
    pub parent: Option<CommitHash>,
    /// Namespace that authored this commit (deepest namespace of the
    /// writer, per the namespaced-view sibling-isolation rule).
    pub author_namespace: Namespace,
    /// Logical clock reading assigned when this commit was created.
    pub created_at: Timestamp,
    /// Full key -> value state as of this commit.
    pub state: BTreeMap<String, Value>,
}

impl Commit {
    /// The deterministic content hash of this commit: `checkout(commit(s)) == s`
    /// holds for any state `s`.
    ///
    /// Computed over a canonical encoding: the parent hash bytes (if any)
    /// followed by the state as a sorted `(key, value)` sequence, so two
    /// commits with identical parent and state always hash identically
    /// regardless of insertion order used to build them.
    pub fn content_hash(&self) -> Result<CommitHash, StoreError> {
        let mut buf = Vec::new();
        if let Some(parent) = &self.parent {
            buf.extend_from_slice(parent.as_bytes());
        }
        let entries: Vec<(&String, &Value)> = self.state.iter().collect();
        buf.extend_from_slice(&bincode::serialize(&entries)?);
        Ok(CommitHash::of(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_state_hashes_identically_regardless_of_parent_ordering() {
        let mut state = BTreeMap::new();
        state.insert("a".to_string(), Value::Int(1));
        state.insert("b".to_string(), Value::Int(2));
        let c1 = Commit {
            parent: None,
            author_namespace: Namespace::root(),
            created_at: Timestamp::tick(),
            state: state.clone(),
        };
        let c2 = Commit {
            parent: None,
            author_namespace: Namespace::for_agent("other"),
            created_at: Timestamp::tick(),
            state,
        };
        assert_eq!(c1.content_hash().unwrap(), c2.content_hash().unwrap());
    }

    #[test]
    fn different_state_hashes_differently() {
        let mut s1 = BTreeMap::new();
        s1.insert("a".to_string(), Value::Int(1));
        let mut s2 = BTreeMap::new();
        s2.insert("a".to_string(), Value::Int(2));
        let c1 = Commit {
            parent: None,
            author_namespace: Namespace::root(),
            created_at: Timestamp::tick(),
            state: s1,
        };
        let c2 = Commit {
            parent: None,
            author_namespace: Namespace::root(),
            created_at: Timestamp::tick(),
            state: s2,
        };
        assert_ne!(c1.content_hash().unwrap(), c2.content_hash().unwrap());
    }
}
