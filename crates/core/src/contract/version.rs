use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-key version counter, incremented on every write to that key within a
/// single branch lineage (distinct from [`super::Timestamp`], which orders
/// commits globally). Used by `VersionedStore::history` to report how many
/// times a key has changed without walking the full commit DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// The version assigned to a key's first write.
    pub fn initial() -> Self {
        Self(1)
    }

    /// The version that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_version_is_one() {
        assert_eq!(Version::initial().raw(), 1);
    }

    #[test]
    fn next_increments() {
        let v = Version::initial();
        assert_eq!(v.next().raw(), 2);
        assert!(v.next() > v);
    }
}
