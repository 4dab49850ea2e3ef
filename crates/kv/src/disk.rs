use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use agentrt_core::{CoreError, Limits};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::KvError;
use crate::Stats;

/// Durable byte KV backend: one file per key under a root directory, named
/// by the hex-encoded SHA-256 digest of the key to avoid filesystem-unsafe
/// key bytes. The file body is `[key_len: u32 LE][key bytes][value bytes]`
/// so `scan_prefix` can recover original keys without a separate index.
///
/// A process-wide [`Mutex`] serializes writes to keep file creation and
/// directory listing race-free; reads/scans take the same lock rather than
/// a finer-grained scheme since the current design does not call for
/// concurrent disk access beyond "durable enough to survive a restart".
pub struct DiskStore {
    root: PathBuf,
    limits: Limits,
    lock: Mutex<()>,
}

impl DiskStore {
    /// Open (creating if absent) a disk-backed store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, limits: Limits) -> Result<Self, KvError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| KvError::Io {
                path: root.display().to_string(),
                source,
        })?;
        Ok(Self {
                root,
                limits,
                lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &[u8]) -> PathBuf {
        let digest = Sha256::digest(key);
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        self.root.join(hex)
    }

    fn read_entry(path: &Path) -> Result<Option<(Vec<u8>, Vec<u8>)>, KvError> {
        let mut file = match fs::File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(KvError::Io {
                        path: path.display().to_string(),
                        source,
                })
            }
        };
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(|source| KvError::Io {
                path: path.display().to_string(),
                source,
        })?;
        if buf.len() < 4 {
            return Err(KvError::Corruption {
                    key: path.display().to_string(),
                    reason: "entry shorter than length prefix".into(),
            });
        }
        let key_len = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
        if buf.len() < 4 + key_len {
            return Err(KvError::Corruption {
                    key: path.display().to_string(),
                    reason: "entry shorter than declared key length".into(),
            });
        }
        let key = buf[4..4 + key_len].to_vec();
        let value = buf[4 + key_len..].to_vec();
        Ok(Some((key, value)))
    }

    /// Entry count and total stored bytes across the directory.
    pub fn stats(&self) -> Result<Stats, KvError> {
        let _guard = self.lock.lock();
        let mut entry_count = 0;
        let mut total_bytes = 0;
        for entry in fs::read_dir(&self.root).map_err(|source| KvError::Io {
                path: self.root.display().to_string(),
                source,
        })? {
            let entry = entry.map_err(|source| KvError::Io {
                    path: self.root.display().to_string(),
                    source,
            })?;
            if let Some((key, value)) = Self::read_entry(&entry.path())? {
                entry_count += 1;
                total_bytes += key.len() + value.len();
            }
        }
        Ok(Stats {
                entry_count,
                total_bytes,
        })
    }
}

impl agentrt_core::ByteStore for DiskStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, CoreError> {
        let _guard = self.lock.lock();
        let path = self.path_for(key);
        let found = DiskStore::read_entry(&path).map_err(Into::<CoreError>::into)?;
        Ok(found.map(|(_, value)| value))
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), CoreError> {
        if key.len() > self.limits.max_key_bytes {
            return Err(KvError::KeyTooLong {
                    len: key.len(),
                    limit: self.limits.max_key_bytes,
                }
                    .into());
        }
        if value.len() > self.limits.max_value_bytes {
            return Err(KvError::ValueTooLarge {
                    len: value.len(),
                    limit: self.limits.max_value_bytes,
                }
                    .into());
        }
        let _guard = self.lock.lock();
        let path = self.path_for(key);
        let mut buf = Vec::with_capacity(4 + key.len() + value.len());
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(&value);
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(|source| KvError::Io {
                path: tmp.display().to_string(),
                source,
        })?;
        file.write_all(&buf).map_err(|source| KvError::Io {
                path: tmp.display().to_string(),
                source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| KvError::Io {
                path: path.display().to_string(),
                source,
        })?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), CoreError> {
        let _guard = self.lock.lock();
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(KvError::Io {
                    path: path.display().to_string(),
                    source,
                }
                    .into()),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, CoreError> {
        let _guard = self.lock.lock();
        let mut out = Vec::new();
        let dir = fs::read_dir(&self.root).map_err(|source| KvError::Io {
                path: self.root.display().to_string(),
                source,
        })?;
        for entry in dir {
            let entry = entry.map_err(|source| KvError::Io {
                    path: self.root.display().to_string(),
                    source,
            })?;
            if let Some((key, _)) = DiskStore::read_entry(&entry.path()).map_err(Into::<CoreError>::into)? {
                if key.starts_with(prefix) {
                    out.push(key);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentrt_core::ByteStore;
    use tempfile::tempdir;

    #[test]
    fn put_then_get_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = DiskStore::open(dir.path(), Limits::default()).unwrap();
            store.put(b"a", vec![9, 9]).unwrap();
        }
        let store = DiskStore::open(dir.path(), Limits::default()).unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(vec![9, 9]));
    }

    #[test]
    fn scan_prefix_recovers_original_keys() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path(), Limits::default()).unwrap();
        store.put(b"ns/a", vec![1]).unwrap();
        store.put(b"ns/b", vec![2]).unwrap();
        store.put(b"x/c", vec![3]).unwrap();
        let mut got = store.scan_prefix(b"ns/").unwrap();
        got.sort();
        assert_eq!(got, vec![b"ns/a".to_vec(), b"ns/b".to_vec()]);
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path(), Limits::default()).unwrap();
        store.delete(b"never-existed").unwrap();
    }

    #[test]
    fn stats_counts_entries_and_bytes() {
        let dir = tempdir().unwrap();
        let store = DiskStore::open(dir.path(), Limits::default()).unwrap();
        store.put(b"a", vec![1, 2]).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_bytes, 1 + 2);
    }
}
