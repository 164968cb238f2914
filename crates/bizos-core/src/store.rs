//! Key-value persistence for wizard state.
//!
//! Every backend is best-effort: reads never fail (absent or unreadable
//! yields `None`) and writes that cannot be carried out are logged and
//! dropped. Callers treat storage the same way a browser page treats
//! local storage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Last-writer-wins; no transaction across keys.
    fn set(&self, key: &str, value: &str);

    fn remove(&self, key: &str);

    /// `false` when the substrate does not exist in this execution context.
    fn is_available(&self) -> bool {
        true
    }
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

type Entries = BTreeMap<String, String>;

/// Poisoning only means another thread panicked mid-write of a plain map;
/// the data is still a valid map, so keep going.
fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.entries).keys().cloned().collect()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.entries).insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        lock(&self.entries).remove(key);
    }
}

// ---------------------------------------------------------------------------
// NullStore
// ---------------------------------------------------------------------------

/// Storage that is not there. Reads are empty and writes vanish.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl Store for NullStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}

    fn is_available(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// A JSON object file shared by every process working on the same project.
///
/// The store keeps an *observed* snapshot: the map as this process last saw
/// it on disk, plus its own writes. [`FileStore::refresh`] diffs the disk
/// against that snapshot, so a process never sees its own writes reported
/// as external changes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    observed: Mutex<Entries>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let observed = read_entries(&path).unwrap_or_default();
        Self {
            path,
            observed: Mutex::new(observed),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reload the file and return every key whose value changed since this
    /// process last looked (added, modified, or removed). The new disk
    /// contents become the observed snapshot.
    pub fn refresh(&self) -> Vec<String> {
        let Some(disk) = read_entries(&self.path) else {
            return Vec::new();
        };
        let mut observed = lock(&self.observed);
        let mut changed: Vec<String> = disk
            .iter()
            .filter(|(k, v)| observed.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect();
        changed.extend(
            observed
                .keys()
                .filter(|k| !disk.contains_key(*k))
                .cloned(),
        );
        changed.sort();
        *observed = disk;
        changed
    }

    fn update(&self, key: &str, value: Option<&str>) {
        let mut observed = lock(&self.observed);
        let mut disk = read_entries(&self.path).unwrap_or_else(|| observed.clone());
        match value {
            Some(v) => {
                disk.insert(key.to_string(), v.to_string());
                observed.insert(key.to_string(), v.to_string());
            }
            None => {
                disk.remove(key);
                observed.remove(key);
            }
        }
        let data = match serde_json::to_vec_pretty(&disk) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to encode store");
                return;
            }
        };
        if let Err(e) = crate::io::atomic_write(&self.path, &data) {
            tracing::warn!(path = %self.path.display(), key, error = %e, "store write dropped");
        }
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match read_entries(&self.path) {
            Some(mut disk) => disk.remove(key),
            None => lock(&self.observed).get(key).cloned(),
        }
    }

    fn set(&self, key: &str, value: &str) {
        self.update(key, Some(value));
    }

    fn remove(&self, key: &str) {
        self.update(key, None);
    }
}

/// Read the backing file. A missing file is an empty store; an unreadable
/// one is `None`; a corrupt one reads as empty.
fn read_entries(path: &Path) -> Option<Entries> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Some(Entries::new()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "store unreadable");
            return None;
        }
    };
    if data.trim().is_empty() {
        return Some(Entries::new());
    }
    match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&data) {
        Ok(map) => Some(
            map.into_iter()
                .filter_map(|(k, v)| match v {
                    serde_json::Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect(),
        ),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "store file corrupt, treating as empty");
            Some(Entries::new())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
