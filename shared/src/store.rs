//! File-backed append stores.
//!
//! Every persistent store in the platform (patients, authorization codes,
//! refresh tokens, the idempotency cache, clinical transfer status) is a
//! JSON-Lines file with an in-memory index rebuilt on start. Mutation is
//! guarded by a single `Mutex`, matching the "single serializing primitive"
//! ownership model described for shared mutable stores: a store is the only
//! actor allowed to touch its own file, and every write replaces the file
//! atomically (write-temporary, rename) so a crash mid-write never leaves a
//! truncated or partially-written store behind.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record that can be indexed by a stable string key within its store.
pub trait Keyed {
    fn store_key(&self) -> String;
}

/// A JSON-Lines file with an in-memory `BTreeMap` index.
///
/// `BTreeMap` (rather than `HashMap`) is used deliberately: rewriting the
/// file iterates the index in key order, which keeps the on-disk
/// representation in sorted-key order run to run, matching §6's
/// "sorted-key JSON for deterministic diff" requirement.
pub struct AppendStore<T> {
    path: PathBuf,
    records: Mutex<BTreeMap<String, T>>,
}

impl<T> AppendStore<T>
where
    T: Keyed + Clone + Serialize + DeserializeOwned,
{
    /// Load the store from `path`, rebuilding the index from whatever is on
    /// disk. `retain` decides whether a loaded record survives into the
    /// index (used to drop already-expired entries on start). A missing
    /// file is treated as an empty store, not an error.
    pub fn open(path: impl Into<PathBuf>, mut retain: impl FnMut(&T) -> bool) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut records = BTreeMap::new();
        if let Ok(contents) = fs::read_to_string(&path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<T>(line) {
                    Ok(record) if retain(&record) => {
                        records.insert(record.store_key(), record);
                    }
                    Ok(_) => {} // expired, dropped
                    Err(err) => {
                        log::warn!("skipping corrupt record in {}: {err}", path.display());
                    }
                }
            }
        }
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Run `f` with exclusive, mutable access to the index, then persist the
    /// result atomically. This is the store's single mutation authority:
    /// every insert, atomic consume, and prune goes through here, so a
    /// `check-then-insert` done entirely inside `f` is a single
    /// compare-and-swap from the caller's perspective.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut BTreeMap<String, T>) -> R) -> anyhow::Result<R> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let result = f(&mut guard);
        self.flush(&guard)?;
        Ok(result)
    }

    /// Run `f` with shared, read-only access to the index.
    pub fn read<R>(&self, f: impl FnOnce(&BTreeMap<String, T>) -> R) -> R {
        let guard = self.records.lock().expect("store mutex poisoned");
        f(&guard)
    }

    fn flush(&self, records: &BTreeMap<String, T>) -> anyhow::Result<()> {
        let mut buf = String::new();
        for record in records.values() {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }
        atomic_write(&self.path, buf.as_bytes())
    }
}

/// An append-only log file, for audit trails that are never rewritten or
/// pruned. Concurrent appenders are serialized by an in-process lock; the
/// file itself is opened in append mode so a single writer per process is
/// sufficient (no O_APPEND torn-write races across processes are expected,
/// since each service owns exactly one log file).
pub struct AppendLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AppendLog {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn append<T: Serialize>(&self, entry: &T) -> anyhow::Result<()> {
        let _guard = self.lock.lock().expect("log mutex poisoned");
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read back all entries, for tests and diagnostics.
    pub fn read_all(&self) -> anyhow::Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Write `data` to `path` via write-temporary-then-rename, the atomicity
/// primitive every store in the platform relies on. Exposed for callers that
/// need a single atomically-persisted value outside the `AppendStore`/
/// `AppendLog` shapes (e.g. a monotonic id counter).
pub fn atomic_write(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Widget {
        id: String,
        value: u32,
    }

    impl Keyed for Widget {
        fn store_key(&self) -> String {
            self.id.clone()
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widgets.txt");

        let store: AppendStore<Widget> = AppendStore::open(&path, |_| true).unwrap();
        store
            .mutate(|m| {
                m.insert(
                    "a".into(),
                    Widget {
                        id: "a".into(),
                        value: 1,
                    },
                );
            })
            .unwrap();

        let reloaded: AppendStore<Widget> = AppendStore::open(&path, |_| true).unwrap();
        let value = reloaded.read(|m| m.get("a").cloned());
        assert_eq!(
            value,
            Some(Widget {
                id: "a".into(),
                value: 1
            })
        );
    }

    #[test]
    fn retain_predicate_drops_expired_entries_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widgets.txt");

        let store: AppendStore<Widget> = AppendStore::open(&path, |_| true).unwrap();
        store
            .mutate(|m| {
                m.insert(
                    "expired".into(),
                    Widget {
                        id: "expired".into(),
                        value: 0,
                    },
                );
            })
            .unwrap();

        let reloaded: AppendStore<Widget> = AppendStore::open(&path, |w| w.value != 0).unwrap();
        assert_eq!(reloaded.read(|m| m.len()), 0);
    }

    #[test]
    fn atomic_consume_removes_entry_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.txt");
        let store: AppendStore<Widget> = AppendStore::open(&path, |_| true).unwrap();
        store
            .mutate(|m| {
                m.insert(
                    "code".into(),
                    Widget {
                        id: "code".into(),
                        value: 7,
                    },
                );
            })
            .unwrap();

        let first = store.mutate(|m| m.remove("code")).unwrap();
        let second = store.mutate(|m| m.remove("code")).unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[test]
    fn append_log_never_rewrites_prior_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = AppendLog::open(&path).unwrap();
        log.append(&serde_json::json!({"n": 1})).unwrap();
        log.append(&serde_json::json!({"n": 2})).unwrap();
        let contents = log.read_all().unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().next().unwrap().contains("\"n\":1"));
    }
}
