// ── Collection persistence ──
//
// One JSON record per collection, keyed by `storage_key(name)`. Writes go
// through a temp file in the same directory and are renamed into place,
// so a reader never sees a half-written record. Create uses a
// no-clobber rename, which makes the duplicate check atomic.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{Collection, storage_key};
use crate::error::CoreError;
use crate::model::DeviceId;

/// Durable key-value store of collections.
pub trait CollectionStore {
    fn load(&self, name: &str) -> Result<Option<Collection>, CoreError>;

    /// Persist a new record. Fails with `DuplicateName` if the key exists;
    /// the existing record is left untouched.
    fn create(&self, collection: &Collection) -> Result<(), CoreError>;

    /// Create or overwrite.
    fn save(&self, collection: &Collection) -> Result<(), CoreError>;

    /// Returns whether a record was removed.
    fn delete(&self, name: &str) -> Result<bool, CoreError>;

    /// Names of all persisted collections, unordered.
    fn names(&self) -> Result<Vec<String>, CoreError>;
}

// ── On-disk record ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    name: String,
    #[serde(default)]
    device_count: usize,
    device_ids: Vec<DeviceId>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: DateTime<Utc>,
}

impl From<&Collection> for Record {
    fn from(c: &Collection) -> Self {
        Self {
            name: c.name().to_owned(),
            device_count: c.len(),
            device_ids: c.to_ids(),
            created_at: c.created_at(),
            updated_at: c.updated_at(),
        }
    }
}

impl From<Record> for Collection {
    fn from(r: Record) -> Self {
        let ids: IndexSet<DeviceId> = r.device_ids.into_iter().collect();
        Collection::from_parts(r.name, ids, r.created_at, r.updated_at)
    }
}

// ── FileStore ───────────────────────────────────────────────────────

/// One `<key>.json` file per collection under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", storage_key(name)))
    }

    fn read_record(path: &Path) -> Result<Option<Record>, CoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::storage(path, e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Serialize into a temp file beside the target, ready to be renamed.
    fn stage(&self, collection: &Collection) -> Result<NamedTempFile, CoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| CoreError::storage(&self.dir, e))?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| CoreError::storage(&self.dir, e))?;
        let json = serde_json::to_vec_pretty(&Record::from(collection)).map_err(|source| {
            CoreError::Corrupt {
                path: self.path_for(collection.name()),
                source,
            }
        })?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| CoreError::storage(tmp.path(), e))?;
        Ok(tmp)
    }
}

impl CollectionStore for FileStore {
    fn load(&self, name: &str) -> Result<Option<Collection>, CoreError> {
        Ok(Self::read_record(&self.path_for(name))?.map(Collection::from))
    }

    fn create(&self, collection: &Collection) -> Result<(), CoreError> {
        let path = self.path_for(collection.name());
        let tmp = self.stage(collection)?;
        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(path = %path.display(), "collection record created");
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Err(CoreError::DuplicateName {
                name: collection.name().to_owned(),
            }),
            Err(e) => Err(CoreError::storage(path, e.error)),
        }
    }

    fn save(&self, collection: &Collection) -> Result<(), CoreError> {
        let path = self.path_for(collection.name());
        let tmp = self.stage(collection)?;
        tmp.persist(&path)
            .map_err(|e| CoreError::storage(&path, e.error))?;
        debug!(path = %path.display(), "collection record written");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool, CoreError> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CoreError::storage(path, e)),
        }
    }

    fn names(&self) -> Result<Vec<String>, CoreError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::storage(&self.dir, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CoreError::storage(&self.dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read_record(&path) {
                Ok(Some(record)) => names.push(record.name),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable collection record"),
            }
        }
        Ok(names)
    }
}

// ── MemoryStore ─────────────────────────────────────────────────────

/// Process-local store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_records<T>(&self, f: impl FnOnce(&mut BTreeMap<String, Collection>) -> T) -> T {
        let mut guard = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl CollectionStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<Collection>, CoreError> {
        Ok(self.with_records(|r| r.get(&storage_key(name)).cloned()))
    }

    fn create(&self, collection: &Collection) -> Result<(), CoreError> {
        self.with_records(|r| {
            let key = storage_key(collection.name());
            if r.contains_key(&key) {
                return Err(CoreError::DuplicateName {
                    name: collection.name().to_owned(),
                });
            }
            r.insert(key, collection.clone());
            Ok(())
        })
    }

    fn save(&self, collection: &Collection) -> Result<(), CoreError> {
        self.with_records(|r| {
            r.insert(storage_key(collection.name()), collection.clone());
        });
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.with_records(|r| r.remove(&storage_key(name)).is_some()))
    }

    fn names(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.with_records(|r| r.values().map(|c| c.name().to_owned()).collect()))
    }
}
