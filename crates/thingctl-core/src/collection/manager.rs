// ── Collection manager ──
//
// The operations callers use. Each one is a single load/modify/persist
// cycle against the store; no state is cached between calls.

use tracing::{info, warn};

use super::store::CollectionStore;
use super::{Collection, Resolution, validate_name};
use crate::error::CoreError;
use crate::model::{DeviceId, DeviceSnapshot};

#[derive(Debug)]
pub struct CollectionManager<S> {
    store: S,
}

impl<S: CollectionStore> CollectionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist a new collection. Fails with `DuplicateName` when the name
    /// is taken, leaving the existing record as it was.
    pub fn create(
        &self,
        name: &str,
        initial_ids: impl IntoIterator<Item = DeviceId>,
    ) -> Result<Collection, CoreError> {
        let collection = Collection::with_ids(name, initial_ids)?;
        self.store.create(&collection)?;
        info!(collection = name, devices = collection.len(), "collection created");
        Ok(collection)
    }

    /// Create or replace `name` with exactly `ids`. An existing record
    /// keeps its creation time.
    pub fn save(
        &self,
        name: &str,
        ids: impl IntoIterator<Item = DeviceId>,
    ) -> Result<Collection, CoreError> {
        validate_name(name)?;
        let collection = match self.store.load(name)? {
            Some(mut existing) => {
                existing.replace_ids(ids);
                existing
            }
            None => Collection::with_ids(name, ids)?,
        };
        self.store.save(&collection)?;
        info!(collection = name, devices = collection.len(), "collection saved");
        Ok(collection)
    }

    pub fn load(&self, name: &str) -> Result<Collection, CoreError> {
        validate_name(name)?;
        self.store
            .load(name)?
            .ok_or_else(|| CoreError::collection_not_found(name))
    }

    /// Add ids; already-present ids are ignored.
    pub fn add(
        &self,
        name: &str,
        ids: impl IntoIterator<Item = DeviceId>,
    ) -> Result<Collection, CoreError> {
        let mut collection = self.load(name)?;
        let added = collection.add(ids);
        if added > 0 {
            self.store.save(&collection)?;
        }
        info!(collection = name, added, "collection updated");
        Ok(collection)
    }

    /// Remove ids; absent ids are ignored.
    pub fn remove(&self, name: &str, ids: &[DeviceId]) -> Result<Collection, CoreError> {
        let mut collection = self.load(name)?;
        let removed = collection.remove(ids);
        if removed > 0 {
            self.store.save(&collection)?;
        }
        info!(collection = name, removed, "collection updated");
        Ok(collection)
    }

    /// Append `source`'s ids to `target`. `source` is not modified.
    pub fn merge(&self, target: &str, source: &str) -> Result<Collection, CoreError> {
        let other = self.load(source)?;
        let mut collection = self.load(target)?;
        let added = collection.merge(&other);
        if added > 0 {
            self.store.save(&collection)?;
        }
        info!(collection = target, from = source, added, "collections merged");
        Ok(collection)
    }

    pub fn delete(&self, name: &str) -> Result<(), CoreError> {
        validate_name(name)?;
        if !self.store.delete(name)? {
            return Err(CoreError::collection_not_found(name));
        }
        info!(collection = name, "collection deleted");
        Ok(())
    }

    /// Persisted names in lexicographic order.
    pub fn list(&self) -> Result<Vec<String>, CoreError> {
        let mut names = self.store.names()?;
        names.sort();
        Ok(names)
    }

    /// Resolve against live snapshots. Missing ids are reported, not fatal.
    pub fn resolve<'a>(&self, collection: &Collection, live: &'a [DeviceSnapshot]) -> Resolution<'a> {
        let resolution = collection.resolve(live);
        if !resolution.is_complete() {
            let missing: Vec<&str> = resolution.missing.iter().map(DeviceId::as_str).collect();
            warn!(
                collection = collection.name(),
                missing = ?missing,
                "collection references devices that no longer exist"
            );
        }
        resolution
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::collection::{FileStore, MemoryStore};
    use crate::model::parse_ids;
    use pretty_assertions::assert_eq;

    fn ids(raw: &[&str]) -> Vec<DeviceId> {
        parse_ids(raw.iter().copied()).unwrap()
    }

    fn manager() -> CollectionManager<MemoryStore> {
        CollectionManager::new(MemoryStore::new())
    }

    #[test]
    fn load_and_delete_missing_are_not_found() {
        let m = manager();
        assert!(m.load("nope").unwrap_err().is_not_found());
        assert!(m.delete("nope").unwrap_err().is_not_found());
        assert!(m.add("nope", ids(&["a"])).unwrap_err().is_not_found());
    }

    #[test]
    fn list_is_lexicographic() {
        let m = manager();
        for name in ["porch", "Attic", "kitchen"] {
            m.create(name, ids(&[])).unwrap();
        }
        assert_eq!(m.list().unwrap(), vec!["Attic", "kitchen", "porch"]);
    }

    #[test]
    fn add_and_remove_persist() {
        let m = manager();
        m.create("x", ids(&["a"])).unwrap();
        m.add("x", ids(&["b", "a"])).unwrap();
        m.remove("x", &ids(&["a", "zzz"])).unwrap();
        assert_eq!(m.load("x").unwrap().to_ids(), ids(&["b"]));
    }

    #[test]
    fn save_replaces_and_keeps_created_at() {
        let m = manager();
        let first = m.create("x", ids(&["a", "b"])).unwrap();
        let replaced = m.save("x", ids(&["c"])).unwrap();
        assert_eq!(replaced.to_ids(), ids(&["c"]));
        assert_eq!(replaced.created_at(), first.created_at());
        assert_eq!(m.load("x").unwrap().to_ids(), ids(&["c"]));
    }

    #[test]
    fn merge_leaves_source_alone() {
        let m = manager();
        m.create("t", ids(&["a"])).unwrap();
        m.create("s", ids(&["b", "a"])).unwrap();
        let merged = m.merge("t", "s").unwrap();
        assert_eq!(merged.to_ids(), ids(&["a", "b"]));
        assert_eq!(m.load("s").unwrap().to_ids(), ids(&["b", "a"]));
    }

    #[test]
    fn invalid_name_is_configuration_error() {
        let m = manager();
        assert!(matches!(
            m.create("a/b", ids(&[])).unwrap_err(),
            CoreError::Configuration { .. }
        ));
    }

    #[test]
    fn different_names_do_not_interfere_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let a = CollectionManager::new(FileStore::new(dir.path()));
        let b = CollectionManager::new(FileStore::new(dir.path()));
        a.create("one", ids(&["a"])).unwrap();
        b.create("two", ids(&["b"])).unwrap();
        a.add("one", ids(&["c"])).unwrap();
        assert_eq!(b.load("two").unwrap().to_ids(), ids(&["b"]));
        assert_eq!(b.load("one").unwrap().to_ids(), ids(&["a", "c"]));
    }
}
