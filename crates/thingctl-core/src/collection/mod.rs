// ── Named device collections ──
//
// A collection stores identifiers only, never snapshots, so it must be
// resolved against a fresh snapshot set before use.

pub mod manager;
pub mod store;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{DeviceId, DeviceSnapshot};

pub use manager::CollectionManager;
pub use store::{CollectionStore, FileStore, MemoryStore};

/// Named, ordered, de-duplicated set of device ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    name: String,
    device_ids: IndexSet<DeviceId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        validate_name(&name)?;
        let now = Utc::now();
        Ok(Self {
            name,
            device_ids: IndexSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a collection from ids; later duplicates are dropped.
    pub fn with_ids(
        name: impl Into<String>,
        ids: impl IntoIterator<Item = DeviceId>,
    ) -> Result<Self, CoreError> {
        let mut collection = Self::new(name)?;
        collection.device_ids.extend(ids);
        Ok(collection)
    }

    pub(crate) fn from_parts(
        name: String,
        device_ids: IndexSet<DeviceId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            device_ids,
            created_at,
            updated_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ids(&self) -> impl ExactSizeIterator<Item = &DeviceId> {
        self.device_ids.iter()
    }

    pub fn to_ids(&self) -> Vec<DeviceId> {
        self.device_ids.iter().cloned().collect()
    }

    pub fn contains(&self, id: &DeviceId) -> bool {
        self.device_ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.device_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.device_ids.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Append ids not already present. Returns how many were new.
    pub fn add(&mut self, ids: impl IntoIterator<Item = DeviceId>) -> usize {
        let added = ids
            .into_iter()
            .filter(|id| self.device_ids.insert(id.clone()))
            .count();
        if added > 0 {
            self.touch();
        }
        added
    }

    /// Remove ids, preserving the order of the rest. Absent ids are ignored.
    pub fn remove<'a>(&mut self, ids: impl IntoIterator<Item = &'a DeviceId>) -> usize {
        let removed = ids
            .into_iter()
            .filter(|id| self.device_ids.shift_remove(*id))
            .count();
        if removed > 0 {
            self.touch();
        }
        removed
    }

    /// Append the other collection's ids in its order, skipping duplicates.
    pub fn merge(&mut self, other: &Collection) -> usize {
        self.add(other.ids().cloned())
    }

    /// Replace the members wholesale, keeping `created_at`.
    pub fn replace_ids(&mut self, ids: impl IntoIterator<Item = DeviceId>) {
        self.device_ids = ids.into_iter().collect();
        self.touch();
    }

    /// Map stored ids onto live snapshots, in collection order.
    pub fn resolve<'a>(&self, live: &'a [DeviceSnapshot]) -> Resolution<'a> {
        let by_id: HashMap<&DeviceId, &DeviceSnapshot> = live.iter().map(|d| (&d.id, d)).collect();
        let mut resolution = Resolution::default();
        for id in &self.device_ids {
            match by_id.get(id) {
                Some(device) => resolution.devices.push(*device),
                None => resolution.missing.push(id.clone()),
            }
        }
        resolution
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// Outcome of [`Collection::resolve`]: live devices plus ids that no
/// longer exist upstream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution<'a> {
    pub devices: Vec<&'a DeviceSnapshot>,
    pub missing: Vec<DeviceId>,
}

impl Resolution<'_> {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|d| d.id.clone()).collect()
    }
}

// ── Naming ──────────────────────────────────────────────────────────

/// Names may contain letters, digits, space, `-`, `_` and `.`.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::config("collection name must not be empty"));
    }
    if name.starts_with('.') {
        return Err(CoreError::config(format!(
            "collection name {name:?} must not start with '.'"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.')))
    {
        return Err(CoreError::config(format!(
            "collection name {name:?} contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

/// Storage key for a name: lowercase, spaces become underscores.
pub fn storage_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}
