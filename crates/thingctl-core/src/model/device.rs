// ── Device snapshot domain types ──

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::device_id::DeviceId;
use crate::error::CoreError;

/// Well-known capability and attribute names.
pub mod capability {
    pub const SWITCH: &str = "switch";
    pub const SWITCH_LEVEL: &str = "switchLevel";
    pub const BATTERY: &str = "battery";

    /// Attribute holding `"on"` / `"off"` under the `switch` capability.
    pub const SWITCH_ATTR: &str = "switch";
    /// Attribute holding 0-100 under the `switchLevel` capability.
    pub const LEVEL_ATTR: &str = "level";
    /// Attribute holding a percentage under the `battery` capability.
    pub const BATTERY_ATTR: &str = "battery";
}

/// A typed attribute value reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    /// Numeric view for threshold comparisons. Text and booleans have none.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// Attributes grouped by capability, then by attribute name.
pub type AttributeMap = BTreeMap<String, BTreeMap<String, AttributeValue>>;

/// Read-only view of one device at query time.
///
/// Built by a [`DeviceSource`](crate::source::DeviceSource); nothing in the
/// core mutates a snapshot once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub label: String,
    #[serde(default)]
    pub room: Option<String>,
    /// Declared device type (e.g. "Light", "Motion Sensor").
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default)]
    pub attributes: AttributeMap,
    #[serde(default)]
    pub online: bool,
}

impl DeviceSnapshot {
    pub fn new(id: DeviceId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            room: None,
            device_type: None,
            capabilities: BTreeSet::new(),
            attributes: AttributeMap::new(),
            online: false,
        }
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    pub fn with_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Record an attribute, declaring its capability as a side effect.
    pub fn with_attribute(
        mut self,
        capability: &str,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.capabilities.insert(capability.to_owned());
        self.attributes
            .entry(capability.to_owned())
            .or_default()
            .insert(name.to_owned(), value.into());
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    /// Look up an attribute by `(capability, name)`.
    ///
    /// Attributes under a capability the device does not report are
    /// treated as missing.
    pub fn attribute(&self, capability: &str, name: &str) -> Option<&AttributeValue> {
        if !self.has_capability(capability) {
            return None;
        }
        self.attributes.get(capability)?.get(name)
    }

    /// Battery percentage, when reported.
    pub fn battery_level(&self) -> Option<f64> {
        self.attribute(capability::BATTERY, capability::BATTERY_ATTR)
            .and_then(AttributeValue::as_number)
    }
}

/// Verify the id uniqueness invariant across one snapshot set.
pub fn ensure_unique_ids(snapshots: &[DeviceSnapshot]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(snapshots.len());
    for snap in snapshots {
        if !seen.insert(&snap.id) {
            return Err(CoreError::config(format!(
                "duplicate device id in snapshot set: {}",
                snap.id
            )));
        }
    }
    Ok(())
}
