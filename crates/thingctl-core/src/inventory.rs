// ── JSON inventory backend ──
//
// A local file holding a JSON array of device snapshots. It serves as
// both collaborators: the data source reads it, the action sink applies
// commands to it and writes it back atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{AttributeValue, DeviceId, DeviceSnapshot, capability, ensure_unique_ids};
use crate::source::{ActionSink, DeviceCommand, DeviceSource, SinkError};

#[derive(Debug, Clone)]
pub struct InventoryFile {
    path: PathBuf,
}

impl InventoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> CoreError {
        CoreError::SourceUnavailable {
            reason: format!("{}: {reason}", self.path.display()),
        }
    }

    fn read(&self) -> Result<Vec<DeviceSnapshot>, CoreError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;
        let devices: Vec<DeviceSnapshot> =
            serde_json::from_str(&raw).map_err(|e| self.unavailable(e))?;
        ensure_unique_ids(&devices).map_err(|e| self.unavailable(e))?;
        Ok(devices)
    }

    /// Replace the whole inventory.
    pub fn write(&self, devices: &[DeviceSnapshot]) -> Result<(), CoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let json = serde_json::to_vec_pretty(devices).map_err(|e| self.unavailable(e))?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CoreError::storage(dir, e))?;
        tmp.write_all(&json)
            .map_err(|e| CoreError::storage(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| CoreError::storage(&self.path, e.error))?;
        Ok(())
    }
}

impl DeviceSource for InventoryFile {
    fn list_devices(&self) -> Result<Vec<DeviceSnapshot>, CoreError> {
        let devices = self.read()?;
        debug!(path = %self.path.display(), devices = devices.len(), "inventory loaded");
        Ok(devices)
    }
}

impl ActionSink for InventoryFile {
    fn apply(&self, device: &DeviceId, command: &DeviceCommand) -> Result<(), SinkError> {
        let mut devices = self.read().map_err(|e| SinkError::Network(e.to_string()))?;
        let index = devices
            .iter()
            .position(|d| &d.id == device)
            .ok_or_else(|| SinkError::NotFound(device.to_string()))?;

        match *command {
            DeviceCommand::Refresh => return Ok(()),
            DeviceCommand::Delete => {
                devices.remove(index);
            }
            DeviceCommand::SwitchOn | DeviceCommand::SwitchOff => {
                let state = if *command == DeviceCommand::SwitchOn { "on" } else { "off" };
                set_attribute(
                    &mut devices,
                    index,
                    capability::SWITCH,
                    capability::SWITCH_ATTR,
                    AttributeValue::from(state),
                )?;
            }
            DeviceCommand::SetLevel { percent } => {
                set_attribute(
                    &mut devices,
                    index,
                    capability::SWITCH_LEVEL,
                    capability::LEVEL_ATTR,
                    AttributeValue::Integer(i64::from(percent)),
                )?;
            }
        }

        self.write(&devices)
            .map_err(|e| SinkError::Network(e.to_string()))?;
        debug!(device = %device, ?command, "inventory updated");
        Ok(())
    }
}

fn set_attribute(
    devices: &mut [DeviceSnapshot],
    index: usize,
    cap: &str,
    name: &str,
    value: AttributeValue,
) -> Result<(), SinkError> {
    let Some(device) = devices.get_mut(index) else {
        return Err(SinkError::NotFound(index.to_string()));
    };
    if !device.has_capability(cap) {
        return Err(SinkError::Validation(format!(
            "{} does not support {cap}",
            device.id
        )));
    }
    device
        .attributes
        .entry(cap.to_owned())
        .or_default()
        .insert(name.to_owned(), value);
    Ok(())
}
