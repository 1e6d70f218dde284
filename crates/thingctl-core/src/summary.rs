// ── Inventory summary ──

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{DeviceId, DeviceSnapshot};

pub const UNASSIGNED_ROOM: &str = "Unassigned";
pub const UNKNOWN_TYPE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryLevel {
    pub device_id: DeviceId,
    pub label: String,
    pub level: f64,
}

/// Aggregate view over a snapshot set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventorySummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub online_percent: f64,
    pub offline_percent: f64,
    pub by_type: BTreeMap<String, usize>,
    pub by_room: BTreeMap<String, usize>,
    /// Lowest first.
    pub battery_levels: Vec<BatteryLevel>,
}

pub fn summarize<'a>(devices: impl IntoIterator<Item = &'a DeviceSnapshot>) -> InventorySummary {
    let mut summary = InventorySummary::default();
    for device in devices {
        summary.total += 1;
        if device.online {
            summary.online += 1;
        } else {
            summary.offline += 1;
        }
        let kind = device.device_type.as_deref().unwrap_or(UNKNOWN_TYPE);
        *summary.by_type.entry(kind.to_owned()).or_default() += 1;
        let room = device.room.as_deref().unwrap_or(UNASSIGNED_ROOM);
        *summary.by_room.entry(room.to_owned()).or_default() += 1;
        if let Some(level) = device.battery_level() {
            summary.battery_levels.push(BatteryLevel {
                device_id: device.id.clone(),
                label: device.label.clone(),
                level,
            });
        }
    }
    summary.online_percent = percent(summary.online, summary.total);
    summary.offline_percent = percent(summary.offline, summary.total);
    summary
        .battery_levels
        .sort_by(|a, b| a.level.total_cmp(&b.level).then_with(|| a.device_id.cmp(&b.device_id)));
    summary
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
