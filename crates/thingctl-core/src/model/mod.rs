// ── Domain model ──

pub mod device;
pub mod device_id;

pub use device::{AttributeMap, AttributeValue, DeviceSnapshot, capability, ensure_unique_ids};
pub use device_id::{DeviceId, parse_ids};
