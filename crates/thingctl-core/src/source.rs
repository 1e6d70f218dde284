// ── External collaborators ──
//
// The core never talks to the device platform directly. Snapshots come
// from a `DeviceSource`, state changes go out through an `ActionSink`.
// Transport, auth and retries live behind these traits.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::error::CoreError;
use crate::model::{DeviceId, DeviceSnapshot};

/// Supplies the full snapshot set for one query.
pub trait DeviceSource {
    /// Fails with [`CoreError::SourceUnavailable`] when the platform cannot
    /// be reached or read.
    fn list_devices(&self) -> Result<Vec<DeviceSnapshot>, CoreError>;
}

/// Executes one command against one device.
///
/// Implementations own their timeout and retry policy; a call must
/// return rather than hang.
pub trait ActionSink {
    fn apply(&self, device: &DeviceId, command: &DeviceCommand) -> Result<(), SinkError>;
}

impl<T: DeviceSource + ?Sized> DeviceSource for &T {
    fn list_devices(&self) -> Result<Vec<DeviceSnapshot>, CoreError> {
        (**self).list_devices()
    }
}

impl<T: ActionSink + ?Sized> ActionSink for &T {
    fn apply(&self, device: &DeviceId, command: &DeviceCommand) -> Result<(), SinkError> {
        (**self).apply(device, command)
    }
}

// ── Commands ────────────────────────────────────────────────────────

/// The write operations a sink understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DeviceCommand {
    SwitchOn,
    SwitchOff,
    SetLevel { percent: u8 },
    Refresh,
    Delete,
}

impl DeviceCommand {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::SwitchOn => ActionKind::SwitchOn,
            Self::SwitchOff => ActionKind::SwitchOff,
            Self::SetLevel { .. } => ActionKind::SetLevel,
            Self::Refresh => ActionKind::Refresh,
            Self::Delete => ActionKind::Delete,
        }
    }
}

/// Stable name of an action, used in logs and reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    SwitchOn,
    SwitchOff,
    SetLevel,
    Refresh,
    Delete,
}

// ── Sink errors ─────────────────────────────────────────────────────

/// Why a sink call failed. Recorded per device, never escalated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("network error: {0}")]
    Network(String),

    #[error("device not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("rejected by platform: {0}")]
    Validation(String),

    #[error("timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl SinkError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Permission(_) => FailureKind::Permission,
            Self::Validation(_) => FailureKind::Validation,
            Self::Timeout { .. } => FailureKind::Timeout,
        }
    }
}

/// Failure category carried on a failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize)]
pub enum FailureKind {
    #[strum(serialize = "NetworkError")]
    #[serde(rename = "NetworkError")]
    Network,
    #[strum(serialize = "NotFoundError")]
    #[serde(rename = "NotFoundError")]
    NotFound,
    #[strum(serialize = "PermissionError")]
    #[serde(rename = "PermissionError")]
    Permission,
    #[strum(serialize = "ValidationError")]
    #[serde(rename = "ValidationError")]
    Validation,
    #[strum(serialize = "TimeoutError")]
    #[serde(rename = "TimeoutError")]
    Timeout,
    /// Action parameters rejected before any sink call.
    #[strum(serialize = "ConfigurationError")]
    #[serde(rename = "ConfigurationError")]
    Configuration,
}
