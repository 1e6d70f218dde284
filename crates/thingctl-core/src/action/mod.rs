// ── Device actions ──
//
// An `Action` turns its own parameters into a `DeviceCommand`, validating
// them first, then hands the command to the sink. Whatever happens, the
// caller gets exactly one `ActionOutcome` back.

pub mod builtin;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::model::DeviceId;
use crate::source::{ActionKind, ActionSink, DeviceCommand, FailureKind};

pub use builtin::{Delete, Refresh, SetLevel, SwitchOff, SwitchOn};

/// One operation applicable to one device at a time.
pub trait Action: fmt::Debug + Send + Sync {
    fn kind(&self) -> ActionKind;

    /// Validate parameters and produce the sink command. Must not touch
    /// the sink, so configuration errors cost no platform call.
    fn command(&self) -> Result<DeviceCommand, CoreError>;

    /// Capability a device must report for this action to make sense.
    fn required_capability(&self) -> Option<&'static str> {
        None
    }

    /// Human-readable form for logs and prompts.
    fn describe(&self) -> String {
        self.kind().to_string()
    }

    fn validate(&self) -> Result<(), CoreError> {
        self.command().map(|_| ())
    }

    fn execute(&self, device: &DeviceId, sink: &dyn ActionSink) -> ActionOutcome {
        let command = match self.command() {
            Ok(command) => command,
            Err(e) => {
                return ActionOutcome::failed(device.clone(), FailureKind::Configuration, e.to_string());
            }
        };
        match sink.apply(device, &command) {
            Ok(()) => ActionOutcome::success(device.clone()),
            Err(e) => ActionOutcome::failed(device.clone(), e.kind(), e.to_string()),
        }
    }
}

impl<A: Action + ?Sized> Action for Box<A> {
    fn kind(&self) -> ActionKind {
        (**self).kind()
    }

    fn command(&self) -> Result<DeviceCommand, CoreError> {
        (**self).command()
    }

    fn required_capability(&self) -> Option<&'static str> {
        (**self).required_capability()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn execute(&self, device: &DeviceId, sink: &dyn ActionSink) -> ActionOutcome {
        (**self).execute(device, sink)
    }
}

// ── Outcomes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failed,
    Skipped,
}

/// Result of one action against one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub device_id: DeviceId,
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActionOutcome {
    pub fn success(device_id: DeviceId) -> Self {
        Self {
            device_id,
            status: OutcomeStatus::Success,
            error: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(device_id: DeviceId, error: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            device_id,
            status: OutcomeStatus::Failed,
            error: Some(error),
            detail: Some(detail.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn skipped(device_id: DeviceId, detail: impl Into<String>) -> Self {
        Self {
            device_id,
            status: OutcomeStatus::Skipped,
            error: None,
            detail: Some(detail.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}
