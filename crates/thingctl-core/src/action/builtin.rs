// ── Built-in actions ──

use super::Action;
use crate::error::CoreError;
use crate::model::capability;
use crate::source::{ActionKind, DeviceCommand};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchOn;

impl Action for SwitchOn {
    fn kind(&self) -> ActionKind {
        ActionKind::SwitchOn
    }

    fn command(&self) -> Result<DeviceCommand, CoreError> {
        Ok(DeviceCommand::SwitchOn)
    }

    fn required_capability(&self) -> Option<&'static str> {
        Some(capability::SWITCH)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchOff;

impl Action for SwitchOff {
    fn kind(&self) -> ActionKind {
        ActionKind::SwitchOff
    }

    fn command(&self) -> Result<DeviceCommand, CoreError> {
        Ok(DeviceCommand::SwitchOff)
    }

    fn required_capability(&self) -> Option<&'static str> {
        Some(capability::SWITCH)
    }
}

/// Set a dimmer level. The percent is checked on every execution, so an
/// out-of-range value fails each device without reaching the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLevel {
    percent: i32,
}

impl SetLevel {
    pub const MAX: i32 = 100;

    pub fn new(percent: i32) -> Self {
        Self { percent }
    }

    /// Like [`SetLevel::new`] but rejects an invalid percent up front.
    pub fn checked(percent: i32) -> Result<Self, CoreError> {
        let action = Self::new(percent);
        action.validate()?;
        Ok(action)
    }

    pub fn percent(&self) -> i32 {
        self.percent
    }
}

impl Action for SetLevel {
    fn kind(&self) -> ActionKind {
        ActionKind::SetLevel
    }

    fn command(&self) -> Result<DeviceCommand, CoreError> {
        match u8::try_from(self.percent) {
            Ok(percent) if i32::from(percent) <= Self::MAX => Ok(DeviceCommand::SetLevel { percent }),
            _ => Err(CoreError::config(format!(
                "level must be between 0 and {}, got {}",
                Self::MAX,
                self.percent
            ))),
        }
    }

    fn required_capability(&self) -> Option<&'static str> {
        Some(capability::SWITCH_LEVEL)
    }

    fn describe(&self) -> String {
        format!("set-level {}%", self.percent)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Refresh;

impl Action for Refresh {
    fn kind(&self) -> ActionKind {
        ActionKind::Refresh
    }

    fn command(&self) -> Result<DeviceCommand, CoreError> {
        Ok(DeviceCommand::Refresh)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delete;

impl Action for Delete {
    fn kind(&self) -> ActionKind {
        ActionKind::Delete
    }

    fn command(&self) -> Result<DeviceCommand, CoreError> {
        Ok(DeviceCommand::Delete)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::action::OutcomeStatus;
    use crate::model::DeviceId;
    use crate::source::{ActionSink, FailureKind, SinkError};

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<DeviceCommand>>,
        fail_with: Option<SinkError>,
    }

    impl ActionSink for Recorder {
        fn apply(&self, _device: &DeviceId, command: &DeviceCommand) -> Result<(), SinkError> {
            self.calls.borrow_mut().push(*command);
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    fn id() -> DeviceId {
        DeviceId::new("d1").unwrap()
    }

    #[test]
    fn switch_on_reaches_sink() {
        let sink = Recorder::default();
        let outcome = SwitchOn.execute(&id(), &sink);
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(*sink.calls.borrow(), vec![DeviceCommand::SwitchOn]);
    }

    #[test]
    fn level_bounds_are_inclusive() {
        assert!(SetLevel::checked(0).is_ok());
        assert!(SetLevel::checked(100).is_ok());
        assert!(SetLevel::checked(101).is_err());
        assert!(SetLevel::checked(-1).is_err());
    }

    #[test]
    fn invalid_level_never_calls_sink() {
        let sink = Recorder::default();
        let outcome = SetLevel::new(150).execute(&id(), &sink);
        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(outcome.error, Some(FailureKind::Configuration));
        assert!(sink.calls.borrow().is_empty());
    }

    #[test]
    fn sink_error_becomes_failed_outcome() {
        let sink = Recorder {
            fail_with: Some(SinkError::Permission("read-only token".into())),
            ..Recorder::default()
        };
        let outcome = Delete.execute(&id(), &sink);
        assert!(outcome.is_failed());
        assert_eq!(outcome.error, Some(FailureKind::Permission));
        assert!(outcome.detail.unwrap().contains("read-only token"));
    }

    #[test]
    fn required_capabilities() {
        assert_eq!(SwitchOff.required_capability(), Some("switch"));
        assert_eq!(SetLevel::new(10).required_capability(), Some("switchLevel"));
        assert_eq!(Refresh.required_capability(), None);
    }
}
