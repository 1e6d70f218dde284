// ── Batch execution ──
//
// Applies one action to many devices, sequentially and in target order.
// Each target yields exactly one outcome; a failing target never stops
// the ones after it. No retries happen here.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::action::{Action, ActionOutcome, OutcomeStatus};
use crate::model::{DeviceId, DeviceSnapshot};
use crate::source::{ActionKind, ActionSink};

/// Aggregate verdict over a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// No target failed. Includes the empty batch.
    Completed,
    /// Some targets failed, at least one succeeded.
    CompletedWithErrors,
    /// Some targets failed and none succeeded.
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Ordered outcomes of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub action: ActionKind,
    pub outcomes: Vec<ActionOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    pub fn counts(&self) -> BatchCounts {
        let mut counts = BatchCounts {
            total: self.outcomes.len(),
            ..BatchCounts::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                OutcomeStatus::Success => counts.succeeded += 1,
                OutcomeStatus::Failed => counts.failed += 1,
                OutcomeStatus::Skipped => counts.skipped += 1,
            }
        }
        counts
    }

    pub fn status(&self) -> BatchStatus {
        let counts = self.counts();
        match (counts.failed, counts.succeeded) {
            (0, _) => BatchStatus::Completed,
            (_, 0) => BatchStatus::Failed,
            _ => BatchStatus::CompletedWithErrors,
        }
    }

    /// Percent of outcomes that succeeded; 0 for an empty report.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn success_rate(&self) -> f64 {
        let counts = self.counts();
        if counts.total == 0 {
            return 0.0;
        }
        counts.succeeded as f64 / counts.total as f64 * 100.0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

// ── Runner ──────────────────────────────────────────────────────────

type Observer<'a> = Box<dyn FnMut(&ActionOutcome) + 'a>;

/// Sequential batch executor with an optional per-outcome observer
/// (used for progress reporting).
#[derive(Default)]
pub struct BatchRunner<'a> {
    observer: Option<Observer<'a>>,
}

impl fmt::Debug for BatchRunner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRunner")
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl<'a> BatchRunner<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `observer` after each outcome is recorded.
    pub fn with_observer(mut self, observer: impl FnMut(&ActionOutcome) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run `action` once per target id, in order.
    pub fn run<A>(&mut self, targets: &[DeviceId], action: &A, sink: &dyn ActionSink) -> BatchReport
    where
        A: Action + ?Sized,
    {
        let started_at = Utc::now();
        let outcomes = targets
            .iter()
            .map(|id| self.record(action.execute(id, sink)))
            .collect();
        Self::finish(action, outcomes, started_at)
    }

    /// Run `action` over resolved snapshots. Devices that lack the
    /// action's required capability are skipped without a sink call.
    pub fn run_on_devices<A>(
        &mut self,
        devices: &[&DeviceSnapshot],
        action: &A,
        sink: &dyn ActionSink,
    ) -> BatchReport
    where
        A: Action + ?Sized,
    {
        let started_at = Utc::now();
        let required = action.required_capability();
        let outcomes = devices
            .iter()
            .map(|device| {
                let outcome = match required {
                    Some(cap) if !device.has_capability(cap) => ActionOutcome::skipped(
                        device.id.clone(),
                        format!("device does not support {cap}"),
                    ),
                    _ => action.execute(&device.id, sink),
                };
                self.record(outcome)
            })
            .collect();
        Self::finish(action, outcomes, started_at)
    }

    fn record(&mut self, outcome: ActionOutcome) -> ActionOutcome {
        match outcome.status {
            OutcomeStatus::Failed => warn!(
                device = %outcome.device_id,
                error = ?outcome.error,
                detail = outcome.detail.as_deref().unwrap_or_default(),
                "action failed"
            ),
            OutcomeStatus::Skipped => debug!(device = %outcome.device_id, "action skipped"),
            OutcomeStatus::Success => debug!(device = %outcome.device_id, "action succeeded"),
        }
        if let Some(observer) = self.observer.as_mut() {
            observer(&outcome);
        }
        outcome
    }

    fn finish<A>(action: &A, outcomes: Vec<ActionOutcome>, started_at: DateTime<Utc>) -> BatchReport
    where
        A: Action + ?Sized,
    {
        let report = BatchReport {
            action: action.kind(),
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        let counts = report.counts();
        info!(
            action = %action.describe(),
            total = counts.total,
            succeeded = counts.succeeded,
            failed = counts.failed,
            skipped = counts.skipped,
            status = %report.status(),
            "batch finished"
        );
        report
    }
}

/// Run `action` over `targets` with no observer.
pub fn run<A>(targets: &[DeviceId], action: &A, sink: &dyn ActionSink) -> BatchReport
where
    A: Action + ?Sized,
{
    BatchRunner::new().run(targets, action, sink)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::action::{Refresh, SetLevel, SwitchOn};
    use crate::model::parse_ids;
    use crate::source::{DeviceCommand, FailureKind, SinkError};
    use pretty_assertions::assert_eq;

    /// Fails for the listed ids, records every call.
    #[derive(Default)]
    struct FlakySink {
        failing: Vec<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl ActionSink for FlakySink {
        fn apply(&self, device: &DeviceId, _command: &DeviceCommand) -> Result<(), SinkError> {
            self.calls.borrow_mut().push(device.to_string());
            if self.failing.iter().any(|f| *f == device.as_str()) {
                Err(SinkError::Network("connection reset".into()))
            } else {
                Ok(())
            }
        }
    }

    fn targets(raw: &[&str]) -> Vec<DeviceId> {
        parse_ids(raw.iter().copied()).unwrap()
    }

    #[test]
    fn failure_is_isolated_and_order_kept() {
        let sink = FlakySink {
            failing: vec!["b"],
            ..FlakySink::default()
        };
        let report = run(&targets(&["a", "b", "c"]), &SwitchOn, &sink);
        let ids: Vec<&str> = report.outcomes.iter().map(|o| o.device_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(*sink.calls.borrow(), vec!["a", "b", "c"]);
        assert_eq!(report.outcomes[1].error, Some(FailureKind::Network));
        assert_eq!(report.status(), BatchStatus::CompletedWithErrors);
    }

    #[test]
    fn all_failed_is_failed() {
        let sink = FlakySink {
            failing: vec!["a", "b"],
            ..FlakySink::default()
        };
        let report = run(&targets(&["a", "b"]), &Refresh, &sink);
        assert_eq!(report.status(), BatchStatus::Failed);
        assert!((report.success_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_batch_is_completed() {
        let report = run(&[], &Refresh, &FlakySink::default());
        assert_eq!(report.status(), BatchStatus::Completed);
        assert_eq!(report.counts(), BatchCounts::default());
        assert!((report.success_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_level_fails_every_target_without_sink_calls() {
        let sink = FlakySink::default();
        let report = run(&targets(&["a", "b"]), &SetLevel::new(200), &sink);
        assert_eq!(report.counts().failed, 2);
        assert_eq!(report.status(), BatchStatus::Failed);
        assert!(sink.calls.borrow().is_empty());
    }

    #[test]
    fn devices_without_capability_are_skipped() {
        let switchable = DeviceSnapshot::new(DeviceId::new("lamp").unwrap(), "Lamp")
            .with_capability("switch");
        let sensor = DeviceSnapshot::new(DeviceId::new("sensor").unwrap(), "Sensor")
            .with_capability("battery");
        let sink = FlakySink::default();
        let report = BatchRunner::new().run_on_devices(&[&switchable, &sensor], &SwitchOn, &sink);

        assert_eq!(report.outcomes[0].status, OutcomeStatus::Success);
        assert_eq!(report.outcomes[1].status, OutcomeStatus::Skipped);
        assert_eq!(*sink.calls.borrow(), vec!["lamp"]);
        assert_eq!(report.status(), BatchStatus::Completed);
    }

    #[test]
    fn observer_sees_every_outcome() {
        let mut seen = Vec::new();
        let report = BatchRunner::new()
            .with_observer(|o| seen.push(o.device_id.to_string()))
            .run(&targets(&["x", "y"]), &Refresh, &FlakySink::default());
        assert_eq!(seen, vec!["x", "y"]);
        assert!((report.success_rate() - 100.0).abs() < f64::EPSILON);
    }
}
