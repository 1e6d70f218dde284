// ── Device filter algebra ──
//
// A `Filter` is a pure predicate over one `DeviceSnapshot`. Leaf
// predicates live in `predicates`, AND/OR/NOT composition in `group`,
// and the serde-driven declarative form in `spec`.

pub mod group;
pub mod predicates;
pub mod spec;

use std::fmt;

use crate::model::DeviceSnapshot;

pub use group::{FilterGroup, FilterGroupBuilder, Mode, NotFilter};
pub use predicates::{
    CapabilityFilter, Comparison, NameFilter, NameMode, RoomFilter, StatusFilter,
    ThresholdFilter, TypeFilter,
};
pub use spec::FilterSpec;

/// Result of evaluating one filter against one device.
///
/// `reason` carries the deciding explanation: why a failed match failed,
/// or (for OR groups and NOT) which alternative decided a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub matched: bool,
    pub reason: Option<String>,
}

impl Evaluation {
    pub fn pass() -> Self {
        Self {
            matched: true,
            reason: None,
        }
    }

    pub fn pass_because(reason: impl Into<String>) -> Self {
        Self {
            matched: true,
            reason: Some(reason.into()),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            matched: false,
            reason: Some(reason.into()),
        }
    }
}

/// A stateless, side-effect-free predicate over a device snapshot.
///
/// Implementations must be pure so that combinators may short-circuit or
/// reorder evaluation without changing results.
pub trait Filter: fmt::Debug + Send + Sync {
    fn matches(&self, device: &DeviceSnapshot) -> bool;

    /// Short human-readable form, e.g. `room == "Kitchen"`.
    fn describe(&self) -> String;

    /// Why `device` does not match. `None` when it does.
    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        if self.matches(device) {
            None
        } else {
            Some(format!("{} did not match", self.describe()))
        }
    }

    fn evaluate(&self, device: &DeviceSnapshot) -> Evaluation {
        if self.matches(device) {
            Evaluation::pass()
        } else {
            Evaluation {
                matched: false,
                reason: self.reason(device),
            }
        }
    }
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn matches(&self, device: &DeviceSnapshot) -> bool {
        (**self).matches(device)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn reason(&self, device: &DeviceSnapshot) -> Option<String> {
        (**self).reason(device)
    }

    fn evaluate(&self, device: &DeviceSnapshot) -> Evaluation {
        (**self).evaluate(device)
    }
}

/// Operator sugar: `a.and(b)`, `a.or(b)`, `a.not()`.
pub trait FilterExt: Filter + Sized + 'static {
    fn and(self, other: impl Filter + 'static) -> FilterGroup {
        FilterGroup::all(vec![Box::new(self), Box::new(other)])
    }

    fn or(self, other: impl Filter + 'static) -> FilterGroup {
        FilterGroup::any(vec![Box::new(self), Box::new(other)])
    }

    fn not(self) -> NotFilter {
        NotFilter::new(self)
    }

    fn boxed(self) -> Box<dyn Filter> {
        Box::new(self)
    }
}

impl<F: Filter + 'static> FilterExt for F {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::DeviceId;

    fn kitchen_lamp(online: bool) -> DeviceSnapshot {
        DeviceSnapshot::new(DeviceId::new("d1").unwrap(), "Lamp")
            .with_room("Kitchen")
            .with_online(online)
    }

    #[test]
    fn operator_sugar_builds_groups() {
        let f = RoomFilter::new("kitchen").and(StatusFilter::online());
        assert!(f.matches(&kitchen_lamp(true)));
        assert!(!f.matches(&kitchen_lamp(false)));

        let f = RoomFilter::new("den").or(StatusFilter::online());
        assert!(f.matches(&kitchen_lamp(true)));

        let f = StatusFilter::online().not();
        assert!(f.matches(&kitchen_lamp(false)));
    }

    #[test]
    fn boxed_filter_delegates() {
        let f: Box<dyn Filter> = RoomFilter::new("Kitchen").boxed();
        assert!(f.matches(&kitchen_lamp(true)));
        assert_eq!(f.describe(), RoomFilter::new("Kitchen").describe());
    }

    #[test]
    fn evaluate_reports_reason_only_on_failure() {
        let f = StatusFilter::online();
        assert_eq!(f.evaluate(&kitchen_lamp(true)), Evaluation::pass());
        let eval = f.evaluate(&kitchen_lamp(false));
        assert!(!eval.matched);
        assert!(eval.reason.is_some());
    }
}
