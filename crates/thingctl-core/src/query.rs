// ── Query execution ──
//
// Pure functions over a snapshot slice supplied by the data source.
// No I/O, input order preserved, input never mutated.

use tracing::debug;

use crate::filter::{Evaluation, Filter};
use crate::model::{DeviceId, DeviceSnapshot};

/// Return the devices matching `filter`, in input order.
pub fn query<'a, F>(snapshots: &'a [DeviceSnapshot], filter: &F) -> Vec<&'a DeviceSnapshot>
where
    F: Filter + ?Sized,
{
    let matched: Vec<&DeviceSnapshot> = snapshots.iter().filter(|d| filter.matches(d)).collect();
    debug!(
        filter = %filter.describe(),
        total = snapshots.len(),
        matched = matched.len(),
        "query evaluated"
    );
    matched
}

/// Ids of the devices matching `filter`, in input order.
pub fn query_ids<F>(snapshots: &[DeviceSnapshot], filter: &F) -> Vec<DeviceId>
where
    F: Filter + ?Sized,
{
    query(snapshots, filter)
        .into_iter()
        .map(|d| d.id.clone())
        .collect()
}

/// Per-device verdict used for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation<'a> {
    pub device: &'a DeviceSnapshot,
    pub evaluation: Evaluation,
}

/// Evaluate every device and keep the deciding reason, in input order.
pub fn explain<'a, F>(snapshots: &'a [DeviceSnapshot], filter: &F) -> Vec<Explanation<'a>>
where
    F: Filter + ?Sized,
{
    snapshots
        .iter()
        .map(|device| Explanation {
            device,
            evaluation: filter.evaluate(device),
        })
        .collect()
}
