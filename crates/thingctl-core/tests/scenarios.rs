#![allow(clippy::unwrap_used)]

// End-to-end behaviour of the selection, collection and batch pipeline.

use std::cell::RefCell;

use pretty_assertions::assert_eq;
use thingctl_core::{
    ActionSink, BatchStatus, CollectionManager, Comparison, CoreError, DeviceCommand, DeviceId,
    DeviceSnapshot, FailureKind, FileStore, Filter, FilterExt, FilterGroup, FilterSpec,
    OutcomeStatus, RoomFilter, SinkError, StatusFilter, SwitchOn, ThresholdFilter, batch, query,
    query_ids,
};

fn id(s: &str) -> DeviceId {
    DeviceId::new(s).unwrap()
}

fn ids(raw: &[&str]) -> Vec<DeviceId> {
    raw.iter().map(|s| id(s)).collect()
}

fn two_rooms() -> Vec<DeviceSnapshot> {
    vec![
        DeviceSnapshot::new(id("d1"), "Kitchen Lamp")
            .with_room("Kitchen")
            .with_online(true),
        DeviceSnapshot::new(id("d2"), "Den Lamp")
            .with_room("Den")
            .with_online(false),
    ]
}

struct FailsFor {
    device: &'static str,
    seen: RefCell<Vec<String>>,
}

impl ActionSink for FailsFor {
    fn apply(&self, device: &DeviceId, _command: &DeviceCommand) -> Result<(), SinkError> {
        self.seen.borrow_mut().push(device.to_string());
        if device == self.device {
            Err(SinkError::Network("gateway unreachable".into()))
        } else {
            Ok(())
        }
    }
}

// ── Selection ───────────────────────────────────────────────────────

#[test]
fn kitchen_and_online_selects_d1() {
    let filter = RoomFilter::new("Kitchen").and(StatusFilter::online());
    assert_eq!(query_ids(&two_rooms(), &filter), ids(&["d1"]));
}

#[test]
fn battery_below_thirty() {
    let set = vec![
        DeviceSnapshot::new(id("d1"), "Door").with_attribute("battery", "battery", 15),
        DeviceSnapshot::new(id("d2"), "Window").with_attribute("battery", "battery", 45),
        DeviceSnapshot::new(id("d3"), "Plug").with_capability("switch"),
    ];
    let filter = ThresholdFilter::battery(Comparison::Lt, 30.0);
    assert_eq!(query_ids(&set, &filter), ids(&["d1"]));
    assert!(!filter.matches(&set[2]));
    assert!(filter.reason(&set[2]).is_some());
}

#[test]
fn group_truth_table() {
    let set = two_rooms();
    let kitchen = || RoomFilter::new("Kitchen");
    let online = StatusFilter::online;
    for device in &set {
        let a = kitchen().matches(device);
        let b = online().matches(device);
        assert_eq!(kitchen().and(online()).matches(device), a && b);
        assert_eq!(kitchen().or(online()).matches(device), a || b);
        assert_eq!(kitchen().not().matches(device), !a);
    }
    assert_eq!(query(&set, &FilterGroup::all(vec![])).len(), 2);
    assert!(query(&set, &FilterGroup::any(vec![])).is_empty());
}

#[test]
fn query_result_is_ordered_subsequence_of_matches() {
    let set: Vec<DeviceSnapshot> = (0..10)
        .map(|i| {
            DeviceSnapshot::new(id(&format!("d{i}")), format!("Device {i}"))
                .with_online(i % 3 != 0)
        })
        .collect();
    let filter = StatusFilter::online();
    let result = query(&set, &filter);
    assert!(result.iter().all(|d| filter.matches(d)));
    let positions: Vec<usize> = result
        .iter()
        .map(|d| set.iter().position(|s| s.id == d.id).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn declarative_spec_matches_hand_built_tree() {
    let spec = FilterSpec::from_json(
        r#"{"and": [{"room": {"name": "kitchen"}}, {"online": true}]}"#,
    )
    .unwrap();
    let built = spec.build().unwrap();
    assert_eq!(query_ids(&two_rooms(), built.as_ref()), ids(&["d1"]));
}

// ── Collections ─────────────────────────────────────────────────────

#[test]
fn duplicate_create_leaves_existing_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CollectionManager::new(FileStore::new(dir.path()));
    manager.create("x", ids(&["d1"])).unwrap();

    let err = manager.create("x", ids(&["d2", "d3"])).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateName { .. }));
    assert_eq!(manager.load("x").unwrap().to_ids(), ids(&["d1"]));
}

#[test]
fn save_then_load_round_trips_name_and_ids() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CollectionManager::new(FileStore::new(dir.path()));
    let saved = manager.save("Evening Scene", ids(&["d9", "d2", "d5"])).unwrap();

    let reopened = CollectionManager::new(FileStore::new(dir.path()));
    let loaded = reopened.load("Evening Scene").unwrap();
    assert_eq!(loaded.name(), saved.name());
    assert_eq!(loaded.to_ids(), saved.to_ids());
    assert_eq!(reopened.list().unwrap(), vec!["Evening Scene"]);
}

#[test]
fn add_twice_equals_add_once_and_remove_absent_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CollectionManager::new(FileStore::new(dir.path()));
    manager.create("c", ids(&["d1"])).unwrap();

    let once = manager.add("c", ids(&["d2"])).unwrap();
    let twice = manager.add("c", ids(&["d2"])).unwrap();
    assert_eq!(once.to_ids(), twice.to_ids());

    let after = manager.remove("c", &ids(&["ghost"])).unwrap();
    assert_eq!(after.to_ids(), ids(&["d1", "d2"]));
}

#[test]
fn resolve_drops_vanished_devices() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CollectionManager::new(FileStore::new(dir.path()));
    let collection = manager.create("c", ids(&["d2", "gone", "d1"])).unwrap();

    let live = two_rooms();
    let resolved = manager.resolve(&collection, &live);
    assert_eq!(resolved.device_ids(), ids(&["d2", "d1"]));
    assert_eq!(resolved.missing, ids(&["gone"]));
}

// ── Batches ─────────────────────────────────────────────────────────

#[test]
fn switch_on_with_network_failure_on_d2() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CollectionManager::new(FileStore::new(dir.path()));
    let collection = manager.create("pair", ids(&["d1", "d2"])).unwrap();
    let sink = FailsFor {
        device: "d2",
        seen: RefCell::default(),
    };

    let report = batch::run(&collection.to_ids(), &SwitchOn, &sink);

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].device_id, id("d1"));
    assert_eq!(report.outcomes[0].status, OutcomeStatus::Success);
    assert_eq!(report.outcomes[1].device_id, id("d2"));
    assert_eq!(report.outcomes[1].status, OutcomeStatus::Failed);
    assert_eq!(report.outcomes[1].error, Some(FailureKind::Network));
    assert_eq!(report.outcomes[1].error.unwrap().to_string(), "NetworkError");
    assert_eq!(report.status(), BatchStatus::CompletedWithErrors);
}

#[test]
fn failure_in_the_middle_does_not_stop_later_targets() {
    let sink = FailsFor {
        device: "b",
        seen: RefCell::default(),
    };
    let targets = ids(&["a", "b", "c", "d"]);
    let report = batch::run(&targets, &SwitchOn, &sink);

    let reported: Vec<DeviceId> = report.outcomes.iter().map(|o| o.device_id.clone()).collect();
    assert_eq!(reported, targets);
    assert_eq!(*sink.seen.borrow(), vec!["a", "b", "c", "d"]);
    assert_eq!(report.counts().failed, 1);
}
