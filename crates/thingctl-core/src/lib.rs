//! Device selection, named collections and batch actions for smart-home
//! device inventories.
//!
//! The crate is a synchronous engine with no console I/O:
//!
//! - **[`Filter`]**: pure predicates over a [`DeviceSnapshot`], composed
//!   with [`FilterGroup`] (AND / OR) and [`NotFilter`], or built from a
//!   declarative [`FilterSpec`].
//! - **[`query()`]**: order-preserving selection over a snapshot set, with
//!   [`explain()`] for per-device diagnostics.
//! - **[`CollectionManager`]**: named, ordered, de-duplicated id sets
//!   persisted through a [`CollectionStore`] ([`FileStore`] on disk).
//! - **[`Action`]** + **[`BatchRunner`]**: one operation over many devices
//!   with per-device failure isolation, aggregated into a [`BatchReport`].
//!
//! Device data comes in through a [`DeviceSource`] and commands go out
//! through an [`ActionSink`]; [`InventoryFile`] implements both over a
//! local JSON file.

pub mod action;
pub mod batch;
pub mod collection;
pub mod error;
pub mod filter;
pub mod inventory;
pub mod model;
pub mod query;
pub mod source;
pub mod summary;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{Action, ActionOutcome, Delete, OutcomeStatus, Refresh, SetLevel, SwitchOff, SwitchOn};
pub use batch::{BatchCounts, BatchReport, BatchRunner, BatchStatus};
pub use collection::{
    Collection, CollectionManager, CollectionStore, FileStore, MemoryStore, Resolution,
};
pub use error::CoreError;
pub use filter::{
    CapabilityFilter, Comparison, Evaluation, Filter, FilterExt, FilterGroup, FilterGroupBuilder,
    FilterSpec, Mode, NameFilter, NameMode, NotFilter, RoomFilter, StatusFilter, ThresholdFilter,
    TypeFilter,
};
pub use inventory::InventoryFile;
pub use model::{AttributeValue, DeviceId, DeviceSnapshot};
pub use query::{Explanation, explain, query, query_ids};
pub use source::{ActionKind, ActionSink, DeviceCommand, DeviceSource, FailureKind, SinkError};
pub use summary::{InventorySummary, summarize};
