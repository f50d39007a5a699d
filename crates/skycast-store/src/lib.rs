//! Single-row snapshot cache shared by the weather fetch pipelines.
//!
//! The store keeps at most one row per entity kind and replaces it atomically
//! on every successful fetch. Each kind is accessed through a typed
//! [`CacheSlot`] handle so the fetch coordinator never has to know which
//! concrete kind it is driving.

pub mod slot;
pub mod store;

pub use slot::{CacheSlot, EntityKind, OverlapPolicy, StoreError, StoreResult, WriteOutcome};
pub use store::{SnapshotStore, Slot};
