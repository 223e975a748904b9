//! Persistence: verifiable grid snapshots, session event logs, on-disk saves.
//!
//! # Invariants
//! - Event log is append-only.
//! - Snapshots carry a content hash and are verified before restore.
//! - A failed load never touches the running session.

pub mod grid_file;
pub mod snapshot;
pub mod store;

pub use grid_file::{read_grid_json, write_grid_json};
pub use snapshot::{EventLog, SnapshotError, WorldSnapshot};
pub use store::{StoreError, WorldStore};
