//! Persistence for world snapshots: in-memory rollback stacks and a
//! file-backed store.
//!
//! # Invariants
//! - Snapshots carry a content hash and are verifiable.
//! - The file store is fail-closed: schema mismatch or corruption is an
//!   error, never a silent partial load.
//! - Restore goes through `World::apply_state`, so the same stale-id
//!   policies apply as everywhere else.

pub mod snapshot;
pub mod store;

pub use snapshot::{Snapshot, SnapshotStore};
pub use store::{StoreError, WorldStore};
