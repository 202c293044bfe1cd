//! World kernel: authoritative entity state, fixed-step integration,
//! snapshot/restore, and the contact notification channel.
//!
//! # Invariants
//! - `World::advance` is a pure function of (current state, dt): no clock
//!   reads, no randomness. Replaying the same dt sequence from the same
//!   `WorldState` yields the same end state.
//! - Entity storage is a `BTreeMap` so iteration order is deterministic
//!   across platforms and insertion orders.
//! - Stale entity ids are skipped silently, never raised as errors.

pub mod entity;
pub mod world;

pub use entity::{Entity, EntityState, SensorConfig, SensorKind};
pub use world::{Contact, ListenerId, RestorePolicy, World, WorldState};
