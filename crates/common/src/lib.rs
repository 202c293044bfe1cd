//! Shared types for the weft simulation core.
//!
//! # Invariants
//! - Entity ids are caller-supplied strings; equality and ordering follow
//!   string semantics so `BTreeMap` iteration is deterministic everywhere.
//! - The serde adapters in [`codec`] produce the `{x,y,z}` / `{x,y,z,w}`
//!   object encoding of the snapshot interchange format, not glam's
//!   default sequence encoding.

pub mod codec;
pub mod types;

pub use codec::{quat_xyzw, vec3_xyz};
pub use types::{Collider, EntityId};
