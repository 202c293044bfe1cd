//! Simulation layer: fixed-timestep scheduling, derived observations, ray
//! sensors, and pluggable controllers behind one contract.
//!
//! # Invariants
//! - Within one step every controller observes the same pre-integration
//!   world state; `World::advance` runs exactly once per step, after all
//!   controllers have acted.
//! - Simulation time advances only in exact multiples of `dt = 1/hz`,
//!   regardless of frame cadence.
//! - Controller bindings whose entity no longer exists are skipped
//!   silently; the only fallible path is actuator configuration.

pub mod actuator;
pub mod controller;
pub mod observation;
pub mod scheduler;
pub mod sensors;

pub use actuator::{ActuatorError, ActuatorTable, ChannelTarget, CommandTarget};
pub use controller::{
    Action, Controller, InteractiveController, MoveInput, PolicyController, PolicyHandle,
    ScriptedController,
};
pub use observation::{Observation, ObservationConfig, ObservationSystem, ObservedEntity};
pub use scheduler::{SimConfig, SimError, Simulation};
pub use sensors::{RayHit, cast_ray};
