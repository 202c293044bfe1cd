//! The fixed-timestep scheduler.
//!
//! [`Simulation`] owns the world, the observation system, and the
//! entity→controller bindings. The host calls [`Simulation::advance_frame`]
//! once per render frame with the elapsed wall time; stepping happens here
//! in exact multiples of `dt = 1/hz`, fully decoupled from frame cadence.

use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use weft_common::EntityId;
use weft_kernel::World;

use crate::actuator::{ActuatorError, ActuatorTable};
use crate::controller::Controller;
use crate::observation::{ObservationConfig, ObservationSystem};

/// Configuration for one simulation instance.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Fixed steps per second of simulation time.
    pub hz: f64,
    pub observation: ObservationConfig,
    /// Upper bound on per-frame elapsed time, so a stall does not trigger
    /// an unbounded catch-up burst.
    pub max_frame_delta: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            hz: 60.0,
            observation: ObservationConfig::default(),
            max_frame_delta: 0.25,
        }
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("actuation failed for entity `{id}`: {source}")]
    Actuation {
        id: EntityId,
        source: ActuatorError,
    },
}

/// The fixed-timestep simulation: world, observation derivation, and
/// controller dispatch under one deterministic schedule.
///
/// Construct explicitly and pass the instance to whoever needs it; there
/// is deliberately no process-wide singleton.
pub struct Simulation {
    world: World,
    observer: ObservationSystem,
    actuators: ActuatorTable,
    controllers: BTreeMap<EntityId, Box<dyn Controller>>,
    /// Fixed step length in seconds (f64 for the accumulator arithmetic,
    /// f32 for integration).
    step_seconds: f64,
    dt: f32,
    hz: f64,
    max_frame_delta: f64,
    accumulator: f64,
    paused: bool,
}

impl Simulation {
    /// Create a paused simulation with an empty world. Call
    /// [`Simulation::start`] to let `advance_frame` run steps.
    pub fn new(config: SimConfig) -> Self {
        let step_seconds = 1.0 / config.hz;
        Self {
            world: World::new(),
            observer: ObservationSystem::new(config.observation),
            actuators: ActuatorTable::default(),
            controllers: BTreeMap::new(),
            step_seconds,
            dt: step_seconds as f32,
            hz: config.hz,
            max_frame_delta: config.max_frame_delta,
            accumulator: 0.0,
            paused: true,
        }
    }

    /// Replace the actuator table (defaults to [`ActuatorTable::default`]).
    pub fn set_actuator_table(&mut self, table: ActuatorTable) {
        self.actuators = table;
    }

    /// Bind a controller to an entity id, replacing any prior binding.
    pub fn register_controller(
        &mut self,
        id: impl Into<EntityId>,
        controller: Box<dyn Controller>,
    ) {
        let id = id.into();
        if self.controllers.insert(id.clone(), controller).is_some() {
            tracing::debug!(entity = %id, "replacing controller binding");
        }
    }

    /// Drop the binding for an entity id, if any.
    pub fn unregister_controller(&mut self, id: &EntityId) -> bool {
        self.controllers.remove(id).is_some()
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Run exactly one fixed step.
    ///
    /// Every bound controller observes the same pre-integration world
    /// state and its action is validated against the actuator table; only
    /// once every action has passed are they applied to the entities'
    /// velocity fields, and only then does the world integrate once. A
    /// configuration error therefore surfaces before any entity is
    /// mutated. Bindings whose entity is gone are skipped silently.
    pub fn step(&mut self) -> Result<(), SimError> {
        let _span =
            tracing::debug_span!("sim_step", step = self.world.step_count()).entered();

        let mut actions = Vec::with_capacity(self.controllers.len());
        for (id, controller) in self.controllers.iter_mut() {
            let Some(observation) = self.observer.observe(&self.world, id) else {
                continue;
            };
            let action = controller.compute_action(&observation);
            self.actuators
                .validate(&action)
                .map_err(|source| SimError::Actuation {
                    id: id.clone(),
                    source,
                })?;
            actions.push((id.clone(), action));
        }

        for (id, action) in &actions {
            let Some(entity) = self.world.get_mut(id) else {
                continue;
            };
            self.actuators
                .apply(action, entity)
                .map_err(|source| SimError::Actuation {
                    id: id.clone(),
                    source,
                })?;
        }

        self.world.advance(self.dt);
        Ok(())
    }

    /// The host's per-frame driver.
    ///
    /// Clamps `elapsed` to the configured bound, adds it to the
    /// accumulator, and runs whole steps while at least one `dt` is
    /// banked. Returns the number of steps run. A paused simulation
    /// ignores elapsed time entirely.
    pub fn advance_frame(&mut self, elapsed: Duration) -> Result<u32, SimError> {
        if self.paused {
            return Ok(0);
        }
        self.accumulator += elapsed.as_secs_f64().min(self.max_frame_delta);

        let mut steps = 0;
        while self.accumulator >= self.step_seconds {
            self.step()?;
            self.accumulator -= self.step_seconds;
            steps += 1;
        }
        Ok(steps)
    }

    pub fn start(&mut self) {
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn hz(&self) -> f64 {
        self.hz
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for loaders and restore operations. Must not
    /// be interleaved with an in-progress `step`; single-threaded use
    /// makes that structural.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Restore the world baseline (or clear it), reset every registered
    /// controller, and zero the accumulator. Bindings are preserved.
    pub fn reset(&mut self) {
        self.world.reset_to_initial_state();
        for controller in self.controllers.values_mut() {
            controller.reset();
        }
        self.accumulator = 0.0;
    }
}
