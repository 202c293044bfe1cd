//! The controller contract and its interchangeable implementations.
//!
//! The scheduler depends only on the [`Controller`] trait; interactive,
//! scripted, and externally-driven policy controllers all sit behind it.
//! New kinds implement `compute_action`/`reset` and nothing in the world
//! or scheduler has to learn about them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;

use crate::observation::Observation;

/// A normalized command expressing a controller's intent.
///
/// Continuous actions map named axes to values; discrete actions name a
/// command with optional numeric parameters. Which channels an action may
/// use is decided by the scheduler's actuator table, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Continuous {
        axes: BTreeMap<String, f32>,
    },
    Discrete {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        params: Vec<f32>,
    },
}

impl Action {
    /// A continuous action with no axes: apply nothing, change nothing.
    pub fn neutral() -> Self {
        Self::Continuous {
            axes: BTreeMap::new(),
        }
    }

    pub fn continuous<I, S>(axes: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        Self::Continuous {
            axes: axes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn discrete(command: impl Into<String>) -> Self {
        Self::Discrete {
            command: command.into(),
            params: Vec::new(),
        }
    }
}

/// The capability contract every decision-maker satisfies.
pub trait Controller {
    /// Convert an observation into an action for this step.
    fn compute_action(&mut self, observation: &Observation) -> Action;

    /// Clear transient internal state (held inputs, script cursors, queued
    /// external actions).
    fn reset(&mut self);
}

/// Directional inputs an interactive controller can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MoveInput {
    Forward,
    Back,
    Left,
    Right,
}

/// Translates live held directional input into continuous velocity axes.
///
/// Forward is -Z, right is +X. The held set persists across steps until
/// released, so a key held for a second keeps producing motion.
#[derive(Debug)]
pub struct InteractiveController {
    held: BTreeSet<MoveInput>,
    speed: f32,
}

impl InteractiveController {
    pub fn new(speed: f32) -> Self {
        Self {
            held: BTreeSet::new(),
            speed,
        }
    }

    pub fn press(&mut self, input: MoveInput) {
        self.held.insert(input);
    }

    pub fn release(&mut self, input: MoveInput) {
        self.held.remove(&input);
    }
}

impl Default for InteractiveController {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl Controller for InteractiveController {
    fn compute_action(&mut self, _observation: &Observation) -> Action {
        let mut x = 0.0;
        let mut z = 0.0;
        for input in &self.held {
            match input {
                MoveInput::Forward => z -= 1.0,
                MoveInput::Back => z += 1.0,
                MoveInput::Left => x -= 1.0,
                MoveInput::Right => x += 1.0,
            }
        }
        Action::continuous([("move_x", x * self.speed), ("move_z", z * self.speed)])
    }

    fn reset(&mut self) {
        self.held.clear();
    }
}

/// Replays a predetermined action sequence, one action per step.
///
/// Past the end it emits neutral actions, or starts over when `looped`.
#[derive(Debug, Clone)]
pub struct ScriptedController {
    script: Vec<Action>,
    cursor: usize,
    looped: bool,
}

impl ScriptedController {
    pub fn new(script: Vec<Action>) -> Self {
        Self {
            script,
            cursor: 0,
            looped: false,
        }
    }

    pub fn looping(script: Vec<Action>) -> Self {
        Self {
            script,
            cursor: 0,
            looped: true,
        }
    }
}

impl Controller for ScriptedController {
    fn compute_action(&mut self, _observation: &Observation) -> Action {
        if self.cursor >= self.script.len() {
            if !self.looped || self.script.is_empty() {
                return Action::neutral();
            }
            self.cursor = 0;
        }
        let action = self.script[self.cursor].clone();
        self.cursor += 1;
        action
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// Sender half handed to whatever computes actions out of process.
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    tx: mpsc::Sender<Action>,
}

impl PolicyHandle {
    /// Deliver an action. Returns false once the controller is dropped.
    pub fn send(&self, action: Action) -> bool {
        self.tx.send(action).is_ok()
    }
}

/// A controller whose actions are computed externally and delivered
/// through a channel.
///
/// Each step drains everything queued since the last step and holds the
/// latest action; the held action repeats until a newer one arrives, so a
/// slow external policy degrades to "keep doing the last thing" rather
/// than stalling the simulation.
#[derive(Debug)]
pub struct PolicyController {
    rx: mpsc::Receiver<Action>,
    current: Option<Action>,
}

impl PolicyController {
    pub fn channel() -> (PolicyHandle, Self) {
        let (tx, rx) = mpsc::channel();
        (PolicyHandle { tx }, Self { rx, current: None })
    }
}

impl Controller for PolicyController {
    fn compute_action(&mut self, _observation: &Observation) -> Action {
        while let Ok(action) = self.rx.try_recv() {
            self.current = Some(action);
        }
        self.current.clone().unwrap_or_else(Action::neutral)
    }

    fn reset(&mut self) {
        while self.rx.try_recv().is_ok() {}
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{Environment, Observation, SelfState, SensorReadings};
    use glam::Vec3;

    fn empty_observation() -> Observation {
        Observation {
            self_state: SelfState {
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
            },
            environment: Environment {
                nearby_entities: Vec::new(),
                visible_entities: Vec::new(),
            },
            sensors: SensorReadings {
                raycasts: Vec::new(),
            },
        }
    }

    fn axis(action: &Action, name: &str) -> f32 {
        match action {
            Action::Continuous { axes } => axes.get(name).copied().unwrap_or(0.0),
            Action::Discrete { .. } => panic!("expected continuous action"),
        }
    }

    #[test]
    fn interactive_held_inputs_sum_into_axes() {
        let obs = empty_observation();
        let mut c = InteractiveController::new(2.0);
        c.press(MoveInput::Forward);
        c.press(MoveInput::Right);

        let action = c.compute_action(&obs);
        assert_eq!(axis(&action, "move_x"), 2.0);
        assert_eq!(axis(&action, "move_z"), -2.0);

        c.release(MoveInput::Forward);
        let action = c.compute_action(&obs);
        assert_eq!(axis(&action, "move_z"), 0.0);
    }

    #[test]
    fn interactive_reset_clears_held_set() {
        let obs = empty_observation();
        let mut c = InteractiveController::default();
        c.press(MoveInput::Back);
        c.reset();
        let action = c.compute_action(&obs);
        assert_eq!(axis(&action, "move_x"), 0.0);
        assert_eq!(axis(&action, "move_z"), 0.0);
    }

    #[test]
    fn opposed_inputs_cancel() {
        let obs = empty_observation();
        let mut c = InteractiveController::default();
        c.press(MoveInput::Left);
        c.press(MoveInput::Right);
        let action = c.compute_action(&obs);
        assert_eq!(axis(&action, "move_x"), 0.0);
    }

    #[test]
    fn scripted_replays_then_goes_neutral() {
        let obs = empty_observation();
        let script = vec![
            Action::continuous([("move_x", 1.0)]),
            Action::continuous([("move_x", 2.0)]),
        ];
        let mut c = ScriptedController::new(script);

        assert_eq!(axis(&c.compute_action(&obs), "move_x"), 1.0);
        assert_eq!(axis(&c.compute_action(&obs), "move_x"), 2.0);
        assert_eq!(c.compute_action(&obs), Action::neutral());
    }

    #[test]
    fn scripted_reset_rewinds() {
        let obs = empty_observation();
        let mut c = ScriptedController::new(vec![Action::continuous([("move_x", 1.0)])]);
        c.compute_action(&obs);
        c.reset();
        assert_eq!(axis(&c.compute_action(&obs), "move_x"), 1.0);
    }

    #[test]
    fn scripted_looping_wraps_around() {
        let obs = empty_observation();
        let mut c = ScriptedController::looping(vec![
            Action::continuous([("move_x", 1.0)]),
            Action::continuous([("move_x", 2.0)]),
        ]);
        for expected in [1.0, 2.0, 1.0, 2.0, 1.0] {
            assert_eq!(axis(&c.compute_action(&obs), "move_x"), expected);
        }
    }

    #[test]
    fn policy_holds_latest_delivered_action() {
        let obs = empty_observation();
        let (handle, mut c) = PolicyController::channel();

        // Nothing delivered yet.
        assert_eq!(c.compute_action(&obs), Action::neutral());

        handle.send(Action::continuous([("move_x", 1.0)]));
        handle.send(Action::continuous([("move_x", 3.0)]));
        assert_eq!(axis(&c.compute_action(&obs), "move_x"), 3.0);

        // Latest action repeats until a newer one arrives.
        assert_eq!(axis(&c.compute_action(&obs), "move_x"), 3.0);
    }

    #[test]
    fn policy_reset_drops_held_and_queued_actions() {
        let obs = empty_observation();
        let (handle, mut c) = PolicyController::channel();
        handle.send(Action::continuous([("move_x", 1.0)]));
        c.compute_action(&obs);
        handle.send(Action::continuous([("move_x", 2.0)]));
        c.reset();
        assert_eq!(c.compute_action(&obs), Action::neutral());
    }

    #[test]
    fn policy_handle_reports_disconnect() {
        let (handle, c) = PolicyController::channel();
        drop(c);
        assert!(!handle.send(Action::neutral()));
    }

    #[test]
    fn action_serde_tagging() {
        let a = Action::continuous([("move_x", 1.5)]);
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["type"], "continuous");
        assert_eq!(json["axes"]["move_x"], 1.5);

        let d = Action::Discrete {
            command: "halt".into(),
            params: vec![1.0],
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["type"], "discrete");
        assert_eq!(json["command"], "halt");

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }
}
