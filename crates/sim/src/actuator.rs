//! Action channel → entity-state mutator table.
//!
//! The mapping from named action channels to kinematic fields is an
//! explicit table: every channel and command must be bound to a target,
//! and applying an action over an unbound name is a configuration error
//! instead of a silent drop.

use thiserror::Error;

use glam::Vec3;
use std::collections::BTreeMap;
use weft_kernel::Entity;

use crate::controller::Action;

/// Where a continuous axis value lands on the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    VelocityX,
    VelocityY,
    VelocityZ,
    /// Yaw rate (radians/second) about the world Y axis.
    AngularVelocityY,
}

/// What a discrete command does to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTarget {
    /// Zero both linear and angular velocity.
    Halt,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    #[error("no actuator bound for continuous channel `{0}`")]
    UnboundChannel(String),
    #[error("no actuator bound for discrete command `{0}`")]
    UnboundCommand(String),
}

/// The actuator bindings one simulation applies to all its entities.
#[derive(Debug, Clone)]
pub struct ActuatorTable {
    channels: BTreeMap<String, ChannelTarget>,
    commands: BTreeMap<String, CommandTarget>,
}

impl ActuatorTable {
    /// A table with no bindings at all.
    pub fn empty() -> Self {
        Self {
            channels: BTreeMap::new(),
            commands: BTreeMap::new(),
        }
    }

    pub fn bind_channel(
        mut self,
        name: impl Into<String>,
        target: ChannelTarget,
    ) -> Self {
        self.channels.insert(name.into(), target);
        self
    }

    pub fn bind_command(
        mut self,
        name: impl Into<String>,
        target: CommandTarget,
    ) -> Self {
        self.commands.insert(name.into(), target);
        self
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Check that every name the action uses is bound, without applying
    /// anything.
    pub fn validate(&self, action: &Action) -> Result<(), ActuatorError> {
        match action {
            Action::Continuous { axes } => {
                for name in axes.keys() {
                    if !self.channels.contains_key(name) {
                        return Err(ActuatorError::UnboundChannel(name.clone()));
                    }
                }
                Ok(())
            }
            Action::Discrete { command, .. } => {
                if self.commands.contains_key(command) {
                    Ok(())
                } else {
                    Err(ActuatorError::UnboundCommand(command.clone()))
                }
            }
        }
    }

    /// Apply an action's effect to the entity.
    ///
    /// Continuous axes write their bound kinematic field; discrete
    /// commands run their bound mutator. Axes are applied in name order,
    /// so the outcome does not depend on how the controller built its map.
    pub fn apply(&self, action: &Action, entity: &mut Entity) -> Result<(), ActuatorError> {
        match action {
            Action::Continuous { axes } => {
                for (name, value) in axes {
                    let target = self
                        .channels
                        .get(name)
                        .ok_or_else(|| ActuatorError::UnboundChannel(name.clone()))?;
                    match target {
                        ChannelTarget::VelocityX => entity.velocity.x = *value,
                        ChannelTarget::VelocityY => entity.velocity.y = *value,
                        ChannelTarget::VelocityZ => entity.velocity.z = *value,
                        ChannelTarget::AngularVelocityY => entity.angular_velocity.y = *value,
                    }
                }
                Ok(())
            }
            Action::Discrete { command, .. } => {
                let target = self
                    .commands
                    .get(command)
                    .ok_or_else(|| ActuatorError::UnboundCommand(command.clone()))?;
                match target {
                    CommandTarget::Halt => {
                        entity.velocity = Vec3::ZERO;
                        entity.angular_velocity = Vec3::ZERO;
                    }
                }
                Ok(())
            }
        }
    }
}

impl Default for ActuatorTable {
    /// The standard bindings: planar motion on `move_x`/`move_z`, plus
    /// vertical motion, yaw, and a halt command.
    fn default() -> Self {
        Self::empty()
            .bind_channel("move_x", ChannelTarget::VelocityX)
            .bind_channel("move_y", ChannelTarget::VelocityY)
            .bind_channel("move_z", ChannelTarget::VelocityZ)
            .bind_channel("turn", ChannelTarget::AngularVelocityY)
            .bind_command("halt", CommandTarget::Halt)
    }
}
