use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_common::{Collider, EntityId, quat_xyzw, vec3_xyz};

/// Kind of sensor probe. Ray casts are the only kind the core evaluates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    #[default]
    Raycast,
}

/// Configuration for one ray-cast probe attached to an entity.
///
/// `direction` is expressed in the entity's local frame and rotated into
/// world space at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: String,
    #[serde(default)]
    pub kind: SensorKind,
    #[serde(with = "vec3_xyz")]
    pub direction: Vec3,
    pub range: f32,
}

/// A mutable record of one simulated object's kinematic state and sensor
/// configuration.
///
/// Entities own nothing beyond these fields. Presentation handles live
/// entirely outside the core and are never read by it; the optional
/// [`Collider`] proxy is what ray queries see instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Opaque caller-defined annotations. The core round-trips these
    /// through snapshots without interpreting them.
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub sensors: Vec<SensorConfig>,
    pub collider: Option<Collider>,
}

/// Serializable per-entity snapshot record (interchange format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "vec3_xyz")]
    pub position: Vec3,
    #[serde(with = "quat_xyzw")]
    pub rotation: Quat,
    #[serde(with = "vec3_xyz")]
    pub velocity: Vec3,
    #[serde(with = "vec3_xyz")]
    pub angular_velocity: Vec3,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<SensorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collider: Option<Collider>,
}

impl Entity {
    /// Create an entity at rest at `position` with identity rotation.
    pub fn new(id: impl Into<EntityId>, kind: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            metadata: BTreeMap::new(),
            sensors: Vec::new(),
            collider: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn with_sensor(mut self, sensor: SensorConfig) -> Self {
        self.sensors.push(sensor);
        self
    }

    /// Snapshot all fields into a fully owned [`EntityState`].
    ///
    /// The returned record shares no mutable state with the entity.
    pub fn state(&self) -> EntityState {
        EntityState {
            id: self.id.clone(),
            kind: self.kind.clone(),
            position: self.position,
            rotation: self.rotation,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            metadata: self.metadata.clone(),
            sensors: self.sensors.clone(),
            collider: self.collider,
        }
    }

    /// Overwrite every field from a snapshot record.
    ///
    /// No validation: a non-unit rotation or inconsistent data is the
    /// caller's responsibility, matching snapshot-restore semantics.
    pub fn apply_state(&mut self, state: &EntityState) {
        self.id = state.id.clone();
        self.kind = state.kind.clone();
        self.position = state.position;
        self.rotation = state.rotation;
        self.velocity = state.velocity;
        self.angular_velocity = state.angular_velocity;
        self.metadata = state.metadata.clone();
        self.sensors = state.sensors.clone();
        self.collider = state.collider;
    }

    /// Construct an entity directly from a snapshot record.
    pub fn from_state(state: &EntityState) -> Self {
        let mut entity = Entity::new(state.id.clone(), state.kind.clone(), state.position);
        entity.apply_state(state);
        entity
    }
}
