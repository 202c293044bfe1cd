//! Per-entity observations derived from world state.
//!
//! An [`Observation`] is a read-only view computed fresh each step; nothing
//! here is stored back into the world.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_common::{EntityId, vec3_xyz};
use weft_kernel::World;

use crate::sensors::{RayHit, cast_ray};

/// Radii for the proximity queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationConfig {
    /// Entities closer than this appear in `nearby_entities`.
    pub near_radius: f32,
    /// Entities closer than this appear in `visible_entities`.
    pub visibility_radius: f32,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            near_radius: 10.0,
            visibility_radius: 25.0,
        }
    }
}

/// The observer's own kinematic snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfState {
    #[serde(with = "vec3_xyz")]
    pub position: Vec3,
    #[serde(with = "vec3_xyz")]
    pub velocity: Vec3,
}

/// Another entity reduced to what proximity sensing reveals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedEntity {
    pub id: EntityId,
    #[serde(with = "vec3_xyz")]
    pub position: Vec3,
}

/// Proximity-derived surroundings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub nearby_entities: Vec<ObservedEntity>,
    /// A proximity approximation: "visible" means within the visibility
    /// radius, not an occlusion test. Changing this to real line-of-sight
    /// is a deliberate semantic change, not a bug fix.
    pub visible_entities: Vec<ObservedEntity>,
}

/// One sensor's ray result, tagged with the configured sensor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub id: String,
    #[serde(flatten)]
    pub ray: RayHit,
}

/// All sensor output for one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    pub raycasts: Vec<SensorReading>,
}

/// A read-only, entity-scoped view of the world used as controller input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "self")]
    pub self_state: SelfState,
    pub environment: Environment,
    pub sensors: SensorReadings,
}

/// Derives observations from world state. Stateless apart from its radii.
#[derive(Debug, Clone, Default)]
pub struct ObservationSystem {
    config: ObservationConfig,
}

impl ObservationSystem {
    pub fn new(config: ObservationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ObservationConfig {
        &self.config
    }

    /// Build the observation for `id`, or `None` if the entity is gone.
    ///
    /// The observer never appears in its own nearby/visible lists. Lists
    /// come out in canonical id order (world iteration order).
    pub fn observe(&self, world: &World, id: &EntityId) -> Option<Observation> {
        let entity = world.get(id)?;

        let mut nearby = Vec::new();
        let mut visible = Vec::new();
        for (other_id, other) in world.entities() {
            if other_id == id {
                continue;
            }
            let distance = entity.position.distance(other.position);
            let observed = ObservedEntity {
                id: other_id.clone(),
                position: other.position,
            };
            if distance < self.config.near_radius {
                nearby.push(observed.clone());
            }
            if distance < self.config.visibility_radius {
                visible.push(observed);
            }
        }

        let raycasts = entity
            .sensors
            .iter()
            .map(|sensor| SensorReading {
                id: sensor.id.clone(),
                ray: cast_ray(world, entity, sensor.direction, sensor.range),
            })
            .collect();

        Some(Observation {
            self_state: SelfState {
                position: entity.position,
                velocity: entity.velocity,
            },
            environment: Environment {
                nearby_entities: nearby,
                visible_entities: visible,
            },
            sensors: SensorReadings { raycasts },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_common::Collider;
    use weft_kernel::{Entity, SensorConfig, SensorKind};

    fn two_entity_world(b_position: Vec3) -> World {
        let mut w = World::new();
        w.add(Entity::new("A", "drone", Vec3::ZERO));
        w.add(Entity::new("B", "drone", b_position));
        w
    }

    #[test]
    fn nearby_entity_at_five_units() {
        let w = two_entity_world(Vec3::new(5.0, 0.0, 0.0));
        let obs = ObservationSystem::default()
            .observe(&w, &"A".into())
            .unwrap();

        assert_eq!(
            obs.environment.nearby_entities,
            vec![ObservedEntity {
                id: "B".into(),
                position: Vec3::new(5.0, 0.0, 0.0),
            }]
        );
        assert_eq!(obs.environment.visible_entities.len(), 1);
    }

    #[test]
    fn entity_beyond_both_radii_disappears() {
        let w = two_entity_world(Vec3::new(30.0, 0.0, 0.0));
        let obs = ObservationSystem::default()
            .observe(&w, &"A".into())
            .unwrap();

        assert!(obs.environment.nearby_entities.is_empty());
        assert!(obs.environment.visible_entities.is_empty());
    }

    #[test]
    fn visible_but_not_nearby_between_radii() {
        let w = two_entity_world(Vec3::new(15.0, 0.0, 0.0));
        let obs = ObservationSystem::default()
            .observe(&w, &"A".into())
            .unwrap();

        assert!(obs.environment.nearby_entities.is_empty());
        assert_eq!(obs.environment.visible_entities.len(), 1);
    }

    #[test]
    fn observer_never_lists_itself() {
        let mut w = World::new();
        w.add(Entity::new("A", "drone", Vec3::ZERO));
        let obs = ObservationSystem::default()
            .observe(&w, &"A".into())
            .unwrap();

        assert!(obs.environment.nearby_entities.is_empty());
        assert!(obs.environment.visible_entities.is_empty());
    }

    #[test]
    fn missing_entity_yields_none() {
        let w = World::new();
        assert!(ObservationSystem::default().observe(&w, &"A".into()).is_none());
    }

    #[test]
    fn self_state_mirrors_entity_kinematics() {
        let mut w = World::new();
        w.add(
            Entity::new("A", "drone", Vec3::new(1.0, 2.0, 3.0)).with_velocity(Vec3::new(
                0.5, 0.0, -0.5,
            )),
        );
        let obs = ObservationSystem::default()
            .observe(&w, &"A".into())
            .unwrap();

        assert_eq!(obs.self_state.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(obs.self_state.velocity, Vec3::new(0.5, 0.0, -0.5));
    }

    #[test]
    fn sensor_readings_carry_configured_ids() {
        let mut w = World::new();
        w.add(
            Entity::new("A", "drone", Vec3::ZERO)
                .with_sensor(SensorConfig {
                    id: "forward".into(),
                    kind: SensorKind::Raycast,
                    direction: Vec3::NEG_Z,
                    range: 20.0,
                })
                .with_sensor(SensorConfig {
                    id: "up".into(),
                    kind: SensorKind::Raycast,
                    direction: Vec3::Y,
                    range: 5.0,
                }),
        );
        w.add(
            Entity::new("wall", "block", Vec3::new(0.0, 0.0, -10.0))
                .with_collider(Collider::Sphere { radius: 1.0 }),
        );

        let obs = ObservationSystem::default()
            .observe(&w, &"A".into())
            .unwrap();
        let readings = &obs.sensors.raycasts;
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].id, "forward");
        assert_eq!(readings[0].ray.hit, Some("wall".into()));
        assert!((readings[0].ray.distance - 9.0).abs() < 1e-4);
        assert_eq!(readings[1].id, "up");
        assert_eq!(readings[1].ray, RayHit { distance: 5.0, hit: None });
    }

    #[test]
    fn observation_serializes_with_self_key() {
        let w = two_entity_world(Vec3::new(5.0, 0.0, 0.0));
        let obs = ObservationSystem::default()
            .observe(&w, &"A".into())
            .unwrap();
        let json = serde_json::to_value(&obs).unwrap();

        assert!(json.get("self").is_some());
        assert_eq!(json["environment"]["nearbyEntities"][0]["id"], "B");
        assert_eq!(json["environment"]["nearbyEntities"][0]["position"]["x"], 5.0);
    }

    #[test]
    fn custom_radii_are_respected() {
        let w = two_entity_world(Vec3::new(5.0, 0.0, 0.0));
        let system = ObservationSystem::new(ObservationConfig {
            near_radius: 4.0,
            visibility_radius: 6.0,
        });
        let obs = system.observe(&w, &"A".into()).unwrap();

        assert!(obs.environment.nearby_entities.is_empty());
        assert_eq!(obs.environment.visible_entities.len(), 1);
    }
}
