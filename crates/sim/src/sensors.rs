//! Stateless ray-cast queries against the world's collider proxies.
//!
//! No broad-phase acceleration structure: every query walks the full entity
//! set and keeps the nearest intersection. Entity counts in this system are
//! small enough that a linear scan is the simpler invariant to maintain.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use weft_common::{Collider, EntityId};
use weft_kernel::{Entity, World};

/// Result of one ray-cast query.
///
/// `distance` is the hit distance, or the full query range on a miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    pub distance: f32,
    pub hit: Option<EntityId>,
}

impl RayHit {
    fn miss(range: f32) -> Self {
        Self {
            distance: range,
            hit: None,
        }
    }
}

/// Cast a ray from `entity`'s position along `local_direction` (rotated
/// into world space by the entity's rotation), out to `range`.
///
/// The query set is every *other* entity with a collider proxy; entities
/// without one are excluded without error. Ties resolve nearest-first. A
/// zero direction is a miss.
pub fn cast_ray(world: &World, entity: &Entity, local_direction: Vec3, range: f32) -> RayHit {
    let Some(direction) = (entity.rotation * local_direction).try_normalize() else {
        return RayHit::miss(range);
    };
    let origin = entity.position;

    let mut nearest = RayHit::miss(range);
    for (id, other) in world.entities() {
        if *id == entity.id {
            continue;
        }
        let Some(collider) = other.collider else {
            continue;
        };
        let distance = match collider {
            Collider::Sphere { radius } => ray_sphere(origin, direction, other.position, radius),
            Collider::Box { half_extents } => {
                ray_aabb(origin, direction, other.position, half_extents)
            }
        };
        if let Some(distance) = distance {
            if distance < nearest.distance {
                nearest = RayHit {
                    distance,
                    hit: Some(id.clone()),
                };
            }
        }
    }
    nearest
}

/// Nearest non-negative intersection of a unit-direction ray with a sphere.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let near = -b - sqrt_d;
    if near >= 0.0 {
        return Some(near);
    }
    // Ray origin inside the sphere: report the exit distance.
    let far = -b + sqrt_d;
    (far >= 0.0).then_some(far)
}

/// Slab test against an axis-aligned box centered at `center`.
///
/// The target's rotation is deliberately ignored; box proxies are
/// world-axis-aligned (see `weft_common::Collider`).
fn ray_aabb(origin: Vec3, direction: Vec3, center: Vec3, half_extents: Vec3) -> Option<f32> {
    let min = center - half_extents;
    let max = center + half_extents;

    let mut t_min = 0.0f32;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < f32::EPSILON {
            // Parallel to this slab: miss unless the origin lies inside it.
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t0 = (min[axis] - o) * inv;
        let mut t1 = (max[axis] - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_max < t_min {
            return None;
        }
    }
    Some(t_min)
}
