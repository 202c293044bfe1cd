use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity in the world.
///
/// Ids are caller-supplied strings (the snapshot interchange format keys
/// entities by string id). The loader generates fresh ids for entities it
/// injects at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Collision proxy standing in for an entity's presentation geometry.
///
/// The core never reads presentation handles; ray queries run against these
/// proxies instead. Entities without a proxy are invisible to ray casts.
///
/// Box proxies are evaluated axis-aligned in world space: the target
/// entity's rotation is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum Collider {
    Sphere {
        radius: f32,
    },
    Box {
        #[serde(rename = "halfExtents", with = "crate::codec::vec3_xyz")]
        half_extents: Vec3,
    },
}
