//! Scene loading and runtime asset injection.
//!
//! The loader sits between scene descriptions (however they were produced;
//! here, YAML/JSON descriptor lists) and the simulation core: it builds
//! entities, registers them with the world, and binds controllers. It is
//! also where configuration errors stop — an unknown controller kind is
//! rejected before anything touches the world, so the core can assume
//! every registered controller is valid.
//!
//! Asset fetch and parsing stay outside; the loader only records the
//! asset reference on the entity for the presentation layer to resolve.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use weft_common::{Collider, EntityId, codec};
use weft_kernel::{Entity, SensorConfig, World};
use weft_sim::{Controller, Simulation};

/// Metadata key under which an entity's external asset reference is kept.
pub const ASSET_METADATA_KEY: &str = "asset";

/// Errors from scene loading. Configuration problems are rejected here,
/// before any entity or controller is registered.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown controller kind `{kind}` requested by entity `{entity}`")]
    UnknownController { entity: String, kind: String },
}

/// One declarative entity description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(with = "codec::vec3_xyz")]
    pub position: Vec3,
    #[serde(
        default,
        with = "codec::quat_xyzw::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub rotation: Option<Quat>,
    #[serde(
        default,
        with = "codec::vec3_xyz::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub velocity: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collider: Option<Collider>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensors: Vec<SensorConfig>,
    /// Controller kind to bind, resolved through the registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// External asset reference; recorded as metadata, never fetched here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl EntityDescriptor {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position,
            rotation: None,
            velocity: None,
            collider: None,
            sensors: Vec::new(),
            controller: None,
            asset: None,
            metadata: BTreeMap::new(),
        }
    }

    fn build(&self) -> Entity {
        let mut entity = Entity::new(self.id.clone(), self.kind.clone(), self.position);
        if let Some(rotation) = self.rotation {
            entity.rotation = rotation;
        }
        if let Some(velocity) = self.velocity {
            entity.velocity = velocity;
        }
        entity.collider = self.collider;
        entity.sensors = self.sensors.clone();
        entity.metadata = self.metadata.clone();
        if let Some(asset) = &self.asset {
            entity.metadata.insert(
                ASSET_METADATA_KEY.into(),
                serde_json::Value::String(asset.clone()),
            );
        }
        entity
    }
}

/// A declarative scene: an ordered list of entity descriptors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub entities: Vec<EntityDescriptor>,
}

impl Scene {
    pub fn from_yaml(text: &str) -> Result<Self, LoaderError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, LoaderError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a scene file, picking the format from the extension
    /// (`.json` is JSON, anything else parses as YAML).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            Self::from_json(&text)
        } else {
            Self::from_yaml(&text)
        }
    }
}

type ControllerFactory = Box<dyn Fn(&EntityDescriptor) -> Box<dyn Controller>>;

/// Maps controller kind names to factories.
///
/// The registry is the loader's whole knowledge of controller kinds; the
/// simulation core never sees kind names, only trait objects.
pub struct ControllerRegistry {
    factories: BTreeMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    /// An empty registry with no kinds.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// The built-in kinds: `interactive` and `scripted` (with an empty
    /// script; real scripts come from custom factories).
    pub fn with_defaults() -> Self {
        Self::empty()
            .register("interactive", |_| {
                Box::new(weft_sim::InteractiveController::default())
            })
            .register("scripted", |_| {
                Box::new(weft_sim::ScriptedController::new(Vec::new()))
            })
    }

    pub fn register(
        mut self,
        kind: impl Into<String>,
        factory: impl Fn(&EntityDescriptor) -> Box<dyn Controller> + 'static,
    ) -> Self {
        self.factories.insert(kind.into(), Box::new(factory));
        self
    }

    pub fn knows(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    fn build(&self, kind: &str, descriptor: &EntityDescriptor) -> Option<Box<dyn Controller>> {
        self.factories.get(kind).map(|f| f(descriptor))
    }
}

/// Load a scene into the simulation: construct entities, add them to the
/// world, and bind controllers. Returns the ids in descriptor order.
///
/// All controller kinds are validated up front; on an unknown kind the
/// world and bindings are left untouched.
pub fn load_scene(
    scene: &Scene,
    sim: &mut Simulation,
    registry: &ControllerRegistry,
) -> Result<Vec<EntityId>, LoaderError> {
    for descriptor in &scene.entities {
        if let Some(kind) = &descriptor.controller {
            if !registry.knows(kind) {
                return Err(LoaderError::UnknownController {
                    entity: descriptor.id.clone(),
                    kind: kind.clone(),
                });
            }
        }
    }

    let mut ids = Vec::with_capacity(scene.entities.len());
    for descriptor in &scene.entities {
        let entity = descriptor.build();
        let id = entity.id.clone();
        sim.world_mut().add(entity);
        if let Some(kind) = &descriptor.controller {
            // Validated above, so the factory lookup cannot fail.
            if let Some(controller) = registry.build(kind, descriptor) {
                sim.register_controller(id.clone(), controller);
            }
        }
        ids.push(id);
    }
    tracing::info!(entities = ids.len(), "scene loaded");
    Ok(ids)
}

/// Inject one externally produced asset as a new entity at runtime.
///
/// Used for dynamically generated content arriving after the scene was
/// loaded. The entity gets a fresh unique id, a unit-sphere collider so
/// ray sensors can see it, and the asset reference in its metadata.
pub fn inject_asset(world: &mut World, asset_ref: &str, position: Vec3) -> EntityId {
    let id = EntityId::new(format!("asset-{}", Uuid::new_v4()));
    let mut entity = Entity::new(id.clone(), "generated", position)
        .with_collider(Collider::Sphere { radius: 1.0 });
    entity.metadata.insert(
        ASSET_METADATA_KEY.into(),
        serde_json::Value::String(asset_ref.to_owned()),
    );
    world.add(entity);
    tracing::info!(entity = %id, asset = asset_ref, "injected runtime asset");
    id
}
