//! Entity/component framework
//!
//! An [`Entity`] is a named bundle of capability components: at most one
//! spatial, one physics, one renderable, and one behavior component each,
//! enforced structurally with one `Option` field per capability. Code asks
//! for a capability through an explicit accessor instead of testing runtime
//! types. Lifecycle is owned by the [`SceneManager`](crate::scene::SceneManager):
//! destroying an entity cascades into its components (physics body removed
//! from the solver, scene subtree removed from the graph).

pub mod factory;

use slotmap::new_key_type;

use crate::physics::BodyHandle;
use crate::render::GeometryHandle;
use crate::scene::{NodeKey, SceneNode};

new_key_type! {
    /// Stable handle to a registered [`Entity`]
    pub struct EntityKey;
}

/// Links an entity to its scene graph node
#[derive(Debug, Clone, Copy)]
pub struct SpatialComponent {
    /// The entity's node in the scene graph
    pub node: NodeKey,
}

/// Links an entity to a rigid body in the physics manager
#[derive(Debug, Clone, Copy)]
pub struct PhysicsComponent {
    /// The registered body
    pub body: BodyHandle,

    /// Whether the body's pose is copied into the scene node each frame
    pub sync_pose: bool,
}

/// Rendering data mirrored onto the entity's scene node
#[derive(Debug, Clone, Copy)]
pub struct RenderableComponent {
    /// Geometry to draw
    pub geometry: GeometryHandle,

    /// Draw-order sort key; lower layers draw first
    pub layer: i32,

    /// Whether the node contributes to shadow passes
    pub cast_shadows: bool,

    /// Whether the node still casts shadows while invisible
    pub cast_shadows_when_invisible: bool,
}

impl RenderableComponent {
    /// Create a renderable with default shadow flags
    pub fn new(geometry: GeometryHandle, layer: i32) -> Self {
        Self {
            geometry,
            layer,
            cast_shadows: true,
            cast_shadows_when_invisible: false,
        }
    }
}

/// A contact involving this entity, delivered to its behavior
#[derive(Debug, Clone)]
pub struct Contact {
    /// Name of the other entity in the pair
    pub other: String,

    /// True when contact started, false when it stopped
    pub started: bool,
}

/// Per-frame behavior attached to an entity
///
/// Behaviors tick only while the owning entity is enabled and its scene
/// node declares the updateable capability.
pub trait UpdateBehavior {
    /// Advance the behavior by `dt` seconds, mutating the entity's node
    fn update(&mut self, node: &mut SceneNode, dt: f32);

    /// Called for each contact event involving this entity
    fn on_contact(&mut self, contact: &Contact) {
        let _ = contact;
    }
}

/// Behavior capability wrapper
pub struct BehaviorComponent {
    /// The boxed behavior
    pub behavior: Box<dyn UpdateBehavior>,
}

/// A named bundle of capability components
pub struct Entity {
    name: String,

    /// Disabled entities are skipped entirely during updates, components
    /// included
    pub enabled: bool,

    pub(crate) spatial: Option<SpatialComponent>,
    pub(crate) physics: Option<PhysicsComponent>,
    pub(crate) renderable: Option<RenderableComponent>,
    pub(crate) behavior: Option<BehaviorComponent>,
}

impl Entity {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            spatial: None,
            physics: None,
            renderable: None,
            behavior: None,
        }
    }

    /// Entity name, unique within its manager
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spatial capability, if attached
    pub fn spatial(&self) -> Option<&SpatialComponent> {
        self.spatial.as_ref()
    }

    /// Physics capability, if attached
    pub fn physics(&self) -> Option<&PhysicsComponent> {
        self.physics.as_ref()
    }

    /// Renderable capability, if attached
    pub fn renderable(&self) -> Option<&RenderableComponent> {
        self.renderable.as_ref()
    }

    /// Behavior capability, if attached
    pub fn behavior(&self) -> Option<&BehaviorComponent> {
        self.behavior.as_ref()
    }

    /// Behavior capability, mutable
    pub fn behavior_mut(&mut self) -> Option<&mut BehaviorComponent> {
        self.behavior.as_mut()
    }
}
