//! Scene graph and entity management
//!
//! The scene is a tree of nodes with transform inheritance. Entities layer
//! capability components (spatial, physics, renderable, behavior) on top of
//! scene nodes and are driven per frame by the [`SceneManager`].

pub mod graph;
pub mod manager;
pub mod node;

pub use graph::{DrawableSpec, NodeCapabilities, SceneGraph, SceneNode};
pub use manager::SceneManager;
pub use node::{Descendants, NodeArena, NodeKey};

/// Errors raised by scene graph and entity operations
///
/// Every variant is a programmer error: operations fail immediately and
/// loudly, never silently. There is no retry path.
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// A node key did not resolve to a live node
    #[error("node not found in arena")]
    NodeNotFound,

    /// Attach target already has a different parent (detach first)
    #[error("node is already attached to a different parent")]
    AlreadyAttached,

    /// Detach target is not a child of the given parent
    #[error("node is not a child of the given parent")]
    NotAChild,

    /// An entity with this name is already registered
    #[error("entity '{0}' is already registered")]
    DuplicateEntity(String),

    /// No entity with this name is registered
    #[error("entity '{0}' not found")]
    EntityNotFound(String),

    /// The entity already owns a component of this capability
    #[error("entity '{0}' already has a {1} component")]
    DuplicateComponent(String, &'static str),

    /// The operation requires a component the entity does not own
    #[error("entity '{0}' is missing a {1} component")]
    MissingComponent(String, &'static str),

    /// A physics-side failure surfaced during an entity operation
    #[error("physics error during entity operation: {0}")]
    Physics(#[from] crate::physics::PhysicsError),
}
