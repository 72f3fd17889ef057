//! # Canopy Engine
//!
//! A component-based real-time 3D game engine core.
//!
//! ## Features
//!
//! - **Scene Graph**: Tree-structured nodes with transform inheritance
//! - **Entity/Component Framework**: Capability-based composition with explicit accessors
//! - **Retained-Mode GUI**: Widget tree with a three-phase invalidation/layout protocol
//! - **Physics Facade**: Rigid-body simulation delegated to rapier3d
//! - **Plugin Managers**: Deterministic per-frame update ordering
//!
//! Rendering and content loading are external collaborators: the engine
//! exposes backend traits ([`render::RenderBackend`], [`gui::GuiBackend`],
//! [`content::ContentProvider`]) and opaque handles, never a graphics device.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canopy_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!     let (scene, physics) = engine.managers_mut();
//!     let floor = canopy_engine::entity::factory::physics_plane(
//!         scene,
//!         physics,
//!         "floor",
//!         Vec3::y_axis(),
//!     )?;
//!     let _ = floor;
//!     engine.advance(1.0 / 60.0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod content;
pub mod entity;
pub mod foundation;
pub mod gui;
pub mod physics;
pub mod plugin;
pub mod render;
pub mod scene;

mod engine;

pub use engine::Engine;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig, GuiConfig, PhysicsConfig},
        content::{ContentError, ContentProvider},
        entity::{Entity, EntityKey, UpdateBehavior},
        foundation::{
            math::{Mat4, Quat, Transform, Vec2, Vec3, Vec4},
            time::Timer,
        },
        gui::{
            GuiBackend, GuiDrawCommand, GuiManager, HorizontalAlign, VerticalAlign, Widget,
            WidgetKey, WidgetKind,
        },
        physics::{BodyDesc, BodyHandle, PhysicsController, PhysicsManager},
        plugin::{Plugin, PluginEvent},
        render::{DrawItem, GeometryHandle, RenderBackend},
        scene::{NodeKey, SceneGraph, SceneManager, SceneNode},
        Engine,
    };
}
