//! Factory helpers assembling common entity configurations
//!
//! Each factory registers an entity and attaches the components the
//! configuration needs, in one call. They are plain conveniences over the
//! [`SceneManager`] attach API.

use crate::foundation::math::{Transform, Unit, Vec3};
use crate::physics::{BodyDesc, ColliderShape, PhysicsManager};
use crate::render::GeometryHandle;
use crate::scene::{SceneError, SceneManager, SceneNode};

use super::{EntityKey, RenderableComponent};

/// An immovable collision plane (no renderable)
///
/// `normal` is the outward surface normal; the plane passes through the
/// origin.
pub fn physics_plane(
    scene: &mut SceneManager,
    physics: &mut PhysicsManager,
    name: &str,
    normal: Unit<Vec3>,
) -> Result<EntityKey, SceneError> {
    let key = scene.add_entity(name)?;
    scene.attach_spatial(key, None, SceneNode::new(name, Transform::identity()))?;
    let desc = BodyDesc::fixed(ColliderShape::Plane { normal });
    scene.attach_physics(key, physics, &desc, false)?;
    Ok(key)
}

/// A dynamic box with a renderable mesh, dropped at `position`
pub fn physics_crate(
    scene: &mut SceneManager,
    physics: &mut PhysicsManager,
    name: &str,
    half_extents: Vec3,
    position: Vec3,
    geometry: GeometryHandle,
) -> Result<EntityKey, SceneError> {
    let transform = Transform::from_position(position);
    let key = scene.add_entity(name)?;
    scene.attach_spatial(key, None, SceneNode::new(name, transform.clone()))?;
    let desc = BodyDesc::dynamic(ColliderShape::Cuboid { half_extents }).at(transform);
    scene.attach_physics(key, physics, &desc, true)?;
    scene.attach_renderable(key, RenderableComponent::new(geometry, 0))?;
    Ok(key)
}

/// A static (non-physical) mesh entity
pub fn static_mesh(
    scene: &mut SceneManager,
    name: &str,
    transform: Transform,
    geometry: GeometryHandle,
    layer: i32,
) -> Result<EntityKey, SceneError> {
    let key = scene.add_entity(name)?;
    scene.attach_spatial(key, None, SceneNode::new(name, transform))?;
    scene.attach_renderable(key, RenderableComponent::new(geometry, layer))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;

    #[test]
    fn test_physics_crate_has_all_capabilities() {
        let mut scene = SceneManager::new();
        let mut physics = PhysicsManager::new(&PhysicsConfig::default());

        let key = physics_crate(
            &mut scene,
            &mut physics,
            "crate",
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(0.0, 5.0, 0.0),
            GeometryHandle::new(1, 1, 36),
        )
        .unwrap();

        let entity = scene.entity(key).unwrap();
        assert!(entity.spatial().is_some());
        assert!(entity.physics().is_some());
        assert!(entity.renderable().is_some());
        assert_eq!(physics.body_count(), 1);
    }

    #[test]
    fn test_static_mesh_has_no_body() {
        let mut scene = SceneManager::new();
        let key = static_mesh(
            &mut scene,
            "statue",
            Transform::identity(),
            GeometryHandle::new(2, 2, 36),
            1,
        )
        .unwrap();
        assert!(scene.entity(key).unwrap().physics().is_none());
    }
}
