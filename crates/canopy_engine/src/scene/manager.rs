//! Scene manager: entity registry and per-frame driver
//!
//! Owns the scene graph and all registered entities. Each frame it walks
//! enabled entities in registration order, syncs physics poses into their
//! nodes, ticks behaviors, delivers contact events, and finally pushes
//! world matrices down the graph.
//!
//! Structural mutation (add/remove entity, attach components) must happen
//! outside a running update; the `&mut self` receiver enforces this at
//! compile time.

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::entity::{
    BehaviorComponent, Contact, Entity, EntityKey, PhysicsComponent, RenderableComponent,
    SpatialComponent, UpdateBehavior,
};
use crate::physics::{BodyDesc, BodyHandle, PhysicsManager};
use crate::plugin::{Plugin, PluginCore};

use super::graph::{DrawableSpec, SceneGraph, SceneNode};
use super::node::NodeKey;
use super::SceneError;

/// Entity registry and per-frame update driver
pub struct SceneManager {
    core: PluginCore,
    graph: SceneGraph,
    entities: SlotMap<EntityKey, Entity>,
    by_name: HashMap<String, EntityKey>,
    order: Vec<EntityKey>,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneManager {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            core: PluginCore::new("scene", 10),
            graph: SceneGraph::new(),
            entities: SlotMap::with_key(),
            by_name: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// The scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The scene graph, mutable
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Register a new entity under a unique name
    pub fn add_entity(&mut self, name: &str) -> Result<EntityKey, SceneError> {
        if self.by_name.contains_key(name) {
            return Err(SceneError::DuplicateEntity(name.to_string()));
        }
        let key = self.entities.insert(Entity::new(name));
        self.by_name.insert(name.to_string(), key);
        self.order.push(key);
        Ok(key)
    }

    /// Look up an entity key by name
    pub fn find(&self, name: &str) -> Option<EntityKey> {
        self.by_name.get(name).copied()
    }

    /// Access an entity
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    /// Access an entity mutably
    pub fn entity_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    /// Number of registered entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Attach the spatial capability: a node in the scene graph
    ///
    /// The node is inserted as a root, or as the last child of `parent`.
    pub fn attach_spatial(
        &mut self,
        key: EntityKey,
        parent: Option<NodeKey>,
        node: SceneNode,
    ) -> Result<NodeKey, SceneError> {
        let name = self.entity_name(key)?;
        let entity = self.entities.get_mut(key).ok_or_else(|| SceneError::EntityNotFound(name.clone()))?;
        if entity.spatial.is_some() {
            return Err(SceneError::DuplicateComponent(name, "spatial"));
        }
        let node_key = match parent {
            Some(parent) => self.graph.add_child(parent, node)?,
            None => self.graph.add_root(node),
        };
        self.entities[key].spatial = Some(SpatialComponent { node: node_key });
        Ok(node_key)
    }

    /// Attach the physics capability: a rigid body registered for this entity
    ///
    /// Requires the spatial capability; the body handle is recorded on the
    /// entity's node. With `sync_pose`, the body's pose is copied into the
    /// node's local transform every update.
    pub fn attach_physics(
        &mut self,
        key: EntityKey,
        physics: &mut PhysicsManager,
        desc: &BodyDesc,
        sync_pose: bool,
    ) -> Result<BodyHandle, SceneError> {
        let name = self.entity_name(key)?;
        let entity = self.entities.get(key).ok_or_else(|| SceneError::EntityNotFound(name.clone()))?;
        if entity.physics.is_some() {
            return Err(SceneError::DuplicateComponent(name, "physics"));
        }
        let spatial = entity
            .spatial
            .ok_or_else(|| SceneError::MissingComponent(name.clone(), "spatial"))?;

        let body = physics.add_body(key, desc)?;
        self.entities[key].physics = Some(PhysicsComponent { body, sync_pose });
        if let Some(node) = self.graph.node_mut(spatial.node) {
            node.capabilities.physics_body = Some(body);
        }
        Ok(body)
    }

    /// Attach the renderable capability, mirrored onto the entity's node
    ///
    /// Requires the spatial capability.
    pub fn attach_renderable(
        &mut self,
        key: EntityKey,
        renderable: RenderableComponent,
    ) -> Result<(), SceneError> {
        let name = self.entity_name(key)?;
        let entity = self.entities.get(key).ok_or_else(|| SceneError::EntityNotFound(name.clone()))?;
        if entity.renderable.is_some() {
            return Err(SceneError::DuplicateComponent(name, "renderable"));
        }
        let spatial = entity
            .spatial
            .ok_or_else(|| SceneError::MissingComponent(name.clone(), "spatial"))?;

        if let Some(node) = self.graph.node_mut(spatial.node) {
            node.capabilities.drawable = Some(DrawableSpec {
                geometry: renderable.geometry,
                layer: renderable.layer,
                cast_shadows: renderable.cast_shadows,
                cast_shadows_when_invisible: renderable.cast_shadows_when_invisible,
            });
        }
        self.entities[key].renderable = Some(renderable);
        Ok(())
    }

    /// Attach the behavior capability
    ///
    /// Requires the spatial capability; marks the node updateable so the
    /// behavior ticks each frame.
    pub fn attach_behavior(
        &mut self,
        key: EntityKey,
        behavior: Box<dyn UpdateBehavior>,
    ) -> Result<(), SceneError> {
        let name = self.entity_name(key)?;
        let entity = self.entities.get(key).ok_or_else(|| SceneError::EntityNotFound(name.clone()))?;
        if entity.behavior.is_some() {
            return Err(SceneError::DuplicateComponent(name, "behavior"));
        }
        let spatial = entity
            .spatial
            .ok_or_else(|| SceneError::MissingComponent(name.clone(), "spatial"))?;

        if let Some(node) = self.graph.node_mut(spatial.node) {
            node.capabilities.updateable = true;
        }
        self.entities[key].behavior = Some(BehaviorComponent { behavior });
        Ok(())
    }

    /// Destroy an entity, cascading into its components
    ///
    /// The physics body is removed from the solver and the entity's scene
    /// subtree is removed from the graph. A body-removal failure is logged
    /// and destruction continues; the entity never half-survives.
    pub fn remove_entity(
        &mut self,
        name: &str,
        physics: &mut PhysicsManager,
    ) -> Result<(), SceneError> {
        let key = self
            .by_name
            .remove(name)
            .ok_or_else(|| SceneError::EntityNotFound(name.to_string()))?;
        self.order.retain(|&k| k != key);
        let entity = self.entities.remove(key).expect("name index out of sync");

        if let Some(physics_component) = entity.physics {
            if let Err(e) = physics.remove_body(physics_component.body) {
                log::warn!("destroying entity '{name}': body removal failed: {e}");
            }
        }
        if let Some(spatial) = entity.spatial {
            if let Err(e) = self.graph.remove(spatial.node) {
                log::warn!("destroying entity '{name}': node removal failed: {e}");
            }
        }
        Ok(())
    }

    /// Destroy every entity, in registration order
    pub fn remove_all_entities(&mut self, physics: &mut PhysicsManager) {
        let names: Vec<String> = self
            .order
            .iter()
            .filter_map(|&k| self.entities.get(k).map(|e| e.name().to_string()))
            .collect();
        for name in names {
            if let Err(e) = self.remove_entity(&name, physics) {
                log::warn!("remove_all_entities: {e}");
            }
        }
    }

    /// Advance every enabled entity by `dt` seconds
    ///
    /// Registration order: for each enabled entity, the physics pose is
    /// copied into its node (when `sync_pose`), then its behavior ticks if
    /// the node is updateable. Disabled entities are skipped entirely,
    /// components included. Contact events drained from the physics manager
    /// are delivered to both owning entities' behaviors. The pass ends by
    /// pushing world matrices down the graph.
    pub fn update(&mut self, dt: f32, physics: &mut PhysicsManager) {
        let order = self.order.clone();
        for key in order {
            let Some(entity) = self.entities.get_mut(key) else {
                continue;
            };
            if !entity.enabled {
                continue;
            }
            if let (Some(spatial), Some(body)) = (entity.spatial, entity.physics) {
                if body.sync_pose {
                    if let Some((position, rotation)) = physics.body_pose(body.body) {
                        if let Some(node) = self.graph.node_mut(spatial.node) {
                            node.local.position = position;
                            node.local.rotation = rotation;
                        }
                    }
                }
            }
            let Some(entity) = self.entities.get_mut(key) else {
                continue;
            };
            if let (Some(spatial), Some(behavior)) = (entity.spatial, entity.behavior.as_mut()) {
                if let Some(node) = self.graph.node_mut(spatial.node) {
                    if node.capabilities.updateable {
                        behavior.behavior.update(node, dt);
                    }
                }
            }
        }

        for event in physics.take_contact_events() {
            self.deliver_contact(event.first, event.second, event.started);
            self.deliver_contact(event.second, event.first, event.started);
        }

        self.graph.update_matrices();
    }

    fn deliver_contact(&mut self, to: EntityKey, other: EntityKey, started: bool) {
        let other_name = self
            .entities
            .get(other)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        if let Some(entity) = self.entities.get_mut(to) {
            if entity.enabled {
                if let Some(behavior) = entity.behavior.as_mut() {
                    behavior
                        .behavior
                        .on_contact(&Contact { other: other_name, started });
                }
            }
        }
    }

    fn entity_name(&self, key: EntityKey) -> Result<String, SceneError> {
        self.entities
            .get(key)
            .map(|e| e.name().to_string())
            .ok_or_else(|| SceneError::EntityNotFound(format!("{key:?}")))
    }
}

impl Plugin for SceneManager {
    fn core(&self) -> &PluginCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PluginCore {
        &mut self.core
    }
}
