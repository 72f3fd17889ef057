//! Scene graph: nodes with transform inheritance and declared capabilities
//!
//! Nodes declare at construction which optional capabilities they carry
//! (drawable, updateable, physics-backed); traversal code queries the
//! capability record instead of inspecting runtime types.

use crate::foundation::math::{Mat4, Transform};
use crate::physics::BodyHandle;
use crate::render::{DrawItem, GeometryHandle};

use super::node::{NodeArena, NodeKey};
use super::SceneError;

/// Rendering data for a drawable node
#[derive(Debug, Clone)]
pub struct DrawableSpec {
    /// Opaque handle to loaded geometry buffers
    pub geometry: GeometryHandle,

    /// Draw-order sort key; lower layers draw first
    pub layer: i32,

    /// Whether this node contributes to shadow passes
    pub cast_shadows: bool,

    /// Whether this node still casts shadows while invisible
    pub cast_shadows_when_invisible: bool,
}

impl DrawableSpec {
    /// Create a drawable spec with default shadow flags (casts shadows,
    /// but not while invisible)
    pub fn new(geometry: GeometryHandle, layer: i32) -> Self {
        Self {
            geometry,
            layer,
            cast_shadows: true,
            cast_shadows_when_invisible: false,
        }
    }
}

/// Optional capabilities a scene node declares at construction
#[derive(Debug, Clone, Default)]
pub struct NodeCapabilities {
    /// Present if the node is drawable
    pub drawable: Option<DrawableSpec>,

    /// Whether behaviors attached to this node's entity should tick
    pub updateable: bool,

    /// Present if a physics body backs this node's pose
    pub physics_body: Option<BodyHandle>,
}

/// A node in the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name, for diagnostics
    pub name: String,

    /// Transform relative to the parent node
    pub local: Transform,

    /// Cached world transform; valid only after the frame's
    /// [`SceneGraph::update_matrices`] pass
    pub world: Mat4,

    /// Visibility flag; an invisible drawable node suppresses its whole
    /// subtree during drawable collection
    pub visible: bool,

    /// Declared capability record
    pub capabilities: NodeCapabilities,
}

impl SceneNode {
    /// Create a plain (non-drawable, non-updateable) node
    pub fn new(name: impl Into<String>, local: Transform) -> Self {
        Self {
            name: name.into(),
            local,
            world: Mat4::identity(),
            visible: true,
            capabilities: NodeCapabilities::default(),
        }
    }

    /// Builder-style: declare the drawable capability
    pub fn with_drawable(mut self, spec: DrawableSpec) -> Self {
        self.capabilities.drawable = Some(spec);
        self
    }

    /// Builder-style: declare the updateable capability
    pub fn with_updateable(mut self) -> Self {
        self.capabilities.updateable = true;
        self
    }
}

/// Tree of [`SceneNode`]s with a push-down world transform pass
#[derive(Default)]
pub struct SceneGraph {
    arena: NodeArena<SceneNode>,
}

impl SceneGraph {
    /// Create an empty scene graph
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
        }
    }

    /// Add a root node
    pub fn add_root(&mut self, node: SceneNode) -> NodeKey {
        self.arena.insert(node)
    }

    /// Add a node as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeKey, node: SceneNode) -> Result<NodeKey, SceneError> {
        self.arena.insert_child(parent, node)
    }

    /// Remove a node and its subtree
    pub fn remove(&mut self, key: NodeKey) -> Result<(), SceneError> {
        self.arena.remove(key)
    }

    /// Access a node
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.arena.get(key)
    }

    /// Access a node mutably
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.arena.get_mut(key)
    }

    /// The underlying tree arena
    pub fn arena(&self) -> &NodeArena<SceneNode> {
        &self.arena
    }

    /// The underlying tree arena, mutable
    pub fn arena_mut(&mut self) -> &mut NodeArena<SceneNode> {
        &mut self.arena
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Recompute every node's cached world matrix, top-down
    ///
    /// `world = parent_world * local.to_matrix()` (column vectors, parent on
    /// the left). This is a strict push-down pass with no lazy recomputation;
    /// it must run once per frame before any draw call reads world matrices.
    pub fn update_matrices(&mut self) {
        let mut stack: Vec<(NodeKey, Mat4)> = self
            .arena
            .roots()
            .iter()
            .map(|&k| (k, Mat4::identity()))
            .collect();
        while let Some((key, parent_world)) = stack.pop() {
            let world = {
                let node = match self.arena.get_mut(key) {
                    Some(n) => n,
                    None => continue,
                };
                node.world = parent_world * node.local.to_matrix();
                node.world
            };
            for &child in self.arena.children(key) {
                stack.push((child, world));
            }
        }
    }

    /// Collect draw items from visible drawable nodes, depth-first in child
    /// order
    ///
    /// Pruning rule: a node that is drawable but invisible is skipped
    /// together with its entire subtree; a node that is not drawable at all
    /// contributes nothing itself but traversal continues into its children.
    pub fn collect_drawables(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        for &root in self.arena.roots() {
            self.collect_drawables_from(root, &mut items);
        }
        items
    }

    fn collect_drawables_from(&self, key: NodeKey, items: &mut Vec<DrawItem>) {
        let node = match self.arena.get(key) {
            Some(n) => n,
            None => return,
        };
        if let Some(spec) = &node.capabilities.drawable {
            if !node.visible {
                return;
            }
            items.push(DrawItem {
                geometry: spec.geometry,
                world: node.world,
                layer: spec.layer,
                cast_shadows: spec.cast_shadows,
            });
        }
        for &child in self.arena.children(key) {
            self.collect_drawables_from(child, items);
        }
    }

    /// Collect draw items for the shadow pass
    ///
    /// Same pruning rule as [`collect_drawables`](Self::collect_drawables),
    /// except an invisible drawable with `cast_shadows_when_invisible` still
    /// contributes itself (its subtree stays pruned).
    pub fn collect_shadow_casters(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        for &root in self.arena.roots() {
            self.collect_shadow_casters_from(root, &mut items);
        }
        items
    }

    fn collect_shadow_casters_from(&self, key: NodeKey, items: &mut Vec<DrawItem>) {
        let node = match self.arena.get(key) {
            Some(n) => n,
            None => return,
        };
        if let Some(spec) = &node.capabilities.drawable {
            let casts = spec.cast_shadows
                && (node.visible || spec.cast_shadows_when_invisible);
            if casts {
                items.push(DrawItem {
                    geometry: spec.geometry,
                    world: node.world,
                    layer: spec.layer,
                    cast_shadows: true,
                });
            }
            if !node.visible {
                return;
            }
        }
        for &child in self.arena.children(key) {
            self.collect_shadow_casters_from(child, items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn geometry() -> GeometryHandle {
        GeometryHandle::new(1, 2, 36)
    }

    #[test]
    fn test_world_matrix_is_ancestor_product() {
        let mut graph = SceneGraph::new();
        let t_root = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        let t_mid = Transform::from_position(Vec3::new(0.0, 2.0, 0.0));
        let t_leaf = Transform::from_position(Vec3::new(0.0, 0.0, 3.0));

        let root = graph.add_root(SceneNode::new("root", t_root.clone()));
        let mid = graph.add_child(root, SceneNode::new("mid", t_mid.clone())).unwrap();
        let leaf = graph.add_child(mid, SceneNode::new("leaf", t_leaf.clone())).unwrap();

        graph.update_matrices();

        let expected = t_root.to_matrix() * t_mid.to_matrix() * t_leaf.to_matrix();
        assert_relative_eq!(graph.node(leaf).unwrap().world, expected, epsilon = 1e-5);
        assert_relative_eq!(
            graph.node(mid).unwrap().world,
            t_root.to_matrix() * t_mid.to_matrix(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_invisible_drawable_prunes_subtree() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(
            SceneNode::new("root", Transform::identity())
                .with_drawable(DrawableSpec::new(geometry(), 0)),
        );
        graph.node_mut(root).unwrap().visible = false;
        // Visible drawable child under an invisible drawable parent
        graph
            .add_child(
                root,
                SceneNode::new("child", Transform::identity())
                    .with_drawable(DrawableSpec::new(geometry(), 0)),
            )
            .unwrap();

        graph.update_matrices();
        assert!(graph.collect_drawables().is_empty());
    }

    #[test]
    fn test_non_drawable_node_does_not_block_children() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::new("group", Transform::identity()));
        graph
            .add_child(
                root,
                SceneNode::new("mesh", Transform::identity())
                    .with_drawable(DrawableSpec::new(geometry(), 3)),
            )
            .unwrap();

        graph.update_matrices();
        let items = graph.collect_drawables();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].layer, 3);
    }

    #[test]
    fn test_shadow_caster_when_invisible() {
        let mut graph = SceneGraph::new();
        let mut spec = DrawableSpec::new(geometry(), 0);
        spec.cast_shadows_when_invisible = true;
        let key = graph.add_root(SceneNode::new("occluder", Transform::identity()).with_drawable(spec));
        graph.node_mut(key).unwrap().visible = false;

        assert!(graph.collect_drawables().is_empty());
        assert_eq!(graph.collect_shadow_casters().len(), 1);
    }

    #[test]
    fn test_drawables_collected_in_child_order() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::new("root", Transform::identity()));
        for layer in [5, 1, 3] {
            graph
                .add_child(
                    root,
                    SceneNode::new("mesh", Transform::identity())
                        .with_drawable(DrawableSpec::new(geometry(), layer)),
                )
                .unwrap();
        }
        let layers: Vec<i32> = graph.collect_drawables().iter().map(|d| d.layer).collect();
        assert_eq!(layers, vec![5, 1, 3]);
    }
}
