//! Generic tree arena
//!
//! Slotmap-backed storage for ordered trees: each node has at most one
//! parent, an insertion-ordered child list, and a payload. The scene graph
//! and the GUI widget tree are both instances of this arena.

use slotmap::{new_key_type, SlotMap};

use super::SceneError;

new_key_type! {
    /// Stable handle to a node in a [`NodeArena`]
    pub struct NodeKey;
}

struct Slot<T> {
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    payload: T,
}

/// Arena-allocated ordered tree
///
/// Child order is insertion order and is significant: layout and draw
/// passes visit children in this order. Destroying a node destroys its
/// whole subtree. Nodes without a parent are roots; root order is also
/// insertion order.
pub struct NodeArena<T> {
    slots: SlotMap<NodeKey, Slot<T>>,
    roots: Vec<NodeKey>,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the key resolves to a live node
    pub fn contains(&self, key: NodeKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Insert a new root node
    pub fn insert(&mut self, payload: T) -> NodeKey {
        let key = self.slots.insert(Slot {
            parent: None,
            children: Vec::new(),
            payload,
        });
        self.roots.push(key);
        key
    }

    /// Insert a new node as the last child of `parent`
    pub fn insert_child(&mut self, parent: NodeKey, payload: T) -> Result<NodeKey, SceneError> {
        if !self.slots.contains_key(parent) {
            return Err(SceneError::NodeNotFound);
        }
        let key = self.slots.insert(Slot {
            parent: Some(parent),
            children: Vec::new(),
            payload,
        });
        self.slots[parent].children.push(key);
        Ok(key)
    }

    /// Attach an existing root node as the last child of `parent`
    ///
    /// Fails with [`SceneError::AlreadyAttached`] if `child` currently has a
    /// different parent; attaching a node to its current parent is a no-op.
    /// O(1) append, preserving sibling order.
    pub fn attach_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), SceneError> {
        if !self.slots.contains_key(parent) || !self.slots.contains_key(child) {
            return Err(SceneError::NodeNotFound);
        }
        match self.slots[child].parent {
            Some(current) if current == parent => return Ok(()),
            Some(_) => return Err(SceneError::AlreadyAttached),
            None => {}
        }
        self.roots.retain(|&k| k != child);
        self.slots[child].parent = Some(parent);
        self.slots[parent].children.push(child);
        Ok(())
    }

    /// Detach `child` from `parent`, making it a root
    ///
    /// Fails with [`SceneError::NotAChild`] if `child` is not currently a
    /// child of `parent`. Sibling order of the remaining children is
    /// preserved.
    pub fn detach_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), SceneError> {
        if !self.slots.contains_key(parent) || !self.slots.contains_key(child) {
            return Err(SceneError::NodeNotFound);
        }
        if self.slots[child].parent != Some(parent) {
            return Err(SceneError::NotAChild);
        }
        self.slots[parent].children.retain(|&k| k != child);
        self.slots[child].parent = None;
        self.roots.push(child);
        Ok(())
    }

    /// Move `child` under `new_parent`, detaching from any current parent
    pub fn reparent(&mut self, child: NodeKey, new_parent: NodeKey) -> Result<(), SceneError> {
        if !self.slots.contains_key(child) || !self.slots.contains_key(new_parent) {
            return Err(SceneError::NodeNotFound);
        }
        if let Some(old) = self.slots[child].parent {
            if old == new_parent {
                return Ok(());
            }
            self.slots[old].children.retain(|&k| k != child);
        } else {
            self.roots.retain(|&k| k != child);
        }
        self.slots[child].parent = Some(new_parent);
        self.slots[new_parent].children.push(child);
        Ok(())
    }

    /// Remove a node and its entire subtree
    pub fn remove(&mut self, key: NodeKey) -> Result<(), SceneError> {
        if !self.slots.contains_key(key) {
            return Err(SceneError::NodeNotFound);
        }
        if let Some(parent) = self.slots[key].parent {
            self.slots[parent].children.retain(|&k| k != key);
        } else {
            self.roots.retain(|&k| k != key);
        }
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(slot) = self.slots.remove(k) {
                stack.extend(slot.children);
            }
        }
        Ok(())
    }

    /// Get a node's payload
    pub fn get(&self, key: NodeKey) -> Option<&T> {
        self.slots.get(key).map(|s| &s.payload)
    }

    /// Get a node's payload mutably
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut T> {
        self.slots.get_mut(key).map(|s| &mut s.payload)
    }

    /// Get a node's parent, if any
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.slots.get(key).and_then(|s| s.parent)
    }

    /// Ordered read-only view of a node's children
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.slots.get(key).map_or(&[], |s| &s.children)
    }

    /// Root nodes in insertion order
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Lazy pre-order iterator over all transitive children of `key`
    /// (exclusive of `key` itself)
    ///
    /// The iterator borrows the arena, so structural mutation during
    /// iteration is rejected at compile time; the sequence therefore always
    /// reflects the live tree.
    pub fn descendants(&self, key: NodeKey) -> Descendants<'_, T> {
        let mut stack: Vec<NodeKey> = self.children(key).to_vec();
        stack.reverse();
        Descendants { arena: self, stack }
    }
}

/// Pre-order traversal over a subtree, see [`NodeArena::descendants`]
pub struct Descendants<'a, T> {
    arena: &'a NodeArena<T>,
    stack: Vec<NodeKey>,
}

impl<T> Iterator for Descendants<'_, T> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let key = self.stack.pop()?;
        for &child in self.arena.children(key).iter().rev() {
            self.stack.push(child);
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (NodeArena<&'static str>, NodeKey, NodeKey, NodeKey, NodeKey) {
        let mut arena = NodeArena::new();
        let root = arena.insert("root");
        let a = arena.insert_child(root, "a").unwrap();
        let b = arena.insert_child(root, "b").unwrap();
        let a1 = arena.insert_child(a, "a1").unwrap();
        (arena, root, a, b, a1)
    }

    #[test]
    fn test_attach_detach_round_trip_preserves_sibling_order() {
        let (mut arena, root, a, b, _) = tree();
        let c = arena.insert("c");
        arena.attach_child(root, c).unwrap();
        assert_eq!(arena.children(root), &[a, b, c]);

        arena.detach_child(root, c).unwrap();
        assert_eq!(arena.children(root), &[a, b]);
        assert_eq!(arena.parent(c), None);
        assert!(arena.roots().contains(&c));
    }

    #[test]
    fn test_attach_rejects_foreign_parent() {
        let (mut arena, _, a, b, a1) = tree();
        // a1 belongs to a; attaching under b must fail without mutation
        assert!(matches!(
            arena.attach_child(b, a1),
            Err(SceneError::AlreadyAttached)
        ));
        assert_eq!(arena.parent(a1), Some(a));
        assert!(arena.children(b).is_empty());
    }

    #[test]
    fn test_attach_to_current_parent_is_noop() {
        let (mut arena, root, a, b, _) = tree();
        arena.attach_child(root, a).unwrap();
        assert_eq!(arena.children(root), &[a, b]);
    }

    #[test]
    fn test_detach_rejects_non_child() {
        let (mut arena, _, _, b, a1) = tree();
        assert!(matches!(
            arena.detach_child(b, a1),
            Err(SceneError::NotAChild)
        ));
    }

    #[test]
    fn test_reparent_moves_subtree() {
        let (mut arena, root, a, b, a1) = tree();
        arena.reparent(a1, b).unwrap();
        assert_eq!(arena.parent(a1), Some(b));
        assert!(arena.children(a).is_empty());
        assert_eq!(arena.children(root), &[a, b]);
    }

    #[test]
    fn test_descendants_pre_order() {
        let (arena, root, a, b, a1) = tree();
        let order: Vec<NodeKey> = arena.descendants(root).collect();
        assert_eq!(order, vec![a, a1, b]);
    }

    #[test]
    fn test_remove_destroys_subtree() {
        let (mut arena, root, a, b, a1) = tree();
        arena.remove(a).unwrap();
        assert!(!arena.contains(a));
        assert!(!arena.contains(a1));
        assert!(arena.contains(b));
        assert_eq!(arena.children(root), &[b]);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_remove_unknown_key_fails() {
        let (mut arena, _, a, _, _) = tree();
        arena.remove(a).unwrap();
        assert!(matches!(arena.remove(a), Err(SceneError::NodeNotFound)));
    }
}
