//! The transform-hierarchy tree.
//!
//! [`SceneTree`] owns every node in a slotmap arena and plays the role of
//! the root node: the root entry is pinned to the identity transform and
//! the per-frame [`update`](SceneTree::update) and
//! [`draw`](SceneTree::draw) traversals start from it.
//!
//! # Cache staleness contract
//!
//! A node's `global_matrix` and `parent_global_inverse` are valid from the
//! end of one full `update()` until the next structural or transform
//! mutation outside a traversal. The global-space setters are the only
//! accessors that force a fresh recompute of the ancestor chain on their
//! own; every plain getter trusts the cache.
//!
//! # Reentrancy
//!
//! An update hook may add or remove nodes anywhere in the tree, including
//! under the node currently being visited. The traversal snapshots each
//! node's children list right after its hook has run and skips handles
//! that are no longer live, so structural mutation never invalidates the
//! walk. Children a hook adds under its own node are visited in the same
//! frame; children it adds under an already-visited node are picked up by
//! the next frame.

use std::any::Any;

use glam::{Affine3A, Quat, Vec3};
use slotmap::SlotMap;

use crate::errors::{Result, SceneTreeError};
use crate::node::{Node, NodeBehavior, NodeHandle};
use crate::render::{MatrixScope, RenderContext, StateScope};
use crate::wrapper::NodeMut;

/// A tree of transformable nodes with cached world matrices.
///
/// The tree exclusively owns its nodes: removing a node destroys its
/// entire subtree, and a child's lifetime can never exceed its parent's.
/// External drivers call [`update`](SceneTree::update) once and then
/// [`draw`](SceneTree::draw) once per frame, in that order.
pub struct SceneTree {
    nodes: SlotMap<NodeHandle, Node>,
    root: NodeHandle,
}

impl SceneTree {
    /// Creates a tree containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("root", None));
        Self { nodes, root }
    }

    /// Handle of the tree's root node. The root always has the identity
    /// transform and never participates as someone else's child.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// Read access to a node, or `None` for stale handles.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    /// Write access to a node, or `None` for stale handles.
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Chainable mutation wrapper for a node. All wrapper methods silently
    /// no-op when the handle is stale.
    #[inline]
    pub fn node(&mut self, handle: NodeHandle) -> NodeMut<'_> {
        NodeMut::new(self, handle)
    }

    /// Total number of live nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ========================================================================
    // Child management
    // ========================================================================

    /// Constructs a node with behavior `T` and attaches it under `parent`
    /// in one step.
    ///
    /// The child's name, parent link and initial global caches are set
    /// before the handle is returned, so the node is usable in world space
    /// right away; all further setup happens through the handle. Fails
    /// with [`StaleNode`](SceneTreeError::StaleNode) if `parent` is dead.
    pub fn add_child<T: NodeBehavior + Default>(
        &mut self,
        parent: NodeHandle,
        name: &str,
    ) -> Result<NodeHandle> {
        self.add_child_boxed(parent, name, Box::new(T::default()))
    }

    /// Non-generic form of [`add_child`](SceneTree::add_child) for
    /// behaviors that need constructor arguments.
    pub fn add_child_boxed(
        &mut self,
        parent: NodeHandle,
        name: &str,
        behavior: Box<dyn NodeBehavior>,
    ) -> Result<NodeHandle> {
        if !self.nodes.contains_key(parent) {
            log::warn!("add_child: parent handle is stale, refusing to attach {name:?}");
            return Err(SceneTreeError::StaleNode);
        }
        let mut node = Node::new(name, Some(behavior));
        node.parent = Some(parent);
        let handle = self.nodes.insert(node);
        self.nodes[parent].children.push(handle);
        self.refresh_global(handle);
        Ok(handle)
    }

    /// Removes `child` from `parent`'s children and destroys its entire
    /// subtree. No-op when `child` is not among `parent`'s children.
    pub fn remove_child(&mut self, parent: NodeHandle, child: NodeHandle) {
        let Some(node) = self.nodes.get_mut(parent) else {
            return;
        };
        let Some(pos) = node.children.iter().position(|&c| c == child) else {
            return;
        };
        node.children.remove(pos);
        self.remove_subtree(child);
    }

    /// Removes all of `handle`'s children, destroying their subtrees.
    pub fn clear_children(&mut self, handle: NodeHandle) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        let children = std::mem::take(&mut node.children);
        for child in children {
            self.remove_subtree(child);
        }
    }

    fn remove_subtree(&mut self, handle: NodeHandle) {
        let Some(node) = self.nodes.remove(handle) else {
            return;
        };
        log::trace!("removing node {:?}", node.name);
        for child in node.children {
            self.remove_subtree(child);
        }
    }

    /// Number of direct children of `handle` (0 for stale handles).
    #[must_use]
    pub fn child_count(&self, handle: NodeHandle) -> usize {
        self.nodes.get(handle).map_or(0, |n| n.children.len())
    }

    /// Bounds-checked indexed child access.
    pub fn child_at(&self, parent: NodeHandle, index: usize) -> Result<NodeHandle> {
        let node = self.nodes.get(parent).ok_or(SceneTreeError::StaleNode)?;
        node.children
            .get(index)
            .copied()
            .ok_or(SceneTreeError::ChildIndexOutOfBounds {
                index,
                len: node.children.len(),
            })
    }

    /// Typed variant of [`child_at`](SceneTree::child_at).
    ///
    /// A bad index is still a hard error; a child whose behavior is not
    /// `T` is the documented soft-fail and yields `Ok(None)`.
    pub fn child_at_as<T: NodeBehavior>(
        &self,
        parent: NodeHandle,
        index: usize,
    ) -> Result<Option<NodeHandle>> {
        let child = self.child_at(parent, index)?;
        Ok(self.behavior::<T>(child).map(|_| child))
    }

    /// Runtime capability query: the node's behavior downcast to `T`.
    ///
    /// Returns `None` for stale handles, for the behavior-less root, for
    /// type mismatches, and for the node whose own hook is currently
    /// running (its behavior is detached for the duration of the call).
    #[must_use]
    pub fn behavior<T: NodeBehavior>(&self, handle: NodeHandle) -> Option<&T> {
        let behavior = self.nodes.get(handle)?.behavior.as_deref()?;
        (behavior as &dyn Any).downcast_ref::<T>()
    }

    /// Mutable variant of [`behavior`](SceneTree::behavior).
    #[must_use]
    pub fn behavior_mut<T: NodeBehavior>(&mut self, handle: NodeHandle) -> Option<&mut T> {
        let behavior = self.nodes.get_mut(handle)?.behavior.as_deref_mut()?;
        (behavior as &mut dyn Any).downcast_mut::<T>()
    }

    /// Collects every direct child (or, if `recursive`, every descendant)
    /// of `parent` whose name exactly equals `name`.
    ///
    /// Depth-first: each child is tested before its own subtree is
    /// descended, so a parent always precedes its descendants in the
    /// result. A missing name is not an error; the result is just empty.
    #[must_use]
    pub fn find(&self, parent: NodeHandle, name: &str, recursive: bool) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.find_children(parent, name, recursive, &mut out);
        out
    }

    fn find_children(
        &self,
        parent: NodeHandle,
        name: &str,
        recursive: bool,
        out: &mut Vec<NodeHandle>,
    ) {
        let Some(node) = self.nodes.get(parent) else {
            return;
        };
        for &child in &node.children {
            if let Some(c) = self.nodes.get(child) {
                if c.name == name {
                    out.push(child);
                }
                if recursive {
                    self.find_children(child, name, recursive, out);
                }
            }
        }
    }

    // ========================================================================
    // Local transform
    // ========================================================================

    /// Sets the node's local position. No-op (with a warning) on the root,
    /// which is pinned to the identity transform.
    pub fn set_position(&mut self, handle: NodeHandle, position: Vec3) {
        if self.reject_root_mutation(handle, "set_position") {
            return;
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.set_position(position);
        }
    }

    /// Sets the node's local rotation (unit quaternion).
    pub fn set_rotation(&mut self, handle: NodeHandle, rotation: Quat) {
        if self.reject_root_mutation(handle, "set_rotation") {
            return;
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.set_rotation(rotation);
        }
    }

    /// Sets the node's local scale.
    pub fn set_scale(&mut self, handle: NodeHandle, scale: Vec3) {
        if self.reject_root_mutation(handle, "set_scale") {
            return;
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.set_scale(scale);
        }
    }

    /// Raw matrix nudge: post-multiplies a translation onto the node's
    /// cached local matrix. See [`Transform::translate`].
    ///
    /// [`Transform::translate`]: crate::Transform::translate
    pub fn translate(&mut self, handle: NodeHandle, delta: Vec3) {
        if self.reject_root_mutation(handle, "translate") {
            return;
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.translate(delta);
        }
    }

    /// Raw matrix nudge: post-multiplies an axis/angle rotation (radians)
    /// onto the node's cached local matrix. See [`Transform::rotate`].
    ///
    /// [`Transform::rotate`]: crate::Transform::rotate
    pub fn rotate(&mut self, handle: NodeHandle, angle: f32, axis: Vec3) {
        if self.reject_root_mutation(handle, "rotate") {
            return;
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.transform.rotate(angle, axis);
        }
    }

    /// Local position component.
    #[must_use]
    pub fn position(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes.get(handle).map(|n| n.transform.position())
    }

    /// Local rotation component.
    #[must_use]
    pub fn rotation(&self, handle: NodeHandle) -> Option<Quat> {
        self.nodes.get(handle).map(|n| n.transform.rotation())
    }

    /// Local scale component.
    #[must_use]
    pub fn scale(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes.get(handle).map(|n| n.transform.scale())
    }

    fn reject_root_mutation(&self, handle: NodeHandle, op: &str) -> bool {
        if handle == self.root {
            log::warn!("{op}: the root node is pinned to the identity transform");
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Global transform
    // ========================================================================

    /// Cached global matrix. See the staleness contract in the module
    /// docs; plain reads never force a recompute.
    #[must_use]
    pub fn global_matrix(&self, handle: NodeHandle) -> Option<Affine3A> {
        self.nodes.get(handle).map(|n| n.global_matrix)
    }

    /// Cached inverse of the parent's global matrix.
    #[must_use]
    pub fn parent_global_inverse(&self, handle: NodeHandle) -> Option<Affine3A> {
        self.nodes.get(handle).map(|n| n.parent_global_inverse)
    }

    /// Translation component of the cached global matrix.
    #[must_use]
    pub fn global_position(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes
            .get(handle)
            .map(|n| n.global_matrix.translation.into())
    }

    /// Rotation component decomposed from the cached global matrix.
    #[must_use]
    pub fn global_rotation(&self, handle: NodeHandle) -> Option<Quat> {
        self.nodes
            .get(handle)
            .map(|n| n.global_matrix.to_scale_rotation_translation().1)
    }

    /// Scale component decomposed from the cached global matrix.
    #[must_use]
    pub fn global_scale(&self, handle: NodeHandle) -> Option<Vec3> {
        self.nodes
            .get(handle)
            .map(|n| n.global_matrix.to_scale_rotation_translation().0)
    }

    /// Places the node at a world-space position, whenever in the frame it
    /// is called.
    ///
    /// Forces a fresh recompute of the whole ancestor chain, converts the
    /// position into local space through the fresh parent inverse, stores
    /// it as the local position and refreshes this node's global matrix so
    /// the set/get round-trip holds immediately.
    pub fn set_global_position(&mut self, handle: NodeHandle, position: Vec3) {
        if self.reject_root_mutation(handle, "set_global_position") {
            return;
        }
        let Some(parent_global) = self.refresh_global(handle) else {
            return;
        };
        let node = &mut self.nodes[handle];
        let local = node.parent_global_inverse.transform_point3(position);
        node.transform.set_position(local);
        node.global_matrix = parent_global * node.transform.local_matrix();
    }

    /// World-space variant of [`set_rotation`](SceneTree::set_rotation);
    /// same forced-recompute contract as
    /// [`set_global_position`](SceneTree::set_global_position).
    pub fn set_global_rotation(&mut self, handle: NodeHandle, rotation: Quat) {
        if self.reject_root_mutation(handle, "set_global_rotation") {
            return;
        }
        let Some(parent_global) = self.refresh_global(handle) else {
            return;
        };
        let node = &mut self.nodes[handle];
        let (_, parent_inv_rotation, _) = node.parent_global_inverse.to_scale_rotation_translation();
        node.transform.set_rotation(parent_inv_rotation * rotation);
        node.global_matrix = parent_global * node.transform.local_matrix();
    }

    /// World-space variant of [`set_scale`](SceneTree::set_scale); same
    /// forced-recompute contract as
    /// [`set_global_position`](SceneTree::set_global_position). The
    /// conversion is component-wise and lossy when ancestors are rotated.
    pub fn set_global_scale(&mut self, handle: NodeHandle, scale: Vec3) {
        if self.reject_root_mutation(handle, "set_global_scale") {
            return;
        }
        let Some(parent_global) = self.refresh_global(handle) else {
            return;
        };
        let node = &mut self.nodes[handle];
        let (parent_inv_scale, _, _) = node.parent_global_inverse.to_scale_rotation_translation();
        node.transform.set_scale(parent_inv_scale * scale);
        node.global_matrix = parent_global * node.transform.local_matrix();
    }

    /// The matrix mapping points in `from`'s local space into `to`'s local
    /// space, computed from the cached globals of both nodes.
    ///
    /// Works for any two live nodes regardless of their ancestor/descendant
    /// relationship. Does not force a recompute: call it after a traversal
    /// (or after a global setter has refreshed the nodes involved).
    #[must_use]
    pub fn node_to_node_transform(&self, from: NodeHandle, to: NodeHandle) -> Option<Affine3A> {
        let from_global = self.nodes.get(from)?.global_matrix;
        let to_global = self.nodes.get(to)?.global_matrix;
        Some(to_global.inverse() * from_global)
    }

    /// Recomputes the global caches for `handle` and every ancestor, root
    /// first. Returns the fresh global matrix of `handle`'s parent, or
    /// `None` for stale handles.
    fn refresh_global(&mut self, handle: NodeHandle) -> Option<Affine3A> {
        if !self.nodes.contains_key(handle) {
            return None;
        }
        let mut chain = vec![handle];
        let mut current = handle;
        while let Some(parent) = self.nodes[current].parent {
            chain.push(parent);
            current = parent;
        }

        let mut parent_global = Affine3A::IDENTITY;
        let mut result = Affine3A::IDENTITY;
        for &link in chain.iter().rev() {
            if link == handle {
                result = parent_global;
            }
            let node = &mut self.nodes[link];
            if link == self.root {
                // pinned, no matter what was poked in the meantime
                node.transform.reset();
                node.global_matrix = Affine3A::IDENTITY;
                node.parent_global_inverse = Affine3A::IDENTITY;
            } else {
                node.parent_global_inverse = parent_global.inverse();
                node.global_matrix = parent_global * node.transform.local_matrix();
            }
            parent_global = self.nodes[link].global_matrix;
        }
        Some(result)
    }

    /// Refreshes the global caches of `handle`'s ancestor chain and then
    /// of every node below `handle`, without running any hooks. Useful for
    /// bringing a subtree's caches up to date between traversals.
    pub fn update_subtree(&mut self, handle: NodeHandle) {
        if self.refresh_global(handle).is_none() {
            return;
        }
        let global = self.nodes[handle].global_matrix;
        for child in self.children_snapshot(handle) {
            self.propagate(child, global);
        }
    }

    fn propagate(&mut self, handle: NodeHandle, parent_global: Affine3A) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        node.parent_global_inverse = parent_global.inverse();
        node.global_matrix = parent_global * node.transform.local_matrix();
        let global = node.global_matrix;
        for child in self.children_snapshot(handle) {
            self.propagate(child, global);
        }
    }

    // ========================================================================
    // Per-frame traversal
    // ========================================================================

    /// Per-frame update traversal.
    ///
    /// Resets the root's matrices to identity, then walks the tree
    /// depth-first. Per node: the global caches are refreshed from the
    /// parent's fresh global matrix, the update hook runs, and the global
    /// matrix is recomputed once more with the same parent matrix so any
    /// local transform change the hook made lands in the matrix the
    /// children (and the subsequent draw) see.
    pub fn update(&mut self) {
        if let Some(root) = self.nodes.get_mut(self.root) {
            root.transform.reset();
            root.global_matrix = Affine3A::IDENTITY;
            root.parent_global_inverse = Affine3A::IDENTITY;
        }
        for child in self.children_snapshot(self.root) {
            self.update_node(child, Affine3A::IDENTITY);
        }
    }

    fn update_node(&mut self, handle: NodeHandle, parent_global: Affine3A) {
        // removed by an earlier hook this frame
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        node.parent_global_inverse = parent_global.inverse();
        node.global_matrix = parent_global * node.transform.local_matrix();

        // detach the behavior so the hook can borrow the whole tree
        let mut behavior = node.behavior.take();
        if let Some(hook) = behavior.as_mut() {
            hook.update(self, handle);
        }
        let Some(node) = self.nodes.get_mut(handle) else {
            // the hook removed its own node; the behavior drops with it
            return;
        };
        node.behavior = behavior;
        node.global_matrix = parent_global * node.transform.local_matrix();
        let global = node.global_matrix;

        for child in self.children_snapshot(handle) {
            self.update_node(child, global);
        }
    }

    /// Per-frame draw traversal.
    ///
    /// Each node's draw hook runs inside a transform scope holding the
    /// node's cached global matrix; the whole walk is wrapped in one
    /// render-state scope. Scopes unwind on drop, so a panicking hook
    /// cannot leave `ctx` unbalanced. Call after
    /// [`update`](SceneTree::update): draw reads the matrices update
    /// produced.
    pub fn draw(&mut self, ctx: &mut dyn RenderContext) {
        let mut state = StateScope::new(ctx);
        for child in self.children_snapshot(self.root) {
            self.draw_node(child, state.ctx());
        }
    }

    fn draw_node(&mut self, handle: NodeHandle, ctx: &mut dyn RenderContext) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        let behavior = node.behavior.take();
        let global = node.global_matrix;
        {
            let mut scope = MatrixScope::new(ctx, global);
            if let Some(hook) = behavior.as_deref() {
                hook.draw(&*self, handle, scope.ctx());
            }
        }
        if let Some(node) = self.nodes.get_mut(handle) {
            node.behavior = behavior;
        }
        for child in self.children_snapshot(handle) {
            self.draw_node(child, ctx);
        }
    }

    fn children_snapshot(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        self.nodes
            .get(handle)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}
