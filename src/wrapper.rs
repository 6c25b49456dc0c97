//! Chainable node operation wrapper.
//!
//! [`NodeMut`] borrows a [`SceneTree`] mutably and provides a fluent API
//! for transforming a node without `get_mut().unwrap()` chains.
//!
//! All methods silently no-op when the handle is stale, so users never
//! encounter panics from dangling handles.
//!
//! # Example
//!
//! ```rust,ignore
//! tree.node(handle)
//!     .set_position(0.0, 3.0, 0.0)
//!     .set_scale(2.0)
//!     .rotate(0.1, Vec3::Z);
//! ```

use glam::{Quat, Vec3};

use crate::node::NodeHandle;
use crate::tree::SceneTree;

/// Temporary mutable borrow of a tree node for chainable operations.
pub struct NodeMut<'a> {
    tree: &'a mut SceneTree,
    handle: NodeHandle,
}

impl<'a> NodeMut<'a> {
    #[inline]
    pub fn new(tree: &'a mut SceneTree, handle: NodeHandle) -> Self {
        Self { tree, handle }
    }

    /// Returns the underlying handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> NodeHandle {
        self.handle
    }

    // -- Local transform (chainable) --

    /// Sets the node's local position.
    #[inline]
    pub fn set_position(self, x: f32, y: f32, z: f32) -> Self {
        self.tree.set_position(self.handle, Vec3::new(x, y, z));
        self
    }

    /// Sets the node's local position from a Vec3.
    #[inline]
    pub fn set_position_vec(self, position: Vec3) -> Self {
        self.tree.set_position(self.handle, position);
        self
    }

    /// Sets rotation from a quaternion.
    #[inline]
    pub fn set_rotation(self, rotation: Quat) -> Self {
        self.tree.set_rotation(self.handle, rotation);
        self
    }

    /// Sets uniform scale.
    #[inline]
    pub fn set_scale(self, s: f32) -> Self {
        self.tree.set_scale(self.handle, Vec3::splat(s));
        self
    }

    /// Sets non-uniform scale.
    #[inline]
    pub fn set_scale_xyz(self, x: f32, y: f32, z: f32) -> Self {
        self.tree.set_scale(self.handle, Vec3::new(x, y, z));
        self
    }

    /// Raw matrix nudge, see [`SceneTree::translate`].
    #[inline]
    pub fn translate(self, delta: Vec3) -> Self {
        self.tree.translate(self.handle, delta);
        self
    }

    /// Raw matrix nudge, see [`SceneTree::rotate`].
    #[inline]
    pub fn rotate(self, angle: f32, axis: Vec3) -> Self {
        self.tree.rotate(self.handle, angle, axis);
        self
    }

    // -- Global transform (chainable, forces ancestor recompute) --

    /// Places the node at a world-space position, see
    /// [`SceneTree::set_global_position`].
    #[inline]
    pub fn set_global_position(self, position: Vec3) -> Self {
        self.tree.set_global_position(self.handle, position);
        self
    }

    /// Sets the node's world-space rotation, see
    /// [`SceneTree::set_global_rotation`].
    #[inline]
    pub fn set_global_rotation(self, rotation: Quat) -> Self {
        self.tree.set_global_rotation(self.handle, rotation);
        self
    }

    /// Sets the node's world-space scale, see
    /// [`SceneTree::set_global_scale`].
    #[inline]
    pub fn set_global_scale(self, scale: Vec3) -> Self {
        self.tree.set_global_scale(self.handle, scale);
        self
    }
}
