//! Tree nodes and the per-node behavior capability.

use std::any::Any;
use std::fmt;

use glam::Affine3A;

use crate::render::RenderContext;
use crate::transform::Transform;
use crate::tree::SceneTree;

slotmap::new_key_type! {
    /// Non-owning handle to a node in a [`SceneTree`].
    ///
    /// Handles never extend a node's lifetime; once the node is removed
    /// from the tree the handle is stale and every lookup through it
    /// returns `None` (or [`StaleNode`](crate::SceneTreeError::StaleNode)
    /// from structural operations).
    pub struct NodeHandle;
}

/// Per-frame hooks a concrete node variant may override.
///
/// Both hooks default to no-op. The update hook receives mutable tree
/// access: it may change its own local transform (the node's global matrix
/// is recomputed right after the hook returns, so the change is visible to
/// children in the same frame) and it may add or remove nodes anywhere in
/// the tree. The draw hook receives shared tree access only, so a draw can
/// never mutate transforms or structure.
///
/// While a node's own hook is running, its behavior box is temporarily
/// detached from the tree; querying that node through
/// [`SceneTree::behavior`] for the duration of the call returns `None`.
pub trait NodeBehavior: Any {
    /// Per-frame logic, invoked once per [`SceneTree::update`] after this
    /// node's global matrix has been refreshed from its parent.
    fn update(&mut self, tree: &mut SceneTree, node: NodeHandle) {
        let _ = (tree, node);
    }

    /// Per-frame rendering, invoked once per [`SceneTree::draw`] inside a
    /// transform scope holding this node's cached global matrix.
    fn draw(&self, tree: &SceneTree, node: NodeHandle, ctx: &mut dyn RenderContext) {
        let _ = (tree, node, ctx);
    }
}

/// One element of the hierarchy: a local transform, matrix caches and the
/// links to parent and children.
///
/// Nodes only exist inside a [`SceneTree`]; construction and attachment
/// are a single operation ([`SceneTree::add_child`]) and removal destroys
/// the whole subtree. Parent links are fixed for a node's lifetime, there
/// is no re-parenting.
pub struct Node {
    pub(crate) name: String,
    /// Local TRS. Setters keep the local matrix cache in sync; the global
    /// caches below are refreshed by traversal, not by these setters.
    pub transform: Transform,
    pub(crate) global_matrix: Affine3A,
    pub(crate) parent_global_inverse: Affine3A,
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
    pub(crate) behavior: Option<Box<dyn NodeBehavior>>,
}

impl Node {
    pub(crate) fn new(name: &str, behavior: Option<Box<dyn NodeBehavior>>) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::new(),
            global_matrix: Affine3A::IDENTITY,
            parent_global_inverse: Affine3A::IDENTITY,
            parent: None,
            children: Vec::new(),
            behavior,
        }
    }

    /// The node's name. Not required to be unique; used by
    /// [`SceneTree::find`].
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning parent, or `None` for the root.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Child handles in insertion order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Cached world matrix. Valid between the end of the last full
    /// [`SceneTree::update`] and the next out-of-traversal mutation; plain
    /// reads never force a recompute.
    #[inline]
    #[must_use]
    pub fn global_matrix(&self) -> Affine3A {
        self.global_matrix
    }

    /// Cached inverse of the parent's world matrix, maintained alongside
    /// [`global_matrix`](Node::global_matrix).
    #[inline]
    #[must_use]
    pub fn parent_global_inverse(&self) -> Affine3A {
        self.parent_global_inverse
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
