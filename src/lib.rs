#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]

//! A transform-hierarchy scene graph.
//!
//! Nodes form a tree. Each node owns a local position/rotation/scale and
//! exposes a cached world matrix computed by composing its local matrix
//! with its ancestors'. An external driver calls
//! [`SceneTree::update`] once and [`SceneTree::draw`] once per frame; the
//! update traversal refreshes world matrices top-down and runs each node's
//! [`NodeBehavior::update`] hook, the draw traversal runs each node's
//! [`NodeBehavior::draw`] hook inside a scoped transform context.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use scenetree::{NodeBehavior, NodeHandle, SceneTree};
//!
//! #[derive(Default)]
//! struct Spinner;
//!
//! impl NodeBehavior for Spinner {
//!     fn update(&mut self, tree: &mut SceneTree, node: NodeHandle) {
//!         tree.rotate(node, 0.01, Vec3::Z);
//!     }
//! }
//!
//! let mut tree = SceneTree::new();
//! let spinner = tree.add_child::<Spinner>(tree.root(), "spinner").unwrap();
//! tree.node(spinner).set_position(0.0, 100.0, 0.0);
//!
//! tree.update();
//! assert_eq!(tree.global_position(spinner), Some(Vec3::new(0.0, 100.0, 0.0)));
//! ```

pub mod errors;
pub mod node;
pub mod render;
pub mod transform;
pub mod tree;
pub mod wrapper;

pub use errors::{Result, SceneTreeError};
pub use node::{Node, NodeBehavior, NodeHandle};
pub use render::{MatrixScope, MatrixStack, RenderContext, StateScope};
pub use transform::Transform;
pub use tree::SceneTree;
pub use wrapper::NodeMut;
