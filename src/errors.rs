//! Error Types
//!
//! [`SceneTreeError`] covers the structural failure modes of the tree.
//! Lookups that are expected to sometimes miss (`find`, typed child access)
//! are not errors; they signal "no result" with an empty return instead.

use thiserror::Error;

/// The error type for tree-structural operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneTreeError {
    /// Indexed child access past the end of the children list.
    #[error("child index out of bounds: index {index}, but node has {len} children")]
    ChildIndexOutOfBounds {
        /// The requested index
        index: usize,
        /// Number of children the node actually has
        len: usize,
    },

    /// A handle that no longer resolves to a live node was used in a
    /// structural operation.
    #[error("stale node handle: the node has been removed from the tree")]
    StaleNode,
}

/// Alias for `Result<T, SceneTreeError>`.
pub type Result<T> = std::result::Result<T, SceneTreeError>;
