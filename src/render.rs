//! Rendering context boundary.
//!
//! The tree never issues draw primitives itself. During a draw traversal
//! it only brokers a transform context: each node's cached global matrix
//! is pushed before the node's draw hook runs and popped after, and the
//! whole traversal is wrapped in one render-state scope. What "push" and
//! "pop" mean is up to the [`RenderContext`] implementation the caller
//! hands in.

use glam::Affine3A;

/// External rendering collaborator driven by [`SceneTree::draw`].
///
/// [`SceneTree::draw`]: crate::SceneTree::draw
pub trait RenderContext {
    /// Enters a transform scope with the given matrix.
    fn push_matrix(&mut self, matrix: Affine3A);

    /// Leaves the innermost transform scope.
    fn pop_matrix(&mut self);

    /// Enters the frame-global render-state scope wrapped around a whole
    /// draw traversal. No-op by default.
    fn push_state(&mut self) {}

    /// Leaves the frame-global render-state scope. No-op by default.
    fn pop_state(&mut self) {}
}

/// RAII transform scope: pushes on construction, pops on drop.
///
/// The drop runs during unwinding too, so a panicking draw hook cannot
/// leave the context unbalanced and corrupt sibling rendering.
pub struct MatrixScope<'a> {
    ctx: &'a mut dyn RenderContext,
}

impl<'a> MatrixScope<'a> {
    pub fn new(ctx: &'a mut dyn RenderContext, matrix: Affine3A) -> Self {
        ctx.push_matrix(matrix);
        Self { ctx }
    }

    /// Reborrows the underlying context for the duration of the scope.
    pub fn ctx(&mut self) -> &mut dyn RenderContext {
        self.ctx
    }
}

impl Drop for MatrixScope<'_> {
    fn drop(&mut self) {
        self.ctx.pop_matrix();
    }
}

/// RAII render-state scope used around a full draw traversal.
pub struct StateScope<'a> {
    ctx: &'a mut dyn RenderContext,
}

impl<'a> StateScope<'a> {
    pub fn new(ctx: &'a mut dyn RenderContext) -> Self {
        ctx.push_state();
        Self { ctx }
    }

    /// Reborrows the underlying context for the duration of the scope.
    pub fn ctx(&mut self) -> &mut dyn RenderContext {
        self.ctx
    }
}

impl Drop for StateScope<'_> {
    fn drop(&mut self) {
        self.ctx.pop_state();
    }
}

/// Reference [`RenderContext`] backed by a plain matrix stack.
///
/// Pushing multiplies onto the top of the stack the way a GL-style matrix
/// stack would. Useful as a starting point for adapters and as a test
/// double for draw traversals.
#[derive(Debug, Default)]
pub struct MatrixStack {
    stack: Vec<Affine3A>,
    state_depth: usize,
}

impl MatrixStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated matrix at the top of the stack (identity when
    /// empty).
    #[must_use]
    pub fn current(&self) -> Affine3A {
        self.stack.last().copied().unwrap_or(Affine3A::IDENTITY)
    }

    /// Number of open transform scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of open render-state scopes.
    #[must_use]
    pub fn state_depth(&self) -> usize {
        self.state_depth
    }
}

impl RenderContext for MatrixStack {
    fn push_matrix(&mut self, matrix: Affine3A) {
        self.stack.push(self.current() * matrix);
    }

    fn pop_matrix(&mut self) {
        self.stack.pop();
    }

    fn push_state(&mut self) {
        self.state_depth += 1;
    }

    fn pop_state(&mut self) {
        self.state_depth = self.state_depth.saturating_sub(1);
    }
}
