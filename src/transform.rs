//! TRS transform component.
//!
//! Wraps a node's position, rotation and scale together with the cached
//! local matrix. Every component setter recomputes the matrix synchronously,
//! so the cache can never lag behind the components.

use glam::{Affine3A, Quat, Vec3};

/// Position/rotation/scale triple with a synchronously maintained local
/// matrix cache.
///
/// The local matrix is always composed as scale, then rotation, then
/// translation, so scale and rotation are evaluated around the node's own
/// origin before it is moved into place. Shear and arbitrary matrix
/// assignment are not representable through the component setters.
///
/// [`translate`](Transform::translate) and [`rotate`](Transform::rotate)
/// are the one exception: they nudge the cached matrix directly and leave
/// the stored components untouched.
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    local_matrix: Affine3A,
}

impl Transform {
    /// Creates an identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Affine3A::IDENTITY,
        }
    }

    /// Sets the position component and rebuilds the local matrix.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.rebuild_local_matrix();
    }

    /// Sets the rotation component (unit quaternion) and rebuilds the local
    /// matrix.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
        self.rebuild_local_matrix();
    }

    /// Sets the scale component and rebuilds the local matrix.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.rebuild_local_matrix();
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// The cached local matrix.
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Affine3A {
        self.local_matrix
    }

    /// Post-multiplies a translation onto the cached local matrix.
    ///
    /// This is a raw matrix nudge: the stored position component is not
    /// updated, and the next component setter rebuilds the matrix from the
    /// components, discarding any accumulated nudges.
    pub fn translate(&mut self, delta: Vec3) {
        self.local_matrix = self.local_matrix * Affine3A::from_translation(delta);
    }

    /// Post-multiplies an axis/angle rotation (radians) onto the cached
    /// local matrix. Same caveat as [`translate`](Transform::translate).
    pub fn rotate(&mut self, angle: f32, axis: Vec3) {
        self.local_matrix = self.local_matrix * Affine3A::from_axis_angle(axis, angle);
    }

    /// Resets components and matrix to identity.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn rebuild_local_matrix(&mut self) {
        self.local_matrix =
            Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
