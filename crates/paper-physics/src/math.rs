//! Vector and matrix helpers on top of `glam`
//!
//! Plain arithmetic (add, scale, dot, cross, ...) comes straight from glam's
//! operators. This module only holds the operations glam has no direct
//! equivalent for, and the guarded normalization that would otherwise divide by zero.

use glam::{Mat3, Mat4, Vec3};

use crate::constants::DEGENERATE_DISTANCE;

/// Unit vector along `delta`, or `fallback` when `delta` is too short to normalize
pub fn normal_or(delta: Vec3, fallback: Vec3) -> Vec3 {
    let length = delta.length();
    if length < DEGENERATE_DISTANCE || !length.is_finite() {
        fallback
    } else {
        delta / length
    }
}

/// Inverse of a diagonal inertia tensor.
///
/// Only the diagonal is read: off-diagonal terms are assumed to be zero, so
/// this is NOT a general matrix inverse. A zero diagonal entry maps to zero,
/// which behaves like infinite inertia around that axis.
pub fn inertia_inverse(inertia: Mat3) -> Mat3 {
    let recip = |v: f32| if v == 0.0 { 0.0 } else { 1.0 / v };
    Mat3::from_diagonal(Vec3::new(
        recip(inertia.x_axis.x),
        recip(inertia.y_axis.y),
        recip(inertia.z_axis.z),
    ))
}

/// Inverse of a rigid affine transform (rotation + translation).
///
/// Transposes the rotation block and rotates the negated translation, which is
/// exact as long as the upper 3×3 block is orthonormal.
pub fn gl_inverse(m: Mat4) -> Mat4 {
    let rotation_t = Mat3::from_mat4(m).transpose();
    let translation = -(rotation_t * m.w_axis.truncate());
    Mat4::from_cols(
        rotation_t.x_axis.extend(0.0),
        rotation_t.y_axis.extend(0.0),
        rotation_t.z_axis.extend(0.0),
        translation.extend(1.0),
    )
}

/// Body-frame inverse inertia rotated into world space: `R · I⁻¹ · Rᵀ`
pub fn world_inverse_inertia(orientation: Mat3, inertia: Mat3) -> Mat3 {
    orientation * inertia_inverse(inertia) * orientation.transpose()
}

/// Re-orthonormalize a rotation matrix that has drifted through integration
pub fn orthonormalize(rotation: Mat3) -> Mat3 {
    Mat3::from_quat(glam::Quat::from_mat3(&rotation).normalize())
}
