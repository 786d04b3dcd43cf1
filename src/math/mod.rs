mod vector;
mod matrix;
mod transform;
mod rotation;
mod aabb;

pub use vector::Vector2;
pub use matrix::{Matrix2, Matrix3};
pub use transform::Transform;
pub use rotation::Rotation;
pub use aabb::Aabb;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// Returns true if the two floating point values are approximately equal
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}

/// Clamps a value between a minimum and maximum value
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Converts degrees to radians
#[inline]
pub fn to_radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Converts radians to degrees
#[inline]
pub fn to_degrees(radians: f32) -> f32 {
    radians * 180.0 / std::f32::consts::PI
}

/// Safe reciprocal: returns 0 for zero or infinite input.
///
/// Used for inverse mass and inverse inertia, where an infinite value must
/// map to exactly zero.
#[inline]
pub fn inverse_or_zero(value: f32) -> f32 {
    if value.is_finite() && value != 0.0 {
        1.0 / value
    } else {
        0.0
    }
}
