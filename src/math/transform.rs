use crate::math::{Vector2, Rotation};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A rigid 2D transform: rotation followed by translation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Position (translation) component
    pub position: Vector2,

    /// Rotation component
    pub rotation: Rotation,
}

impl Transform {
    /// Creates a new transform
    #[inline]
    pub fn new(position: Vector2, rotation: Rotation) -> Self {
        Self { position, rotation }
    }

    /// Creates an identity transform
    #[inline]
    pub fn identity() -> Self {
        Self {
            position: Vector2::zero(),
            rotation: Rotation::identity(),
        }
    }

    /// Creates a transform with the given position and no rotation
    #[inline]
    pub fn from_position(position: Vector2) -> Self {
        Self {
            position,
            rotation: Rotation::identity(),
        }
    }

    /// Creates a transform from a position and an angle in radians
    #[inline]
    pub fn from_position_angle(position: Vector2, angle: f32) -> Self {
        Self {
            position,
            rotation: Rotation::new(angle),
        }
    }

    /// Transforms a point from local space to world space
    #[inline]
    pub fn transform_point(&self, point: Vector2) -> Vector2 {
        self.rotation.rotate_vector(point) + self.position
    }

    /// Transforms a point from world space to local space
    #[inline]
    pub fn inverse_transform_point(&self, point: Vector2) -> Vector2 {
        self.rotation.inverse_rotate_vector(point - self.position)
    }

    /// Transforms a direction (ignores translation)
    #[inline]
    pub fn transform_direction(&self, direction: Vector2) -> Vector2 {
        self.rotation.rotate_vector(direction)
    }

    /// Transforms a direction from world space to local space
    #[inline]
    pub fn inverse_transform_direction(&self, direction: Vector2) -> Vector2 {
        self.rotation.inverse_rotate_vector(direction)
    }

    /// Returns the inverse of this transform
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            position: rotation.rotate_vector(-self.position),
            rotation,
        }
    }

    /// Combines this transform with another (`self * other`): `other` is
    /// applied first.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(other.position),
            rotation: self.rotation * other.rotation,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
