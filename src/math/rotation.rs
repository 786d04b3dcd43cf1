use crate::math::Vector2;
use std::fmt;
use std::ops::{Mul, MulAssign};

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A planar rotation stored as its angle together with the cached sine and cosine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Rotation {
    angle: f32,
    sin: f32,
    cos: f32,
}

impl Rotation {
    /// Creates a rotation of `angle` radians (counter-clockwise)
    #[inline]
    pub fn new(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { angle, sin, cos }
    }

    /// Creates an identity rotation
    #[inline]
    pub fn identity() -> Self {
        Self { angle: 0.0, sin: 0.0, cos: 1.0 }
    }

    /// Returns the angle in radians
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Returns the sine of the angle
    #[inline]
    pub fn sin(&self) -> f32 {
        self.sin
    }

    /// Returns the cosine of the angle
    #[inline]
    pub fn cos(&self) -> f32 {
        self.cos
    }

    /// Rotates a vector by this rotation
    #[inline]
    pub fn rotate_vector(&self, v: Vector2) -> Vector2 {
        Vector2::new(v.x * self.cos - v.y * self.sin, v.x * self.sin + v.y * self.cos)
    }

    /// Rotates a vector by the inverse of this rotation
    #[inline]
    pub fn inverse_rotate_vector(&self, v: Vector2) -> Vector2 {
        Vector2::new(v.x * self.cos + v.y * self.sin, -v.x * self.sin + v.y * self.cos)
    }

    /// Returns the inverse rotation
    #[inline]
    pub fn inverse(&self) -> Self {
        Self { angle: -self.angle, sin: -self.sin, cos: self.cos }
    }

    /// Convert to a nalgebra unit complex number
    #[inline]
    pub fn to_nalgebra(&self) -> nalgebra::UnitComplex<f32> {
        nalgebra::UnitComplex::new(self.angle)
    }

    /// Convert from a nalgebra unit complex number
    #[inline]
    pub fn from_nalgebra(rotation: &nalgebra::UnitComplex<f32>) -> Self {
        Self::new(rotation.angle())
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} rad", self.angle)
    }
}

impl Mul for Rotation {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(self.angle + rhs.angle)
    }
}

impl MulAssign for Rotation {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Vector2> for Rotation {
    type Output = Vector2;

    #[inline]
    fn mul(self, rhs: Vector2) -> Self::Output {
        self.rotate_vector(rhs)
    }
}
