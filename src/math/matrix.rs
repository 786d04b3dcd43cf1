use nalgebra as na;
use crate::math::Vector2;
use std::fmt;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// A 2x2 matrix, used for point-constraint effective masses
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Matrix2 {
    pub data: [[f32; 2]; 2],
}

/// A 3x3 matrix, used for the coupled point + angle constraint of welds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Matrix3 {
    pub data: [[f32; 3]; 3],
}

// === Matrix2 Implementation ===

impl Matrix2 {
    /// Creates a new 2x2 matrix from a 2D array
    #[inline]
    pub fn new(data: [[f32; 2]; 2]) -> Self {
        Self { data }
    }

    /// Creates an identity matrix
    #[inline]
    pub fn identity() -> Self {
        Self { data: [[1.0, 0.0], [0.0, 1.0]] }
    }

    /// Creates a zero matrix
    #[inline]
    pub fn zero() -> Self {
        Self { data: [[0.0; 2]; 2] }
    }

    /// Returns the determinant of the matrix
    #[inline]
    pub fn determinant(&self) -> f32 {
        let [[a, b], [c, d]] = self.data;
        a * d - b * c
    }

    /// Returns the inverse of the matrix, or None if it is singular
    pub fn inverse(&self) -> Option<Self> {
        self.to_nalgebra()
            .try_inverse()
            .map(|m| Self::from_nalgebra(&m))
    }

    /// Returns the inverse, or the zero matrix when the matrix is singular.
    ///
    /// A singular effective-mass matrix means the constraint has no degree of
    /// freedom to act on, so a zero inverse applies no impulse.
    #[inline]
    pub fn inverse_or_zero(&self) -> Self {
        self.inverse().unwrap_or_else(Self::zero)
    }

    /// Multiplies the matrix by a vector
    #[inline]
    pub fn multiply_vector(&self, v: Vector2) -> Vector2 {
        let [[a, b], [c, d]] = self.data;
        Vector2::new(a * v.x + b * v.y, c * v.x + d * v.y)
    }

    /// Convert to nalgebra Matrix2
    #[inline]
    pub fn to_nalgebra(&self) -> na::Matrix2<f32> {
        let [[a, b], [c, d]] = self.data;
        na::Matrix2::new(a, b, c, d)
    }

    /// Convert from nalgebra Matrix2
    #[inline]
    pub fn from_nalgebra(m: &na::Matrix2<f32>) -> Self {
        Self {
            data: [
                [m[(0, 0)], m[(0, 1)]],
                [m[(1, 0)], m[(1, 1)]],
            ],
        }
    }
}

impl fmt::Display for Matrix2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "[ {}, {} ]", self.data[0][0], self.data[0][1])?;
        write!(f, "[ {}, {} ]", self.data[1][0], self.data[1][1])
    }
}

// === Matrix3 Implementation ===

impl Matrix3 {
    /// Creates a new 3x3 matrix from a 2D array
    #[inline]
    pub fn new(data: [[f32; 3]; 3]) -> Self {
        Self { data }
    }

    /// Creates a zero matrix
    #[inline]
    pub fn zero() -> Self {
        Self { data: [[0.0; 3]; 3] }
    }

    /// Returns the determinant of the matrix
    pub fn determinant(&self) -> f32 {
        self.to_nalgebra().determinant()
    }

    /// Solves `self * x = (b, c)` for the full 3x3 system, where the first two
    /// rows are the linear part and the third row the angular part.
    ///
    /// Returns zero when the system is singular.
    pub fn solve33(&self, b: Vector2, c: f32) -> (Vector2, f32) {
        let rhs = na::Vector3::new(b.x, b.y, c);
        match self.to_nalgebra().lu().solve(&rhs) {
            Some(x) => (Vector2::new(x.x, x.y), x.z),
            None => (Vector2::zero(), 0.0),
        }
    }

    /// Solves only the upper-left 2x2 block: `A22 * x = b`
    pub fn solve22(&self, b: Vector2) -> Vector2 {
        let block = Matrix2::new([
            [self.data[0][0], self.data[0][1]],
            [self.data[1][0], self.data[1][1]],
        ]);
        block.inverse_or_zero().multiply_vector(b)
    }

    /// Convert to nalgebra Matrix3
    #[inline]
    pub fn to_nalgebra(&self) -> na::Matrix3<f32> {
        let [[a, b, c], [d, e, f], [g, h, i]] = self.data;

        na::Matrix3::new(
            a, b, c,
            d, e, f,
            g, h, i,
        )
    }
}

impl fmt::Display for Matrix3 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "[ {}, {}, {} ]", self.data[0][0], self.data[0][1], self.data[0][2])?;
        writeln!(f, "[ {}, {}, {} ]", self.data[1][0], self.data[1][1], self.data[1][2])?;
        write!(f, "[ {}, {}, {} ]", self.data[2][0], self.data[2][1], self.data[2][2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Matrix2::new([[1.0, 2.0], [2.0, 4.0]]);
        assert!(m.inverse().is_none());
        assert_eq!(m.inverse_or_zero(), Matrix2::zero());
    }

    #[test]
    fn solve33_matches_known_solution() {
        let m = Matrix3::new([[2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 0.5]]);
        let (v, w) = m.solve33(Vector2::new(2.0, 8.0), 1.0);

        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 2.0);
        assert_relative_eq!(w, 2.0);
    }
}
