use crate::math::Vector2;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Axis-Aligned Bounding Box (AABB) used by the broad phase and by queries
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner of the AABB
    pub min: Vector2,

    /// Maximum corner of the AABB
    pub max: Vector2,
}

impl Aabb {
    /// Creates a new AABB from minimum and maximum points
    #[inline]
    pub fn new(min: Vector2, max: Vector2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB centered at a position with the given half extents
    #[inline]
    pub fn from_center_half_extents(center: Vector2, half_extents: Vector2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Creates an AABB from a set of points
    pub fn from_points(points: &[Vector2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;

        let mut aabb = Self::new(*first, *first);
        for point in rest {
            aabb.expand_to_include_point(*point);
        }

        Some(aabb)
    }

    /// Returns the center of the AABB
    #[inline]
    pub fn center(&self) -> Vector2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the extents (width, height) of the AABB
    #[inline]
    pub fn extents(&self) -> Vector2 {
        self.max - self.min
    }

    /// Returns half the extents of the AABB
    #[inline]
    pub fn half_extents(&self) -> Vector2 {
        self.extents() * 0.5
    }

    /// Returns the area of the AABB
    #[inline]
    pub fn area(&self) -> f32 {
        let extents = self.extents();
        extents.x * extents.y
    }

    /// Returns whether the AABB contains a point
    #[inline]
    pub fn contains_point(&self, point: Vector2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }

    /// Returns whether this AABB completely contains another AABB
    #[inline]
    pub fn contains_aabb(&self, other: &Self) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x &&
        self.min.y <= other.min.y && self.max.y >= other.max.y
    }

    /// Returns whether this AABB intersects another AABB (touching counts)
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Returns the overlapping region of two AABBs, if any
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }

        Some(Self::new(self.min.max(&other.min), self.max.min(&other.max)))
    }

    /// Returns the smallest AABB containing both AABBs
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(&other.min), self.max.max(&other.max))
    }

    /// Expands the AABB to include a point
    #[inline]
    pub fn expand_to_include_point(&mut self, point: Vector2) {
        self.min = self.min.min(&point);
        self.max = self.max.max(&point);
    }

    /// Expands the AABB to include another AABB
    #[inline]
    pub fn expand_to_include_aabb(&mut self, other: &Self) {
        *self = self.union(other);
    }

    /// Returns a copy grown by `margin` on every side
    #[inline]
    pub fn expand(&self, margin: f32) -> Self {
        let margin = Vector2::new(margin, margin);
        Self::new(self.min - margin, self.max + margin)
    }

    /// Returns a copy swept along `displacement`, so it also covers where the
    /// box will be after moving by that amount.
    #[inline]
    pub fn swept(&self, displacement: Vector2) -> Self {
        let moved = Self::new(self.min + displacement, self.max + displacement);
        self.union(&moved)
    }

    /// Returns a copy translated by `offset`
    #[inline]
    pub fn translated(&self, offset: Vector2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    /// Returns the closest point on or inside the AABB to the given point
    #[inline]
    pub fn closest_point(&self, point: Vector2) -> Vector2 {
        point.max(&self.min).min(&self.max)
    }

    /// Returns the squared distance from the AABB to a point (zero if inside)
    #[inline]
    pub fn squared_distance_to_point(&self, point: Vector2) -> f32 {
        self.closest_point(point).distance_squared(&point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swept_box_covers_both_ends() {
        let aabb = Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
        let swept = aabb.swept(Vector2::new(5.0, -2.0));

        assert_eq!(swept.min, Vector2::new(0.0, -2.0));
        assert_eq!(swept.max, Vector2::new(6.0, 1.0));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0));
        let b = Aabb::new(Vector2::new(1.0, 0.5), Vector2::new(2.0, 2.0));
        let c = Aabb::new(Vector2::new(1.1, 0.5), Vector2::new(2.0, 2.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&b).map(|i| i.area()), Some(0.0));
    }
}
