use crate::error::PhysicsError;
use crate::math::{Vector2, Aabb, Transform, EPSILON};
use crate::shapes::Shape;
use crate::shapes::shape::world_bounds_of;
use crate::Result;

/// A line segment between two local points.
///
/// Collision treats it as a two-vertex polygon with no thickness. Segments
/// have no area, so they are meant for static level geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    start: Vector2,
    end: Vector2,
}

impl Segment {
    /// Creates a new segment. Fails if both end points coincide.
    pub fn new(start: Vector2, end: Vector2) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() || start.distance_squared(&end) <= EPSILON {
            return Err(PhysicsError::DegenerateShape(
                "segment end points must be distinct and finite".into(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Returns the start point
    pub fn get_start(&self) -> Vector2 {
        self.start
    }

    /// Returns the end point
    pub fn get_end(&self) -> Vector2 {
        self.end
    }

    /// Returns the segment length
    pub fn length(&self) -> f32 {
        self.start.distance(&self.end)
    }

    /// Returns the closest point on the segment to `point`
    pub fn closest_point(&self, point: Vector2) -> Vector2 {
        closest_point_on_segment(self.start, self.end, point)
    }
}

impl Shape for Segment {
    fn shape_type(&self) -> &'static str {
        "Segment"
    }

    fn get_area(&self) -> f32 {
        0.0
    }

    fn get_centroid(&self) -> Vector2 {
        (self.start + self.end) * 0.5
    }

    fn get_unit_inertia(&self) -> f32 {
        // Thin rod about its midpoint, shifted to the origin
        let length = self.length();
        length * length / 12.0 + self.get_centroid().length_squared()
    }

    fn get_local_bounds(&self) -> Aabb {
        Aabb::new(self.start.min(&self.end), self.start.max(&self.end))
    }

    fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        world_bounds_of(&[self.start, self.end], transform)
    }

    fn contains_local_point(&self, point: Vector2) -> bool {
        self.closest_point(point).distance_squared(&point) <= EPSILON
    }
}

/// A connected sequence of segments, optionally closed into a loop
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    points: Vec<Vector2>,
    closed: bool,
}

impl Chain {
    /// Creates an open chain through `points`. Needs at least two points.
    pub fn new(points: &[Vector2]) -> Result<Self> {
        Self::build(points, false)
    }

    /// Creates a closed loop through `points`. Needs at least three points.
    pub fn new_loop(points: &[Vector2]) -> Result<Self> {
        Self::build(points, true)
    }

    fn build(points: &[Vector2], closed: bool) -> Result<Self> {
        let needed = if closed { 3 } else { 2 };
        if points.len() < needed {
            return Err(PhysicsError::DegenerateShape(format!(
                "chain needs at least {} points, got {}",
                needed,
                points.len()
            )));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(PhysicsError::DegenerateShape("chain point is not finite".into()));
        }
        Ok(Self { points: points.to_vec(), closed })
    }

    /// Returns the chain's points
    pub fn get_points(&self) -> &[Vector2] {
        &self.points
    }

    /// Returns whether the last point connects back to the first
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Iterates over the chain's non-degenerate segments
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        let n = self.points.len();
        let count = if self.closed { n } else { n - 1 };
        (0..count).filter_map(move |i| Segment::new(self.points[i], self.points[(i + 1) % n]).ok())
    }
}

impl Shape for Chain {
    fn shape_type(&self) -> &'static str {
        "Chain"
    }

    fn get_area(&self) -> f32 {
        0.0
    }

    fn get_centroid(&self) -> Vector2 {
        let (sum, length) = self.segments().fold((Vector2::zero(), 0.0), |(sum, length), s| {
            let l = s.length();
            (sum + s.get_centroid() * l, length + l)
        });
        if length > EPSILON { sum / length } else { Vector2::zero() }
    }

    fn get_unit_inertia(&self) -> f32 {
        // Length-weighted average of the segment rods
        let (sum, length) = self.segments().fold((0.0, 0.0), |(sum, length), s| {
            let l = s.length();
            (sum + s.get_unit_inertia() * l, length + l)
        });
        if length > EPSILON { sum / length } else { 0.0 }
    }

    fn get_local_bounds(&self) -> Aabb {
        Aabb::from_points(&self.points).unwrap_or_else(|| Aabb::new(Vector2::zero(), Vector2::zero()))
    }

    fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        world_bounds_of(&self.points, transform)
    }

    fn contains_local_point(&self, point: Vector2) -> bool {
        self.segments().any(|s| s.contains_local_point(point))
    }
}

/// Closest point to `point` on the segment `a`–`b`
pub(crate) fn closest_point_on_segment(a: Vector2, b: Vector2, point: Vector2) -> Vector2 {
    let ab = b - a;
    let denom = ab.length_squared();
    if denom <= EPSILON {
        return a;
    }
    let t = ((point - a).dot(&ab) / denom).clamp(0.0, 1.0);
    a + ab * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn segment_rejects_coincident_points() {
        assert!(Segment::new(Vector2::one(), Vector2::one()).is_err());
    }

    #[test]
    fn closed_chain_has_wraparound_segment() {
        let square = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];
        assert_eq!(Chain::new(&square).unwrap().segments().count(), 3);
        assert_eq!(Chain::new_loop(&square).unwrap().segments().count(), 4);
    }

    #[test]
    fn closest_point_clamps_to_ends() {
        let s = Segment::new(Vector2::zero(), Vector2::new(2.0, 0.0)).unwrap();
        assert_relative_eq!(s.closest_point(Vector2::new(5.0, 1.0)), Vector2::new(2.0, 0.0));
        assert_relative_eq!(s.closest_point(Vector2::new(1.0, 3.0)), Vector2::new(1.0, 0.0));
    }
}
