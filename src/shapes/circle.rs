use crate::error::PhysicsError;
use crate::math::{Vector2, Aabb, Transform};
use crate::shapes::Shape;
use crate::Result;

/// A circular collision shape
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    /// The radius of the circle
    radius: f32,

    /// The center of the circle in the body's local space
    center: Vector2,
}

impl Circle {
    /// Creates a new circle centered on the body's origin.
    ///
    /// Fails if the radius is not a positive finite number.
    pub fn new(radius: f32) -> Result<Self> {
        Self::with_center(radius, Vector2::zero())
    }

    /// Creates a new circle at a local offset from the body's origin
    pub fn with_center(radius: f32, center: Vector2) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(PhysicsError::DegenerateShape(format!(
                "circle radius must be positive, got {}",
                radius
            )));
        }

        Ok(Self { radius, center })
    }

    /// Returns the radius of the circle
    pub fn get_radius(&self) -> f32 {
        self.radius
    }

    /// Returns the local center of the circle
    pub fn get_center(&self) -> Vector2 {
        self.center
    }

    /// Approximates the circle with a regular polygon of `segments` vertices (at least 3)
    pub fn outline(&self, segments: usize) -> Vec<Vector2> {
        let segments = segments.max(3);
        (0..segments)
            .map(|i| {
                let t = i as f32 * std::f32::consts::TAU / segments as f32;
                self.center + Vector2::from_angle(t) * self.radius
            })
            .collect()
    }
}

impl Shape for Circle {
    fn shape_type(&self) -> &'static str {
        "Circle"
    }

    fn get_area(&self) -> f32 {
        std::f32::consts::PI * self.radius * self.radius
    }

    fn get_centroid(&self) -> Vector2 {
        self.center
    }

    fn get_unit_inertia(&self) -> f32 {
        // Solid disc about its center, shifted to the body origin
        0.5 * self.radius * self.radius + self.center.length_squared()
    }

    fn get_local_bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, Vector2::new(self.radius, self.radius))
    }

    fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        // Rotation only moves the center
        let center = transform.transform_point(self.center);
        Aabb::from_center_half_extents(center, Vector2::new(self.radius, self.radius))
    }

    fn contains_local_point(&self, point: Vector2) -> bool {
        point.distance_squared(&self.center) <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_non_positive_radius() {
        assert!(Circle::new(0.0).is_err());
        assert!(Circle::new(-1.0).is_err());
        assert!(Circle::new(f32::NAN).is_err());
    }

    #[test]
    fn unit_inertia_is_half_radius_squared() {
        let circle = Circle::new(25.0).unwrap();
        assert_relative_eq!(circle.get_unit_inertia(), 0.5 * 625.0);
    }

    #[test]
    fn world_bounds_follow_offset_center() {
        let circle = Circle::with_center(1.0, Vector2::new(2.0, 0.0)).unwrap();
        let transform = Transform::from_position_angle(Vector2::zero(), std::f32::consts::FRAC_PI_2);
        let bounds = circle.get_world_bounds(&transform);

        assert_relative_eq!(bounds.center().x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.center().y, 2.0, epsilon = 1e-5);
    }
}
