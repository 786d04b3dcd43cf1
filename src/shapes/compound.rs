use crate::error::PhysicsError;
use crate::math::{Vector2, Aabb, Transform, EPSILON};
use crate::shapes::{Shape, CollisionShape};
use crate::Result;

/// One child of a [`Compound`] together with its placement
#[derive(Debug, Clone)]
pub struct CompoundPart {
    /// The child shape, in its own local space
    pub shape: CollisionShape,

    /// Placement of the child inside the compound's local space
    pub transform: Transform,
}

/// A compound collision shape composed of multiple shapes.
///
/// Mass properties weight each child by its area; children without area
/// (segments, chains) count equally when no child has area.
#[derive(Debug, Clone, Default)]
pub struct Compound {
    parts: Vec<CompoundPart>,
}

impl Compound {
    /// Creates a new empty compound shape
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Creates a compound from a list of parts. Fails if the list is empty.
    pub fn from_parts(parts: Vec<CompoundPart>) -> Result<Self> {
        if parts.is_empty() {
            return Err(PhysicsError::DegenerateShape("compound shape has no parts".into()));
        }
        Ok(Self { parts })
    }

    /// Adds a shape to the compound shape
    pub fn add_shape(&mut self, shape: CollisionShape, transform: Transform) {
        self.parts.push(CompoundPart { shape, transform });
    }

    /// Removes the part at the given index
    pub fn remove_shape(&mut self, index: usize) -> Option<CompoundPart> {
        if index < self.parts.len() {
            Some(self.parts.remove(index))
        } else {
            None
        }
    }

    /// Returns the parts that make up the compound shape
    pub fn get_parts(&self) -> &[CompoundPart] {
        &self.parts
    }

    /// Returns the number of parts
    pub fn shape_count(&self) -> usize {
        self.parts.len()
    }

    /// Returns whether the compound has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Per-part weights used for mass properties, summing to 1
    fn weights(&self) -> Vec<f32> {
        let areas: Vec<f32> = self.parts.iter().map(|p| p.shape.get_area()).collect();
        let total: f32 = areas.iter().sum();
        if total > EPSILON {
            areas.iter().map(|a| a / total).collect()
        } else {
            let n = self.parts.len().max(1) as f32;
            vec![1.0 / n; self.parts.len()]
        }
    }
}

impl Shape for Compound {
    fn shape_type(&self) -> &'static str {
        "Compound"
    }

    fn get_area(&self) -> f32 {
        self.parts.iter().map(|p| p.shape.get_area()).sum()
    }

    fn get_centroid(&self) -> Vector2 {
        self.parts
            .iter()
            .zip(self.weights())
            .fold(Vector2::zero(), |acc, (part, w)| {
                acc + part.transform.transform_point(part.shape.get_centroid()) * w
            })
    }

    fn get_unit_inertia(&self) -> f32 {
        self.parts
            .iter()
            .zip(self.weights())
            .map(|(part, w)| {
                // Move the child's inertia from its own origin to its centroid,
                // then out to the compound origin.
                let local_centroid = part.shape.get_centroid();
                let placed_centroid = part.transform.transform_point(local_centroid);
                let about_centroid = part.shape.get_unit_inertia() - local_centroid.length_squared();
                w * (about_centroid + placed_centroid.length_squared())
            })
            .sum()
    }

    fn get_local_bounds(&self) -> Aabb {
        self.get_world_bounds(&Transform::identity())
    }

    fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        let mut bounds: Option<Aabb> = None;
        for part in &self.parts {
            let child = part.shape.get_world_bounds(&transform.combine(&part.transform));
            bounds = Some(match bounds {
                Some(b) => b.union(&child),
                None => child,
            });
        }
        bounds.unwrap_or_else(|| Aabb::new(transform.position, transform.position))
    }

    fn contains_local_point(&self, point: Vector2) -> bool {
        self.parts
            .iter()
            .any(|part| part.shape.contains_point(point, &part.transform))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Circle;
    use approx::assert_relative_eq;

    #[test]
    fn offset_circles_use_parallel_axis() {
        let circle = CollisionShape::from(Circle::new(1.0).unwrap());
        let mut compound = Compound::new();
        compound.add_shape(circle.clone(), Transform::from_position(Vector2::new(-2.0, 0.0)));
        compound.add_shape(circle, Transform::from_position(Vector2::new(2.0, 0.0)));

        assert_relative_eq!(compound.get_unit_inertia(), 0.5 + 4.0, epsilon = 1e-5);
        assert_relative_eq!(compound.get_centroid(), Vector2::zero());
        assert!(compound.contains_local_point(Vector2::new(2.5, 0.0)));
        assert!(!compound.contains_local_point(Vector2::zero()));
    }
}
