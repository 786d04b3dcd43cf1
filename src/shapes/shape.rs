use crate::math::{Vector2, Aabb, Transform};
use crate::shapes::{Circle, Polygon, Segment, Chain, Compound};
use std::fmt::Debug;

/// Base trait for collision shapes.
///
/// Shapes live in the local space of their body: the body's position is the
/// origin and the body rotates about it.
pub trait Shape: Send + Sync + Debug + 'static {
    /// Returns the type name of the shape
    fn shape_type(&self) -> &'static str;

    /// Returns the area of the shape (zero for segments and chains)
    fn get_area(&self) -> f32;

    /// Returns the centroid of the shape in local space
    fn get_centroid(&self) -> Vector2;

    /// Returns the moment of inertia per unit mass about the local origin.
    ///
    /// Multiply by the body's mass to get its moment of inertia.
    fn get_unit_inertia(&self) -> f32;

    /// Returns the axis-aligned bounding box of the shape in local space
    fn get_local_bounds(&self) -> Aabb;

    /// Returns the axis-aligned bounding box of the shape in world space
    fn get_world_bounds(&self, transform: &Transform) -> Aabb;

    /// Returns whether a point given in local space lies inside the shape
    fn contains_local_point(&self, point: Vector2) -> bool;

    /// Returns whether a point given in world space lies inside the shape
    fn contains_point(&self, point: Vector2, transform: &Transform) -> bool {
        self.contains_local_point(transform.inverse_transform_point(point))
    }
}

/// The closed set of shapes a body can carry.
///
/// Collision dispatch matches on this enum, so every primitive pairing is
/// handled explicitly.
#[derive(Debug, Clone)]
pub enum CollisionShape {
    /// Analytic circle
    Circle(Circle),

    /// Convex polygon
    Polygon(Polygon),

    /// Single line segment
    Segment(Segment),

    /// Connected sequence of segments
    Chain(Chain),

    /// Several shapes rigidly attached at local offsets
    Compound(Compound),
}

impl CollisionShape {
    /// Returns the shape as a dynamic [`Shape`]
    pub fn as_shape(&self) -> &dyn Shape {
        match self {
            CollisionShape::Circle(s) => s,
            CollisionShape::Polygon(s) => s,
            CollisionShape::Segment(s) => s,
            CollisionShape::Chain(s) => s,
            CollisionShape::Compound(s) => s,
        }
    }

    /// Returns the outline vertices in local space, for drawing and for
    /// building compound shapes. Circles are approximated with `segments`
    /// vertices.
    pub fn outline(&self, segments: usize) -> Vec<Vector2> {
        match self {
            CollisionShape::Circle(c) => c.outline(segments),
            CollisionShape::Polygon(p) => p.get_outline().to_vec(),
            CollisionShape::Segment(s) => vec![s.get_start(), s.get_end()],
            CollisionShape::Chain(c) => c.get_points().to_vec(),
            CollisionShape::Compound(c) => c
                .get_parts()
                .iter()
                .flat_map(|part| {
                    part.shape
                        .outline(segments)
                        .into_iter()
                        .map(move |v| part.transform.transform_point(v))
                })
                .collect(),
        }
    }
}

impl Shape for CollisionShape {
    fn shape_type(&self) -> &'static str {
        self.as_shape().shape_type()
    }

    fn get_area(&self) -> f32 {
        self.as_shape().get_area()
    }

    fn get_centroid(&self) -> Vector2 {
        self.as_shape().get_centroid()
    }

    fn get_unit_inertia(&self) -> f32 {
        self.as_shape().get_unit_inertia()
    }

    fn get_local_bounds(&self) -> Aabb {
        self.as_shape().get_local_bounds()
    }

    fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        self.as_shape().get_world_bounds(transform)
    }

    fn contains_local_point(&self, point: Vector2) -> bool {
        self.as_shape().contains_local_point(point)
    }
}

impl From<Circle> for CollisionShape {
    fn from(shape: Circle) -> Self {
        CollisionShape::Circle(shape)
    }
}

impl From<Polygon> for CollisionShape {
    fn from(shape: Polygon) -> Self {
        CollisionShape::Polygon(shape)
    }
}

impl From<Segment> for CollisionShape {
    fn from(shape: Segment) -> Self {
        CollisionShape::Segment(shape)
    }
}

impl From<Chain> for CollisionShape {
    fn from(shape: Chain) -> Self {
        CollisionShape::Chain(shape)
    }
}

impl From<Compound> for CollisionShape {
    fn from(shape: Compound) -> Self {
        CollisionShape::Compound(shape)
    }
}

/// Computes the world-space bounds of a set of local vertices
pub(crate) fn world_bounds_of(vertices: &[Vector2], transform: &Transform) -> Aabb {
    let mut iter = vertices.iter().map(|v| transform.transform_point(*v));
    match iter.next() {
        Some(first) => {
            let mut aabb = Aabb::new(first, first);
            for v in iter {
                aabb.expand_to_include_point(v);
            }
            aabb
        }
        None => Aabb::new(transform.position, transform.position),
    }
}
