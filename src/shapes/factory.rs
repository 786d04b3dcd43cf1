//! Building collision shapes from a shape kind and a size.

use crate::error::PhysicsError;
use crate::math::{Vector2, Transform, EPSILON};
use crate::shapes::{Circle, Polygon, Compound, CollisionShape};
use crate::shapes::polygon::{signed_area, is_convex, remove_collinear};
use crate::Result;

/// Outline of an object, given at unit size (fits in a 1x1 box centered on the origin)
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Axis-aligned rectangle
    Rectangle,

    /// Circle; uses the mean of width and height as diameter when they differ
    Circle,

    /// Ellipse; equal width and height produce an analytic circle
    Ellipse,

    /// Isosceles triangle pointing up
    Triangle,

    /// Square rotated 45°
    Diamond,

    /// Regular pentagon
    Pentagon,

    /// Regular hexagon
    Hexagon,

    /// Regular octagon
    Octagon,

    /// Heart; concave, decomposed into convex pieces
    Heart,

    /// Custom unit-size outline
    Polygon(Vec<Vector2>),
}

/// Tuning for turning a [`ShapeKind`] into a collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionShapeParameters {
    /// Longest allowed distance between consecutive outline vertices
    pub max_vertex_distance: f32,
}

impl CollisionShapeParameters {
    /// Default parameters for an object of the given size: a third of the smaller side
    pub fn for_size(width: f32, height: f32) -> Self {
        Self {
            max_vertex_distance: width.min(height) / 3.0,
        }
    }
}

impl ShapeKind {
    /// Unit-size outline vertices, counter-clockwise
    pub fn unit_outline(&self) -> Vec<Vector2> {
        match self {
            ShapeKind::Rectangle => vec![
                Vector2::new(-0.5, -0.5),
                Vector2::new(0.5, -0.5),
                Vector2::new(0.5, 0.5),
                Vector2::new(-0.5, 0.5),
            ],
            ShapeKind::Triangle => vec![
                Vector2::new(0.0, 0.5),
                Vector2::new(-0.5, -0.5),
                Vector2::new(0.5, -0.5),
            ],
            ShapeKind::Diamond => regular_outline(4),
            ShapeKind::Pentagon => regular_outline(5),
            ShapeKind::Hexagon => regular_outline(6),
            ShapeKind::Octagon => regular_outline(8),
            ShapeKind::Heart => vec![
                Vector2::new(0.0, -0.5),
                Vector2::new(0.5, 0.2),
                Vector2::new(0.4, 0.4),
                Vector2::new(0.25, 0.5),
                Vector2::new(0.1, 0.4),
                Vector2::new(0.0, 0.2),
                Vector2::new(-0.1, 0.4),
                Vector2::new(-0.25, 0.5),
                Vector2::new(-0.4, 0.4),
                Vector2::new(-0.5, 0.2),
            ],
            ShapeKind::Circle | ShapeKind::Ellipse => regular_outline(32),
            ShapeKind::Polygon(vertices) => vertices.clone(),
        }
    }
}

/// Creates the collision shape for an object of `width` x `height`
pub fn create_shape(
    kind: &ShapeKind,
    width: f32,
    height: f32,
    parameters: CollisionShapeParameters,
) -> Result<CollisionShape> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(PhysicsError::InvalidParameter(format!(
            "object size must be positive, got {} x {}",
            width, height
        )));
    }
    if !(parameters.max_vertex_distance > 0.0) {
        return Err(PhysicsError::InvalidParameter(
            "max_vertex_distance must be greater than zero".into(),
        ));
    }

    match kind {
        ShapeKind::Circle | ShapeKind::Ellipse => create_ellipse(width, height, parameters),
        _ => {
            let scaled: Vec<Vector2> = kind
                .unit_outline()
                .into_iter()
                .map(|v| Vector2::new(v.x * width, v.y * height))
                .collect();
            let outline = subdivide(&scaled, parameters.max_vertex_distance, true);
            polygon_or_decomposition(&outline)
        }
    }
}

fn create_ellipse(width: f32, height: f32, parameters: CollisionShapeParameters) -> Result<CollisionShape> {
    let r = (width + height) * 0.25;

    if (width - height).abs() <= f32::EPSILON {
        return Ok(Circle::new(r)?.into());
    }

    let vertex_count = ellipse_vertex_count(width, height, parameters);
    let (a, b) = (0.5 * width, 0.5 * height);
    let vertices: Vec<Vector2> = (0..vertex_count)
        .map(|i| {
            let t = i as f32 * std::f32::consts::TAU / vertex_count as f32;
            Vector2::new(a * t.cos(), b * t.sin())
        })
        .collect();

    Ok(Polygon::new(&vertices)?.into())
}

/// Number of vertices used to approximate an ellipse: `ceil(2πr / max_vertex_distance)`
/// with `r` the mean radius, never fewer than 3.
pub fn ellipse_vertex_count(width: f32, height: f32, parameters: CollisionShapeParameters) -> usize {
    let r = (width + height) * 0.25;
    let count = (std::f32::consts::TAU * r / parameters.max_vertex_distance).ceil();
    (count as usize).max(3)
}

/// Inserts vertices so that no edge is longer than `max_length`.
///
/// With `closed` the edge from the last vertex back to the first is
/// subdivided as well.
pub fn subdivide(vertices: &[Vector2], max_length: f32, closed: bool) -> Vec<Vector2> {
    if vertices.len() < 2 || !(max_length > 0.0) {
        return vertices.to_vec();
    }

    let n = vertices.len();
    let edge_count = if closed { n } else { n - 1 };
    let mut result = Vec::with_capacity(n);
    if !closed {
        result.push(vertices[0]);
    }

    for i in 0..edge_count {
        let (from, to) = if closed {
            (vertices[(i + n - 1) % n], vertices[i])
        } else {
            (vertices[i], vertices[i + 1])
        };
        let edge = to - from;
        let length = edge.length();
        if length > max_length {
            let count = (length / max_length).ceil() as usize;
            let step = edge / count as f32;
            for k in 1..count {
                result.push(from + step * k as f32);
            }
        }
        result.push(to);
    }

    result
}

/// Builds a single polygon for convex outlines, or a compound of convex
/// triangles for concave ones.
pub fn polygon_or_decomposition(outline: &[Vector2]) -> Result<CollisionShape> {
    match Polygon::new(outline) {
        Ok(polygon) => Ok(polygon.into()),
        Err(PhysicsError::InvalidParameter(_)) => {
            let mut compound = Compound::new();
            for triangle in triangulate(outline)? {
                compound.add_shape(Polygon::new(&triangle)?.into(), Transform::identity());
            }
            Ok(compound.into())
        }
        Err(e) => Err(e),
    }
}

/// Ear-clipping triangulation of a simple polygon
fn triangulate(outline: &[Vector2]) -> Result<Vec<[Vector2; 3]>> {
    let mut ring = remove_collinear(outline);
    if signed_area(&ring) < 0.0 {
        ring.reverse();
    }

    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));
    let mut guard = 0;
    while ring.len() > 3 {
        let n = ring.len();
        let ear = (0..n).find(|&i| {
            let (a, b, c) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
            let triangle = [a, b, c];
            (b - a).cross(&(c - b)) > EPSILON
                && ring
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i && *j != (i + n - 1) % n && *j != (i + 1) % n)
                    .all(|(_, p)| !point_in_triangle(*p, &triangle))
        });

        match ear {
            Some(i) => {
                let n = ring.len();
                triangles.push([ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]]);
                ring.remove(i);
            }
            None => {
                // Only collinear runs remain
                guard += 1;
                if guard > outline.len() || is_convex(&ring) {
                    break;
                }
                ring.remove(0);
            }
        }
    }

    if ring.len() == 3 && signed_area(&ring).abs() > EPSILON {
        triangles.push([ring[0], ring[1], ring[2]]);
    }

    if triangles.is_empty() {
        return Err(PhysicsError::DegenerateShape("outline has zero area".into()));
    }
    Ok(triangles)
}

fn point_in_triangle(p: Vector2, [a, b, c]: &[Vector2; 3]) -> bool {
    let d1 = (*b - *a).cross(&(p - *a));
    let d2 = (*c - *b).cross(&(p - *b));
    let d3 = (*a - *c).cross(&(p - *c));
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

fn regular_outline(sides: usize) -> Vec<Vector2> {
    (0..sides)
        .map(|i| Vector2::from_angle(i as f32 * std::f32::consts::TAU / sides as f32) * 0.5)
        .collect()
}
