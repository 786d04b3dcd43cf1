use crate::error::PhysicsError;
use crate::math::{Vector2, Aabb, Transform, EPSILON};
use crate::shapes::Shape;
use crate::shapes::shape::world_bounds_of;
use crate::Result;

/// A convex polygon collision shape.
///
/// Vertices are stored counter-clockwise. The outline keeps every vertex it
/// was built from (including subdivision points), while collision uses the
/// hull with collinear vertices removed.
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Full outline, counter-clockwise
    outline: Vec<Vector2>,

    /// Collision hull, counter-clockwise with no collinear vertices
    vertices: Vec<Vector2>,

    /// Outward unit normal of each hull edge `vertices[i] -> vertices[i + 1]`
    normals: Vec<Vector2>,

    area: f32,
    centroid: Vector2,
    unit_inertia: f32,
    local_bounds: Aabb,
}

impl Polygon {
    /// Creates a convex polygon from its outline vertices.
    ///
    /// The winding is normalized to counter-clockwise. Fails with
    /// [`PhysicsError::DegenerateShape`] for fewer than 3 vertices or zero
    /// area, and with [`PhysicsError::InvalidParameter`] if the outline is
    /// not convex.
    pub fn new(vertices: &[Vector2]) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(PhysicsError::DegenerateShape(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::DegenerateShape("polygon vertex is not finite".into()));
        }

        let signed = signed_area(vertices);
        if signed.abs() <= EPSILON {
            return Err(PhysicsError::DegenerateShape("polygon has zero area".into()));
        }

        let mut outline = vertices.to_vec();
        if signed < 0.0 {
            outline.reverse();
        }

        let hull = remove_collinear(&outline);
        if hull.len() < 3 {
            return Err(PhysicsError::DegenerateShape("polygon has zero area".into()));
        }
        if !is_convex(&hull) {
            return Err(PhysicsError::InvalidParameter(
                "polygon outline is not convex; decompose it into a compound".into(),
            ));
        }

        let normals = hull
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let edge = hull[(i + 1) % hull.len()] - *v;
                Vector2::new(edge.y, -edge.x).normalize()
            })
            .collect();

        let area = signed.abs();
        let centroid = centroid(&outline, area);
        let unit_inertia = unit_inertia(&outline);
        let local_bounds = Aabb::from_points(&outline)
            .unwrap_or_else(|| Aabb::new(Vector2::zero(), Vector2::zero()));

        Ok(Self {
            outline,
            vertices: hull,
            normals,
            area,
            centroid,
            unit_inertia,
            local_bounds,
        })
    }

    /// Builds the convex hull of an arbitrary point cloud (monotone chain)
    pub fn convex_hull(points: &[Vector2]) -> Result<Self> {
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        sorted.dedup();

        if sorted.len() < 3 {
            return Self::new(&sorted);
        }

        let mut hull: Vec<Vector2> = Vec::with_capacity(sorted.len() * 2);
        for pass in 0..2 {
            let start = hull.len();
            let iter: Box<dyn Iterator<Item = &Vector2>> = if pass == 0 {
                Box::new(sorted.iter())
            } else {
                Box::new(sorted.iter().rev())
            };
            for p in iter {
                while hull.len() >= start + 2 {
                    let a = hull[hull.len() - 2];
                    let b = hull[hull.len() - 1];
                    if (b - a).cross(&(*p - a)) <= 0.0 {
                        hull.pop();
                    } else {
                        break;
                    }
                }
                hull.push(*p);
            }
            hull.pop();
        }

        Self::new(&hull)
    }

    /// Creates an axis-aligned rectangle centered on the origin
    pub fn rectangle(width: f32, height: f32) -> Result<Self> {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::new(&[
            Vector2::new(-hw, -hh),
            Vector2::new(hw, -hh),
            Vector2::new(hw, hh),
            Vector2::new(-hw, hh),
        ])
    }

    /// Creates a regular polygon with `sides` vertices on a circle of `radius`
    pub fn regular(sides: usize, radius: f32) -> Result<Self> {
        let vertices: Vec<Vector2> = (0..sides)
            .map(|i| Vector2::from_angle(i as f32 * std::f32::consts::TAU / sides as f32) * radius)
            .collect();
        Self::new(&vertices)
    }

    /// Returns the collision hull vertices (counter-clockwise)
    pub fn get_vertices(&self) -> &[Vector2] {
        &self.vertices
    }

    /// Returns the outward edge normals of the collision hull
    pub fn get_normals(&self) -> &[Vector2] {
        &self.normals
    }

    /// Returns the full outline the polygon was built from
    pub fn get_outline(&self) -> &[Vector2] {
        &self.outline
    }

    /// Returns the number of hull vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

impl Shape for Polygon {
    fn shape_type(&self) -> &'static str {
        "Polygon"
    }

    fn get_area(&self) -> f32 {
        self.area
    }

    fn get_centroid(&self) -> Vector2 {
        self.centroid
    }

    fn get_unit_inertia(&self) -> f32 {
        self.unit_inertia
    }

    fn get_local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    fn get_world_bounds(&self, transform: &Transform) -> Aabb {
        world_bounds_of(&self.vertices, transform)
    }

    fn contains_local_point(&self, point: Vector2) -> bool {
        self.vertices
            .iter()
            .zip(&self.normals)
            .all(|(v, n)| n.dot(&(point - *v)) <= 0.0)
    }
}

/// Signed area of a closed outline (positive when counter-clockwise)
pub(crate) fn signed_area(vertices: &[Vector2]) -> f32 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        sum += vertices[i].cross(&vertices[(i + 1) % n]);
    }
    sum * 0.5
}

fn centroid(vertices: &[Vector2], area: f32) -> Vector2 {
    let n = vertices.len();
    let mut c = Vector2::zero();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        c += (a + b) * a.cross(&b);
    }
    c / (6.0 * area)
}

/// Second moment of area about the origin divided by the area, which is the
/// moment of inertia for unit mass. Summed over the triangle fan from the
/// origin.
pub(crate) fn unit_inertia(vertices: &[Vector2]) -> f32 {
    let n = vertices.len();
    let mut numer = 0.0;
    let mut denom = 0.0;
    for i in 0..n {
        let v1 = vertices[i];
        let v2 = vertices[(i + 1) % n];
        let cross = v1.cross(&v2);
        numer += cross * (v1.dot(&v1) + v1.dot(&v2) + v2.dot(&v2));
        denom += cross;
    }
    if denom.abs() <= EPSILON {
        return 0.0;
    }
    (numer / (6.0 * denom)).abs()
}

pub(crate) fn remove_collinear(vertices: &[Vector2]) -> Vec<Vector2> {
    let n = vertices.len();
    let scale = vertices
        .iter()
        .map(|v| v.length_squared())
        .fold(0.0f32, f32::max)
        .max(1.0);
    (0..n)
        .filter(|&i| {
            let prev = vertices[(i + n - 1) % n];
            let cur = vertices[i];
            let next = vertices[(i + 1) % n];
            let turn = (cur - prev).cross(&(next - cur));
            turn.abs() > EPSILON * scale && cur.distance_squared(&prev) > EPSILON
        })
        .map(|i| vertices[i])
        .collect()
}

pub(crate) fn is_convex(ccw: &[Vector2]) -> bool {
    let n = ccw.len();
    (0..n).all(|i| {
        let a = ccw[i];
        let b = ccw[(i + 1) % n];
        let c = ccw[(i + 2) % n];
        (b - a).cross(&(c - b)) >= -EPSILON
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_degenerate_outlines() {
        assert!(matches!(
            Polygon::new(&[Vector2::zero(), Vector2::unit_x()]),
            Err(PhysicsError::DegenerateShape(_))
        ));
        assert!(matches!(
            Polygon::new(&[Vector2::zero(), Vector2::unit_x(), Vector2::new(2.0, 0.0)]),
            Err(PhysicsError::DegenerateShape(_))
        ));
    }

    #[test]
    fn clockwise_input_is_rewound() {
        let poly = Polygon::new(&[
            Vector2::new(-1.0, -1.0),
            Vector2::new(-1.0, 1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(1.0, -1.0),
        ])
        .unwrap();

        assert!(signed_area(poly.get_vertices()) > 0.0);
        assert_relative_eq!(poly.get_area(), 4.0);
    }

    #[test]
    fn rectangle_inertia_matches_closed_form() {
        let (w, h) = (4.0, 2.0);
        let poly = Polygon::rectangle(w, h).unwrap();
        assert_relative_eq!(poly.get_unit_inertia(), (w * w + h * h) / 12.0, epsilon = 1e-5);
        assert_relative_eq!(poly.get_centroid().x, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn collinear_points_leave_hull_but_stay_in_outline() {
        let poly = Polygon::new(&[
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(2.0, 2.0),
            Vector2::new(0.0, 2.0),
        ])
        .unwrap();

        assert_eq!(poly.get_outline().len(), 5);
        assert_eq!(poly.vertex_count(), 4);
    }

    #[test]
    fn convex_hull_drops_interior_points() {
        let poly = Polygon::convex_hull(&[
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(2.0, 0.0),
            Vector2::new(2.0, 2.0),
            Vector2::new(0.0, 2.0),
        ])
        .unwrap();

        assert_eq!(poly.vertex_count(), 4);
        assert!(poly.contains_local_point(Vector2::new(1.0, 1.0)));
        assert!(!poly.contains_local_point(Vector2::new(3.0, 1.0)));
    }
}
