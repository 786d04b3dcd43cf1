use crate::bodies::RigidBody;
use crate::collision::{
    collision_pair::CollisionPair,
    contact_manifold::ContactManifold,
    ignorer::pair_can_collide,
};
use crate::core::{BodyHandle, BodyStorage, ContactId, ContactPoint};
use crate::math::{Transform, Vector2, EPSILON};
use crate::shapes::CollisionShape;
use std::collections::HashMap;

/// Reference face selection prefers the first polygon unless the second
/// separates clearly more
const RELATIVE_TOLERANCE: f32 = 0.98;
const ABSOLUTE_TOLERANCE: f32 = 0.001;

/// Trait for narrow-phase collision detection algorithms
pub trait NarrowPhase: Send + Sync {
    /// Returns the name of the algorithm
    fn name(&self) -> &'static str;

    /// Detects collisions between the given pairs of bodies. Pairs whose
    /// ignorers veto the collision produce nothing.
    fn detect_collisions(&mut self, pairs: &[CollisionPair], bodies: &BodyStorage<RigidBody>) -> Vec<ContactManifold>;
}

/// A convex collision primitive in world space
#[derive(Debug, Clone)]
pub enum Primitive {
    /// Circle
    Circle {
        /// World-space center
        center: Vector2,
        /// Radius
        radius: f32,
    },

    /// Convex polygon, or a segment as a 2-vertex polygon with opposite
    /// normals
    Polygon {
        /// World-space vertices, counter-clockwise
        vertices: Vec<Vector2>,
        /// Outward normal of edge `i -> i + 1`
        normals: Vec<Vector2>,
    },
}

impl Primitive {
    fn segment(start: Vector2, end: Vector2) -> Option<Self> {
        let n = Vector2::new(end.y - start.y, start.x - end.x).try_normalize()?;
        Some(Primitive::Polygon {
            vertices: vec![start, end],
            normals: vec![n, -n],
        })
    }
}

/// Breaks a shape down into world-space convex primitives
pub fn world_primitives(shape: &CollisionShape, transform: &Transform, out: &mut Vec<Primitive>) {
    match shape {
        CollisionShape::Circle(circle) => out.push(Primitive::Circle {
            center: transform.transform_point(circle.get_center()),
            radius: circle.get_radius(),
        }),
        CollisionShape::Polygon(polygon) => out.push(Primitive::Polygon {
            vertices: polygon.get_vertices().iter().map(|v| transform.transform_point(*v)).collect(),
            normals: polygon.get_normals().iter().map(|n| transform.transform_direction(*n)).collect(),
        }),
        CollisionShape::Segment(segment) => {
            out.extend(Primitive::segment(
                transform.transform_point(segment.get_start()),
                transform.transform_point(segment.get_end()),
            ));
        }
        CollisionShape::Chain(chain) => {
            for segment in chain.segments() {
                out.extend(Primitive::segment(
                    transform.transform_point(segment.get_start()),
                    transform.transform_point(segment.get_end()),
                ));
            }
        }
        CollisionShape::Compound(compound) => {
            for part in compound.get_parts() {
                world_primitives(&part.shape, &transform.combine(&part.transform), out);
            }
        }
    }
}

/// Raw contact between two primitives, normal from the first to the second
struct RawContact {
    position: Vector2,
    normal: Vector2,
    penetration: f32,
    feature: u32,
}

fn collide_circles(center_a: Vector2, radius_a: f32, center_b: Vector2, radius_b: f32, out: &mut Vec<RawContact>) {
    let d = center_b - center_a;
    let radius = radius_a + radius_b;
    let distance_sq = d.length_squared();
    if distance_sq > radius * radius {
        return;
    }

    let distance = distance_sq.sqrt();
    // Concentric circles have no meaningful direction; pick one
    let normal = if distance > EPSILON { d / distance } else { Vector2::unit_y() };
    let penetration = radius - distance;

    out.push(RawContact {
        position: center_a + normal * (radius_a - 0.5 * penetration),
        normal,
        penetration,
        feature: 0,
    });
}

/// Polygon (first) against circle (second)
fn collide_polygon_circle(
    vertices: &[Vector2],
    normals: &[Vector2],
    center: Vector2,
    radius: f32,
    out: &mut Vec<RawContact>,
) {
    let count = vertices.len();

    let mut edge = 0;
    let mut separation = f32::NEG_INFINITY;
    for i in 0..count {
        let s = normals[i].dot(&(center - vertices[i]));
        if s > radius {
            return;
        }
        if s > separation {
            separation = s;
            edge = i;
        }
    }

    let v1 = vertices[edge];
    let v2 = vertices[(edge + 1) % count];

    // Center inside the polygon
    if separation < EPSILON {
        let normal = normals[edge];
        out.push(RawContact {
            position: center - normal * (0.5 * (radius + separation)),
            normal,
            penetration: radius - separation,
            feature: edge as u32,
        });
        return;
    }

    let u1 = (center - v1).dot(&(v2 - v1));
    let u2 = (center - v2).dot(&(v1 - v2));

    let (closest, feature) = if u1 <= 0.0 {
        (v1, 0x100 | edge as u32)
    } else if u2 <= 0.0 {
        (v2, 0x100 | ((edge + 1) % count) as u32)
    } else {
        let normal = normals[edge];
        out.push(RawContact {
            position: center - normal * (0.5 * (radius + separation)),
            normal,
            penetration: radius - separation,
            feature: edge as u32,
        });
        return;
    };

    let d = center - closest;
    let distance_sq = d.length_squared();
    if distance_sq > radius * radius {
        return;
    }
    let distance = distance_sq.sqrt();
    let normal = match d.try_normalize() {
        Some(n) => n,
        None => normals[edge],
    };
    let penetration = radius - distance;

    out.push(RawContact {
        position: closest + normal * (-0.5 * penetration),
        normal,
        penetration,
        feature,
    });
}

/// Largest separation of `b` from the edges of `a`: (edge, separation)
fn max_separation(
    vertices_a: &[Vector2],
    normals_a: &[Vector2],
    vertices_b: &[Vector2],
) -> (usize, f32) {
    let mut best_edge = 0;
    let mut best = f32::NEG_INFINITY;

    for (i, (v, n)) in vertices_a.iter().zip(normals_a).enumerate() {
        let s = vertices_b
            .iter()
            .map(|w| n.dot(&(*w - *v)))
            .fold(f32::INFINITY, f32::min);
        if s > best {
            best = s;
            best_edge = i;
        }
    }

    (best_edge, best)
}

/// Keeps the part of segment `points` on the negative side of the plane
/// `normal · x = offset`
fn clip_segment(points: [(Vector2, u32); 2], normal: Vector2, offset: f32, clip_id: u32) -> Option<[(Vector2, u32); 2]> {
    let d0 = normal.dot(&points[0].0) - offset;
    let d1 = normal.dot(&points[1].0) - offset;

    let mut kept = Vec::with_capacity(2);
    if d0 <= 0.0 {
        kept.push(points[0]);
    }
    if d1 <= 0.0 {
        kept.push(points[1]);
    }
    if d0 * d1 < 0.0 {
        let t = d0 / (d0 - d1);
        kept.push((points[0].0 + (points[1].0 - points[0].0) * t, clip_id));
    }

    match kept.as_slice() {
        [a, b, ..] => Some([*a, *b]),
        _ => None,
    }
}

/// Separating-axis test between two convex polygons with reference-face
/// clipping. Produces up to two contact points.
fn collide_polygons(
    vertices_a: &[Vector2],
    normals_a: &[Vector2],
    vertices_b: &[Vector2],
    normals_b: &[Vector2],
    out: &mut Vec<RawContact>,
) {
    let (edge_a, separation_a) = max_separation(vertices_a, normals_a, vertices_b);
    if separation_a > 0.0 {
        return;
    }
    let (edge_b, separation_b) = max_separation(vertices_b, normals_b, vertices_a);
    if separation_b > 0.0 {
        return;
    }

    let flip = separation_b > RELATIVE_TOLERANCE * separation_a + ABSOLUTE_TOLERANCE;
    let (ref_vertices, ref_normals, inc_vertices, inc_normals, ref_edge) = if flip {
        (vertices_b, normals_b, vertices_a, normals_a, edge_b)
    } else {
        (vertices_a, normals_a, vertices_b, normals_b, edge_a)
    };

    let ref_normal = ref_normals[ref_edge];
    let v1 = ref_vertices[ref_edge];
    let v2 = ref_vertices[(ref_edge + 1) % ref_vertices.len()];

    // Incident edge: most anti-parallel to the reference normal
    let inc_edge = inc_normals
        .iter()
        .enumerate()
        .min_by(|(_, x), (_, y)| x.dot(&ref_normal).total_cmp(&y.dot(&ref_normal)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let inc_next = (inc_edge + 1) % inc_vertices.len();
    let incident = [
        (inc_vertices[inc_edge], inc_edge as u32),
        (inc_vertices[inc_next], inc_next as u32),
    ];

    let tangent = match (v2 - v1).try_normalize() {
        Some(t) => t,
        None => return,
    };

    let clipped = clip_segment(incident, -tangent, -tangent.dot(&v1), 0x80)
        .and_then(|points| clip_segment(points, tangent, tangent.dot(&v2), 0x81));
    let clipped = match clipped {
        Some(points) => points,
        None => return,
    };

    let normal = if flip { -ref_normal } else { ref_normal };
    let feature_base = (u32::from(flip) << 24) | ((ref_edge as u32 & 0xff) << 16) | ((inc_edge as u32 & 0xff) << 8);

    for (point, id) in clipped {
        let separation = ref_normal.dot(&(point - v1));
        if separation <= 0.0 {
            out.push(RawContact {
                position: point - ref_normal * (0.5 * separation),
                normal,
                penetration: -separation,
                feature: feature_base | (id & 0xff),
            });
        }
    }
}

fn collide_primitives(a: &Primitive, b: &Primitive, out: &mut Vec<RawContact>) {
    match (a, b) {
        (Primitive::Circle { center: ca, radius: ra }, Primitive::Circle { center: cb, radius: rb }) => {
            collide_circles(*ca, *ra, *cb, *rb, out);
        }
        (Primitive::Polygon { vertices, normals }, Primitive::Circle { center, radius }) => {
            collide_polygon_circle(vertices, normals, *center, *radius, out);
        }
        (Primitive::Circle { center, radius }, Primitive::Polygon { vertices, normals }) => {
            let start = out.len();
            collide_polygon_circle(vertices, normals, *center, *radius, out);
            for contact in &mut out[start..] {
                contact.normal = -contact.normal;
            }
        }
        (
            Primitive::Polygon { vertices: va, normals: na },
            Primitive::Polygon { vertices: vb, normals: nb },
        ) => {
            // Two zero-thickness segments have no meaningful overlap
            if va.len() < 3 && vb.len() < 3 {
                return;
            }
            collide_polygons(va, na, vb, nb, out);
        }
    }
}

/// Computes the contacts between two sets of primitives, normals pointing
/// from `a` to `b`
pub fn collide_primitive_sets(a: &[Primitive], b: &[Primitive]) -> Vec<ContactPoint> {
    let mut contacts = Vec::new();
    let mut raw = Vec::new();

    for (ia, pa) in a.iter().enumerate() {
        for (ib, pb) in b.iter().enumerate() {
            raw.clear();
            collide_primitives(pa, pb, &mut raw);
            contacts.extend(raw.drain(..).map(|c| {
                ContactPoint::new(
                    c.position,
                    c.normal,
                    c.penetration,
                    ContactId {
                        primitive_a: ia as u16,
                        primitive_b: ib as u16,
                        feature: c.feature,
                    },
                )
            }));
        }
    }

    contacts
}

/// Computes the contacts between two bodies at their current transforms,
/// ignoring collision filters
pub fn collide_bodies(a: &RigidBody, b: &RigidBody) -> Vec<ContactPoint> {
    if !a.get_bounds().intersects(&b.get_bounds()) {
        return Vec::new();
    }

    let mut primitives_a = Vec::new();
    let mut primitives_b = Vec::new();
    world_primitives(a.get_shape(), &a.get_transform(), &mut primitives_a);
    world_primitives(b.get_shape(), &b.get_transform(), &mut primitives_b);

    collide_primitive_sets(&primitives_a, &primitives_b)
}

/// Separating-axis narrow phase over circles, polygons and segments
#[derive(Debug, Default)]
pub struct SatNarrowPhase {
    /// World-space primitives of the bodies seen this pass
    primitives: HashMap<BodyHandle, Vec<Primitive>>,
}

impl SatNarrowPhase {
    /// Creates a new narrow phase
    pub fn new() -> Self {
        Self::default()
    }

    fn primitives_of(&mut self, handle: BodyHandle, body: &RigidBody) {
        self.primitives.entry(handle).or_insert_with(|| {
            let mut out = Vec::new();
            world_primitives(body.get_shape(), &body.get_transform(), &mut out);
            out
        });
    }
}

impl NarrowPhase for SatNarrowPhase {
    fn name(&self) -> &'static str {
        "SAT"
    }

    fn detect_collisions(&mut self, pairs: &[CollisionPair], bodies: &BodyStorage<RigidBody>) -> Vec<ContactManifold> {
        self.primitives.clear();
        let mut manifolds = Vec::new();

        for pair in pairs {
            let (body_a, body_b) = match (bodies.get_body(pair.body_a), bodies.get_body(pair.body_b)) {
                (Ok(a), Ok(b)) => (a, b),
                _ => continue,
            };

            if body_a.is_expired() || body_b.is_expired() {
                continue;
            }

            // Two immovable bodies never need resolving
            if body_a.get_inverse_mass() == 0.0
                && body_b.get_inverse_mass() == 0.0
                && body_a.get_inverse_inertia() == 0.0
                && body_b.get_inverse_inertia() == 0.0
            {
                continue;
            }

            if !pair_can_collide(body_a, body_b) {
                continue;
            }

            self.primitives_of(pair.body_a, body_a);
            self.primitives_of(pair.body_b, body_b);

            let contacts = match (self.primitives.get(&pair.body_a), self.primitives.get(&pair.body_b)) {
                (Some(a), Some(b)) => collide_primitive_sets(a, b),
                _ => continue,
            };

            if contacts.is_empty() {
                continue;
            }

            let mut manifold = ContactManifold::between(*pair, body_a, body_b);
            manifold.contacts = contacts;
            manifolds.push(manifold);
        }

        manifolds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Polygon, Segment};
    use approx::assert_relative_eq;

    fn circle_at(radius: f32, x: f32, y: f32) -> RigidBody {
        RigidBody::new(Circle::new(radius).unwrap().into(), Vector2::new(x, y))
    }

    fn box_at(w: f32, h: f32, x: f32, y: f32) -> RigidBody {
        RigidBody::new(Polygon::rectangle(w, h).unwrap().into(), Vector2::new(x, y))
    }

    #[test]
    fn circle_circle_overlap() {
        let contacts = collide_bodies(&circle_at(1.0, 0.0, 0.0), &circle_at(1.0, 1.5, 0.0));
        assert_eq!(contacts.len(), 1);
        assert_relative_eq!(contacts[0].normal, Vector2::unit_x());
        assert_relative_eq!(contacts[0].penetration, 0.5);
        assert_relative_eq!(contacts[0].position, Vector2::new(0.75, 0.0));
    }

    #[test]
    fn separated_circles_do_not_touch() {
        assert!(collide_bodies(&circle_at(1.0, 0.0, 0.0), &circle_at(1.0, 2.5, 0.0)).is_empty());
    }

    #[test]
    fn circle_resting_on_box_face() {
        let ground = box_at(10.0, 2.0, 0.0, 0.0);
        let ball = circle_at(1.0, 2.0, 1.9);

        let contacts = collide_bodies(&ground, &ball);
        assert_eq!(contacts.len(), 1);
        assert_relative_eq!(contacts[0].normal, Vector2::unit_y(), epsilon = 1e-5);
        assert_relative_eq!(contacts[0].penetration, 0.1, epsilon = 1e-5);

        // Seen from the ball the normal points down
        let flipped = collide_bodies(&ball, &ground);
        assert_relative_eq!(flipped[0].normal, -Vector2::unit_y(), epsilon = 1e-5);
    }

    #[test]
    fn circle_against_box_corner() {
        let block = box_at(2.0, 2.0, 0.0, 0.0);
        let ball = circle_at(1.0, 1.5, 1.5);

        let contacts = collide_bodies(&block, &ball);
        assert_eq!(contacts.len(), 1);
        let expected = Vector2::new(1.0, 1.0).normalize();
        assert_relative_eq!(contacts[0].normal, expected, epsilon = 1e-5);
        assert_relative_eq!(contacts[0].penetration, 1.0 - 0.5f32.hypot(0.5), epsilon = 1e-5);
    }

    #[test]
    fn stacked_boxes_give_two_points() {
        let lower = box_at(4.0, 2.0, 0.0, 0.0);
        let upper = box_at(2.0, 2.0, 0.5, 1.9);

        let contacts = collide_bodies(&lower, &upper);
        assert_eq!(contacts.len(), 2);
        for contact in &contacts {
            assert_relative_eq!(contact.normal, Vector2::unit_y(), epsilon = 1e-5);
            assert_relative_eq!(contact.penetration, 0.1, epsilon = 1e-5);
        }
        assert_ne!(contacts[0].id, contacts[1].id);
    }

    #[test]
    fn separated_boxes_do_not_touch() {
        assert!(collide_bodies(&box_at(2.0, 2.0, 0.0, 0.0), &box_at(2.0, 2.0, 2.5, 0.0)).is_empty());
    }

    #[test]
    fn box_lands_on_segment() {
        let floor = RigidBody::new_static(
            Segment::new(Vector2::new(-10.0, 0.0), Vector2::new(10.0, 0.0)).unwrap().into(),
            Vector2::zero(),
        );
        let crate_box = box_at(2.0, 2.0, 0.0, 0.95);

        let contacts = collide_bodies(&floor, &crate_box);
        assert_eq!(contacts.len(), 2);
        for contact in &contacts {
            assert_relative_eq!(contact.normal, Vector2::unit_y(), epsilon = 1e-5);
            assert_relative_eq!(contact.penetration, 0.05, epsilon = 1e-5);
        }
    }

    #[test]
    fn rotated_box_corner_contact() {
        let ground = box_at(10.0, 2.0, 0.0, 0.0);
        let mut diamond = box_at(2.0, 2.0, 0.0, 1.0 + 2.0f32.sqrt() - 0.1);
        diamond.set_angle(std::f32::consts::FRAC_PI_4);

        let contacts = collide_bodies(&ground, &diamond);
        assert_eq!(contacts.len(), 1);
        assert_relative_eq!(contacts[0].normal, Vector2::unit_y(), epsilon = 1e-4);
        assert_relative_eq!(contacts[0].penetration, 0.1, epsilon = 1e-4);
    }
}
