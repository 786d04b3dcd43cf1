use crate::bodies::RigidBody;
use crate::collision::contact_manifold::ContactManifold;
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::math::{self, Vector2};

/// Trait for contact constraint solvers
pub trait ContactSolver {
    /// Prepares the solver for the given contacts and applies warm-start
    /// impulses
    fn prepare(&mut self, contacts: &[ContactManifold], bodies: &mut BodyStorage<RigidBody>, config: &SimulationConfig, dt: f32);

    /// Runs one velocity iteration over all prepared contacts and writes the
    /// accumulated impulses back into `contacts`
    fn solve_velocity(&mut self, contacts: &mut [ContactManifold], bodies: &mut BodyStorage<RigidBody>);
}

/// Per-point solver state
#[derive(Debug, Clone)]
struct ContactConstraint {
    manifold: usize,
    contact: usize,
    body_a: BodyHandle,
    body_b: BodyHandle,

    r_a: Vector2,
    r_b: Vector2,
    normal: Vector2,
    tangent: Vector2,

    normal_mass: f32,
    tangent_mass: f32,

    /// Penetration-correction target speed
    bias: f32,

    /// Restitution target speed
    velocity_bias: f32,

    friction: f32,

    normal_impulse: f32,
    tangent_impulse: f32,
    bias_impulse: f32,
}

/// Sequential impulse contact solver with accumulated, clamped impulses.
///
/// Contacts only push: the accumulated normal impulse stays non-negative.
/// Friction is clamped to the Coulomb cone `friction * normal_impulse`.
/// Penetration is corrected either through the real velocity (Baumgarte) or
/// through a separate bias velocity (split impulse).
#[derive(Debug, Default)]
pub struct SequentialImpulseSolver {
    constraints: Vec<ContactConstraint>,
    split_impulse: bool,
}

impl SequentialImpulseSolver {
    /// Creates a new sequential impulse solver
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of prepared contact points
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    fn effective_mass(inv_mass: f32, a: &RigidBody, b: &RigidBody, r_a: Vector2, r_b: Vector2, axis: Vector2) -> f32 {
        let rn_a = r_a.cross(&axis);
        let rn_b = r_b.cross(&axis);
        let k = inv_mass + a.get_inverse_inertia() * rn_a * rn_a + b.get_inverse_inertia() * rn_b * rn_b;
        math::inverse_or_zero(k)
    }
}

impl ContactSolver for SequentialImpulseSolver {
    fn prepare(&mut self, contacts: &[ContactManifold], bodies: &mut BodyStorage<RigidBody>, config: &SimulationConfig, dt: f32) {
        self.constraints.clear();
        self.split_impulse = config.split_impulse;
        let inv_dt = if dt > 0.0 { 1.0 / dt } else { 0.0 };

        for (m, manifold) in contacts.iter().enumerate() {
            if manifold.is_sensor {
                continue;
            }

            let (body_a, body_b) = match bodies.get_pair_mut(manifold.pair.body_a, manifold.pair.body_b) {
                Some(pair) => pair,
                None => continue,
            };
            let inv_mass = body_a.get_inverse_mass() + body_b.get_inverse_mass();
            let (pos_a, pos_b) = (body_a.get_position(), body_b.get_position());

            for (c, contact) in manifold.contacts.iter().enumerate() {
                let normal = contact.normal;
                let tangent = Vector2::new(normal.y, -normal.x);
                let r_a = contact.position - pos_a;
                let r_b = contact.position - pos_b;

                let dv = body_b.velocity_at_offset(r_b) - body_a.velocity_at_offset(r_a);
                let vn = dv.dot(&normal);
                let vt = dv.dot(&tangent);

                let velocity_bias = if vn < -config.restitution_velocity_threshold {
                    -manifold.restitution * vn
                } else {
                    0.0
                };

                let friction = if vt.abs() < config.static_friction_threshold {
                    manifold.static_friction
                } else {
                    manifold.kinetic_friction
                };

                let (normal_impulse, tangent_impulse) = if config.warm_starting {
                    (contact.normal_impulse, contact.tangent_impulse)
                } else {
                    (0.0, 0.0)
                };

                let warm = normal * normal_impulse + tangent * tangent_impulse;
                if !warm.is_zero() {
                    body_a.apply_impulse_at_offset(-warm, r_a);
                    body_b.apply_impulse_at_offset(warm, r_b);
                }

                self.constraints.push(ContactConstraint {
                    manifold: m,
                    contact: c,
                    body_a: manifold.pair.body_a,
                    body_b: manifold.pair.body_b,
                    r_a,
                    r_b,
                    normal,
                    tangent,
                    normal_mass: Self::effective_mass(inv_mass, body_a, body_b, r_a, r_b, normal),
                    tangent_mass: Self::effective_mass(inv_mass, body_a, body_b, r_a, r_b, tangent),
                    bias: config.bias_factor * inv_dt * (contact.penetration - config.allowed_penetration).max(0.0),
                    velocity_bias,
                    friction,
                    normal_impulse,
                    tangent_impulse,
                    bias_impulse: 0.0,
                });
            }
        }

        log::trace!("contact solver prepared {} points", self.constraints.len());
    }

    fn solve_velocity(&mut self, contacts: &mut [ContactManifold], bodies: &mut BodyStorage<RigidBody>) {
        let split = self.split_impulse;

        for c in &mut self.constraints {
            // A listener may have removed a body; treat the contact as inert
            let (body_a, body_b) = match bodies.get_pair_mut(c.body_a, c.body_b) {
                Some(pair) => pair,
                None => continue,
            };

            // Normal impulse
            let dv = body_b.velocity_at_offset(c.r_b) - body_a.velocity_at_offset(c.r_a);
            let vn = dv.dot(&c.normal);
            let target = if split { c.velocity_bias } else { c.velocity_bias + c.bias };

            let old = c.normal_impulse;
            c.normal_impulse = (old + c.normal_mass * (target - vn)).max(0.0);
            let impulse = c.normal * (c.normal_impulse - old);
            body_a.apply_impulse_at_offset(-impulse, c.r_a);
            body_b.apply_impulse_at_offset(impulse, c.r_b);

            // Split impulse: push apart through the bias velocity only
            if split && c.bias > 0.0 {
                let dvb = body_b.bias_velocity_at_offset(c.r_b) - body_a.bias_velocity_at_offset(c.r_a);
                let vnb = dvb.dot(&c.normal);

                let old = c.bias_impulse;
                c.bias_impulse = (old + c.normal_mass * (c.bias - vnb)).max(0.0);
                let impulse = c.normal * (c.bias_impulse - old);
                body_a.apply_bias_impulse_at_offset(-impulse, c.r_a);
                body_b.apply_bias_impulse_at_offset(impulse, c.r_b);
            }

            // Friction
            let dv = body_b.velocity_at_offset(c.r_b) - body_a.velocity_at_offset(c.r_a);
            let vt = dv.dot(&c.tangent);
            let max_friction = c.friction * c.normal_impulse;

            let old = c.tangent_impulse;
            c.tangent_impulse = (old - c.tangent_mass * vt).clamp(-max_friction, max_friction);
            let impulse = c.tangent * (c.tangent_impulse - old);
            body_a.apply_impulse_at_offset(-impulse, c.r_a);
            body_b.apply_impulse_at_offset(impulse, c.r_b);
        }

        for c in &self.constraints {
            if let Some(contact) = contacts.get_mut(c.manifold).and_then(|m| m.contacts.get_mut(c.contact)) {
                contact.normal_impulse = c.normal_impulse;
                contact.tangent_impulse = c.tangent_impulse;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::Coefficients;
    use crate::collision::{narrow_phase::collide_bodies, CollisionPair};
    use crate::core::Storage;
    use crate::shapes::Circle;
    use approx::assert_relative_eq;

    fn frictionless_ball(x: f32, velocity: f32, restitution: f32) -> RigidBody {
        let mut body = RigidBody::new(Circle::new(1.0).unwrap().into(), Vector2::new(x, 0.0));
        body.set_coefficients(Coefficients::frictionless(restitution));
        body.set_linear_velocity(Vector2::new(velocity, 0.0));
        body
    }

    fn resolve(a: RigidBody, b: RigidBody, config: &SimulationConfig) -> (RigidBody, RigidBody) {
        let contacts = collide_bodies(&a, &b);
        let mut bodies: BodyStorage<RigidBody> = Storage::new();
        let ha = bodies.add(a);
        let hb = bodies.add(b);

        let pair = CollisionPair::new(ha, hb);
        let (first, second) = (bodies.get_body(pair.body_a).unwrap(), bodies.get_body(pair.body_b).unwrap());
        let mut manifold = ContactManifold::between(pair, first, second);
        manifold.contacts = if pair.body_a == ha { contacts } else { contacts.iter().map(|c| c.flipped()).collect() };
        let mut manifolds = vec![manifold];

        let mut solver = SequentialImpulseSolver::new();
        solver.prepare(&manifolds, &mut bodies, config, 1.0 / 60.0);
        for _ in 0..config.solver_iterations {
            solver.solve_velocity(&mut manifolds, &mut bodies);
        }

        (bodies.remove(ha).unwrap(), bodies.remove(hb).unwrap())
    }

    #[test]
    fn elastic_head_on_swaps_velocities() {
        let config = SimulationConfig { warm_starting: false, ..Default::default() };
        let (a, b) = resolve(frictionless_ball(0.0, 5.0, 1.0), frictionless_ball(1.99, -5.0, 1.0), &config);

        assert_relative_eq!(a.get_linear_velocity().x, -5.0, epsilon = 1e-3);
        assert_relative_eq!(b.get_linear_velocity().x, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn separating_bodies_get_no_impulse() {
        let config = SimulationConfig::default();
        let (a, b) = resolve(frictionless_ball(0.0, -1.0, 1.0), frictionless_ball(1.99, 1.0, 1.0), &config);

        assert_relative_eq!(a.get_linear_velocity().x, -1.0);
        assert_relative_eq!(b.get_linear_velocity().x, 1.0);
    }

    #[test]
    fn inelastic_contact_stops_closing_speed() {
        let config = SimulationConfig::default();
        let (a, b) = resolve(frictionless_ball(0.0, 4.0, 0.0), frictionless_ball(1.99, 0.0, 0.0), &config);

        assert_relative_eq!(a.get_linear_velocity().x, 2.0, epsilon = 1e-3);
        assert_relative_eq!(b.get_linear_velocity().x, 2.0, epsilon = 1e-3);
    }

    #[test]
    fn static_body_never_moves() {
        let config = SimulationConfig::default();
        let mut wall = frictionless_ball(1.99, 0.0, 1.0);
        wall.make_static();
        let (ball, wall) = resolve(frictionless_ball(0.0, 5.0, 1.0), wall, &config);

        assert_eq!(wall.get_linear_velocity(), Vector2::zero());
        assert_relative_eq!(ball.get_linear_velocity().x, -5.0, epsilon = 1e-3);
    }

    #[test]
    fn split_impulse_keeps_correction_out_of_velocity() {
        let config = SimulationConfig::default();
        // Deep overlap, at rest
        let (a, b) = resolve(frictionless_ball(0.0, 0.0, 0.0), frictionless_ball(1.0, 0.0, 0.0), &config);

        assert_eq!(a.get_linear_velocity(), Vector2::zero());
        assert_eq!(b.get_linear_velocity(), Vector2::zero());
        assert!(b.bias_velocity.x > 0.0);
        assert!(a.bias_velocity.x < 0.0);
    }
}
