use crate::bodies::RigidBody;
use crate::integration::Integrator;
use crate::math::Vector2;

/// Symplectic Euler integrator (semi-implicit Euler).
///
/// Positions are advanced with the velocity that the solver just produced,
/// which keeps resting contacts and joints stable.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymplecticEulerIntegrator;

impl SymplecticEulerIntegrator {
    /// Creates a new Symplectic Euler integrator
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for SymplecticEulerIntegrator {
    fn integrate_forces(&mut self, body: &mut RigidBody, gravity: Vector2, dt: f32) {
        // Structure members follow their center body
        if body.is_structure_member() {
            return;
        }

        let gravity = if body.ignores_gravity() || body.ignores_physics_logics() {
            Vector2::zero()
        } else {
            gravity
        };
        body.integrate_forces(gravity, dt);
    }

    fn integrate_positions(&mut self, body: &mut RigidBody, dt: f32) {
        if body.is_structure_member() {
            return;
        }

        body.apply_velocity_limits();
        body.integrate_velocity(dt);
    }

    fn name(&self) -> &str {
        "SymplecticEuler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Circle;
    use approx::assert_relative_eq;

    #[test]
    fn position_uses_updated_velocity() {
        let mut integrator = SymplecticEulerIntegrator::new();
        let mut body = RigidBody::new(Circle::new(1.0).unwrap().into(), Vector2::zero());

        integrator.integrate_forces(&mut body, Vector2::new(0.0, -10.0), 0.5);
        integrator.integrate_positions(&mut body, 0.5);

        assert_relative_eq!(body.get_linear_velocity().y, -5.0);
        assert_relative_eq!(body.get_position().y, -2.5);
    }

    #[test]
    fn exempt_body_ignores_gravity_but_not_pushes() {
        let mut integrator = SymplecticEulerIntegrator::new();
        let mut body = RigidBody::new(Circle::new(1.0).unwrap().into(), Vector2::zero());
        body.set_ignores_gravity(true);
        body.push(Vector2::new(2.0, 0.0));

        integrator.integrate_forces(&mut body, Vector2::new(0.0, -10.0), 1.0);

        assert_relative_eq!(body.get_linear_velocity(), Vector2::new(2.0, 0.0));
    }
}
