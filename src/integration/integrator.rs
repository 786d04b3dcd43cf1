use crate::bodies::RigidBody;
use crate::math::Vector2;

/// Trait for numerical integration algorithms.
///
/// A step is split in two halves around the constraint solver: velocities
/// are advanced from forces before solving, positions from the solved
/// velocities after.
pub trait Integrator: Send + Sync {
    /// Advances the body's velocity by its queued forces and `gravity`
    fn integrate_forces(&mut self, body: &mut RigidBody, gravity: Vector2, dt: f32);

    /// Advances the body's position and orientation by its velocity
    fn integrate_positions(&mut self, body: &mut RigidBody, dt: f32);

    /// Returns the name of the integrator
    fn name(&self) -> &str;
}
