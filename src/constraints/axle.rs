use crate::constraints::joint::{SolverBody, JOINT_BIAS_FACTOR};
use crate::core::BodyHandle;
use crate::math::{Matrix2, Vector2};

/// A pivot shared by two bodies, or a body pinned to a fixed world point.
///
/// The bodies rotate freely around the pivot. Softness lets the pivot give
/// a little under load: 0 is rigid, larger values are springier.
#[derive(Debug, Clone)]
pub struct AxleJoint {
    body_a: BodyHandle,
    body_b: Option<BodyHandle>,

    /// Pivot in world space at creation
    pivot: Vector2,

    local_anchor_a: Vector2,

    /// Anchor in B's frame, or the world pivot when there is no body B
    local_anchor_b: Vector2,

    softness: f32,
    bias_factor: f32,

    r_a: Vector2,
    r_b: Vector2,
    mass: Matrix2,
    bias: Vector2,

    /// Accumulated impulse
    impulse: Vector2,
}

impl AxleJoint {
    /// Creates an axle between two bodies at the world point `pivot`
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, pivot: Vector2) -> Self {
        Self::build(body_a, Some(body_b), pivot)
    }

    /// Pins a body to the world at `pivot`
    pub fn fixed(body: BodyHandle, pivot: Vector2) -> Self {
        Self::build(body, None, pivot)
    }

    fn build(body_a: BodyHandle, body_b: Option<BodyHandle>, pivot: Vector2) -> Self {
        Self {
            body_a,
            body_b,
            pivot,
            local_anchor_a: Vector2::zero(),
            local_anchor_b: pivot,
            softness: 0.0,
            bias_factor: JOINT_BIAS_FACTOR,
            r_a: Vector2::zero(),
            r_b: Vector2::zero(),
            mass: Matrix2::zero(),
            bias: Vector2::zero(),
            impulse: Vector2::zero(),
        }
    }

    /// Returns the first body
    pub fn get_body_a(&self) -> BodyHandle {
        self.body_a
    }

    /// Returns the second body, if the axle is not pinned to the world
    pub fn get_body_b(&self) -> Option<BodyHandle> {
        self.body_b
    }

    /// Returns the pivot the joint was created at
    pub fn get_pivot(&self) -> Vector2 {
        self.pivot
    }

    /// Returns the softness
    pub fn get_softness(&self) -> f32 {
        self.softness
    }

    /// Sets the softness (negative values are treated as 0)
    pub fn set_softness(&mut self, softness: f32) {
        self.softness = softness.max(0.0);
    }

    /// Returns the fraction of pivot drift corrected per step
    pub fn get_bias_factor(&self) -> f32 {
        self.bias_factor
    }

    /// Sets the fraction of pivot drift corrected per step, clamped to 0..=1
    pub fn set_bias_factor(&mut self, bias_factor: f32) {
        self.bias_factor = bias_factor.clamp(0.0, 1.0);
    }

    /// Returns the impulse accumulated during the last step
    pub fn get_impulse(&self) -> Vector2 {
        self.impulse
    }

    pub(crate) fn axle_point(&self, a: &SolverBody) -> Vector2 {
        a.position + a.offset(self.local_anchor_a)
    }

    pub(crate) fn bind(&mut self, a: &SolverBody, b: &SolverBody) {
        self.local_anchor_a = a.rotation.inverse_rotate_vector(self.pivot - a.position);
        self.local_anchor_b = b.rotation.inverse_rotate_vector(self.pivot - b.position);
        self.impulse = Vector2::zero();
    }

    pub(crate) fn prepare(&mut self, a: &mut SolverBody, b: &mut SolverBody, inv_dt: f32, warm_starting: bool) {
        self.r_a = a.offset(self.local_anchor_a);
        self.r_b = b.offset(self.local_anchor_b);
        let (ra, rb) = (self.r_a, self.r_b);

        let m = a.inv_mass + b.inv_mass;
        let (ia, ib) = (a.inv_inertia, b.inv_inertia);
        let k = Matrix2::new([
            [
                m + ia * ra.y * ra.y + ib * rb.y * rb.y + self.softness,
                -ia * ra.x * ra.y - ib * rb.x * rb.y,
            ],
            [
                -ia * ra.x * ra.y - ib * rb.x * rb.y,
                m + ia * ra.x * ra.x + ib * rb.x * rb.x + self.softness,
            ],
        ]);
        self.mass = k.inverse_or_zero();

        let drift = (b.position + rb) - (a.position + ra);
        self.bias = drift * (-self.bias_factor * inv_dt);

        if warm_starting {
            a.apply_impulse(-self.impulse, ra);
            b.apply_impulse(self.impulse, rb);
        } else {
            self.impulse = Vector2::zero();
        }
    }

    pub(crate) fn solve_velocity(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        let dv = b.velocity_at(self.r_b) - a.velocity_at(self.r_a);
        let impulse = self
            .mass
            .multiply_vector(self.bias - dv - self.impulse * self.softness);

        a.apply_impulse(-impulse, self.r_a);
        b.apply_impulse(impulse, self.r_b);
        self.impulse += impulse;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn body_at(x: f32, y: f32) -> SolverBody {
        SolverBody {
            position: Vector2::new(x, y),
            inv_mass: 1.0,
            inv_inertia: 1.0,
            ..SolverBody::world()
        }
    }

    #[test]
    fn pinned_body_cannot_move_away_from_pivot() {
        let mut joint = AxleJoint::fixed(BodyHandle::dangling(), Vector2::new(0.0, 1.0));
        let mut a = body_at(0.0, 0.0);
        let mut world = SolverBody::world();
        joint.bind(&a, &world);

        // Pull straight away from the pivot
        a.velocity = Vector2::new(0.0, -3.0);
        joint.prepare(&mut a, &mut world, 60.0, false);
        for _ in 0..20 {
            joint.solve_velocity(&mut a, &mut world);
        }

        let pivot_velocity = a.velocity_at(joint.r_a);
        assert_relative_eq!(pivot_velocity.length(), 0.0, epsilon = 1e-4);
        assert_eq!(world.velocity, Vector2::zero());
    }

    #[test]
    fn drift_produces_correcting_bias() {
        let mut joint = AxleJoint::new(BodyHandle::dangling(), BodyHandle::dangling(), Vector2::new(1.0, 0.0));
        let mut a = body_at(0.0, 0.0);
        let mut b = body_at(2.0, 0.0);
        joint.bind(&a, &b);

        // B drifts away along x
        b.position.x += 0.5;
        joint.prepare(&mut a, &mut b, 60.0, false);
        assert!(joint.bias.x < 0.0);
        assert_relative_eq!(joint.bias.y, 0.0);
    }
}
