use crate::constraints::joint::{SolverBody, JOINT_BIAS_FACTOR};
use crate::core::BodyHandle;
use crate::math::{Matrix3, Vector2};

/// Glues two bodies together: they share an anchor point and keep the
/// relative angle they had when the joint was added.
#[derive(Debug, Clone)]
pub struct WeldJoint {
    body_a: BodyHandle,
    body_b: BodyHandle,

    /// Anchor in world space at creation; None means halfway between the bodies
    anchor: Option<Vector2>,

    local_anchor_a: Vector2,
    local_anchor_b: Vector2,
    reference_angle: f32,

    r_a: Vector2,
    r_b: Vector2,
    mass: Matrix3,
    linear_bias: Vector2,
    angular_bias: f32,

    linear_impulse: Vector2,
    angular_impulse: f32,
}

impl WeldJoint {
    /// Welds two bodies at the midpoint between their positions
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            body_a,
            body_b,
            anchor: None,
            local_anchor_a: Vector2::zero(),
            local_anchor_b: Vector2::zero(),
            reference_angle: 0.0,
            r_a: Vector2::zero(),
            r_b: Vector2::zero(),
            mass: Matrix3::zero(),
            linear_bias: Vector2::zero(),
            angular_bias: 0.0,
            linear_impulse: Vector2::zero(),
            angular_impulse: 0.0,
        }
    }

    /// Welds two bodies at the world point `anchor`
    pub fn with_anchor(body_a: BodyHandle, body_b: BodyHandle, anchor: Vector2) -> Self {
        Self {
            anchor: Some(anchor),
            ..Self::new(body_a, body_b)
        }
    }

    /// Returns the first body
    pub fn get_body_a(&self) -> BodyHandle {
        self.body_a
    }

    /// Returns the second body
    pub fn get_body_b(&self) -> BodyHandle {
        self.body_b
    }

    /// Returns the relative angle the joint holds
    pub fn get_reference_angle(&self) -> f32 {
        self.reference_angle
    }

    /// Welds are always rigid
    pub fn get_softness(&self) -> f32 {
        0.0
    }

    pub(crate) fn axle_point(&self, a: &SolverBody, b: &SolverBody) -> Vector2 {
        (a.position + b.position) * 0.5
    }

    pub(crate) fn bind(&mut self, a: &SolverBody, b: &SolverBody) {
        let anchor = self.anchor.unwrap_or_else(|| (a.position + b.position) * 0.5);
        self.local_anchor_a = a.rotation.inverse_rotate_vector(anchor - a.position);
        self.local_anchor_b = b.rotation.inverse_rotate_vector(anchor - b.position);
        self.reference_angle = b.angle - a.angle;
        self.linear_impulse = Vector2::zero();
        self.angular_impulse = 0.0;
    }

    pub(crate) fn prepare(&mut self, a: &mut SolverBody, b: &mut SolverBody, inv_dt: f32, warm_starting: bool) {
        self.r_a = a.offset(self.local_anchor_a);
        self.r_b = b.offset(self.local_anchor_b);
        let (ra, rb) = (self.r_a, self.r_b);
        let (ma, mb, ia, ib) = (a.inv_mass, b.inv_mass, a.inv_inertia, b.inv_inertia);

        let xy = -ra.y * ra.x * ia - rb.y * rb.x * ib;
        let xz = -ra.y * ia - rb.y * ib;
        let yz = ra.x * ia + rb.x * ib;
        self.mass = Matrix3::new([
            [ma + mb + ra.y * ra.y * ia + rb.y * rb.y * ib, xy, xz],
            [xy, ma + mb + ra.x * ra.x * ia + rb.x * rb.x * ib, yz],
            [xz, yz, ia + ib],
        ]);

        let linear_error = (b.position + rb) - (a.position + ra);
        let angular_error = b.angle - a.angle - self.reference_angle;
        self.linear_bias = linear_error * (JOINT_BIAS_FACTOR * inv_dt);
        self.angular_bias = angular_error * JOINT_BIAS_FACTOR * inv_dt;

        if warm_starting {
            let p = self.linear_impulse;
            a.apply_impulse(-p, ra);
            a.apply_angular_impulse(-self.angular_impulse);
            b.apply_impulse(p, rb);
            b.apply_angular_impulse(self.angular_impulse);
        } else {
            self.linear_impulse = Vector2::zero();
            self.angular_impulse = 0.0;
        }
    }

    pub(crate) fn solve_velocity(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        let cdot_linear = b.velocity_at(self.r_b) - a.velocity_at(self.r_a) + self.linear_bias;
        let cdot_angular = b.angular_velocity - a.angular_velocity + self.angular_bias;

        // Neither body can rotate: only the point constraint is solvable
        let (p, angular) = if self.mass.data[2][2] == 0.0 {
            (-self.mass.solve22(cdot_linear), 0.0)
        } else {
            let (p, angular) = self.mass.solve33(cdot_linear, cdot_angular);
            (-p, -angular)
        };

        a.apply_impulse(-p, self.r_a);
        a.apply_angular_impulse(-angular);
        b.apply_impulse(p, self.r_b);
        b.apply_angular_impulse(angular);

        self.linear_impulse += p;
        self.angular_impulse += angular;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Rotation;
    use approx::assert_relative_eq;

    fn body_at(x: f32) -> SolverBody {
        SolverBody {
            position: Vector2::new(x, 0.0),
            inv_mass: 1.0,
            inv_inertia: 2.0,
            ..SolverBody::world()
        }
    }

    #[test]
    fn welded_bodies_move_as_one() {
        let mut joint = WeldJoint::new(BodyHandle::dangling(), BodyHandle::dangling());
        let (mut a, mut b) = (body_at(0.0), body_at(2.0));
        joint.bind(&a, &b);

        a.velocity = Vector2::new(0.0, 4.0);
        joint.prepare(&mut a, &mut b, 60.0, false);
        for _ in 0..20 {
            joint.solve_velocity(&mut a, &mut b);
        }

        assert_relative_eq!(a.angular_velocity, b.angular_velocity, epsilon = 1e-4);
        let anchor_a = a.velocity_at(joint.r_a);
        let anchor_b = b.velocity_at(joint.r_b);
        assert_relative_eq!(anchor_a, anchor_b, epsilon = 1e-4);
    }

    #[test]
    fn reference_angle_is_captured_on_bind() {
        let mut joint = WeldJoint::with_anchor(BodyHandle::dangling(), BodyHandle::dangling(), Vector2::new(1.0, 0.0));
        let a = body_at(0.0);
        let mut b = body_at(2.0);
        b.angle = 0.5;
        b.rotation = Rotation::new(0.5);
        joint.bind(&a, &b);

        assert_relative_eq!(joint.get_reference_angle(), 0.5);
    }
}
