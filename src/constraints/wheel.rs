use crate::constraints::joint::{SolverBody, JOINT_BIAS_FACTOR};
use crate::core::BodyHandle;
use crate::error::PhysicsError;
use crate::math::{self, Vector2};
use crate::Result;
use std::f32::consts::PI;

/// Suspension joint for vehicle wheels.
///
/// Body B (the wheel) may slide along `axis` (fixed in A's frame) against a
/// damped spring and rotate freely. An optional motor drives the relative
/// angular velocity towards `motor_speed`, limited by `max_motor_torque`.
#[derive(Debug, Clone)]
pub struct WheelJoint {
    body_a: BodyHandle,
    body_b: BodyHandle,

    /// Anchor in world space at creation; None means body B's position
    anchor: Option<Vector2>,

    /// Translation axis in world space at creation
    axis: Vector2,

    local_anchor_a: Vector2,
    local_anchor_b: Vector2,
    local_axis: Vector2,

    frequency: f32,
    damping_ratio: f32,

    motor_enabled: bool,
    motor_speed: f32,
    max_motor_torque: f32,

    // Solver state
    r_a: Vector2,
    r_b: Vector2,
    ax: Vector2,
    ay: Vector2,
    s_ax: f32,
    s_bx: f32,
    s_ay: f32,
    s_by: f32,
    mass: f32,
    spring_mass: f32,
    motor_mass: f32,
    bias: f32,
    gamma: f32,
    line_bias: f32,
    dt: f32,

    impulse: f32,
    spring_impulse: f32,
    motor_impulse: f32,
}

impl WheelJoint {
    /// Default spring frequency in Hz
    pub const DEFAULT_FREQUENCY: f32 = 5.0;

    /// Default spring damping ratio
    pub const DEFAULT_DAMPING_RATIO: f32 = 0.5;

    /// Creates a wheel joint anchored at body B, sliding along the diagonal
    /// `(1, 1)` axis
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            body_a,
            body_b,
            anchor: None,
            axis: Vector2::new(1.0, 1.0).normalize(),
            local_anchor_a: Vector2::zero(),
            local_anchor_b: Vector2::zero(),
            local_axis: Vector2::unit_x(),
            frequency: Self::DEFAULT_FREQUENCY,
            damping_ratio: Self::DEFAULT_DAMPING_RATIO,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            r_a: Vector2::zero(),
            r_b: Vector2::zero(),
            ax: Vector2::zero(),
            ay: Vector2::zero(),
            s_ax: 0.0,
            s_bx: 0.0,
            s_ay: 0.0,
            s_by: 0.0,
            mass: 0.0,
            spring_mass: 0.0,
            motor_mass: 0.0,
            bias: 0.0,
            gamma: 0.0,
            line_bias: 0.0,
            dt: 0.0,
            impulse: 0.0,
            spring_impulse: 0.0,
            motor_impulse: 0.0,
        }
    }

    /// Creates a wheel joint anchored at the world point `anchor`
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

    /// Returns the second body (the wheel)
    pub fn get_body_b(&self) -> BodyHandle {
        self.body_b
    }

    /// Returns the translation axis in world space at creation
    pub fn get_axis(&self) -> Vector2 {
        self.axis
    }

    /// Sets the translation axis. Takes effect when the joint is added to a
    /// world.
    pub fn set_axis(&mut self, axis: Vector2) -> Result<()> {
        self.axis = axis
            .try_normalize()
            .ok_or_else(|| PhysicsError::InvalidParameter("wheel axis must be non-zero".into()))?;
        Ok(())
    }

    /// Returns the spring frequency in Hz
    pub fn get_frequency(&self) -> f32 {
        self.frequency
    }

    /// Sets the spring frequency in Hz. 0 disables the spring.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.max(0.0);
    }

    /// Returns the spring damping ratio
    pub fn get_damping_ratio(&self) -> f32 {
        self.damping_ratio
    }

    /// Sets the spring damping ratio
    pub fn set_damping_ratio(&mut self, damping_ratio: f32) {
        self.damping_ratio = damping_ratio.max(0.0);
    }

    /// Returns whether the motor is on
    pub fn is_motor_enabled(&self) -> bool {
        self.motor_enabled
    }

    /// Turns the motor on or off
    pub fn set_motor_enabled(&mut self, enabled: bool) {
        self.motor_enabled = enabled;
    }

    /// Returns the target relative angular velocity
    pub fn get_motor_speed(&self) -> f32 {
        self.motor_speed
    }

    /// Sets the target relative angular velocity
    pub fn set_motor_speed(&mut self, speed: f32) {
        self.motor_speed = speed;
    }

    /// Returns the largest torque the motor applies
    pub fn get_max_motor_torque(&self) -> f32 {
        self.max_motor_torque
    }

    /// Sets the largest torque the motor applies
    pub fn set_max_motor_torque(&mut self, torque: f32) {
        self.max_motor_torque = torque.max(0.0);
    }

    pub(crate) fn axle_point(&self, a: &SolverBody, b: &SolverBody) -> Vector2 {
        (a.position + b.position) * 0.5
    }

    pub(crate) fn bind(&mut self, a: &SolverBody, b: &SolverBody) {
        let anchor = self.anchor.unwrap_or(b.position);
        self.local_anchor_a = a.rotation.inverse_rotate_vector(anchor - a.position);
        self.local_anchor_b = b.rotation.inverse_rotate_vector(anchor - b.position);
        self.local_axis = a.rotation.inverse_rotate_vector(self.axis);
        self.impulse = 0.0;
        self.spring_impulse = 0.0;
        self.motor_impulse = 0.0;
    }

    pub(crate) fn prepare(&mut self, a: &mut SolverBody, b: &mut SolverBody, dt: f32, warm_starting: bool) {
        self.dt = dt;
        self.r_a = a.offset(self.local_anchor_a);
        self.r_b = b.offset(self.local_anchor_b);
        let (ma, mb, ia, ib) = (a.inv_mass, b.inv_mass, a.inv_inertia, b.inv_inertia);
        let d = b.position + self.r_b - a.position - self.r_a;

        // Point-on-line constraint
        self.ay = a.offset(self.local_axis.perpendicular());
        self.s_ay = (d + self.r_a).cross(&self.ay);
        self.s_by = self.r_b.cross(&self.ay);
        self.mass = math::inverse_or_zero(ma + mb + ia * self.s_ay * self.s_ay + ib * self.s_by * self.s_by);
        let inv_dt = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        self.line_bias = JOINT_BIAS_FACTOR * inv_dt * d.dot(&self.ay);

        // Spring along the axis
        self.ax = a.offset(self.local_axis);
        self.s_ax = (d + self.r_a).cross(&self.ax);
        self.s_bx = self.r_b.cross(&self.ax);
        self.spring_mass = 0.0;
        self.bias = 0.0;
        self.gamma = 0.0;

        let axial_inv_mass = ma + mb + ia * self.s_ax * self.s_ax + ib * self.s_bx * self.s_bx;
        if self.frequency > 0.0 && axial_inv_mass > 0.0 {
            let axial_mass = 1.0 / axial_inv_mass;
            let omega = 2.0 * PI * self.frequency;
            let damping = 2.0 * axial_mass * self.damping_ratio * omega;
            let stiffness = axial_mass * omega * omega;

            self.gamma = math::inverse_or_zero(dt * (damping + dt * stiffness));
            self.bias = d.dot(&self.ax) * dt * stiffness * self.gamma;
            self.spring_mass = math::inverse_or_zero(axial_inv_mass + self.gamma);
        } else {
            self.spring_impulse = 0.0;
        }

        // Motor
        if self.motor_enabled {
            self.motor_mass = math::inverse_or_zero(ia + ib);
        } else {
            self.motor_mass = 0.0;
            self.motor_impulse = 0.0;
        }

        if warm_starting {
            let p = self.ay * self.impulse + self.ax * self.spring_impulse;
            let la = self.impulse * self.s_ay + self.spring_impulse * self.s_ax + self.motor_impulse;
            let lb = self.impulse * self.s_by + self.spring_impulse * self.s_bx + self.motor_impulse;
            self.apply(a, b, p, la, lb);
        } else {
            self.impulse = 0.0;
            self.spring_impulse = 0.0;
            self.motor_impulse = 0.0;
        }
    }

    pub(crate) fn solve_velocity(&mut self, a: &mut SolverBody, b: &mut SolverBody) {
        // Spring
        let cdot = self.ax.dot(&(b.velocity - a.velocity)) + self.s_bx * b.angular_velocity
            - self.s_ax * a.angular_velocity;
        let impulse = -self.spring_mass * (cdot + self.bias + self.gamma * self.spring_impulse);
        self.spring_impulse += impulse;
        self.apply(a, b, self.ax * impulse, impulse * self.s_ax, impulse * self.s_bx);

        // Motor
        if self.motor_enabled {
            let cdot = b.angular_velocity - a.angular_velocity - self.motor_speed;
            let max_impulse = self.dt * self.max_motor_torque;
            let old = self.motor_impulse;
            self.motor_impulse = (old - self.motor_mass * cdot).clamp(-max_impulse, max_impulse);
            let impulse = self.motor_impulse - old;
            a.apply_angular_impulse(-impulse);
            b.apply_angular_impulse(impulse);
        }

        // Point on line
        let cdot = self.ay.dot(&(b.velocity - a.velocity)) + self.s_by * b.angular_velocity
            - self.s_ay * a.angular_velocity;
        let impulse = -self.mass * (cdot + self.line_bias);
        self.impulse += impulse;
        self.apply(a, b, self.ay * impulse, impulse * self.s_ay, impulse * self.s_by);
    }

    /// Applies a linear impulse `p` with angular parts `la` on A and `lb` on B
    fn apply(&self, a: &mut SolverBody, b: &mut SolverBody, p: Vector2, la: f32, lb: f32) {
        a.velocity -= p * a.inv_mass;
        a.angular_velocity -= la * a.inv_inertia;
        b.velocity += p * b.inv_mass;
        b.angular_velocity += lb * b.inv_inertia;
    }
}
