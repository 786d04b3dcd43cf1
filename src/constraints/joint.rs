use crate::bodies::{Lifespan, RigidBody};
use crate::constraints::{AxleJoint, WeldJoint, WheelJoint};
use crate::core::{BodyHandle, BodyStorage, Storage};
use crate::math::{Rotation, Vector2};

/// Fraction of the positional error joints correct per step
pub const JOINT_BIAS_FACTOR: f32 = 0.2;

/// Velocity state of one side of a joint while it is being solved.
///
/// The world side of a single-body joint is [`SolverBody::world`]: zero
/// inverse mass at the origin, so it never moves.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SolverBody {
    pub position: Vector2,
    pub angle: f32,
    pub rotation: Rotation,
    pub velocity: Vector2,
    pub angular_velocity: f32,
    pub inv_mass: f32,
    pub inv_inertia: f32,
}

impl SolverBody {
    pub fn world() -> Self {
        Self {
            position: Vector2::zero(),
            angle: 0.0,
            rotation: Rotation::identity(),
            velocity: Vector2::zero(),
            angular_velocity: 0.0,
            inv_mass: 0.0,
            inv_inertia: 0.0,
        }
    }

    pub fn read(body: &RigidBody) -> Self {
        let transform = body.get_transform();
        Self {
            position: transform.position,
            angle: transform.rotation.angle(),
            rotation: transform.rotation,
            velocity: body.get_linear_velocity(),
            angular_velocity: body.get_angular_velocity(),
            inv_mass: body.get_inverse_mass(),
            inv_inertia: body.get_inverse_inertia(),
        }
    }

    pub fn write(&self, body: &mut RigidBody) {
        body.set_linear_velocity(self.velocity);
        body.set_angular_velocity(self.angular_velocity);
    }

    /// Offset of a local anchor from the body origin, in world axes
    #[inline]
    pub fn offset(&self, local_anchor: Vector2) -> Vector2 {
        self.rotation.rotate_vector(local_anchor)
    }

    #[inline]
    pub fn velocity_at(&self, r: Vector2) -> Vector2 {
        self.velocity + Vector2::cross_scalar(self.angular_velocity, &r)
    }

    #[inline]
    pub fn apply_impulse(&mut self, impulse: Vector2, r: Vector2) {
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += r.cross(&impulse) * self.inv_inertia;
    }

    #[inline]
    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        self.angular_velocity += impulse * self.inv_inertia;
    }
}

/// The constraint a joint enforces
#[derive(Debug, Clone)]
pub enum JointKind {
    /// Shared pivot point, free rotation
    Axle(AxleJoint),

    /// Shared point and fixed relative angle
    Weld(WeldJoint),

    /// Sprung translation along one axis, free rotation with an optional motor
    Wheel(WheelJoint),
}

/// A joint binding one body to the world, or two bodies to each other.
///
/// Joints are owned by the world; the bodies they bind are referenced by
/// handle only. Like bodies, a joint is removed at the start of the step
/// after it expires.
#[derive(Debug, Clone)]
pub struct Joint {
    kind: JointKind,
    lifespan: Lifespan,
}

impl Joint {
    /// Creates an immortal joint
    pub fn new(kind: JointKind) -> Self {
        Self {
            kind,
            lifespan: Lifespan::immortal(),
        }
    }

    /// Returns the joint's constraint
    pub fn get_kind(&self) -> &JointKind {
        &self.kind
    }

    /// Returns the joint's constraint mutably, to tune its parameters
    pub fn get_kind_mut(&mut self) -> &mut JointKind {
        &mut self.kind
    }

    /// Returns the name of the joint type
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            JointKind::Axle(_) => "Axle",
            JointKind::Weld(_) => "Weld",
            JointKind::Wheel(_) => "Wheel",
        }
    }

    /// Returns the first body
    pub fn get_body_a(&self) -> BodyHandle {
        match &self.kind {
            JointKind::Axle(j) => j.get_body_a(),
            JointKind::Weld(j) => j.get_body_a(),
            JointKind::Wheel(j) => j.get_body_a(),
        }
    }

    /// Returns the second body, or None when the joint is anchored to the world
    pub fn get_body_b(&self) -> Option<BodyHandle> {
        match &self.kind {
            JointKind::Axle(j) => j.get_body_b(),
            JointKind::Weld(j) => Some(j.get_body_b()),
            JointKind::Wheel(j) => Some(j.get_body_b()),
        }
    }

    /// Checks if the joint binds a specific body
    pub fn involves_body(&self, body: BodyHandle) -> bool {
        self.get_body_a() == body || self.get_body_b() == Some(body)
    }

    /// Current world position of the joint's pivot
    pub fn get_axle_point(&self, bodies: &BodyStorage<RigidBody>) -> Option<Vector2> {
        let (a, b) = load(bodies, self.get_body_a(), self.get_body_b())?;
        Some(match &self.kind {
            JointKind::Axle(j) => j.axle_point(&a),
            JointKind::Weld(j) => j.axle_point(&a, &b),
            JointKind::Wheel(j) => j.axle_point(&a, &b),
        })
    }

    /// Returns the joint's lifespan
    pub fn get_lifespan(&self) -> &Lifespan {
        &self.lifespan
    }

    /// Replaces the joint's lifespan
    pub fn set_lifespan(&mut self, lifespan: Lifespan) {
        self.lifespan = lifespan;
    }

    /// Returns whether the joint is marked for removal
    pub fn is_expired(&self) -> bool {
        self.lifespan.is_expired()
    }

    /// Marks the joint for removal at the start of the next step
    pub fn expire(&mut self) {
        self.lifespan.expire();
    }

    pub(crate) fn update_time(&mut self, dt: f32) {
        self.lifespan.update(dt);
    }

    /// Captures local anchors and reference angles from the bodies' current
    /// placement. Returns false if a body is missing.
    pub(crate) fn bind(&mut self, bodies: &BodyStorage<RigidBody>) -> bool {
        let Some((a, b)) = load(bodies, self.get_body_a(), self.get_body_b()) else {
            return false;
        };
        match &mut self.kind {
            JointKind::Axle(j) => j.bind(&a, &b),
            JointKind::Weld(j) => j.bind(&a, &b),
            JointKind::Wheel(j) => j.bind(&a, &b),
        }
        true
    }

    /// Computes effective masses and applies the warm-start impulse.
    ///
    /// A joint whose body has left the world does nothing.
    pub(crate) fn prepare(&mut self, bodies: &mut BodyStorage<RigidBody>, dt: f32, warm_starting: bool) {
        let (body_a, body_b) = (self.get_body_a(), self.get_body_b());
        let Some((mut a, mut b)) = load(bodies, body_a, body_b) else {
            return;
        };
        let inv_dt = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        match &mut self.kind {
            JointKind::Axle(j) => j.prepare(&mut a, &mut b, inv_dt, warm_starting),
            JointKind::Weld(j) => j.prepare(&mut a, &mut b, inv_dt, warm_starting),
            JointKind::Wheel(j) => j.prepare(&mut a, &mut b, dt, warm_starting),
        }
        store(bodies, body_a, body_b, &a, &b);
    }

    /// Runs one velocity iteration
    pub(crate) fn solve_velocity(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let (body_a, body_b) = (self.get_body_a(), self.get_body_b());
        let Some((mut a, mut b)) = load(bodies, body_a, body_b) else {
            return;
        };
        match &mut self.kind {
            JointKind::Axle(j) => j.solve_velocity(&mut a, &mut b),
            JointKind::Weld(j) => j.solve_velocity(&mut a, &mut b),
            JointKind::Wheel(j) => j.solve_velocity(&mut a, &mut b),
        }
        store(bodies, body_a, body_b, &a, &b);
    }
}

impl From<AxleJoint> for Joint {
    fn from(joint: AxleJoint) -> Self {
        Self::new(JointKind::Axle(joint))
    }
}

impl From<WeldJoint> for Joint {
    fn from(joint: WeldJoint) -> Self {
        Self::new(JointKind::Weld(joint))
    }
}

impl From<WheelJoint> for Joint {
    fn from(joint: WheelJoint) -> Self {
        Self::new(JointKind::Wheel(joint))
    }
}

fn load(bodies: &BodyStorage<RigidBody>, a: BodyHandle, b: Option<BodyHandle>) -> Option<(SolverBody, SolverBody)> {
    let state_a = SolverBody::read(bodies.get(a)?);
    let state_b = match b {
        Some(b) => SolverBody::read(bodies.get(b)?),
        None => SolverBody::world(),
    };
    Some((state_a, state_b))
}

fn store(bodies: &mut BodyStorage<RigidBody>, a: BodyHandle, b: Option<BodyHandle>, state_a: &SolverBody, state_b: &SolverBody) {
    if let Some(body) = bodies.get_mut(a) {
        state_a.write(body);
    }
    if let Some(body) = b.and_then(|b| bodies.get_mut(b)) {
        state_b.write(body);
    }
}
