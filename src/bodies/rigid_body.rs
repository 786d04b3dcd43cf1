use crate::bodies::{BodyFlags, Coefficients, ForceType, Lifespan, TimedPush};
use crate::collision::{CollisionIgnorer, GroupIgnorer, Ignorer};
use crate::core::{BodyHandle, StructureHandle};
use crate::error::PhysicsError;
use crate::math::{self, Vector2, Transform, Rotation, Aabb};
use crate::shapes::{CollisionShape, CollisionShapeParameters, Shape, ShapeKind, create_shape};
use crate::Result;

/// Type alias for a handle to a rigid body
pub type RigidBodyHandle = BodyHandle;

/// Mass given to new bodies
pub const DEFAULT_MASS: f32 = 1.0;

/// A rigid body for physics simulation.
///
/// Mass may be infinite, in which case the inverse mass is exactly zero and
/// no impulse can move the body. The same holds for the moment of inertia
/// and rotation.
#[derive(Debug, Clone)]
pub struct RigidBody {
    /// The body's transform in world space
    transform: Transform,

    /// The body's linear velocity
    linear_velocity: Vector2,

    /// The body's angular velocity (radians per second, counter-clockwise)
    angular_velocity: f32,

    /// Position-correction velocity from split impulses, cleared every step
    pub(crate) bias_velocity: Vector2,
    pub(crate) bias_angular_velocity: f32,

    /// The body's surface coefficients
    coefficients: Coefficients,

    /// The body's collision shape
    shape: CollisionShape,

    /// Size the shape was generated for, if it came from a [`ShapeKind`]
    generated_from: Option<(ShapeKind, Vector2)>,

    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,

    /// The moment of inertia was set explicitly and survives mass changes
    inertia_overridden: bool,

    can_rotate: bool,

    /// Velocity multiplier applied once per step (1 = no damping)
    linear_damping: f32,

    /// Angular velocity multiplier applied once per step (1 = no damping)
    angular_damping: f32,

    max_velocity: f32,
    max_angular_velocity: f32,

    /// The body's flags
    flags: BodyFlags,

    /// Collision filter policy
    ignorer: Option<CollisionIgnorer>,

    lifespan: Lifespan,

    /// Opaque value identifying the game object that owns the body
    tag: u64,

    /// The structure this body belongs to, if any
    parent: Option<StructureHandle>,

    /// World-space bounds, refreshed whenever the transform or shape changes
    bounds: Aabb,

    /// Forces to be applied in the next integration step
    forces: Vec<ForceType>,

    /// Forces applied over a period of time
    timed_pushes: Vec<TimedPush>,
}

impl RigidBody {
    /// Creates a new dynamic body with the given shape at the given position.
    ///
    /// The body starts with [`DEFAULT_MASS`] and the inertia of its shape.
    pub fn new(shape: CollisionShape, position: Vector2) -> Self {
        let transform = Transform::from_position(position);
        let bounds = shape.get_world_bounds(&transform);
        let mut body = Self {
            transform,
            linear_velocity: Vector2::zero(),
            angular_velocity: 0.0,
            bias_velocity: Vector2::zero(),
            bias_angular_velocity: 0.0,
            coefficients: Coefficients::default(),
            shape,
            generated_from: None,
            mass: DEFAULT_MASS,
            inv_mass: 1.0 / DEFAULT_MASS,
            inertia: 0.0,
            inv_inertia: 0.0,
            inertia_overridden: false,
            can_rotate: true,
            linear_damping: 1.0,
            angular_damping: 1.0,
            max_velocity: f32::INFINITY,
            max_angular_velocity: f32::INFINITY,
            flags: BodyFlags::GENERATE_COLLISION_EVENTS,
            ignorer: None,
            lifespan: Lifespan::immortal(),
            tag: 0,
            parent: None,
            bounds,
            forces: Vec::new(),
            timed_pushes: Vec::new(),
        };

        body.update_mass_properties();

        body
    }

    /// Creates a body of `width` x `height` with the outline of `kind`,
    /// using the default vertex density for that size.
    pub fn from_dimensions(width: f32, height: f32, kind: ShapeKind) -> Result<Self> {
        Self::from_dimensions_with(width, height, kind, CollisionShapeParameters::for_size(width, height))
    }

    /// Creates a body of `width` x `height` with explicit shape parameters
    pub fn from_dimensions_with(
        width: f32,
        height: f32,
        kind: ShapeKind,
        parameters: CollisionShapeParameters,
    ) -> Result<Self> {
        let shape = create_shape(&kind, width, height, parameters)?;
        let mut body = Self::new(shape, Vector2::zero());
        body.generated_from = Some((kind, Vector2::new(width, height)));
        Ok(body)
    }

    /// Creates a static body: infinite mass, no rotation, ignores gravity
    pub fn new_static(shape: CollisionShape, position: Vector2) -> Self {
        let mut body = Self::new(shape, position);
        body.make_static();
        body
    }

    /// Sets the owner tag and returns the body, for builder-style construction
    pub fn with_tag(mut self, tag: u64) -> Self {
        self.tag = tag;
        self
    }

    /// Sets the position and returns the body, for builder-style construction
    pub fn with_position(mut self, position: Vector2) -> Self {
        self.set_position(position);
        self
    }

    // --- Kinematic state -------------------------------------------------

    /// Returns the body's transform
    pub fn get_transform(&self) -> Transform {
        self.transform
    }

    /// Sets the body's transform
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.update_bounds();
    }

    /// Returns the body's position
    pub fn get_position(&self) -> Vector2 {
        self.transform.position
    }

    /// Sets the body's position
    pub fn set_position(&mut self, position: Vector2) {
        self.transform.position = position;
        self.update_bounds();
    }

    /// Returns the body's orientation in radians
    pub fn get_angle(&self) -> f32 {
        self.transform.rotation.angle()
    }

    /// Sets the body's orientation in radians
    pub fn set_angle(&mut self, angle: f32) {
        self.transform.rotation = Rotation::new(angle);
        self.update_bounds();
    }

    /// Returns the body's linear velocity
    pub fn get_linear_velocity(&self) -> Vector2 {
        self.linear_velocity
    }

    /// Sets the body's linear velocity
    pub fn set_linear_velocity(&mut self, velocity: Vector2) {
        self.linear_velocity = velocity;
    }

    /// Returns the body's angular velocity
    pub fn get_angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Sets the body's angular velocity
    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.angular_velocity = velocity;
    }

    /// Velocity of the material point at `point` (world space)
    pub fn get_velocity_at_point(&self, point: Vector2) -> Vector2 {
        let r = point - self.transform.position;
        self.linear_velocity + Vector2::cross_scalar(self.angular_velocity, &r)
    }

    // --- Shape -----------------------------------------------------------

    /// Returns the body's shape
    pub fn get_shape(&self) -> &CollisionShape {
        &self.shape
    }

    /// Replaces the body's shape, recomputing inertia and bounds
    pub fn set_shape(&mut self, shape: CollisionShape) {
        self.shape = shape;
        self.generated_from = None;
        self.update_mass_properties();
        self.update_bounds();
    }

    /// Returns the size and kind the shape was generated from, if any
    pub fn get_dimensions(&self) -> Option<(&ShapeKind, Vector2)> {
        self.generated_from.as_ref().map(|(kind, size)| (kind, *size))
    }

    /// Regenerates the shape for a new size.
    ///
    /// Only available for bodies created with [`RigidBody::from_dimensions`].
    pub fn set_size(&mut self, width: f32, height: f32) -> Result<()> {
        let kind = match &self.generated_from {
            Some((kind, _)) => kind.clone(),
            None => {
                return Err(PhysicsError::InvalidState(
                    "body shape was not created from dimensions; use set_shape".into(),
                ))
            }
        };
        let shape = create_shape(&kind, width, height, CollisionShapeParameters::for_size(width, height))?;
        self.set_shape(shape);
        self.generated_from = Some((kind, Vector2::new(width, height)));
        Ok(())
    }

    /// Returns the cached world-space bounds
    pub fn get_bounds(&self) -> Aabb {
        self.bounds
    }

    /// Recomputes the world-space bounds from the current transform
    pub fn update_bounds(&mut self) {
        self.bounds = self.shape.get_world_bounds(&self.transform);
    }

    /// Returns whether a world-space point lies inside the body's shape
    pub fn contains_point(&self, point: Vector2) -> bool {
        self.bounds.contains_point(point) && self.shape.contains_point(point, &self.transform)
    }

    // --- Mass ------------------------------------------------------------

    /// Returns the body's mass
    pub fn get_mass(&self) -> f32 {
        self.mass
    }

    /// Sets the body's mass (and inverse mass).
    ///
    /// `f32::INFINITY` makes the body immovable. The moment of inertia
    /// follows the mass unless it was set explicitly.
    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        if mass.is_nan() || mass <= 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "mass must be positive, got {}",
                mass
            )));
        }
        self.mass = mass;
        self.inv_mass = math::inverse_or_zero(mass);
        if !self.inertia_overridden {
            self.update_mass_properties();
        }
        Ok(())
    }

    /// Returns the body's inverse mass (zero for infinite mass)
    pub fn get_inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Returns the body's moment of inertia
    pub fn get_moment_of_inertia(&self) -> f32 {
        self.inertia
    }

    /// Sets the moment of inertia explicitly.
    ///
    /// The value is kept when the mass changes later.
    pub fn set_moment_of_inertia(&mut self, inertia: f32) -> Result<()> {
        if inertia.is_nan() || inertia < 0.0 {
            return Err(PhysicsError::InvalidParameter(format!(
                "moment of inertia must be non-negative, got {}",
                inertia
            )));
        }
        self.inertia_overridden = true;
        self.inertia = inertia;
        self.inv_inertia = if self.can_rotate { math::inverse_or_zero(inertia) } else { 0.0 };
        Ok(())
    }

    /// Returns the body's inverse moment of inertia (zero when it cannot rotate)
    pub fn get_inverse_inertia(&self) -> f32 {
        self.inv_inertia
    }

    /// Returns whether the body may rotate
    pub fn can_rotate(&self) -> bool {
        self.can_rotate
    }

    /// Allows or forbids rotation. A body that cannot rotate has infinite inertia.
    pub fn set_can_rotate(&mut self, can_rotate: bool) {
        self.can_rotate = can_rotate;
        if can_rotate {
            if self.inertia_overridden {
                self.inv_inertia = math::inverse_or_zero(self.inertia);
            } else {
                self.update_mass_properties();
            }
        } else {
            self.inertia = f32::INFINITY;
            self.inv_inertia = 0.0;
            self.angular_velocity = 0.0;
        }
    }

    /// Returns whether the body has infinite mass and inertia
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0 && self.inv_inertia == 0.0
    }

    /// Makes the body immovable: infinite mass, no rotation, no gravity
    pub fn make_static(&mut self) {
        self.mass = f32::INFINITY;
        self.inv_mass = 0.0;
        self.set_can_rotate(false);
        self.flags.insert(BodyFlags::IGNORES_GRAVITY);
        self.stop();
    }

    /// Recomputes the moment of inertia from the shape and the current mass
    pub fn update_mass_properties(&mut self) {
        if !self.can_rotate {
            self.inertia = f32::INFINITY;
            self.inv_inertia = 0.0;
            return;
        }
        if self.inertia_overridden {
            return;
        }
        self.inertia = self.shape.get_unit_inertia() * self.mass;
        self.inv_inertia = math::inverse_or_zero(self.inertia);
    }

    // --- Surface ---------------------------------------------------------

    /// Returns the body's coefficients
    pub fn get_coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Sets the body's coefficients
    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
    }

    /// Returns the restitution coefficient
    pub fn get_restitution(&self) -> f32 {
        self.coefficients.restitution
    }

    /// Sets the restitution coefficient. Values above 1 are kept as-is.
    pub fn set_restitution(&mut self, restitution: f32) {
        self.coefficients.restitution = restitution;
    }

    /// Returns the kinetic friction coefficient
    pub fn get_friction(&self) -> f32 {
        self.coefficients.kinetic_friction
    }

    /// Sets both the static and kinetic friction coefficients
    pub fn set_friction(&mut self, friction: f32) {
        self.coefficients.static_friction = friction;
        self.coefficients.kinetic_friction = friction;
    }

    /// Sets the static friction coefficient
    pub fn set_static_friction(&mut self, friction: f32) {
        self.coefficients.static_friction = friction;
    }

    /// Sets the kinetic friction coefficient
    pub fn set_kinetic_friction(&mut self, friction: f32) {
        self.coefficients.kinetic_friction = friction;
    }

    // --- Damping and limits ----------------------------------------------

    /// Returns the per-step linear velocity multiplier
    pub fn get_linear_damping(&self) -> f32 {
        self.linear_damping
    }

    /// Sets the per-step linear velocity multiplier (1 = no damping, 0 = full stop)
    pub fn set_linear_damping(&mut self, damping: f32) {
        self.linear_damping = damping.clamp(0.0, 1.0);
    }

    /// Returns the per-step angular velocity multiplier
    pub fn get_angular_damping(&self) -> f32 {
        self.angular_damping
    }

    /// Sets the per-step angular velocity multiplier (1 = no damping, 0 = full stop)
    pub fn set_angular_damping(&mut self, damping: f32) {
        self.angular_damping = damping.clamp(0.0, 1.0);
    }

    /// Returns the speed limit
    pub fn get_max_velocity(&self) -> f32 {
        self.max_velocity
    }

    /// Sets the speed limit enforced after every step
    pub fn set_max_velocity(&mut self, max_velocity: f32) {
        self.max_velocity = max_velocity.max(0.0);
    }

    /// Returns the angular speed limit
    pub fn get_max_angular_velocity(&self) -> f32 {
        self.max_angular_velocity
    }

    /// Sets the angular speed limit enforced after every step
    pub fn set_max_angular_velocity(&mut self, max_angular_velocity: f32) {
        self.max_angular_velocity = max_angular_velocity.max(0.0);
    }

    // --- Flags -----------------------------------------------------------

    /// Returns the body's flags
    pub fn get_flags(&self) -> BodyFlags {
        self.flags
    }

    /// Sets or clears a flag
    pub fn set_flag(&mut self, flag: BodyFlags, value: bool) {
        self.flags.set(flag, value);
    }

    /// Returns whether gravity fields skip the body
    pub fn ignores_gravity(&self) -> bool {
        self.flags.contains(BodyFlags::IGNORES_GRAVITY)
    }

    /// Sets whether gravity fields skip the body
    pub fn set_ignores_gravity(&mut self, ignores: bool) {
        self.flags.set(BodyFlags::IGNORES_GRAVITY, ignores);
    }

    /// Returns whether collisions with the body are reported but not resolved
    pub fn ignores_collision_response(&self) -> bool {
        self.flags.contains(BodyFlags::IGNORES_COLLISION_RESPONSE)
    }

    /// Sets whether collisions with the body are reported but not resolved
    pub fn set_ignores_collision_response(&mut self, ignores: bool) {
        self.flags.set(BodyFlags::IGNORES_COLLISION_RESPONSE, ignores);
    }

    /// Returns whether physics logics skip the body
    pub fn ignores_physics_logics(&self) -> bool {
        self.flags.contains(BodyFlags::IGNORES_PHYSICS_LOGICS)
    }

    /// Sets whether physics logics skip the body
    pub fn set_ignores_physics_logics(&mut self, ignores: bool) {
        self.flags.set(BodyFlags::IGNORES_PHYSICS_LOGICS, ignores);
    }

    /// Returns whether the body generates collision events
    pub fn generates_collision_events(&self) -> bool {
        self.flags.contains(BodyFlags::GENERATE_COLLISION_EVENTS)
    }

    /// Sets whether the body generates collision events
    pub fn set_generates_collision_events(&mut self, generates: bool) {
        self.flags.set(BodyFlags::GENERATE_COLLISION_EVENTS, generates);
    }

    // --- Filtering -------------------------------------------------------

    /// Returns the body's collision ignorer
    pub fn get_ignorer(&self) -> Option<&CollisionIgnorer> {
        self.ignorer.as_ref()
    }

    /// Returns the body's collision ignorer mutably
    pub fn get_ignorer_mut(&mut self) -> Option<&mut CollisionIgnorer> {
        self.ignorer.as_mut()
    }

    /// Sets or clears the body's collision ignorer
    pub fn set_ignorer(&mut self, ignorer: Option<CollisionIgnorer>) {
        self.ignorer = ignorer;
    }

    /// Returns the legacy collision ignore group (0 when none is set)
    pub fn get_collision_ignore_group(&self) -> i32 {
        self.ignorer
            .as_ref()
            .and_then(|i| i.get().as_any().downcast_ref::<GroupIgnorer>())
            .map_or(0, GroupIgnorer::get_legacy_group)
    }

    /// Sets the legacy collision ignore group.
    ///
    /// Bodies sharing the same non-zero group never collide. Installs a
    /// [`GroupIgnorer`] if the body has no group ignorer yet.
    pub fn set_collision_ignore_group(&mut self, group: i32) {
        if let Some(group_ignorer) = self
            .ignorer
            .as_mut()
            .and_then(|i| i.get_mut().as_any_mut().downcast_mut::<GroupIgnorer>())
        {
            group_ignorer.set_legacy_group(group);
            return;
        }
        let mut group_ignorer = GroupIgnorer::new();
        group_ignorer.set_legacy_group(group);
        self.ignorer = Some(CollisionIgnorer::new(group_ignorer));
    }

    /// Returns the body's group ignorer.
    ///
    /// A body without one (or with a different kind of ignorer) gets a fresh
    /// [`GroupIgnorer`] first.
    pub fn group_ignorer_mut(&mut self) -> Option<&mut GroupIgnorer> {
        let has_group = self
            .ignorer
            .as_ref()
            .map_or(false, |i| i.get().as_any().is::<GroupIgnorer>());
        if !has_group {
            self.ignorer = Some(CollisionIgnorer::new(GroupIgnorer::new()));
        }
        self.ignorer
            .as_mut()
            .and_then(|i| i.get_mut().as_any_mut().downcast_mut::<GroupIgnorer>())
    }

    // --- Ownership and lifetime ------------------------------------------

    /// Returns the owner tag
    pub fn get_tag(&self) -> u64 {
        self.tag
    }

    /// Sets the owner tag
    pub fn set_tag(&mut self, tag: u64) {
        self.tag = tag;
    }

    /// Returns the structure this body belongs to
    pub fn get_parent_structure(&self) -> Option<StructureHandle> {
        self.parent
    }

    /// Returns whether the body is a member of a structure
    pub fn is_structure_member(&self) -> bool {
        self.flags.contains(BodyFlags::STRUCTURE_MEMBER)
    }

    pub(crate) fn set_parent_structure(&mut self, parent: Option<StructureHandle>) {
        self.parent = parent;
        self.flags.set(BodyFlags::STRUCTURE_MEMBER, parent.is_some());
    }

    /// Returns the body's lifespan
    pub fn get_lifespan(&self) -> &Lifespan {
        &self.lifespan
    }

    /// Replaces the body's lifespan
    pub fn set_lifespan(&mut self, lifespan: Lifespan) {
        self.lifespan = lifespan;
    }

    /// Returns whether the body is marked for removal
    pub fn is_expired(&self) -> bool {
        self.lifespan.is_expired()
    }

    /// Marks the body for removal at the start of the next step
    pub fn expire(&mut self) {
        self.lifespan.expire();
    }

    pub(crate) fn update_time(&mut self, dt: f32) {
        self.lifespan.update(dt);
    }

    // --- Forces and impulses ---------------------------------------------

    /// Applies an impulse at the center of mass, changing velocity immediately
    pub fn hit(&mut self, impulse: Vector2) {
        self.linear_velocity += impulse * self.inv_mass;
    }

    /// Applies an impulse at a world-space point
    pub fn apply_impulse_at_point(&mut self, impulse: Vector2, point: Vector2) {
        self.linear_velocity += impulse * self.inv_mass;
        let r = point - self.transform.position;
        self.angular_velocity += r.cross(&impulse) * self.inv_inertia;
    }

    /// Applies an angular impulse, changing angular velocity immediately
    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        self.angular_velocity += impulse * self.inv_inertia;
    }

    /// Applies an impulse at offset `r` from the body origin
    #[inline]
    pub(crate) fn apply_impulse_at_offset(&mut self, impulse: Vector2, r: Vector2) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += r.cross(&impulse) * self.inv_inertia;
    }

    /// Applies a position-correction impulse at offset `r`; it moves the body
    /// this step but never becomes real velocity
    #[inline]
    pub(crate) fn apply_bias_impulse_at_offset(&mut self, impulse: Vector2, r: Vector2) {
        self.bias_velocity += impulse * self.inv_mass;
        self.bias_angular_velocity += r.cross(&impulse) * self.inv_inertia;
    }

    /// Velocity of the point at offset `r` from the body origin
    #[inline]
    pub(crate) fn velocity_at_offset(&self, r: Vector2) -> Vector2 {
        self.linear_velocity + Vector2::cross_scalar(self.angular_velocity, &r)
    }

    /// Position-correction velocity of the point at offset `r`
    #[inline]
    pub(crate) fn bias_velocity_at_offset(&self, r: Vector2) -> Vector2 {
        self.bias_velocity + Vector2::cross_scalar(self.bias_angular_velocity, &r)
    }

    /// Applies a force for the next step
    pub fn push(&mut self, force: Vector2) {
        self.forces.push(ForceType::Force(force));
    }

    /// Applies a force on every step for the next `duration` seconds
    pub fn push_for(&mut self, force: Vector2, duration: f32) {
        if duration > 0.0 {
            self.timed_pushes.push(TimedPush { force, remaining: duration });
        }
    }

    /// Applies a force at a world-space point for the next step
    pub fn apply_force_at_point(&mut self, force: Vector2, point: Vector2) {
        self.forces.push(ForceType::ForceAtPoint { force, point });
    }

    /// Accelerates the body for the next step, regardless of its mass
    pub fn accelerate(&mut self, acceleration: Vector2) {
        self.forces.push(ForceType::Acceleration(acceleration));
    }

    /// Applies a torque for the next step
    pub fn apply_torque(&mut self, torque: f32) {
        self.forces.push(ForceType::Torque(torque));
    }

    /// Returns the forces queued for the next step
    pub fn get_pending_forces(&self) -> &[ForceType] {
        &self.forces
    }

    pub(crate) fn queue_force(&mut self, force: ForceType) {
        self.forces.push(force);
    }

    /// Drains the queued forces plus one `dt` of every timed push, without
    /// integrating them
    pub(crate) fn take_pending_forces(&mut self, dt: f32) -> Vec<ForceType> {
        let mut taken: Vec<ForceType> = self.forces.drain(..).collect();
        self.timed_pushes.retain_mut(|push| {
            taken.push(ForceType::Force(push.force));
            push.remaining -= dt;
            push.remaining > 0.0
        });
        taken
    }

    /// Stops all linear and angular movement and drops queued forces
    pub fn stop(&mut self) {
        self.linear_velocity = Vector2::zero();
        self.angular_velocity = 0.0;
        self.forces.clear();
        self.timed_pushes.clear();
    }

    /// Stops movement along `axis`, keeping the perpendicular part
    pub fn stop_axial(&mut self, axis: Vector2) {
        if let Some(axis) = axis.try_normalize() {
            self.linear_velocity -= axis * self.linear_velocity.dot(&axis);
        }
    }

    /// Stops horizontal movement
    pub fn stop_horizontal(&mut self) {
        self.stop_axial(Vector2::unit_x());
    }

    /// Stops vertical movement
    pub fn stop_vertical(&mut self) {
        self.stop_axial(Vector2::unit_y());
    }

    /// Stops rotation
    pub fn stop_angular(&mut self) {
        self.angular_velocity = 0.0;
    }

    // --- Integration -----------------------------------------------------

    /// Integrates queued forces and `gravity` into velocity over `dt`, then
    /// applies damping
    pub fn integrate_forces(&mut self, gravity: Vector2, dt: f32) {
        let mut force = Vector2::zero();
        let mut acceleration = gravity;
        let mut torque = 0.0;

        for f in self.forces.drain(..) {
            match f {
                ForceType::Force(f) => force += f,
                ForceType::ForceAtPoint { force: f, point } => {
                    force += f;
                    torque += (point - self.transform.position).cross(&f);
                }
                ForceType::Torque(t) => torque += t,
                ForceType::Acceleration(a) => acceleration += a,
            }
        }

        self.timed_pushes.retain_mut(|push| {
            force += push.force;
            push.remaining -= dt;
            push.remaining > 0.0
        });

        if self.inv_mass > 0.0 {
            self.linear_velocity += (acceleration + force * self.inv_mass) * dt;
        }
        self.angular_velocity += torque * self.inv_inertia * dt;

        self.linear_velocity *= self.linear_damping;
        self.angular_velocity *= self.angular_damping;
    }

    /// Moves the body by its velocity (plus split-impulse correction) over `dt`
    pub fn integrate_velocity(&mut self, dt: f32) {
        let velocity = self.linear_velocity + self.bias_velocity;
        let angular = self.angular_velocity + self.bias_angular_velocity;
        self.bias_velocity = Vector2::zero();
        self.bias_angular_velocity = 0.0;

        if velocity.is_zero() && angular == 0.0 {
            return;
        }

        self.transform.position += velocity * dt;
        if angular != 0.0 {
            self.transform.rotation = Rotation::new(self.transform.rotation.angle() + angular * dt);
        }
        self.update_bounds();
    }

    /// Clamps the velocities to the configured limits
    pub fn apply_velocity_limits(&mut self) {
        self.linear_velocity = self.linear_velocity.clamp_length(self.max_velocity);
        self.angular_velocity = self
            .angular_velocity
            .clamp(-self.max_angular_velocity, self.max_angular_velocity);
    }
}
