use crate::bodies::{BodyFlags, Coefficients, ForceType, RigidBody};
use crate::core::{BodyHandle, BodyStorage, Storage, StructureHandle};
use crate::error::PhysicsError;
use crate::math::{Aabb, Transform, Vector2};
use crate::shapes::{CollisionShape, Compound};
use crate::Result;

/// A member body and its placement relative to the center body
#[derive(Debug, Clone, Copy)]
struct StructureMember {
    body: BodyHandle,
    local: Transform,
}

/// Several bodies moving as one rigid object.
///
/// A hidden center body carries the members' shapes as a compound and does
/// all of the simulating; members are copied into place from it after every
/// step. The aggregate mass is the sum of the member masses and the moment of
/// inertia is `Σ mᵢ·dᵢ²` over the members' distances from the center, unless
/// overridden.
///
/// Use [`PhysicsWorld::structure`](crate::core::PhysicsWorld::structure) and
/// [`PhysicsWorld::structure_mut`](crate::core::PhysicsWorld::structure_mut)
/// to read and change the aggregate's physical properties.
#[derive(Debug, Clone)]
pub struct PhysicsStructure {
    center: BodyHandle,
    members: Vec<StructureMember>,
    inertia_override: Option<f32>,
    computed_inertia: f32,
    is_destroying: bool,
    tag: u64,
}

impl PhysicsStructure {
    pub(crate) fn new(center: BodyHandle) -> Self {
        Self {
            center,
            members: Vec::new(),
            inertia_override: None,
            computed_inertia: 0.0,
            is_destroying: false,
            tag: 0,
        }
    }

    /// Builds the hidden center body for a new structure at `position`
    pub(crate) fn center_body(position: Vector2) -> RigidBody {
        let mut center = RigidBody::new(CollisionShape::Compound(Compound::new()), position);
        center.set_flag(BodyFlags::STRUCTURE_CENTER, true);
        center
    }

    /// Returns the hidden center body
    pub fn get_center_body(&self) -> BodyHandle {
        self.center
    }

    /// Returns the member bodies, in the order they were added
    pub fn objects(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.members.iter().map(|m| m.body)
    }

    /// Returns the number of member bodies
    pub fn object_count(&self) -> usize {
        self.members.len()
    }

    /// Returns whether `body` is a member
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.members.iter().any(|m| m.body == body)
    }

    /// Returns whether the structure is being destroyed; it disappears at
    /// the start of the next step
    pub fn is_destroying(&self) -> bool {
        self.is_destroying
    }

    /// Returns the owner tag
    pub fn get_tag(&self) -> u64 {
        self.tag
    }

    /// Sets the owner tag
    pub fn set_tag(&mut self, tag: u64) {
        self.tag = tag;
    }

    /// Returns the moment of inertia: the override if set, else `Σ mᵢ·dᵢ²`
    pub fn get_moment_of_inertia(&self) -> f32 {
        self.inertia_override.unwrap_or(self.computed_inertia)
    }

    pub(crate) fn mark_destroying(&mut self) {
        self.is_destroying = true;
    }

    pub(crate) fn add_member(&mut self, handle: StructureHandle, body: BodyHandle, bodies: &mut BodyStorage<RigidBody>) -> Result<()> {
        if body == self.center {
            return Err(PhysicsError::InvalidState("a structure cannot contain itself".into()));
        }
        let center = bodies.get_body(self.center)?.get_transform();
        let member = bodies.get_body_mut(body)?;
        if member.get_flags().contains(BodyFlags::STRUCTURE_CENTER) {
            return Err(PhysicsError::InvalidState("structures cannot be nested".into()));
        }
        if member.get_parent_structure().is_some() {
            return Err(PhysicsError::InvalidState(format!("body {:?} already belongs to a structure", body)));
        }

        let placement = member.get_transform();
        let local = Transform::from_position_angle(
            center.inverse_transform_point(placement.position),
            placement.rotation.angle() - center.rotation.angle(),
        );
        member.set_parent_structure(Some(handle));
        let coefficients = *member.get_coefficients();

        self.members.push(StructureMember { body, local });
        if self.members.len() == 1 {
            if let Some(center) = bodies.get_mut(self.center) {
                center.set_coefficients(coefficients);
            }
        }
        self.rebuild(bodies);
        Ok(())
    }

    /// Detaches a member; it stays in the world as an independent body.
    /// Returns false if `body` was not a member.
    pub(crate) fn remove_member(&mut self, body: BodyHandle, bodies: &mut BodyStorage<RigidBody>) -> bool {
        let Some(index) = self.members.iter().position(|m| m.body == body) else {
            return false;
        };
        self.members.remove(index);
        if let Some(member) = bodies.get_mut(body) {
            member.set_parent_structure(None);
        }
        self.rebuild(bodies);
        true
    }

    /// Regenerates the center body's compound shape, mass and inertia from
    /// the current members
    pub(crate) fn rebuild(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let mut compound = Compound::new();
        let mut mass = 0.0;
        let mut inertia = 0.0;

        self.members.retain(|m| bodies.contains(m.body));
        for member in &self.members {
            if let Some(body) = bodies.get(member.body) {
                compound.add_shape(body.get_shape().clone(), member.local);
                mass += body.get_mass();
                let distance_sq = member.local.position.length_squared();
                if distance_sq > 0.0 {
                    inertia += body.get_mass() * distance_sq;
                }
            }
        }
        self.computed_inertia = inertia;

        let inertia = self.get_moment_of_inertia();
        if let Some(center) = bodies.get_mut(self.center) {
            center.set_shape(CollisionShape::Compound(compound));
            if mass > 0.0 {
                if let Err(err) = center.set_mass(mass) {
                    log::warn!("structure mass rejected: {}", err);
                }
            }
            // Infinite inertia from a static member pins the structure's rotation
            if let Err(err) = center.set_moment_of_inertia(inertia) {
                log::warn!("structure inertia rejected: {}", err);
            }
        }
    }

    /// Moves forces queued on members over to the center body, acting at
    /// each member's position. Members are never integrated themselves.
    pub(crate) fn forward_member_forces(&self, bodies: &mut BodyStorage<RigidBody>, dt: f32) {
        let mut forwarded = Vec::new();
        for member in &self.members {
            let Some(body) = bodies.get_mut(member.body) else {
                continue;
            };
            let (point, mass) = (body.get_position(), body.get_mass());
            for force in body.take_pending_forces(dt) {
                match force {
                    ForceType::Force(force) => forwarded.push(ForceType::ForceAtPoint { force, point }),
                    // A static member has no finite force behind its acceleration
                    ForceType::Acceleration(acceleration) if mass.is_finite() => {
                        forwarded.push(ForceType::ForceAtPoint { force: acceleration * mass, point })
                    }
                    ForceType::Acceleration(_) => {}
                    other => forwarded.push(other),
                }
            }
        }

        if forwarded.is_empty() {
            return;
        }
        if let Some(center) = bodies.get_mut(self.center) {
            for force in forwarded {
                center.queue_force(force);
            }
        }
    }

    /// Moves every member to its place on the center body and gives it the
    /// velocity of that point
    pub(crate) fn sync_members(&self, bodies: &mut BodyStorage<RigidBody>) {
        let Some(center) = bodies.get(self.center) else {
            return;
        };
        let transform = center.get_transform();
        let (velocity, angular_velocity) = (center.get_linear_velocity(), center.get_angular_velocity());

        for member in &self.members {
            if let Some(body) = bodies.get_mut(member.body) {
                let placed = transform.combine(&member.local);
                let r = placed.position - transform.position;
                body.set_transform(placed);
                body.set_linear_velocity(velocity + Vector2::cross_scalar(angular_velocity, &r));
                body.set_angular_velocity(angular_velocity);
            }
        }
    }
}

/// Read access to a structure's aggregate properties
#[derive(Debug, Clone, Copy)]
pub struct StructureRef<'w> {
    structure: &'w PhysicsStructure,
    bodies: &'w BodyStorage<RigidBody>,
}

impl<'w> StructureRef<'w> {
    pub(crate) fn new(structure: &'w PhysicsStructure, bodies: &'w BodyStorage<RigidBody>) -> Self {
        Self { structure, bodies }
    }

    /// Returns the structure itself
    pub fn get(&self) -> &'w PhysicsStructure {
        self.structure
    }

    fn center(&self) -> Option<&'w RigidBody> {
        self.bodies.get(self.structure.center)
    }

    /// Returns the aggregate position
    pub fn get_position(&self) -> Vector2 {
        self.center().map_or(Vector2::zero(), RigidBody::get_position)
    }

    /// Returns the aggregate orientation in radians
    pub fn get_angle(&self) -> f32 {
        self.center().map_or(0.0, RigidBody::get_angle)
    }

    /// Returns the aggregate velocity
    pub fn get_velocity(&self) -> Vector2 {
        self.center().map_or(Vector2::zero(), RigidBody::get_linear_velocity)
    }

    /// Returns the aggregate angular velocity
    pub fn get_angular_velocity(&self) -> f32 {
        self.center().map_or(0.0, RigidBody::get_angular_velocity)
    }

    /// Returns the sum of the member masses
    pub fn get_mass(&self) -> f32 {
        self.structure
            .objects()
            .filter_map(|h| self.bodies.get(h))
            .map(RigidBody::get_mass)
            .sum()
    }

    /// Returns the moment of inertia
    pub fn get_moment_of_inertia(&self) -> f32 {
        self.structure.get_moment_of_inertia()
    }

    /// Returns the coefficients of the center body
    pub fn get_coefficients(&self) -> Coefficients {
        self.center().map(|c| *c.get_coefficients()).unwrap_or_default()
    }

    /// Returns whether the aggregate may rotate
    pub fn can_rotate(&self) -> bool {
        self.center().map_or(false, RigidBody::can_rotate)
    }

    /// Returns whether `point` lies inside any member
    pub fn is_inside(&self, point: Vector2) -> bool {
        self.structure
            .objects()
            .filter_map(|h| self.bodies.get(h))
            .any(|body| body.contains_point(point))
    }

    /// Bounds of all members, scanned fresh on every call.
    ///
    /// Returns None for a structure without members.
    pub fn bounding_rectangle(&self) -> Option<Aabb> {
        self.structure
            .objects()
            .filter_map(|h| self.bodies.get(h))
            .map(RigidBody::get_bounds)
            .reduce(|a, b| a.union(&b))
    }
}

/// Write access to a structure. Setters write through to every member and
/// the center body.
#[derive(Debug)]
pub struct StructureMut<'w> {
    structure: &'w mut PhysicsStructure,
    bodies: &'w mut BodyStorage<RigidBody>,
}

impl<'w> StructureMut<'w> {
    pub(crate) fn new(structure: &'w mut PhysicsStructure, bodies: &'w mut BodyStorage<RigidBody>) -> Self {
        Self { structure, bodies }
    }

    /// Returns read access to the same structure
    pub fn view(&self) -> StructureRef<'_> {
        StructureRef::new(&*self.structure, &*self.bodies)
    }

    fn for_all(&mut self, mut f: impl FnMut(&mut RigidBody)) {
        if let Some(center) = self.bodies.get_mut(self.structure.center) {
            f(center);
        }
        for member in self.structure.objects().collect::<Vec<_>>() {
            if let Some(body) = self.bodies.get_mut(member) {
                f(body);
            }
        }
    }

    fn with_center(&mut self, f: impl FnOnce(&mut RigidBody)) {
        if let Some(center) = self.bodies.get_mut(self.structure.center) {
            f(center);
        }
        self.structure.sync_members(self.bodies);
    }

    /// Sets the owner tag
    pub fn set_tag(&mut self, tag: u64) {
        self.structure.set_tag(tag);
    }

    /// Moves the aggregate
    pub fn set_position(&mut self, position: Vector2) {
        self.with_center(|c| c.set_position(position));
    }

    /// Rotates the aggregate
    pub fn set_angle(&mut self, angle: f32) {
        self.with_center(|c| c.set_angle(angle));
    }

    /// Sets the aggregate velocity
    pub fn set_velocity(&mut self, velocity: Vector2) {
        self.with_center(|c| c.set_linear_velocity(velocity));
    }

    /// Sets the aggregate angular velocity
    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.with_center(|c| c.set_angular_velocity(velocity));
    }

    /// Sets the restitution of every part
    pub fn set_restitution(&mut self, restitution: f32) {
        self.for_all(|b| b.set_restitution(restitution));
    }

    /// Sets both friction coefficients of every part
    pub fn set_friction(&mut self, friction: f32) {
        self.for_all(|b| b.set_friction(friction));
    }

    /// Sets the static friction of every part
    pub fn set_static_friction(&mut self, friction: f32) {
        self.for_all(|b| b.set_static_friction(friction));
    }

    /// Sets the kinetic friction of every part
    pub fn set_kinetic_friction(&mut self, friction: f32) {
        self.for_all(|b| b.set_kinetic_friction(friction));
    }

    /// Sets the per-step linear velocity multiplier of every part
    pub fn set_linear_damping(&mut self, damping: f32) {
        self.for_all(|b| b.set_linear_damping(damping));
    }

    /// Sets the per-step angular velocity multiplier of every part
    pub fn set_angular_damping(&mut self, damping: f32) {
        self.for_all(|b| b.set_angular_damping(damping));
    }

    /// Sets whether gravity skips the aggregate
    pub fn set_ignores_gravity(&mut self, ignores: bool) {
        self.for_all(|b| b.set_ignores_gravity(ignores));
    }

    /// Sets whether collisions of the aggregate are reported but not resolved
    pub fn set_ignores_collision_response(&mut self, ignores: bool) {
        self.for_all(|b| b.set_ignores_collision_response(ignores));
    }

    /// Sets whether physics logics skip the aggregate
    pub fn set_ignores_physics_logics(&mut self, ignores: bool) {
        self.for_all(|b| b.set_ignores_physics_logics(ignores));
    }

    /// Sets the legacy collision ignore group of every part
    pub fn set_collision_ignore_group(&mut self, group: i32) {
        self.for_all(|b| b.set_collision_ignore_group(group));
    }

    /// Allows or forbids rotation of the aggregate
    pub fn set_can_rotate(&mut self, can_rotate: bool) {
        self.with_center(|c| c.set_can_rotate(can_rotate));
        // Locking left the center with infinite inertia
        if can_rotate {
            self.structure.rebuild(self.bodies);
        }
    }

    /// Overrides the computed moment of inertia; None restores `Σ mᵢ·dᵢ²`
    pub fn set_moment_of_inertia(&mut self, inertia: Option<f32>) -> Result<()> {
        if let Some(value) = inertia {
            if value.is_nan() || value < 0.0 {
                return Err(PhysicsError::InvalidParameter(format!(
                    "moment of inertia must be non-negative, got {}",
                    value
                )));
            }
        }
        self.structure.inertia_override = inertia;
        self.structure.rebuild(self.bodies);
        Ok(())
    }

    /// Applies an impulse to the aggregate
    pub fn hit(&mut self, impulse: Vector2) {
        self.with_center(|c| c.hit(impulse));
    }

    /// Pushes the aggregate for the next step
    pub fn push(&mut self, force: Vector2) {
        self.with_center(|c| c.push(force));
    }

    /// Pushes the aggregate on every step for `duration` seconds
    pub fn push_for(&mut self, force: Vector2, duration: f32) {
        self.with_center(|c| c.push_for(force, duration));
    }

    /// Applies a torque to the aggregate for the next step
    pub fn apply_torque(&mut self, torque: f32) {
        self.with_center(|c| c.apply_torque(torque));
    }

    /// Stops all movement
    pub fn stop(&mut self) {
        self.with_center(RigidBody::stop);
    }

    /// Stops horizontal movement
    pub fn stop_horizontal(&mut self) {
        self.with_center(RigidBody::stop_horizontal);
    }

    /// Stops vertical movement
    pub fn stop_vertical(&mut self) {
        self.with_center(RigidBody::stop_vertical);
    }

    /// Stops movement along `axis`
    pub fn stop_axial(&mut self, axis: Vector2) {
        self.with_center(|c| c.stop_axial(axis));
    }

    /// Stops rotation
    pub fn stop_angular(&mut self) {
        self.with_center(RigidBody::stop_angular);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Circle;
    use approx::assert_relative_eq;

    fn setup(offsets: &[Vector2]) -> (PhysicsStructure, BodyStorage<RigidBody>, Vec<BodyHandle>) {
        let mut bodies: BodyStorage<RigidBody> = Storage::new();
        let center = bodies.add(PhysicsStructure::center_body(Vector2::new(10.0, 0.0)));
        let mut structure = PhysicsStructure::new(center);

        let members: Vec<BodyHandle> = offsets
            .iter()
            .map(|&offset| {
                let mut body = RigidBody::new(Circle::new(0.5).unwrap().into(), Vector2::new(10.0, 0.0) + offset);
                body.set_mass(2.0).unwrap();
                bodies.add(body)
            })
            .collect();
        for &member in &members {
            structure.add_member(StructureHandle::dangling(), member, &mut bodies).unwrap();
        }
        (structure, bodies, members)
    }

    #[test]
    fn aggregate_mass_and_inertia() {
        let (structure, bodies, _) = setup(&[Vector2::new(1.0, 0.0), Vector2::new(-2.0, 0.0), Vector2::new(0.0, 3.0)]);
        let view = StructureRef::new(&structure, &bodies);

        assert_relative_eq!(view.get_mass(), 6.0);
        assert_relative_eq!(view.get_moment_of_inertia(), 2.0 * (1.0 + 4.0 + 9.0), epsilon = 1e-4);
        let center = bodies.get(structure.get_center_body()).unwrap();
        assert_relative_eq!(center.get_mass(), 6.0);
        assert_relative_eq!(center.get_moment_of_inertia(), 28.0, epsilon = 1e-4);
    }

    #[test]
    fn members_follow_the_center() {
        let (structure, mut bodies, members) = setup(&[Vector2::new(1.0, 0.0)]);
        {
            let center = bodies.get_mut(structure.get_center_body()).unwrap();
            center.set_position(Vector2::new(0.0, 0.0));
            center.set_angle(std::f32::consts::FRAC_PI_2);
            center.set_angular_velocity(1.0);
        }
        structure.sync_members(&mut bodies);

        let member = bodies.get(members[0]).unwrap();
        assert_relative_eq!(member.get_position(), Vector2::new(0.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(member.get_linear_velocity(), Vector2::new(-1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn removing_a_member_recomputes_inertia() {
        let (mut structure, mut bodies, members) = setup(&[Vector2::new(1.0, 0.0), Vector2::new(-2.0, 0.0)]);
        assert!(structure.remove_member(members[1], &mut bodies));
        assert!(!structure.remove_member(members[1], &mut bodies));

        assert_eq!(structure.object_count(), 1);
        assert_relative_eq!(structure.get_moment_of_inertia(), 2.0, epsilon = 1e-5);
        assert!(!bodies.get(members[1]).unwrap().is_structure_member());
    }

    #[test]
    fn member_forces_move_to_the_center() {
        let (structure, mut bodies, members) = setup(&[Vector2::new(0.0, 1.0)]);
        {
            let member = bodies.get_mut(members[0]).unwrap();
            member.push(Vector2::new(4.0, 0.0));
            member.apply_torque(2.0);
            member.push_for(Vector2::new(1.0, 0.0), 0.15);
        }

        structure.forward_member_forces(&mut bodies, 0.1);
        assert!(bodies.get(members[0]).unwrap().get_pending_forces().is_empty());
        let pending = bodies.get(structure.get_center_body()).unwrap().get_pending_forces().to_vec();
        assert_eq!(
            pending,
            vec![
                ForceType::ForceAtPoint { force: Vector2::new(4.0, 0.0), point: Vector2::new(10.0, 1.0) },
                ForceType::Torque(2.0),
                ForceType::ForceAtPoint { force: Vector2::new(1.0, 0.0), point: Vector2::new(10.0, 1.0) },
            ]
        );

        // The timed push runs out after its duration
        structure.forward_member_forces(&mut bodies, 0.1);
        structure.forward_member_forces(&mut bodies, 0.1);
        assert_eq!(bodies.get(structure.get_center_body()).unwrap().get_pending_forces().len(), 4);
    }

    #[test]
    fn unlocking_rotation_restores_inertia() {
        let (mut structure, mut bodies, _) = setup(&[Vector2::new(1.0, 0.0), Vector2::new(-1.0, 0.0)]);
        let center = structure.get_center_body();

        let mut aggregate = StructureMut::new(&mut structure, &mut bodies);
        aggregate.set_can_rotate(false);
        assert_eq!(aggregate.view().get_moment_of_inertia(), 4.0);
        assert_eq!(bodies.get(center).unwrap().get_inverse_inertia(), 0.0);

        let mut aggregate = StructureMut::new(&mut structure, &mut bodies);
        aggregate.set_can_rotate(true);
        let center = bodies.get(center).unwrap();
        assert_relative_eq!(center.get_moment_of_inertia(), 4.0, epsilon = 1e-5);
        assert_relative_eq!(center.get_inverse_inertia(), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn rejects_double_membership() {
        let (mut structure, mut bodies, members) = setup(&[Vector2::new(1.0, 0.0)]);
        let result = structure.add_member(StructureHandle::dangling(), members[0], &mut bodies);
        assert!(matches!(result, Err(PhysicsError::InvalidState(_))));
    }

    #[test]
    fn bounding_rectangle_spans_members() {
        let (structure, bodies, _) = setup(&[Vector2::new(1.0, 0.0), Vector2::new(-2.0, 1.0)]);
        let bounds = StructureRef::new(&structure, &bodies).bounding_rectangle().unwrap();

        assert_relative_eq!(bounds.min, Vector2::new(7.5, -0.5), epsilon = 1e-5);
        assert_relative_eq!(bounds.max, Vector2::new(11.5, 1.5), epsilon = 1e-5);
    }
}
