use crate::bodies::{BodyFlags, RigidBody};
use crate::collision::{CollisionDetector, ContactManifold, ContactSolver, SequentialImpulseSolver};
use crate::constraints::Joint;
use crate::core::events::{BodyEventType, CollisionEventType};
use crate::core::structure::{StructureMut, StructureRef};
use crate::core::{
    BodyEvent, BodyHandle, BodyStorage, CollisionEvent, EventQueue, GravityType, JointHandle, JointStorage,
    LogicHandle, PhysicsStructure, SimulationConfig, Storage, StructureHandle, StructureStorage,
};
use crate::error::PhysicsError;
use crate::forces::{LogicRegistry, PhysicsLogic};
use crate::integration::{Integrator, SymplecticEulerIntegrator};
use crate::math::{Aabb, Vector2};
use crate::Result;
use std::collections::HashMap;
use std::hash::Hash;

/// A callback run after each step for every collision event it sees.
///
/// Listeners get the world itself, so they may add, change or remove
/// bodies; removals take effect at the start of the next step.
pub type CollisionListener = Box<dyn FnMut(&mut PhysicsWorld, &CollisionEvent)>;

/// The main physics world that owns all physics objects and runs the
/// simulation
pub struct PhysicsWorld {
    /// All rigid bodies in the world, structure center bodies included
    bodies: BodyStorage<RigidBody>,

    /// Bodies added since the last step; queries skip them until it starts
    pending_bodies: Vec<BodyHandle>,

    /// All joints in the world
    joints: JointStorage<Joint>,

    /// All structures in the world
    structures: StructureStorage<PhysicsStructure>,

    /// Physics logics run before collision detection
    logics: LogicRegistry,

    /// Broad and narrow phase, with contact state carried between steps
    detector: CollisionDetector,

    /// Contact impulse solver
    solver: SequentialImpulseSolver,

    /// Moves bodies from forces and velocities
    integrator: Box<dyn Integrator>,

    /// Configuration for the simulation
    config: SimulationConfig,

    /// Events of the last call to `step`
    events: EventQueue,

    /// Listeners for every collision event
    listeners: Vec<CollisionListener>,

    /// Listeners for the collisions of one body, which is always `body_a`
    /// in the events they receive
    body_listeners: HashMap<BodyHandle, Vec<CollisionListener>>,

    /// Listeners for the collisions of one structure; `body_a` is the
    /// structure's center body
    structure_listeners: HashMap<StructureHandle, Vec<CollisionListener>>,

    /// The total elapsed simulation time
    time: f32,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.bodies.len())
            .field("joints", &self.joints.len())
            .field("structures", &self.structures.len())
            .field("logics", &self.logics.len())
            .field("detector", &self.detector)
            .field("integrator", &self.integrator.name())
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .field("time", &self.time)
            .finish()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Creates a new physics world with default settings
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new physics world with the given configuration
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            bodies: BodyStorage::new(),
            pending_bodies: Vec::new(),
            joints: JointStorage::new(),
            structures: StructureStorage::new(),
            logics: LogicRegistry::new(),
            detector: CollisionDetector::new(config.broad_phase),
            solver: SequentialImpulseSolver::new(),
            integrator: Box::new(SymplecticEulerIntegrator::new()),
            config,
            events: EventQueue::new(),
            listeners: Vec::new(),
            body_listeners: HashMap::new(),
            structure_listeners: HashMap::new(),
            time: 0.0,
        }
    }

    /// Returns the current simulation time
    pub fn get_time(&self) -> f32 {
        self.time
    }

    /// Sets the gravity for the simulation
    pub fn set_gravity(&mut self, gravity: GravityType) {
        self.config.gravity = gravity;
    }

    /// Gets the current gravity
    pub fn get_gravity(&self) -> GravityType {
        self.config.gravity
    }

    /// Returns a reference to the simulation configuration
    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns a mutable reference to the simulation configuration
    pub fn get_config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    /// Replaces the integrator
    pub fn set_integrator(&mut self, integrator: Box<dyn Integrator>) {
        self.integrator = integrator;
    }

    /// Adds a rigid body to the world and returns its handle.
    ///
    /// The body can be read and changed through its handle right away, but
    /// it joins the simulation and the spatial queries at the start of the
    /// next step.
    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = self.bodies.add(body);
        self.pending_bodies.push(handle);
        log::debug!("added body {:?}", handle);

        self.events.add_body_event(BodyEvent {
            event_type: BodyEventType::Added,
            body: Some(handle),
        });

        handle
    }

    /// Removes a rigid body from the world.
    ///
    /// The body is only flagged here; it leaves the world at the start of
    /// the next step, together with its joints. Safe to call from a
    /// collision listener.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<()> {
        self.bodies.get_body_mut(handle)?.expire();
        Ok(())
    }

    /// Gets a reference to a rigid body by its handle
    pub fn get_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.get_body(handle)
    }

    /// Gets a mutable reference to a rigid body by its handle
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.get_body_mut(handle)
    }

    /// Returns all bodies, structure center bodies included
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter()
    }

    /// Adds a joint between bodies already in the world.
    ///
    /// The joint's anchors are taken from the bodies' current placement.
    /// Fails with `JointSetup` if a referenced body is not in the world.
    pub fn add_joint(&mut self, joint: impl Into<Joint>) -> Result<JointHandle> {
        let mut joint = joint.into();
        let referenced = std::iter::once(joint.get_body_a()).chain(joint.get_body_b());
        for body in referenced {
            let present = self.bodies.get(body).map_or(false, |b| !b.is_expired());
            if !present {
                return Err(PhysicsError::JointSetup(format!(
                    "{} joint references body {:?}, which is not in the world",
                    joint.type_name(),
                    body
                )));
            }
        }

        if !joint.bind(&self.bodies) {
            return Err(PhysicsError::JointSetup(format!("{} joint could not be bound", joint.type_name())));
        }

        let kind = joint.type_name();
        let handle = self.joints.add(joint);
        log::debug!("added {} joint {:?}", kind, handle);
        Ok(handle)
    }

    /// Removes a joint; it stops acting at the start of the next step
    pub fn remove_joint(&mut self, handle: JointHandle) -> Result<()> {
        self.joints.get_joint_mut(handle)?.expire();
        Ok(())
    }

    /// Gets a reference to a joint by its handle
    pub fn get_joint(&self, handle: JointHandle) -> Result<&Joint> {
        self.joints.get_joint(handle)
    }

    /// Gets a mutable reference to a joint by its handle
    pub fn get_joint_mut(&mut self, handle: JointHandle) -> Result<&mut Joint> {
        self.joints.get_joint_mut(handle)
    }

    /// Adds a physics logic and returns its handle
    pub fn add_logic(&mut self, logic: impl PhysicsLogic) -> LogicHandle {
        self.logics.add(Box::new(logic))
    }

    /// Removes a physics logic; it stops acting at the start of the next step
    pub fn remove_logic(&mut self, handle: LogicHandle) -> Result<()> {
        self.logics
            .get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("logic {:?}", handle)))?
            .get_lifespan_mut()
            .expire();
        Ok(())
    }

    /// Gets a reference to a physics logic by its handle
    pub fn get_logic(&self, handle: LogicHandle) -> Result<&dyn PhysicsLogic> {
        self.logics
            .get(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("logic {:?}", handle)))
    }

    /// Gets a mutable reference to a physics logic by its handle
    pub fn get_logic_mut(&mut self, handle: LogicHandle) -> Result<&mut dyn PhysicsLogic> {
        self.logics
            .get_mut(handle)
            .ok_or_else(|| PhysicsError::ResourceNotFound(format!("logic {:?}", handle)))
    }

    /// Creates an empty structure centered on `position`
    pub fn create_structure(&mut self, position: Vector2) -> StructureHandle {
        let center = self.bodies.add(PhysicsStructure::center_body(position));
        let handle = self.structures.add(PhysicsStructure::new(center));
        log::debug!("created structure {:?} with center body {:?}", handle, center);
        handle
    }

    /// Makes `body` a member of a structure. Its offset from the structure's
    /// center is fixed from now on.
    pub fn add_to_structure(&mut self, structure: StructureHandle, body: BodyHandle) -> Result<()> {
        let target = self.structures.get_structure_mut(structure)?;
        if target.is_destroying() {
            return Err(PhysicsError::InvalidState(format!("structure {:?} is being destroyed", structure)));
        }
        if self.bodies.get_body(body)?.is_expired() {
            return Err(PhysicsError::InvalidState(format!("body {:?} is being removed", body)));
        }
        target.add_member(structure, body, &mut self.bodies)?;
        self.detector.remove_body(body);
        Ok(())
    }

    /// Detaches `body` from a structure; it stays in the world on its own.
    /// Returns false if it was not a member.
    pub fn remove_from_structure(&mut self, structure: StructureHandle, body: BodyHandle) -> Result<bool> {
        let target = self.structures.get_structure_mut(structure)?;
        Ok(target.remove_member(body, &mut self.bodies))
    }

    /// Marks a structure for destruction. Its members and center body leave
    /// the world at the start of the next step.
    pub fn destroy_structure(&mut self, structure: StructureHandle) -> Result<()> {
        self.structures.get_structure_mut(structure)?.mark_destroying();
        Ok(())
    }

    /// Returns read access to a structure's aggregate properties
    pub fn structure(&self, structure: StructureHandle) -> Result<StructureRef<'_>> {
        let target = self.structures.get_structure(structure)?;
        Ok(StructureRef::new(target, &self.bodies))
    }

    /// Returns write access to a structure's aggregate properties
    pub fn structure_mut(&mut self, structure: StructureHandle) -> Result<StructureMut<'_>> {
        let target = self.structures.get_structure_mut(structure)?;
        Ok(StructureMut::new(target, &mut self.bodies))
    }

    /// Registers a listener for every collision event
    pub fn add_collision_listener(&mut self, listener: impl FnMut(&mut PhysicsWorld, &CollisionEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Registers a listener for the collisions of one body. The body is
    /// `body_a` in every event the listener receives.
    pub fn add_body_collision_listener(
        &mut self,
        body: BodyHandle,
        listener: impl FnMut(&mut PhysicsWorld, &CollisionEvent) + 'static,
    ) -> Result<()> {
        self.bodies.get_body_mut(body)?.set_flag(BodyFlags::GENERATE_COLLISION_EVENTS, true);
        self.body_listeners.entry(body).or_default().push(Box::new(listener));
        Ok(())
    }

    /// Registers a listener for collisions of any member of a structure.
    /// The structure's center body is `body_a` in every event the listener
    /// receives.
    pub fn add_structure_collision_listener(
        &mut self,
        structure: StructureHandle,
        listener: impl FnMut(&mut PhysicsWorld, &CollisionEvent) + 'static,
    ) -> Result<()> {
        let center = self.structures.get_structure(structure)?.get_center_body();
        if let Some(center) = self.bodies.get_mut(center) {
            center.set_flag(BodyFlags::GENERATE_COLLISION_EVENTS, true);
        }
        self.structure_listeners.entry(structure).or_default().push(Box::new(listener));
        Ok(())
    }

    /// Drops every global collision listener
    pub fn clear_collision_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Returns whether two bodies touched in the last step
    pub fn are_colliding(&self, body_a: BodyHandle, body_b: BodyHandle) -> bool {
        self.detector.are_colliding(body_a, body_b)
    }

    /// Returns the contact manifolds of the last step
    pub fn get_contact_manifolds(&self) -> &[ContactManifold] {
        self.detector.get_contact_manifolds()
    }

    /// Advances the simulation by `time_step` seconds.
    ///
    /// The time is split into sub-steps of at most `config.time_step`, up to
    /// `config.max_substeps`; time past that cap is dropped. Negative and
    /// non-finite steps are ignored. Collision listeners run once all
    /// sub-steps are done.
    pub fn step(&mut self, time_step: f32) {
        if !time_step.is_finite() || time_step < 0.0 {
            log::warn!("ignoring invalid time step {}", time_step);
            return;
        }
        self.events.clear();
        if !self.pending_bodies.is_empty() {
            log::trace!("splicing in {} new bodies", self.pending_bodies.len());
            self.pending_bodies.clear();
        }

        let fixed_step = self.config.time_step;
        let max_steps = self.config.max_substeps.max(1);

        let mut remaining_time = time_step;
        let mut steps = 0;

        // Rounding leaves a sliver of time after the last full sub-step
        while remaining_time > f32::EPSILON && steps < max_steps {
            let dt = fixed_step.min(remaining_time);

            self.step_simulation(dt);

            remaining_time -= dt;
            steps += 1;
        }

        if remaining_time > f32::EPSILON {
            log::debug!(
                "step of {:.4}s clipped to {} sub-steps, dropping {:.4}s",
                time_step,
                max_steps,
                remaining_time
            );
            self.time += time_step - remaining_time;
        } else {
            self.time += time_step;
        }
        self.dispatch_collision_events();
    }

    /// Same as [`step`](Self::step)
    pub fn update(&mut self, dt: f32) {
        self.step(dt);
    }

    fn step_simulation(&mut self, dt: f32) {
        self.sweep_expired();

        for (_, body) in self.bodies.iter_mut() {
            body.update_time(dt);
        }
        for (_, joint) in self.joints.iter_mut() {
            joint.update_time(dt);
        }

        self.logics.apply(&mut self.bodies, dt);

        for (_, structure) in self.structures.iter() {
            structure.forward_member_forces(&mut self.bodies, dt);
        }

        let gravity = self.config.gravity;
        for (_, body) in self.bodies.iter_mut() {
            if body.is_expired() {
                continue;
            }
            let acceleration = gravity.acceleration_at(body.get_position());
            self.integrator.integrate_forces(body, acceleration, dt);
        }

        self.detector.update(&self.bodies, dt, &self.config, &mut self.events);

        self.solver.prepare(self.detector.get_contact_manifolds(), &mut self.bodies, &self.config, dt);
        for (_, joint) in self.joints.iter_mut() {
            if !joint.is_expired() {
                joint.prepare(&mut self.bodies, dt, self.config.warm_starting);
            }
        }

        for _ in 0..self.config.solver_iterations {
            self.solver.solve_velocity(self.detector.get_contact_manifolds_mut(), &mut self.bodies);
            for (_, joint) in self.joints.iter_mut() {
                if !joint.is_expired() {
                    joint.solve_velocity(&mut self.bodies);
                }
            }
        }

        log::trace!(
            "step {:.4}s: {} contact constraints, {} joints, {} iterations",
            dt,
            self.solver.constraint_count(),
            self.joints.len(),
            self.config.solver_iterations
        );

        for (_, body) in self.bodies.iter_mut() {
            if !body.is_expired() {
                self.integrator.integrate_positions(body, dt);
            }
        }

        for (_, structure) in self.structures.iter() {
            structure.sync_members(&mut self.bodies);
        }
    }

    /// Drops structures, bodies, joints and logics flagged since the last
    /// step
    fn sweep_expired(&mut self) {
        let doomed: Vec<StructureHandle> = self
            .structures
            .iter()
            .filter(|(_, s)| s.is_destroying() || !self.bodies.contains(s.get_center_body()))
            .map(|(handle, _)| handle)
            .collect();
        for handle in doomed {
            if let Some(structure) = self.structures.remove(handle) {
                for body in structure.objects().chain(std::iter::once(structure.get_center_body())) {
                    if let Some(body) = self.bodies.get_mut(body) {
                        body.expire();
                    }
                }
                self.structure_listeners.remove(&handle);
                log::debug!("destroyed structure {:?}", handle);
                self.events.add_body_event(BodyEvent {
                    event_type: BodyEventType::StructureDestroyed(handle),
                    body: Some(structure.get_center_body()),
                });
            }
        }

        let removed = self.bodies.drain_where(RigidBody::is_expired);
        for (handle, body) in &removed {
            if let Some(parent) = body.get_parent_structure() {
                if let Some(structure) = self.structures.get_mut(parent) {
                    structure.remove_member(*handle, &mut self.bodies);
                }
            }
            self.detector.remove_body(*handle);
            self.body_listeners.remove(handle);
            log::debug!("removed body {:?}", handle);
            self.events.add_body_event(BodyEvent {
                event_type: BodyEventType::Removed,
                body: Some(*handle),
            });
        }
        for (handle, _) in &removed {
            self.logics.forget_body(*handle, &self.bodies);
        }

        let bodies = &self.bodies;
        let orphaned = |joint: &Joint| {
            std::iter::once(joint.get_body_a())
                .chain(joint.get_body_b())
                .any(|body| !bodies.contains(body))
        };
        let dropped = self.joints.drain_where(|joint| joint.is_expired() || orphaned(joint));
        for (handle, joint) in dropped {
            if joint.is_expired() {
                log::debug!("removed {} joint {:?}", joint.type_name(), handle);
            } else {
                log::warn!("dropping {} joint {:?}: a body left the world", joint.type_name(), handle);
            }
            self.events.add_body_event(BodyEvent {
                event_type: BodyEventType::JointRemoved(handle),
                body: Some(joint.get_body_a()),
            });
        }

        self.logics.sweep_expired();
    }

    fn dispatch_collision_events(&mut self) {
        let events: Vec<CollisionEvent> = self.events.collision_events().cloned().collect();
        if events.is_empty() {
            return;
        }

        let mut listeners = std::mem::take(&mut self.listeners);
        for event in &events {
            for listener in listeners.iter_mut() {
                listener(self, event);
            }
        }
        // Keep listeners registered from inside a callback
        listeners.append(&mut self.listeners);
        self.listeners = listeners;

        let mut body_events = Vec::new();
        let mut structure_events = Vec::new();
        let centers: HashMap<BodyHandle, StructureHandle> = self
            .structures
            .iter()
            .map(|(handle, s)| (s.get_center_body(), handle))
            .collect();

        for event in &events {
            for seen in [event.clone(), event.flipped()] {
                if self.body_listeners.contains_key(&seen.body_a) {
                    body_events.push((seen.body_a, seen.clone()));
                }
                if let Some(&structure) = centers.get(&seen.body_a) {
                    structure_events.push((structure, seen));
                }
            }
        }

        self.dispatch_keyed(|world| &mut world.body_listeners, body_events);
        self.dispatch_keyed(|world| &mut world.structure_listeners, structure_events);
    }

    fn dispatch_keyed<K: Copy + Eq + Hash>(
        &mut self,
        registry: fn(&mut Self) -> &mut HashMap<K, Vec<CollisionListener>>,
        targets: Vec<(K, CollisionEvent)>,
    ) {
        if targets.is_empty() {
            return;
        }

        let mut listeners = std::mem::take(registry(self));
        for (key, event) in &targets {
            if let Some(list) = listeners.get_mut(key) {
                for listener in list.iter_mut() {
                    listener(self, event);
                }
            }
        }
        for (key, mut added) in registry(self).drain() {
            listeners.entry(key).or_default().append(&mut added);
        }
        *registry(self) = listeners;
    }

    /// Returns the events of the last step
    pub fn get_events(&self) -> &EventQueue {
        &self.events
    }

    /// Returns the Begin events of the last step
    pub fn get_begin_events(&self) -> Vec<&CollisionEvent> {
        self.events.get_collision_events_of_type(CollisionEventType::Begin)
    }

    /// Returns the bodies whose shape contains `point`. Structure center
    /// bodies are not reported; their members are.
    pub fn bodies_at(&self, point: Vector2) -> Vec<BodyHandle> {
        self.visible_bodies()
            .filter(|(_, body)| body.get_bounds().contains_point(point) && body.contains_point(point))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Returns the bodies whose bounds overlap `aabb`
    pub fn bodies_in_aabb(&self, aabb: &Aabb) -> Vec<BodyHandle> {
        self.visible_bodies()
            .filter(|(_, body)| body.get_bounds().intersects(aabb))
            .map(|(handle, _)| handle)
            .collect()
    }

    fn visible_bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies
            .iter()
            .filter(|(handle, body)| {
                !body.is_expired()
                    && !body.get_flags().contains(BodyFlags::STRUCTURE_CENTER)
                    && !self.pending_bodies.contains(handle)
            })
    }

    /// Drops every body, joint, structure and logic, and every per-body
    /// and per-structure listener. Global listeners stay registered.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.pending_bodies.clear();
        self.joints.clear();
        self.structures.clear();
        self.logics.clear();
        self.detector.clear();
        self.events.clear();
        self.body_listeners.clear();
        self.structure_listeners.clear();
        log::debug!("cleared world");
    }

    /// Returns the number of bodies in the world, structure center bodies
    /// included
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Returns the number of joints in the world
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Returns the number of structures in the world
    pub fn structure_count(&self) -> usize {
        self.structures.len()
    }

    /// Returns the number of physics logics in the world
    pub fn logic_count(&self) -> usize {
        self.logics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::AxleJoint;
    use crate::shapes::{Circle, Polygon};
    use approx::assert_relative_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn ball(position: Vector2) -> RigidBody {
        RigidBody::new(Circle::new(1.0).unwrap().into(), position)
    }

    #[test]
    fn removal_is_deferred_to_next_step() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_body(ball(Vector2::zero()));

        world.remove_body(handle).unwrap();
        assert_eq!(world.body_count(), 1);
        assert!(world.get_body(handle).unwrap().is_expired());

        world.step(1.0 / 60.0);
        assert_eq!(world.body_count(), 0);
        assert!(matches!(world.get_body(handle), Err(PhysicsError::ResourceNotFound(_))));
    }

    #[test]
    fn joint_needs_bodies_in_world() {
        let mut world = PhysicsWorld::new();
        let a = world.add_body(ball(Vector2::zero()));
        let b = world.add_body(ball(Vector2::new(5.0, 0.0)));
        world.remove_body(b).unwrap();
        world.step(1.0 / 60.0);

        let result = world.add_joint(AxleJoint::new(a, b, Vector2::new(2.5, 0.0)));
        assert!(matches!(result, Err(PhysicsError::JointSetup(_))));
        assert_eq!(world.joint_count(), 0);
    }

    #[test]
    fn joints_go_with_their_bodies() {
        let mut world = PhysicsWorld::new();
        let a = world.add_body(ball(Vector2::zero()));
        let b = world.add_body(ball(Vector2::new(5.0, 0.0)));
        let joint = world.add_joint(AxleJoint::new(a, b, Vector2::new(2.5, 0.0))).unwrap();

        world.remove_body(a).unwrap();
        world.step(1.0 / 60.0);

        assert_eq!(world.joint_count(), 0);
        assert!(world.get_joint(joint).is_err());
        let removed = world
            .get_events()
            .get_body_events_for_body(a)
            .iter()
            .any(|e| e.event_type == BodyEventType::JointRemoved(joint));
        assert!(removed);
    }

    #[test]
    fn step_splits_into_substeps() {
        let mut config = SimulationConfig::default();
        config.time_step = 0.01;
        config.gravity = GravityType::Constant(Vector2::new(0.0, -10.0));
        let mut world = PhysicsWorld::with_config(config);
        let handle = world.add_body(ball(Vector2::zero()));

        world.step(0.05);

        assert_relative_eq!(world.get_time(), 0.05);
        assert_relative_eq!(world.get_body(handle).unwrap().get_linear_velocity().y, -0.5, epsilon = 1e-4);
    }

    #[test]
    fn step_caps_substeps_and_ignores_bad_input() {
        let mut config = SimulationConfig::default();
        config.time_step = 0.01;
        config.max_substeps = 2;
        config.gravity = GravityType::Constant(Vector2::new(0.0, -10.0));
        let mut world = PhysicsWorld::with_config(config);
        let handle = world.add_body(ball(Vector2::zero()));

        // Only two of the five sub-steps run, and only their time counts
        world.step(0.05);
        assert_relative_eq!(world.get_time(), 0.02, epsilon = 1e-6);
        assert_relative_eq!(world.get_body(handle).unwrap().get_linear_velocity().y, -0.2, epsilon = 1e-4);

        for bad in [f32::NAN, f32::INFINITY, -0.01] {
            world.step(bad);
        }
        assert_relative_eq!(world.get_time(), 0.02, epsilon = 1e-6);
        assert_relative_eq!(world.get_body(handle).unwrap().get_linear_velocity().y, -0.2, epsilon = 1e-4);
    }

    #[test]
    fn listeners_run_after_the_step() {
        let mut world = PhysicsWorld::new();
        let floor = world.add_body(RigidBody::new_static(
            Polygon::rectangle(10.0, 1.0).unwrap().into(),
            Vector2::zero(),
        ));
        let ball = world.add_body(ball(Vector2::new(0.0, 1.2)));
        world.get_body_mut(ball).unwrap().set_linear_velocity(Vector2::new(0.0, -10.0));

        let hits = Rc::new(Cell::new(0));
        let seen = hits.clone();
        world
            .add_body_collision_listener(ball, move |world, event| {
                assert_eq!(event.body_a, ball);
                assert_eq!(event.other(ball), Some(floor));
                seen.set(seen.get() + 1);
                world.remove_body(ball).unwrap();
            })
            .unwrap();

        world.step(1.0 / 60.0);
        assert_eq!(hits.get(), 1);
        assert!(world.get_body(ball).unwrap().is_expired());

        world.step(1.0 / 60.0);
        assert!(world.get_body(ball).is_err());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn bodies_at_finds_shapes_not_bounds() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_body(ball(Vector2::zero()));
        world.step(0.0);

        assert_eq!(world.bodies_at(Vector2::new(0.5, 0.5)), vec![handle]);
        // Inside the bounding box, outside the circle
        assert!(world.bodies_at(Vector2::new(0.9, 0.9)).is_empty());
        let area = Aabb::new(Vector2::new(0.9, 0.9), Vector2::new(2.0, 2.0));
        assert_eq!(world.bodies_in_aabb(&area), vec![handle]);
    }

    #[test]
    fn added_bodies_wait_for_the_next_step() {
        let mut world = PhysicsWorld::new();
        let floor = world.add_body(RigidBody::new_static(
            Polygon::rectangle(10.0, 1.0).unwrap().into(),
            Vector2::zero(),
        ));
        let ball = world.add_body(ball(Vector2::new(0.0, 0.9)));
        world.add_body_collision_listener(ball, |world, _| {
            world.add_body(RigidBody::new(Circle::new(1.0).unwrap().into(), Vector2::new(20.0, 0.0)));
        })
        .unwrap();

        // Not part of the world until a step has started
        assert!(world.bodies_at(Vector2::new(4.0, 0.0)).is_empty());
        world.step(1.0 / 60.0);
        assert_eq!(world.bodies_at(Vector2::new(4.0, 0.0)), vec![floor]);
        assert_eq!(world.get_begin_events().len(), 1);

        // The body added by the listener is readable, but not yet found
        assert_eq!(world.body_count(), 3);
        assert!(world.bodies_at(Vector2::new(20.0, 0.0)).is_empty());
        world.step(0.0);
        assert_eq!(world.bodies_at(Vector2::new(20.0, 0.0)).len(), 1);
    }

    #[test]
    fn destroyed_structure_leaves_on_next_step() {
        let mut world = PhysicsWorld::new();
        let structure = world.create_structure(Vector2::zero());
        let member = world.add_body(ball(Vector2::new(2.0, 0.0)));
        world.add_to_structure(structure, member).unwrap();

        world.destroy_structure(structure).unwrap();
        assert!(world.structure(structure).unwrap().get().is_destroying());
        assert!(world.add_to_structure(structure, member).is_err());

        world.step(1.0 / 60.0);
        world.step(1.0 / 60.0);
        assert_eq!(world.structure_count(), 0);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn clear_drops_everything() {
        let mut world = PhysicsWorld::new();
        let a = world.add_body(ball(Vector2::zero()));
        let b = world.add_body(ball(Vector2::new(3.0, 0.0)));
        world.add_joint(AxleJoint::new(a, b, Vector2::new(1.5, 0.0))).unwrap();
        world.create_structure(Vector2::zero());

        world.clear();

        assert_eq!(world.body_count(), 0);
        assert_eq!(world.joint_count(), 0);
        assert_eq!(world.structure_count(), 0);
    }
}
