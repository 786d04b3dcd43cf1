use crate::bodies::{Lifespan, RigidBody};
use crate::core::{BodyHandle, BodyStorage, LogicHandle, LogicStorage, Storage};
use std::any::Any;

/// A world-owned rule that acts on bodies every step, before collisions are
/// detected: gravity fields, attractors, movers.
///
/// Bodies flagged `IGNORES_PHYSICS_LOGICS` are never touched by a logic.
pub trait PhysicsLogic: Send + Sync + std::fmt::Debug + 'static {
    /// Returns the type name of the logic
    fn logic_type(&self) -> &'static str;

    /// Applies the logic to the bodies for a step of length `dt`
    fn apply(&mut self, bodies: &mut BodyStorage<RigidBody>, dt: f32);

    /// Returns the bodies this logic is limited to, or None if it acts on
    /// every body
    fn get_affected_bodies(&self) -> Option<&[BodyHandle]>;

    /// Returns true if the logic acts on the given body
    fn affects_body(&self, body: BodyHandle) -> bool {
        self.get_affected_bodies().map_or(true, |bodies| bodies.contains(&body))
    }

    /// Returns the logic's lifespan
    fn get_lifespan(&self) -> &Lifespan;

    /// Returns the logic's lifespan mutably
    fn get_lifespan_mut(&mut self) -> &mut Lifespan;

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Clone the logic to create a new box
    fn clone_logic(&self) -> Box<dyn PhysicsLogic>;
}

/// Iterates the bodies a logic acts on, skipping bodies that opt out of logics.
///
/// With no explicit body list, every body in the world is visited.
pub fn for_each_affected<F>(bodies: &mut BodyStorage<RigidBody>, affected: Option<&[BodyHandle]>, mut f: F)
where
    F: FnMut(BodyHandle, &mut RigidBody),
{
    match affected {
        Some(handles) => {
            for &handle in handles {
                if let Some(body) = bodies.get_mut(handle) {
                    if !body.ignores_physics_logics() && !body.is_expired() {
                        f(handle, body);
                    }
                }
            }
        }
        None => {
            for (handle, body) in bodies.iter_mut() {
                if !body.ignores_physics_logics() && !body.is_expired() {
                    f(handle, body);
                }
            }
        }
    }
}

/// The world's collection of physics logics
#[derive(Debug, Default)]
pub struct LogicRegistry {
    logics: LogicStorage<Box<dyn PhysicsLogic>>,
}

impl LogicRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a logic and returns its handle
    pub fn add(&mut self, logic: Box<dyn PhysicsLogic>) -> LogicHandle {
        let kind = logic.logic_type();
        let handle = self.logics.add(logic);
        log::debug!("added {} logic {:?}", kind, handle);
        handle
    }

    /// Removes a logic immediately
    pub fn remove(&mut self, handle: LogicHandle) -> Option<Box<dyn PhysicsLogic>> {
        self.logics.remove(handle)
    }

    /// Returns a logic by handle
    pub fn get(&self, handle: LogicHandle) -> Option<&dyn PhysicsLogic> {
        self.logics.get(handle).map(|l| l.as_ref())
    }

    /// Returns a logic by handle, mutably
    pub fn get_mut(&mut self, handle: LogicHandle) -> Option<&mut dyn PhysicsLogic> {
        self.logics.get_mut(handle).map(|l| l.as_mut())
    }

    /// Returns the number of logics
    pub fn len(&self) -> usize {
        self.logics.len()
    }

    /// Returns whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.logics.is_empty()
    }

    /// Drops every logic
    pub fn clear(&mut self) {
        self.logics.clear();
    }

    /// Removes logics that expired, returning how many were removed
    pub fn sweep_expired(&mut self) -> usize {
        let removed = self.logics.drain_where(|logic| logic.get_lifespan().is_expired());
        for (handle, logic) in &removed {
            log::debug!("swept expired {} logic {:?}", logic.logic_type(), handle);
        }
        removed.len()
    }

    /// Expires logics limited to bodies that are all gone
    pub fn forget_body(&mut self, body: BodyHandle, bodies: &BodyStorage<RigidBody>) {
        for (_, logic) in self.logics.iter_mut() {
            let orphaned = logic
                .get_affected_bodies()
                .map_or(false, |handles| handles.contains(&body) && handles.iter().all(|&h| !bodies.contains(h)));
            if orphaned {
                logic.get_lifespan_mut().expire();
            }
        }
    }

    /// Runs every live logic and ages it by `dt`
    pub fn apply(&mut self, bodies: &mut BodyStorage<RigidBody>, dt: f32) {
        for (_, logic) in self.logics.iter_mut() {
            if logic.get_lifespan().is_expired() {
                continue;
            }
            logic.apply(bodies, dt);
            logic.get_lifespan_mut().update(dt);
        }
    }
}
