use crate::bodies::{Lifespan, RigidBody};
use crate::core::{BodyHandle, BodyStorage};
use crate::forces::{for_each_affected, PhysicsLogic};
use crate::math::Vector2;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Called once with the body's handle when it reaches its target
pub type ArrivalCallback = Arc<dyn Fn(BodyHandle) + Send + Sync>;

/// Drives one body towards a target point at a fixed speed.
///
/// The logic overrides the body's velocity every step. When the target is
/// within one step's travel the body is placed on it and stopped, the
/// arrival callback runs and the logic expires.
#[derive(Clone)]
pub struct MoveToPointLogic {
    body: [BodyHandle; 1],
    target: Vector2,
    speed: f32,
    arrived: bool,
    on_arrival: Option<ArrivalCallback>,
    lifespan: Lifespan,
}

impl fmt::Debug for MoveToPointLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveToPointLogic")
            .field("body", &self.body[0])
            .field("target", &self.target)
            .field("speed", &self.speed)
            .field("arrived", &self.arrived)
            .field("has_callback", &self.on_arrival.is_some())
            .finish()
    }
}

impl MoveToPointLogic {
    /// Creates a mover for `body` heading to `target` at `speed` units per second
    pub fn new(body: BodyHandle, target: Vector2, speed: f32) -> Self {
        Self {
            body: [body],
            target,
            speed: speed.abs(),
            arrived: false,
            on_arrival: None,
            lifespan: Lifespan::immortal(),
        }
    }

    /// Sets a callback to run on arrival and returns the logic
    pub fn with_arrival_callback(mut self, callback: impl Fn(BodyHandle) + Send + Sync + 'static) -> Self {
        self.on_arrival = Some(Arc::new(callback));
        self
    }

    /// Returns the target
    pub fn get_target(&self) -> Vector2 {
        self.target
    }

    /// Returns the speed
    pub fn get_speed(&self) -> f32 {
        self.speed
    }

    /// Returns whether the body has reached the target
    pub fn has_arrived(&self) -> bool {
        self.arrived
    }
}

impl PhysicsLogic for MoveToPointLogic {
    fn logic_type(&self) -> &'static str {
        "MoveToPoint"
    }

    fn apply(&mut self, bodies: &mut BodyStorage<RigidBody>, dt: f32) {
        if self.arrived {
            return;
        }

        let (target, speed) = (self.target, self.speed);
        let mut arrived = false;
        for_each_affected(bodies, Some(&self.body), |_, body| {
            let to_target = target - body.get_position();
            let distance = to_target.length();

            if distance <= speed * dt {
                body.set_position(target);
                body.set_linear_velocity(Vector2::zero());
                arrived = true;
            } else {
                body.set_linear_velocity(to_target * (speed / distance));
            }
        });

        if arrived {
            self.arrived = true;
            self.lifespan.expire();
            if let Some(callback) = &self.on_arrival {
                callback(self.body[0]);
            }
        }
    }

    fn get_affected_bodies(&self) -> Option<&[BodyHandle]> {
        Some(&self.body)
    }

    fn get_lifespan(&self) -> &Lifespan {
        &self.lifespan
    }

    fn get_lifespan_mut(&mut self) -> &mut Lifespan {
        &mut self.lifespan
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_logic(&self) -> Box<dyn PhysicsLogic> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Storage;
    use crate::shapes::Circle;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn body_arrives_and_callback_runs_once() {
        let mut bodies: BodyStorage<RigidBody> = Storage::new();
        let handle = bodies.add(RigidBody::new(Circle::new(1.0).unwrap().into(), Vector2::zero()));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut logic = MoveToPointLogic::new(handle, Vector2::new(3.0, 4.0), 10.0)
            .with_arrival_callback(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        logic.apply(&mut bodies, 0.25);
        let body = bodies.get_mut(handle).unwrap();
        assert_relative_eq!(body.get_linear_velocity(), Vector2::new(6.0, 8.0), epsilon = 1e-5);
        body.integrate_velocity(0.25);

        // 2.5 units travelled, 2.5 left: exactly one step of travel
        logic.apply(&mut bodies, 0.25);
        logic.apply(&mut bodies, 0.25);

        assert!(logic.has_arrived());
        assert!(logic.get_lifespan().is_expired());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_relative_eq!(bodies.get(handle).unwrap().get_position(), Vector2::new(3.0, 4.0));
    }
}
