use crate::bodies::{Lifespan, RigidBody};
use crate::core::{BodyHandle, BodyStorage, GravityType};
use crate::forces::{for_each_affected, PhysicsLogic};
use crate::math::Vector2;
use std::any::Any;

/// Uniform gravity: the same acceleration for every body, regardless of mass
#[derive(Debug, Clone)]
pub struct GravityField {
    /// The gravity acceleration vector
    gravity: Vector2,

    /// The bodies affected, or None for all
    affected_bodies: Option<Vec<BodyHandle>>,

    lifespan: Lifespan,
}

impl GravityField {
    /// Creates a gravity field acting on every body
    pub fn new(gravity: Vector2) -> Self {
        Self {
            gravity,
            affected_bodies: None,
            lifespan: Lifespan::immortal(),
        }
    }

    /// Creates a gravity field acting only on the given bodies
    pub fn for_bodies(gravity: Vector2, bodies: Vec<BodyHandle>) -> Self {
        Self {
            affected_bodies: Some(bodies),
            ..Self::new(gravity)
        }
    }

    /// Gets the current gravity acceleration
    pub fn get_gravity(&self) -> Vector2 {
        self.gravity
    }

    /// Sets the gravity acceleration vector
    pub fn set_gravity(&mut self, gravity: Vector2) {
        self.gravity = gravity;
    }
}

impl PhysicsLogic for GravityField {
    fn logic_type(&self) -> &'static str {
        "GravityField"
    }

    fn apply(&mut self, bodies: &mut BodyStorage<RigidBody>, _dt: f32) {
        let gravity = self.gravity;
        for_each_affected(bodies, self.affected_bodies.as_deref(), |_, body| {
            if !body.ignores_gravity() {
                body.accelerate(gravity);
            }
        });
    }

    fn get_affected_bodies(&self) -> Option<&[BodyHandle]> {
        self.affected_bodies.as_deref()
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

/// Gravity pulling towards a point (like a planet), with `strength / distance²`
#[derive(Debug, Clone)]
pub struct PointGravityField {
    /// The position of the gravity source
    position: Vector2,

    /// The gravitational strength
    strength: f32,

    /// The bodies affected, or None for all
    affected_bodies: Option<Vec<BodyHandle>>,

    /// Bodies closer than this are not pulled
    min_distance: f32,

    lifespan: Lifespan,
}

impl PointGravityField {
    /// Creates a point gravity field acting on every body
    pub fn new(position: Vector2, strength: f32) -> Self {
        Self {
            position,
            strength,
            affected_bodies: None,
            min_distance: 0.1,
            lifespan: Lifespan::immortal(),
        }
    }

    /// Gets the current position of the gravity source
    pub fn get_position(&self) -> Vector2 {
        self.position
    }

    /// Sets the position of the gravity source
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
    }

    /// Gets the current strength
    pub fn get_strength(&self) -> f32 {
        self.strength
    }

    /// Sets the strength. Negative values repel.
    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }

    /// Gets the minimum distance
    pub fn get_min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Sets the distance inside which bodies are not pulled
    pub fn set_min_distance(&mut self, min_distance: f32) {
        self.min_distance = min_distance.max(0.001);
    }
}

impl PhysicsLogic for PointGravityField {
    fn logic_type(&self) -> &'static str {
        "PointGravityField"
    }

    fn apply(&mut self, bodies: &mut BodyStorage<RigidBody>, _dt: f32) {
        let field = GravityType::Point {
            position: self.position,
            strength: self.strength,
        };
        let min_distance_sq = self.min_distance * self.min_distance;

        for_each_affected(bodies, self.affected_bodies.as_deref(), |_, body| {
            if body.ignores_gravity() {
                return;
            }
            let position = body.get_position();
            if position.distance_squared(&self.position) < min_distance_sq {
                return;
            }
            body.accelerate(field.acceleration_at(position));
        });
    }

    fn get_affected_bodies(&self) -> Option<&[BodyHandle]> {
        self.affected_bodies.as_deref()
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
