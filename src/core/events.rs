use crate::core::{BodyHandle, ContactPoint, JointHandle, StructureHandle};

/// Types of collision events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEventType {
    /// Bodies have just started colliding
    Begin,

    /// Bodies are still colliding (persisting contact)
    Persist,

    /// Bodies have just stopped colliding
    End,
}

/// A collision event between two bodies
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    /// The type of collision event
    pub event_type: CollisionEventType,

    /// The first body in the collision
    pub body_a: BodyHandle,

    /// The second body in the collision
    pub body_b: BodyHandle,

    /// The contact points of the collision, normals pointing from `body_a`
    /// to `body_b` (empty for End events)
    pub contacts: Vec<ContactPoint>,

    /// Whether the contact was detect-only (no impulse applied)
    pub is_sensor: bool,
}

impl CollisionEvent {
    /// Returns the other body of the event
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }

    /// Returns the same event seen from the other body
    pub fn flipped(&self) -> Self {
        Self {
            event_type: self.event_type,
            body_a: self.body_b,
            body_b: self.body_a,
            contacts: self.contacts.iter().map(ContactPoint::flipped).collect(),
            is_sensor: self.is_sensor,
        }
    }

    /// Returns the summed normal impulse over all contact points
    pub fn total_normal_impulse(&self) -> f32 {
        self.contacts.iter().map(|c| c.normal_impulse).sum()
    }
}

/// Types of lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEventType {
    /// A body has been added to the world
    Added,

    /// A body has been removed from the world
    Removed,

    /// A joint has been removed from the world
    JointRemoved(JointHandle),

    /// A structure has been torn down
    StructureDestroyed(StructureHandle),
}

/// A lifecycle event related to a single body
#[derive(Debug, Clone)]
pub struct BodyEvent {
    /// The type of body event
    pub event_type: BodyEventType,

    /// The body that the event refers to
    pub body: Option<BodyHandle>,
}

/// Events produced by one call to `PhysicsWorld::step`
#[derive(Debug, Default)]
pub struct EventQueue {
    /// Collision events
    collision_events: Vec<CollisionEvent>,

    /// Body events
    body_events: Vec<BodyEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collision event to the queue
    pub fn add_collision_event(&mut self, event: CollisionEvent) {
        self.collision_events.push(event);
    }

    /// Adds a body event to the queue
    pub fn add_body_event(&mut self, event: BodyEvent) {
        self.body_events.push(event);
    }

    /// Returns the queued collision events in the order they happened
    pub fn collision_events(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.collision_events.iter()
    }

    /// Clears all events from the queue
    pub fn clear(&mut self) {
        self.collision_events.clear();
        self.body_events.clear();
    }

    /// Gets all collision events of a specific type
    pub fn get_collision_events_of_type(&self, event_type: CollisionEventType) -> Vec<&CollisionEvent> {
        self.collision_events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Gets all body events for a specific body
    pub fn get_body_events_for_body(&self, body: BodyHandle) -> Vec<&BodyEvent> {
        self.body_events
            .iter()
            .filter(|e| e.body == Some(body))
            .collect()
    }
}
