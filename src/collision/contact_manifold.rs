use crate::bodies::{Coefficients, RigidBody};
use crate::collision::collision_pair::CollisionPair;
use crate::core::ContactPoint;

/// All contact points between two colliding bodies in one step
#[derive(Debug, Clone)]
pub struct ContactManifold {
    /// The collision pair this manifold belongs to
    pub pair: CollisionPair,

    /// The contact points, normals pointing from `pair.body_a` to `pair.body_b`
    pub contacts: Vec<ContactPoint>,

    /// Combined restitution (minimum of the two bodies)
    pub restitution: f32,

    /// Combined static friction (geometric mean)
    pub static_friction: f32,

    /// Combined kinetic friction (geometric mean)
    pub kinetic_friction: f32,

    /// Detect-only contact: reported to listeners, skipped by the solver
    pub is_sensor: bool,
}

impl ContactManifold {
    /// Creates an empty manifold for the given collision pair
    pub fn new(pair: CollisionPair) -> Self {
        Self {
            pair,
            contacts: Vec::new(),
            restitution: 0.0,
            static_friction: 0.0,
            kinetic_friction: 0.0,
            is_sensor: false,
        }
    }

    /// Creates a manifold with the material and sensor state of two bodies
    pub fn between(pair: CollisionPair, body_a: &RigidBody, body_b: &RigidBody) -> Self {
        let mut manifold = Self::new(pair);
        manifold.set_material_properties(body_a.get_coefficients(), body_b.get_coefficients());
        manifold.is_sensor = body_a.ignores_collision_response() || body_b.ignores_collision_response();
        manifold
    }

    /// Adds a contact point to the manifold
    pub fn add_contact(&mut self, contact: ContactPoint) {
        self.contacts.push(contact);
    }

    /// Clears all contacts from the manifold
    pub fn clear(&mut self) {
        self.contacts.clear();
    }

    /// Returns whether the manifold is empty
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Returns the deepest penetration among the contacts
    pub fn max_penetration(&self) -> f32 {
        self.contacts.iter().fold(0.0, |acc, c| acc.max(c.penetration))
    }

    /// Copies accumulated impulses from `previous` into contacts with the
    /// same feature id
    pub fn warm_start_from(&mut self, previous: &ContactManifold) {
        for contact in &mut self.contacts {
            if let Some(old) = previous.contacts.iter().find(|old| old.id == contact.id) {
                contact.normal_impulse = old.normal_impulse;
                contact.tangent_impulse = old.tangent_impulse;
            }
        }
    }

    /// Sets the combined material properties for this collision
    pub fn set_material_properties(&mut self, a: &Coefficients, b: &Coefficients) {
        self.restitution = Coefficients::combine_restitution(a, b);
        self.static_friction = Coefficients::combine_static_friction(a, b);
        self.kinetic_friction = Coefficients::combine_kinetic_friction(a, b);
    }
}
