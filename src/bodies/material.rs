#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

/// Surface response coefficients of a body
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct Coefficients {
    /// Coefficient of restitution (bounciness). Usually in 0-1; larger
    /// values are accepted and make collisions add energy.
    pub restitution: f32,

    /// Friction coefficient used while the contact is not sliding
    pub static_friction: f32,

    /// Friction coefficient used while the contact is sliding
    pub kinetic_friction: f32,
}

impl Coefficients {
    /// Creates a new set of coefficients
    pub fn new(restitution: f32, static_friction: f32, kinetic_friction: f32) -> Self {
        Self {
            restitution,
            static_friction,
            kinetic_friction,
        }
    }

    /// Coefficients with no friction and the given restitution
    pub fn frictionless(restitution: f32) -> Self {
        Self::new(restitution, 0.0, 0.0)
    }

    /// Ice: almost no friction, a little bounce
    pub fn ice() -> Self {
        Self::new(0.4, 0.05, 0.03)
    }

    /// Rubber: grippy and bouncy
    pub fn rubber() -> Self {
        Self::new(0.7, 0.9, 0.8)
    }

    /// Wood: medium friction, low bounce
    pub fn wood() -> Self {
        Self::new(0.2, 0.6, 0.4)
    }

    /// Restitution of a contact between two surfaces: the smaller of the two
    #[inline]
    pub fn combine_restitution(a: &Self, b: &Self) -> f32 {
        a.restitution.min(b.restitution)
    }

    /// Static friction of a contact between two surfaces: the geometric mean
    #[inline]
    pub fn combine_static_friction(a: &Self, b: &Self) -> f32 {
        (a.static_friction * b.static_friction).max(0.0).sqrt()
    }

    /// Kinetic friction of a contact between two surfaces: the geometric mean
    #[inline]
    pub fn combine_kinetic_friction(a: &Self, b: &Self) -> f32 {
        (a.kinetic_friction * b.kinetic_friction).max(0.0).sqrt()
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            static_friction: 0.4,
            kinetic_friction: 0.4,
        }
    }
}
