mod rigid_body;
mod material;
mod lifespan;

pub use self::rigid_body::{RigidBody, RigidBodyHandle, DEFAULT_MASS};
pub use self::material::Coefficients;
pub use self::lifespan::Lifespan;
pub use self::body_flags::BodyFlags;

use crate::math::Vector2;

/// Forces queued on a body until the next velocity integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceType {
    /// Force applied at the center of mass
    Force(Vector2),

    /// Force applied at a specific point in world space (can cause torque)
    ForceAtPoint {
        /// The force to apply
        force: Vector2,

        /// The point to apply the force at, in world space
        point: Vector2,
    },

    /// Torque around the center of mass
    Torque(f32),

    /// Acceleration independent of mass; immovable bodies ignore it
    Acceleration(Vector2),
}

/// A force that keeps being applied for a limited time
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TimedPush {
    pub force: Vector2,
    pub remaining: f32,
}

/// Flags for controlling body behavior
pub mod body_flags {
    use bitflags::bitflags;

    bitflags! {
        /// Flags for controlling the behavior of rigid bodies
        #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
        pub struct BodyFlags: u32 {
            /// Gravity fields do not act on the body
            const IGNORES_GRAVITY = 0x01;

            /// Collisions are detected and reported but never resolved
            const IGNORES_COLLISION_RESPONSE = 0x02;

            /// No physics logic (gravity, attractors, movers) acts on the body
            const IGNORES_PHYSICS_LOGICS = 0x04;

            /// Body generates collision events
            const GENERATE_COLLISION_EVENTS = 0x08;

            /// Body is part of a structure and follows its center body
            const STRUCTURE_MEMBER = 0x10;

            /// Body is the hidden center of a structure
            const STRUCTURE_CENTER = 0x20;
        }
    }
}
