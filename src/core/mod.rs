pub mod world;
pub mod config;
pub mod storage;
pub mod events;
pub mod structure;

pub use self::world::{PhysicsWorld, CollisionListener};
pub use self::config::{SimulationConfig, BroadPhaseKind};
pub use self::storage::{BodyStorage, JointStorage, LogicStorage, StructureStorage, Storage, StorageHandle};
pub use self::events::{EventQueue, CollisionEvent, CollisionEventType, BodyEvent, BodyEventType};
pub use self::structure::{PhysicsStructure, StructureMut, StructureRef};

use crate::math::Vector2;
use std::cmp::Ordering;
use thunderdome as td;

#[cfg(feature = "serialize")]
use serde::{Serialize, Deserialize};

macro_rules! arena_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub(crate) td::Index);

        impl $name {
            /// Get the underlying [`thunderdome::Index`] of this handle.
            #[inline]
            pub fn index(&self) -> td::Index {
                self.0
            }

            /// A handle that never resolves to anything
            #[inline]
            pub fn dangling() -> Self {
                Self(td::Index::DANGLING)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        // Slot order matches arena iteration order
        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                (self.0.slot(), self.0.to_bits()).cmp(&(other.0.slot(), other.0.to_bits()))
            }
        }

        impl StorageHandle for $name {
            const KIND: &'static str = stringify!($name);

            fn from_index(index: td::Index) -> Self {
                Self(index)
            }

            fn to_index(self) -> td::Index {
                self.0
            }
        }
    };
}

arena_handle!(
    /// A unique identifier for a body in the physics world.
    ///
    /// Handles are generational: once the body is removed, the handle no
    /// longer resolves, even if its slot is reused.
    BodyHandle
);

arena_handle!(
    /// A unique identifier for a joint in the physics world
    JointHandle
);

arena_handle!(
    /// A unique identifier for a structure in the physics world
    StructureHandle
);

arena_handle!(
    /// A unique identifier for a physics logic in the physics world
    LogicHandle
);

/// Identifies the geometric feature pair that produced a contact point, so
/// contacts can be matched between steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContactId {
    /// Index of the collision primitive on the first body
    pub primitive_a: u16,

    /// Index of the collision primitive on the second body
    pub primitive_b: u16,

    /// Edge/vertex feature key within the primitive pair
    pub feature: u32,
}

/// A contact point between two bodies
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    /// The position of the contact point in world space
    pub position: Vector2,

    /// Unit normal pointing from the first body towards the second
    pub normal: Vector2,

    /// The penetration depth of the contact (positive when overlapping)
    pub penetration: f32,

    /// The feature pair that generated this point
    pub id: ContactId,

    /// Accumulated normal impulse
    pub normal_impulse: f32,

    /// Accumulated tangent (friction) impulse
    pub tangent_impulse: f32,
}

impl ContactPoint {
    /// Creates a contact point with no accumulated impulse
    pub fn new(position: Vector2, normal: Vector2, penetration: f32, id: ContactId) -> Self {
        Self {
            position,
            normal,
            penetration,
            id,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        }
    }

    /// Returns the same contact seen from the other body
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            id: ContactId {
                primitive_a: self.id.primitive_b,
                primitive_b: self.id.primitive_a,
                feature: self.id.feature,
            },
            ..*self
        }
    }
}

/// The gravity to apply to the physics world
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum GravityType {
    /// No gravity
    None,

    /// Constant acceleration in a direction
    Constant(Vector2),

    /// Point gravity source, pulling with `strength / distance²`
    Point {
        /// The position of the gravity source
        position: Vector2,

        /// The strength of the gravity
        strength: f32,
    },
}

impl GravityType {
    /// Returns the gravitational acceleration at `position`
    pub fn acceleration_at(&self, position: Vector2) -> Vector2 {
        match *self {
            GravityType::None => Vector2::zero(),
            GravityType::Constant(g) => g,
            GravityType::Point { position: source, strength } => {
                let to_source = source - position;
                let distance_sq = to_source.length_squared();
                if distance_sq > crate::math::EPSILON {
                    to_source * (strength / (distance_sq * distance_sq.sqrt()))
                } else {
                    Vector2::zero()
                }
            }
        }
    }
}

impl Default for GravityType {
    fn default() -> Self {
        Self::None
    }
}
