//! A 2D rigid-body physics engine for small games.
//!
//! A [`PhysicsWorld`] owns bodies, joints, structures and physics logics and
//! advances them with [`PhysicsWorld::step`]. Collisions are found with a
//! swappable broad phase and a separating-axis narrow phase, and resolved by
//! a sequential impulse solver with warm starting and split impulses.
//!
//! ```no_run
//! use phys2d::{GravityType, PhysicsWorld, RigidBody, Vector2};
//! use phys2d::shapes::{Circle, Polygon};
//!
//! let mut world = PhysicsWorld::new();
//! world.set_gravity(GravityType::Constant(Vector2::new(0.0, -1000.0)));
//!
//! let floor = Polygon::rectangle(1000.0, 20.0).unwrap();
//! world.add_body(RigidBody::new_static(floor.into(), Vector2::zero()));
//!
//! let ball = world.add_body(RigidBody::new(Circle::new(25.0).unwrap().into(), Vector2::new(0.0, 500.0)));
//! world.add_collision_listener(|_world, event| println!("{:?} touched {:?}", event.body_a, event.body_b));
//!
//! for _ in 0..120 {
//!     world.step(1.0 / 60.0);
//! }
//! println!("ball at {:?}", world.get_body(ball).unwrap().get_position());
//! ```

pub mod math;
pub mod core;
pub mod bodies;
pub mod shapes;
pub mod collision;
pub mod constraints;
pub mod forces;
pub mod integration;

/// Re-export common types for easier usage
pub use crate::core::{BodyHandle, GravityType, JointHandle, PhysicsWorld, SimulationConfig, StructureHandle};
pub use crate::bodies::{BodyFlags, Coefficients, Lifespan, RigidBody};
pub use crate::constraints::{AxleJoint, Joint, WeldJoint, WheelJoint};
pub use crate::math::Vector2;

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum PhysicsError {
        #[error("Invalid parameter: {0}")]
        InvalidParameter(String),

        #[error("Degenerate shape: {0}")]
        DegenerateShape(String),

        #[error("Resource not found: {0}")]
        ResourceNotFound(String),

        #[error("Joint setup error: {0}")]
        JointSetup(String),

        #[error("Invalid state: {0}")]
        InvalidState(String),
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
