mod physics_logic;
mod gravity;
mod move_to_point;

pub use self::physics_logic::{for_each_affected, LogicRegistry, PhysicsLogic};
pub use self::gravity::{GravityField, PointGravityField};
pub use self::move_to_point::{ArrivalCallback, MoveToPointLogic};
