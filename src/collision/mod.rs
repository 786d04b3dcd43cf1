mod ignorer;
mod collision_pair;
mod contact_manifold;
mod broad_phase;
mod narrow_phase;
mod collision_detector;
mod contact_solver;

pub use self::ignorer::{
    can_collide, pair_can_collide, CollisionGroup, CollisionIgnorer, GroupIgnorer, Ignorer, ObjectIgnorer,
    OneWayPlatformIgnorer,
};
pub use self::collision_pair::CollisionPair;
pub use self::contact_manifold::ContactManifold;
pub use self::broad_phase::{create_broad_phase, BroadPhase, BruteForceBroadPhase, SpatialHashing, SweepAndPrune};
pub use self::narrow_phase::{
    collide_bodies, collide_primitive_sets, world_primitives, NarrowPhase, Primitive, SatNarrowPhase,
};
pub use self::collision_detector::CollisionDetector;
pub use self::contact_solver::{ContactSolver, SequentialImpulseSolver};
