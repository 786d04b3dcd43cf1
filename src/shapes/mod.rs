mod shape;
mod circle;
mod polygon;
mod segment;
mod compound;
pub mod factory;

pub use self::shape::{Shape, CollisionShape};
pub use self::circle::Circle;
pub use self::polygon::Polygon;
pub use self::segment::{Segment, Chain};
pub use self::compound::{Compound, CompoundPart};
pub use self::factory::{ShapeKind, CollisionShapeParameters, create_shape};

pub(crate) use self::segment::closest_point_on_segment;
