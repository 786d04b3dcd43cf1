mod joint;
mod axle;
mod weld;
mod wheel;

pub use self::joint::{Joint, JointKind, JOINT_BIAS_FACTOR};
pub use self::axle::AxleJoint;
pub use self::weld::WeldJoint;
pub use self::wheel::WheelJoint;
