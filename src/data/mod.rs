//! Data structures shared by all gates.

mod channel;
mod mask;
mod point_set;
mod result;

pub use channel::{Channel, ChannelSelector};
pub use mask::Mask;
pub use point_set::{ChannelInfo, PointSet};
pub use result::{Contour, GateEvaluation, GateOutput};
