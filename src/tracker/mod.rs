pub mod gate;
pub mod retarget;
pub mod smooth;

pub use gate::{GateClass, LimbGate, LIMB_GATES};
pub use retarget::{remap_hand_joint, Retargeter};
pub use smooth::{ChannelKey, ChannelSmoother};
