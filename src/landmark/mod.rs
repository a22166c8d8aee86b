pub mod frame;
pub mod index;
pub mod mailbox;

pub use frame::{FaceLandmarks, HandLandmarks, Handedness, Landmark, LandmarkFrame, PoseLandmarks};
pub use index::{FaceIndex, HandIndex, PoseIndex};
pub use mailbox::FrameMailbox;
