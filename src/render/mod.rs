pub mod cartoon;
pub mod overlay;
pub mod raster;
pub mod skeleton;
pub mod skinned;
pub mod surface;
pub mod wireframe;
#[cfg(feature = "desktop")]
pub mod window;

pub use cartoon::CartoonAvatar;
pub use overlay::CameraOverlay;
pub use raster::PixelSurface;
pub use skeleton::{HAND_CONNECTIONS, POSE_CONNECTIONS};
pub use skinned::SkinnedAvatar;
pub use surface::{Color, CommandRecorder, Paint, Point, Shape, Stroke, Surface, VideoFrame};
pub use wireframe::{StyleKind, WireframeAvatar};
#[cfg(feature = "desktop")]
pub use window::MinifbRenderer;

use crate::config::ProjectionConfig;
use crate::geometry::VISIBILITY_FLOOR;
use crate::landmark::LandmarkFrame;

/// 1 回の描画に渡す付帯情報
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// カメラ映像 (オーバーレイのみ使う)
    pub video: Option<&'a VideoFrame>,
    /// アニメーション用の経過時間 (秒)
    pub time: f32,
    pub visibility_floor: f32,
    pub projection: ProjectionConfig,
}

impl<'a> FrameContext<'a> {
    pub fn new(time: f32) -> Self {
        Self {
            video: None,
            time,
            visibility_floor: VISIBILITY_FLOOR,
            projection: ProjectionConfig::default(),
        }
    }

    pub fn with_video(mut self, video: Option<&'a VideoFrame>) -> Self {
        self.video = video;
        self
    }
}

/// 配信されたフレームを1枚描くレンダラー
///
/// 欠けているランドマークグループは描かずに済ませる。パニックしない。
pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render_frame(&mut self, frame: &LandmarkFrame, ctx: &FrameContext<'_>, surface: &mut dyn Surface);
}
