//! 透視投影したワイヤーフレームアバター
//!
//! 骨は奥から手前の順に描き、関節・頭・顔・手の描き方はスタイルに任せる。

mod face;
mod ghost;
mod matrix;
mod neon;
mod robot;
mod style;
mod synthwave;

use std::fmt;
use std::str::FromStr;

pub use face::{EyeLayout, FaceLayout, MouthLayout};
pub use matrix::GlyphRain;
pub use style::{Palette, RenderStyle, Segment};

use super::skeleton::{HAND_CONNECTIONS, POSE_CONNECTIONS};
use super::surface::{Glow, Point, Shape, Stroke, Surface};
use super::{FrameContext, Renderer};
use crate::config::ProjectionConfig;
use crate::error::UnknownName;
use crate::geometry::{depth_norm, project_perspective, segment_visible, to_screen, Projected};
use crate::landmark::{Landmark, LandmarkFrame, PoseIndex, PoseLandmarks};

/// ワイヤーフレームの見た目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StyleKind {
    #[default]
    Neon,
    Ghost,
    Robot,
    Matrix,
    Synthwave,
}

impl StyleKind {
    pub const ALL: [StyleKind; 5] = [
        StyleKind::Neon,
        StyleKind::Ghost,
        StyleKind::Robot,
        StyleKind::Matrix,
        StyleKind::Synthwave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neon => "neon",
            Self::Ghost => "ghost",
            Self::Robot => "robot",
            Self::Matrix => "matrix",
            Self::Synthwave => "synthwave",
        }
    }

    fn build(self) -> Box<dyn RenderStyle> {
        match self {
            Self::Neon => Box::new(neon::Neon::new()),
            Self::Ghost => Box::new(ghost::Ghost::new()),
            Self::Robot => Box::new(robot::Robot::new()),
            Self::Matrix => Box::new(matrix::Matrix::new()),
            Self::Synthwave => Box::new(synthwave::Synthwave::new()),
        }
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownName {
                kind: "style",
                name: s.to_string(),
            })
    }
}

/// ランドマークをビューポートへ透視投影する
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    pub width: f32,
    pub height: f32,
    pub projection: ProjectionConfig,
}

impl Projector {
    pub fn new(width: f32, height: f32, projection: ProjectionConfig) -> Self {
        Self {
            width,
            height,
            projection,
        }
    }

    pub fn project(&self, lm: &Landmark) -> Projected {
        project_perspective(
            lm,
            self.width,
            self.height,
            self.projection.fov,
            self.projection.depth_scale,
        )
    }

    pub fn point(&self, lm: &Landmark) -> Point {
        let p = self.project(lm);
        Point::new(p.x, p.y)
    }

    /// 遠近グリッドの地平線の高さ
    pub fn horizon(&self, ratio: f32) -> f32 {
        self.height * ratio
    }
}

/// 描画する骨を奥から手前の順で返す
///
/// 信頼度の無い点は 0 とみなすので、信頼度付きの点どうしの線分だけが残る。
pub fn sorted_segments(pose: &PoseLandmarks, projector: &Projector, floor: f32) -> Vec<Segment> {
    let mut segs: Vec<Segment> = POSE_CONNECTIONS
        .iter()
        .filter_map(|(a, b)| {
            let (la, lb) = (pose.get(*a)?, pose.get(*b)?);
            if !segment_visible(la, lb, floor, 0.0) {
                return None;
            }
            let pa = projector.project(la);
            let pb = projector.project(lb);
            Some(Segment {
                a: Point::new(pa.x, pa.y),
                b: Point::new(pb.x, pb.y),
                scale: pa.scale,
                z: (la.z + lb.z) / 2.0,
            })
        })
        .collect();
    // z が大きいほど奥
    segs.sort_by(|x, y| y.z.total_cmp(&x.z));
    segs
}

/// 地平線から手前へ広がる遠近グリッド
fn draw_grid(surface: &mut dyn Surface, style: &dyn RenderStyle, projector: &Projector) {
    let (w, h) = (projector.width, projector.height);
    let horizon = projector.horizon(style.horizon_ratio());
    let stroke = Stroke::new(style.palette().grid, 1.0);
    surface.set_glow(style.grid_glow());
    for i in 0..=12 {
        let t = i as f32 / 12.0;
        let gy = horizon + (h - horizon) * t;
        let span = w * 0.55 * t;
        surface.stroke(
            &Shape::line(Point::new(w / 2.0 - span, gy), Point::new(w / 2.0 + span, gy)),
            &stroke,
        );
        let gx = w / 2.0 + (i as f32 - 6.0) / 6.0 * w * 0.5;
        surface.stroke(
            &Shape::line(Point::new(w / 2.0, horizon), Point::new(gx, h)),
            &stroke,
        );
    }
    surface.set_glow(None);
}

/// 手の骨 (投影後の始点, 終点, 始点スケール)
fn hand_segments(frame: &LandmarkFrame, projector: &Projector) -> Vec<Vec<(Point, Point, f32)>> {
    frame
        .hands()
        .map(|hand| {
            HAND_CONNECTIONS
                .iter()
                .filter_map(|(a, b)| {
                    let pa = projector.project(hand.get(*a)?);
                    let pb = projector.project(hand.get(*b)?);
                    Some((Point::new(pa.x, pa.y), Point::new(pb.x, pb.y), pa.scale))
                })
                .collect()
        })
        .collect()
}

pub struct WireframeAvatar {
    kind: StyleKind,
    style: Box<dyn RenderStyle>,
}

impl Default for WireframeAvatar {
    fn default() -> Self {
        Self::new(StyleKind::default())
    }
}

impl WireframeAvatar {
    pub fn new(kind: StyleKind) -> Self {
        Self {
            kind,
            style: kind.build(),
        }
    }

    pub fn style(&self) -> StyleKind {
        self.kind
    }

    /// スタイル切り替え。次のフレームから反映される
    pub fn set_style(&mut self, kind: StyleKind) {
        if kind != self.kind {
            self.kind = kind;
            self.style = kind.build();
        }
    }
}

impl Renderer for WireframeAvatar {
    fn name(&self) -> &'static str {
        "3d"
    }

    fn render_frame(&mut self, frame: &LandmarkFrame, ctx: &FrameContext<'_>, surface: &mut dyn Surface) {
        let (w, h) = surface.size();
        let projector = Projector::new(w, h, ctx.projection);
        let floor = ctx.visibility_floor;
        let time = ctx.time;
        surface.set_glow(None);

        self.style.background(surface, time);
        draw_grid(surface, self.style.as_ref(), &projector);
        self.style.scanlines(surface, time);

        let Some(pose) = frame.pose() else {
            return;
        };
        let style = self.style.as_ref();

        style.aura(surface, pose, &projector);

        let segs = sorted_segments(pose, &projector, floor);
        style.bones(surface, &segs, time);

        for lm in pose.iter() {
            if lm.visibility_or(0.0) < floor {
                continue;
            }
            let p = projector.project(lm);
            style.joint(
                surface,
                Point::new(p.x, p.y),
                (6.0 * p.scale).max(3.0),
                depth_norm(lm.z),
                time,
            );
        }
        surface.set_glow(None);

        if let Some(nose) = pose.get(PoseIndex::Nose).filter(|lm| lm.visibility_or(0.0) > floor) {
            let hp = projector.project(nose);
            let ear_distance = match (pose.get(PoseIndex::LeftEar), pose.get(PoseIndex::RightEar)) {
                (Some(le), Some(re)) => to_screen(le, w, h).distance(&to_screen(re, w, h)),
                _ => 0.0,
            };
            let radius = (ear_distance * 0.55 * hp.scale).max(20.0);
            style.head(surface, Point::new(hp.x, hp.y), radius);
        }

        if let Some(face) = frame.face() {
            let layout = FaceLayout::project(face, &projector);
            style.face(surface, &layout, time);
        }

        for segments in hand_segments(frame, &projector) {
            surface.set_glow(Some(Glow::new(style.palette().hand, 10.0)));
            style.hand(surface, &segments);
        }
        surface.set_glow(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{FaceIndex, FaceLandmarks, HandIndex, HandLandmarks};
    use crate::render::surface::{CommandRecorder, DrawCommand};

    fn pose_at(vis: f32) -> PoseLandmarks {
        PoseLandmarks(
            (0..PoseIndex::COUNT)
                .map(|i| {
                    let f = i as f32;
                    Landmark::with_visibility(0.3 + f * 0.01, 0.2 + f * 0.02, -0.1 + f * 0.005, vis)
                })
                .collect(),
        )
    }

    fn render(kind: StyleKind, frame: &LandmarkFrame) -> CommandRecorder {
        let mut rec = CommandRecorder::new(640.0, 480.0);
        WireframeAvatar::new(kind).render_frame(frame, &FrameContext::new(1.0), &mut rec);
        rec
    }

    #[test]
    fn test_style_kind_from_str() {
        assert_eq!("neon".parse::<StyleKind>().unwrap(), StyleKind::Neon);
        assert_eq!("Synthwave".parse::<StyleKind>().unwrap(), StyleKind::Synthwave);
        let err = "vapor".parse::<StyleKind>().unwrap_err();
        assert_eq!(err.kind, "style");
        for kind in StyleKind::ALL {
            assert_eq!(kind.as_str().parse::<StyleKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_segments_sorted_back_to_front() {
        let pose = pose_at(0.9);
        let projector = Projector::new(640.0, 480.0, ProjectionConfig::default());
        let segs = sorted_segments(&pose, &projector, 0.3);
        assert_eq!(segs.len(), POSE_CONNECTIONS.len());
        assert!(segs.windows(2).all(|w| w[0].z >= w[1].z));
    }

    #[test]
    fn test_missing_visibility_is_not_drawn() {
        let mut pose = pose_at(0.9);
        pose.0[PoseIndex::LeftKnee as usize].visibility = None;
        pose.0[PoseIndex::RightKnee as usize].visibility = Some(0.29);
        let projector = Projector::new(640.0, 480.0, ProjectionConfig::default());
        let segs = sorted_segments(&pose, &projector, 0.3);
        assert_eq!(segs.len(), POSE_CONNECTIONS.len() - 4);
    }

    #[test]
    fn test_no_pose_draws_background_and_grid_only() {
        let rec = render(StyleKind::Neon, &LandmarkFrame::default());
        assert!(matches!(rec.commands()[0], DrawCommand::Clear(_)));
        assert_eq!(rec.stroked_lines().len(), 26);
    }

    #[test]
    fn test_pose_only_frame_draws_every_style() {
        let frame = LandmarkFrame {
            pose: Some(pose_at(0.9)),
            ..Default::default()
        };
        for kind in StyleKind::ALL {
            let rec = render(kind, &frame);
            let grid_only = render(kind, &LandmarkFrame::default());
            assert!(
                rec.commands().len() > grid_only.commands().len() + PoseIndex::COUNT,
                "{kind} drew too little"
            );
        }
    }

    /// NaN・無限大を混ぜた全グループ入りのフレーム
    fn frame_with_non_finite_points() -> LandmarkFrame {
        let mut pose = pose_at(0.9);
        pose.0[PoseIndex::Nose as usize].x = f32::NAN;
        pose.0[PoseIndex::LeftWrist as usize].x = f32::INFINITY;
        pose.0[PoseIndex::LeftHip as usize].z = f32::NEG_INFINITY;
        let mut face: Vec<Landmark> = (0..478)
            .map(|i| Landmark::new(0.4 + (i % 20) as f32 * 0.01, 0.1 + (i / 20) as f32 * 0.005, 0.0))
            .collect();
        face[FaceIndex::MouthLeft as usize].y = f32::NAN;
        let mut hand: Vec<Landmark> = (0..HandIndex::COUNT)
            .map(|i| Landmark::new(0.6 + i as f32 * 0.005, 0.5, 0.0))
            .collect();
        hand[HandIndex::Wrist as usize].z = f32::INFINITY;
        LandmarkFrame {
            pose: Some(pose),
            faces: vec![FaceLandmarks(face)],
            hands: vec![HandLandmarks {
                landmarks: hand,
                handedness: Default::default(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_non_finite_points_render_in_every_style() {
        let frame = frame_with_non_finite_points();
        for kind in StyleKind::ALL {
            let rec = render(kind, &frame);
            assert!(
                rec.stroked_lines()
                    .iter()
                    .all(|(a, b, _)| a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()),
                "{kind} stroked a non-finite line"
            );

            let mut avatar = WireframeAvatar::new(kind);
            let mut pixels = crate::render::PixelSurface::new(160, 120);
            for tick in 0..3 {
                avatar.render_frame(&frame, &FrameContext::new(tick as f32 * 0.1), &mut pixels);
            }
        }
    }

    #[test]
    fn test_non_finite_points_drop_their_segments() {
        let frame = frame_with_non_finite_points();
        let projector = Projector::new(640.0, 480.0, ProjectionConfig::default());
        let segs = sorted_segments(frame.pose.as_ref().unwrap(), &projector, 0.3);
        let touching = POSE_CONNECTIONS
            .iter()
            .filter(|(a, b)| {
                [PoseIndex::Nose, PoseIndex::LeftWrist, PoseIndex::LeftHip]
                    .iter()
                    .any(|bad| a == bad || b == bad)
            })
            .count();
        assert_eq!(segs.len(), POSE_CONNECTIONS.len() - touching);
    }

    #[test]
    fn test_neon_joints_skip_low_visibility() {
        let mut pose = pose_at(0.9);
        pose.0[PoseIndex::LeftWrist as usize].visibility = Some(0.1);
        let frame = LandmarkFrame {
            pose: Some(pose),
            ..Default::default()
        };
        let rec = render(StyleKind::Neon, &frame);
        let joints = rec
            .fills()
            .filter(|(s, p)| matches!(s, Shape::Circle { .. }) && matches!(p, crate::render::Paint::Radial { .. }))
            .count();
        assert_eq!(joints, PoseIndex::COUNT - 1);
    }

    #[test]
    fn test_set_style_switches_immediately() {
        let mut avatar = WireframeAvatar::default();
        assert_eq!(avatar.style(), StyleKind::Neon);
        avatar.set_style(StyleKind::Robot);
        assert_eq!(avatar.style(), StyleKind::Robot);
        let frame = LandmarkFrame {
            pose: Some(pose_at(0.9)),
            ..Default::default()
        };
        let mut rec = CommandRecorder::new(640.0, 480.0);
        avatar.render_frame(&frame, &FrameContext::new(0.0), &mut rec);
        assert!(rec.texts().iter().any(|t| t.contains("TRACKING")));
    }
}
