use std::f32::consts::TAU;

use super::face::{self, FaceLayout};
use super::style::{Palette, RenderStyle, Segment};
use super::Projector;
use crate::landmark::{Landmark, PoseIndex, PoseLandmarks};
use crate::render::surface::{Color, Glow, Paint, Point, Shape, Stroke, Surface};

const PALETTE: Palette = Palette {
    background: Color::hex(0x050515),
    grid: Color::rgba(100, 50, 200, 18),
    head_fill: Color::rgba(120, 60, 220, 20),
    head_stroke: Color::rgba(160, 100, 255, 64),
    face_stroke: Color::rgba(180, 140, 255, 102),
    face_glow: Color::hex(0xAA77FF),
    eye_iris: Color::rgba(200, 160, 255, 224),
    eye_glow: Color::hex(0xCC99FF),
    hand: Color::hex(0xCC99FF),
};

const BONE: Color = Color::rgba(200, 165, 255, 166);
const BONE_HALO: Color = Color::rgba(130, 80, 220, 28);
const JOINT: Color = Color::rgba(220, 195, 255, 224);
/// 破線の流れる速さ (px/秒)
const DASH_SPEED: f32 = 18.0;
const PARTICLES: usize = 3;

/// 脈動する霊体
#[derive(Debug, Default)]
pub struct Ghost;

impl Ghost {
    pub fn new() -> Self {
        Self
    }

    /// 関節ごとに位相のずれた脈動 (0.85..1.15)
    fn pulse(at: Point, time: f32) -> f32 {
        1.0 + 0.15 * (time * 1.8 + at.x * 0.04 + at.y * 0.03).sin()
    }
}

impl RenderStyle for Ghost {
    fn palette(&self) -> &Palette {
        &PALETTE
    }

    fn bone_color(&self, _d: f32) -> Color {
        BONE
    }

    fn bone_glow(&self, _d: f32) -> Color {
        Color::hex(0x9977FF)
    }

    fn bone_width(&self, s: f32) -> f32 {
        (3.0 * s).max(1.5)
    }

    fn joint_color(&self, _d: f32) -> Color {
        JOINT
    }

    fn joint_glow(&self, _d: f32) -> Color {
        Color::hex(0xAA88FF)
    }

    fn aura(&self, surface: &mut dyn Surface, pose: &PoseLandmarks, projector: &Projector) {
        let (Some(shoulder), Some(hip)) = (pose.get(PoseIndex::LeftShoulder), pose.get(PoseIndex::LeftHip)) else {
            return;
        };
        let mid = Landmark::new((shoulder.x + hip.x) / 2.0, (shoulder.y + hip.y) / 2.0, 0.0);
        let center = projector.point(&mid);
        let radius = projector.width.min(projector.height) * 0.38;
        let paint = Paint::radial(
            center,
            radius,
            &[
                (0.0, Color::rgba(100, 50, 200, 26)),
                (0.5, Color::rgba(80, 30, 160, 13)),
                (1.0, Color::rgba(40, 0, 80, 0)),
            ],
        );
        surface.fill(&Shape::circle(center, radius), &paint);
    }

    fn bones(&self, surface: &mut dyn Surface, segs: &[Segment], time: f32) {
        let offset = -time * DASH_SPEED;
        for seg in segs {
            let width = self.bone_width(seg.scale);
            let shape = seg.shape();
            surface.set_glow(None);
            surface.stroke(&shape, &Stroke::new(BONE_HALO, width * 2.8).butt().dashed(10.0, 7.0, offset));
            surface.set_glow(Some(Glow::new(self.bone_glow(seg.depth()), 12.0)));
            surface.stroke(&shape, &Stroke::new(BONE, width).butt().dashed(10.0, 7.0, offset));
        }
        surface.set_glow(None);
    }

    fn joint(&self, surface: &mut dyn Surface, at: Point, radius: f32, d: f32, time: f32) {
        let pulse = Self::pulse(at, time);
        let orb = radius * 2.2 * pulse;
        surface.set_glow(Some(Glow::new(self.joint_glow(d), 28.0)));
        surface.fill(
            &Shape::circle(at, orb),
            &Paint::radial(
                at,
                orb,
                &[
                    (0.0, Color::rgba(235, 215, 255, 230)),
                    (0.35, self.joint_color(d)),
                    (0.72, Color::rgba(120, 70, 210, 46)),
                    (1.0, Color::rgba(70, 20, 160, 0)),
                ],
            ),
        );
        surface.set_glow(None);
        surface.stroke(
            &Shape::circle(at, orb * 1.45),
            &Stroke::new(Color::rgba(180, 130, 255, 0).with_alpha(0.11 * pulse), 1.0),
        );
        for p in 0..PARTICLES {
            let k = p as f32;
            let phase = time * (0.8 + k * 0.28) + k * TAU / 3.0;
            let orbit = radius * (1.9 + k * 0.5);
            let pos = at + Point::new(orbit * phase.cos(), orbit * phase.sin() * 0.6);
            surface.fill(
                &Shape::circle(pos, 1.5),
                &Paint::Solid(Color::rgba(210, 170, 255, 0).with_alpha(0.55 - k * 0.14)),
            );
        }
    }

    fn face(&self, surface: &mut dyn Surface, layout: &FaceLayout, _time: f32) {
        face::contour_lines(surface, layout, &PALETTE, 8.0, Some((4.0, 5.0)));
        face::ellipse_eyes(surface, layout, &PALETTE, 18.0);
        face::lip_curves(surface, layout, &PALETTE, 10.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectionConfig;
    use crate::render::surface::{CommandRecorder, DrawCommand};

    #[test]
    fn test_pulse_range() {
        for i in 0..50 {
            let p = Ghost::pulse(Point::new(i as f32 * 13.0, 40.0), i as f32 * 0.1);
            assert!((0.849..=1.151).contains(&p));
        }
    }

    #[test]
    fn test_bones_are_dashed_and_move() {
        let seg = Segment {
            a: Point::new(0.0, 0.0),
            b: Point::new(100.0, 0.0),
            scale: 1.0,
            z: 0.0,
        };
        let offsets = |time: f32| {
            let mut rec = CommandRecorder::new(200.0, 200.0);
            Ghost::new().bones(&mut rec, &[seg], time);
            rec.commands()
                .iter()
                .filter_map(|c| match c {
                    DrawCommand::Stroke { stroke, .. } => stroke.dash.map(|d| d.offset),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };
        let at0 = offsets(0.0);
        let at1 = offsets(1.0);
        assert_eq!(at0.len(), 2);
        assert_eq!(at1[0], -DASH_SPEED);
        assert_ne!(at0, at1);
    }

    #[test]
    fn test_aura_needs_shoulder_and_hip() {
        let projector = Projector::new(640.0, 480.0, ProjectionConfig::default());
        let mut rec = CommandRecorder::new(640.0, 480.0);
        let short = PoseLandmarks(vec![Landmark::new(0.5, 0.5, 0.0); 12]);
        Ghost::new().aura(&mut rec, &short, &projector);
        assert!(rec.commands().is_empty());

        let full = PoseLandmarks(vec![Landmark::new(0.5, 0.5, 0.0); PoseIndex::COUNT]);
        Ghost::new().aura(&mut rec, &full, &projector);
        assert_eq!(rec.fills().count(), 1);
    }
}
