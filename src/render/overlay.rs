//! カメラ映像にランドマークをそのまま重ねる表示 (平滑化なし)

use super::skeleton::{HAND_CONNECTIONS, POSE_CONNECTIONS};
use super::surface::{Color, Paint, Point, Shape, Stroke, Surface};
use super::{FrameContext, Renderer};
use crate::geometry::{segment_visible, to_screen};
use crate::landmark::index::{FACE_OVAL, LEFT_BROW, LEFT_EYE_LOOP, LIPS_OUTER, RIGHT_BROW, RIGHT_EYE_LOOP};
use crate::landmark::{FaceLandmarks, Landmark, LandmarkFrame};

const FACE_COLOR: Color = Color::hexa(0xC0C0C040);
const HAND_COLOR: Color = Color::hex(0x00FF88);
const POINT_COLOR: Color = Color::hex(0xFF6B9D);
const POSE_COLOR: Color = Color::hex(0x00AAFF);

const FACE_CONTOURS: [&[usize]; 6] = [
    &FACE_OVAL,
    &LEFT_EYE_LOOP,
    &RIGHT_EYE_LOOP,
    &LIPS_OUTER,
    &LEFT_BROW,
    &RIGHT_BROW,
];

#[derive(Debug, Default)]
pub struct CameraOverlay;

impl CameraOverlay {
    pub fn new() -> Self {
        Self
    }

    fn draw_face(face: &FaceLandmarks, w: f32, h: f32, surface: &mut dyn Surface) {
        let stroke = Stroke::new(FACE_COLOR, 1.0);
        for contour in FACE_CONTOURS {
            // 欠けた点で輪郭を切る
            for run in contour.split(|&i| face.at(i).is_none()) {
                let pts: Vec<Point> = run
                    .iter()
                    .filter_map(|&i| face.at(i))
                    .map(|lm| {
                        let p = to_screen(lm, w, h);
                        Point::new(p.x, p.y)
                    })
                    .collect();
                if pts.len() >= 2 {
                    surface.stroke(&Shape::Polyline(pts), &stroke);
                }
            }
        }
    }

    fn draw_points<'a>(
        points: impl Iterator<Item = &'a Landmark>,
        floor: f32,
        radius: f32,
        w: f32,
        h: f32,
        surface: &mut dyn Surface,
    ) {
        let paint = Paint::Solid(POINT_COLOR);
        for lm in points {
            let p = to_screen(lm, w, h);
            if p.v < floor {
                continue;
            }
            surface.fill(&Shape::circle(Point::new(p.x, p.y), radius), &paint);
        }
    }
}

impl Renderer for CameraOverlay {
    fn name(&self) -> &'static str {
        "overlay"
    }

    fn render_frame(&mut self, frame: &LandmarkFrame, ctx: &FrameContext<'_>, surface: &mut dyn Surface) {
        let (w, h) = surface.size();
        surface.set_glow(None);
        match ctx.video {
            Some(video) => surface.draw_video(video),
            None => surface.clear(Color::BLACK),
        }

        for face in frame.faces.iter().filter(|f| !f.is_empty()) {
            Self::draw_face(face, w, h, surface);
        }

        let hand_stroke = Stroke::new(HAND_COLOR, 4.0);
        for hand in frame.hands() {
            for (a, b) in HAND_CONNECTIONS.iter() {
                let (Some(la), Some(lb)) = (hand.get(*a), hand.get(*b)) else {
                    continue;
                };
                let (pa, pb) = (to_screen(la, w, h), to_screen(lb, w, h));
                surface.stroke(
                    &Shape::line(Point::new(pa.x, pa.y), Point::new(pb.x, pb.y)),
                    &hand_stroke,
                );
            }
            Self::draw_points(hand.iter(), ctx.visibility_floor, 4.0, w, h, surface);
        }

        if let Some(pose) = frame.pose() {
            let pose_stroke = Stroke::new(POSE_COLOR, 3.0);
            for (a, b) in POSE_CONNECTIONS.iter() {
                let (Some(la), Some(lb)) = (pose.get(*a), pose.get(*b)) else {
                    continue;
                };
                if !segment_visible(la, lb, ctx.visibility_floor, 1.0) {
                    continue;
                }
                let (pa, pb) = (to_screen(la, w, h), to_screen(lb, w, h));
                surface.stroke(
                    &Shape::line(Point::new(pa.x, pa.y), Point::new(pb.x, pb.y)),
                    &pose_stroke,
                );
            }
            Self::draw_points(pose.iter(), ctx.visibility_floor, 3.0, w, h, surface);
        }
    }
}
