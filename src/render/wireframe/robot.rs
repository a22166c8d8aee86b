use std::f32::consts::PI;

use super::face::{self, FaceLayout};
use super::style::{Palette, RenderStyle, Segment};
use crate::render::surface::{Color, Glow, Paint, Point, Shape, Stroke, Surface};

const PALETTE: Palette = Palette {
    background: Color::hex(0x0A0800),
    grid: Color::rgba(200, 80, 0, 18),
    head_fill: Color::rgba(80, 30, 0, 38),
    head_stroke: Color::rgba(255, 140, 0, 89),
    face_stroke: Color::rgba(255, 150, 30, 153),
    face_glow: Color::hex(0xFF7700),
    eye_iris: Color::rgba(255, 130, 0, 235),
    eye_glow: Color::hex(0xFF6600),
    hand: Color::hex(0xFFAA00),
};

const GLOW: Color = Color::hex(0xFF8800);
/// 端の四角の一辺
const CAP: f32 = 5.0;
/// バイザーの走査線の速さ (周/秒)
const VISOR_SCAN_RATE: f32 = 0.7;

/// 橙色の計器風
#[derive(Debug, Default)]
pub struct Robot;

impl Robot {
    pub fn new() -> Self {
        Self
    }

    fn visor(&self, surface: &mut dyn Surface, layout: &FaceLayout, time: f32) {
        let Some([left, right]) = &layout.eyes else {
            return;
        };
        let x = left.outer.x;
        let y = (left.top.y + right.top.y) / 2.0 - 1.0;
        let w = (right.outer.x - left.outer.x).max(20.0);
        let h = ((left.bottom.y + right.bottom.y) / 2.0 - y + 3.0).max(9.0);
        let rect = Shape::rect(x, y, w, h);
        surface.fill(&rect, &Paint::Solid(Color::rgba(0, 0, 0, 235)));
        surface.fill(
            &rect,
            &Paint::linear(
                Point::new(x, y),
                Point::new(x, y + h),
                &[
                    (0.0, Color::rgba(255, 80, 0, 15)),
                    (0.5, Color::rgba(255, 120, 0, 56)),
                    (1.0, Color::rgba(255, 80, 0, 13)),
                ],
            ),
        );
        surface.set_glow(Some(Glow::new(PALETTE.eye_glow, 14.0)));
        surface.stroke(&rect, &Stroke::new(PALETTE.eye_glow, 1.5));
        let scan = (time * VISOR_SCAN_RATE).rem_euclid(1.0);
        surface.fill(
            &Shape::rect(x, y + h * scan, w, 1.5),
            &Paint::Solid(Color::rgba(255, 160, 0, 153)),
        );
        surface.set_glow(None);
    }

    fn mouth(&self, surface: &mut dyn Surface, layout: &FaceLayout) {
        let Some(mouth) = &layout.mouth else {
            return;
        };
        let c = mouth.center();
        let (mw, mh) = (mouth.half_width(), mouth.half_height());
        let stroke = Stroke::new(PALETTE.face_stroke, 2.0);
        surface.set_glow(Some(Glow::new(PALETTE.face_glow, 6.0)));
        surface.stroke(
            &Shape::line(Point::new(mouth.left.x, c.y), Point::new(mouth.right.x, c.y)),
            &stroke,
        );
        for x in [mouth.left.x, mouth.right.x] {
            surface.stroke(&Shape::line(Point::new(x, c.y - 5.0), Point::new(x, c.y + 5.0)), &stroke);
        }
        if mh > 5.0 {
            surface.stroke(
                &Shape::rect(c.x - mw * 0.65, c.y - mh * 0.35, mw * 1.3, mh * 0.95),
                &Stroke::new(Color::rgba(255, 120, 0, 102), 1.0),
            );
        }
        surface.set_glow(None);
    }
}

impl RenderStyle for Robot {
    fn palette(&self) -> &Palette {
        &PALETTE
    }

    fn bone_color(&self, d: f32) -> Color {
        Color::from_f32(255.0, 155.0 - d * 75.0, 15.0 + d * 10.0, 1.0)
    }

    fn bone_glow(&self, _d: f32) -> Color {
        GLOW
    }

    fn bone_width(&self, s: f32) -> f32 {
        (4.0 * s).max(2.0)
    }

    fn joint_color(&self, d: f32) -> Color {
        Color::from_f32(255.0, 170.0 - d * 70.0, 20.0, 1.0)
    }

    fn joint_glow(&self, _d: f32) -> Color {
        GLOW
    }

    fn scanlines(&self, surface: &mut dyn Surface, _time: f32) {
        let (w, h) = surface.size();
        let paint = Paint::Solid(Color::rgba(0, 0, 0, 13));
        let mut y = 0.0;
        while y < h {
            surface.fill(&Shape::rect(0.0, y, w, 1.0), &paint);
            y += 4.0;
        }
    }

    /// 影 + 管 + 中心の導線の 3 重線と四角い端
    fn bones(&self, surface: &mut dyn Surface, segs: &[Segment], _time: f32) {
        for seg in segs {
            let d = seg.depth();
            let width = self.bone_width(seg.scale);
            let shape = seg.shape();
            surface.set_glow(None);
            surface.stroke(&shape, &Stroke::new(Color::rgba(0, 0, 0, 224), width + 6.0).butt());
            surface.stroke(&shape, &Stroke::new(Color::rgba(55, 18, 0, 179), width + 2.0).butt());
            surface.set_glow(Some(Glow::new(GLOW, 8.0)));
            surface.stroke(&shape, &Stroke::new(self.bone_color(d), 1.5));
            surface.set_glow(None);
            let cap = Paint::Solid(self.bone_color(d));
            for end in [seg.a, seg.b] {
                surface.fill(&Shape::rect(end.x - CAP / 2.0, end.y - CAP / 2.0, CAP, CAP), &cap);
            }
        }
    }

    /// 六角形 + 内円 + 十字線の照準
    fn joint(&self, surface: &mut dyn Surface, at: Point, radius: f32, d: f32, _time: f32) {
        let hex = Shape::regular(at, radius, 6, -PI / 6.0);
        surface.set_glow(Some(Glow::new(self.joint_glow(d), 14.0)));
        surface.fill(&hex, &Paint::Solid(Color::rgba(8, 4, 0, 235)));
        surface.stroke(&hex, &Stroke::new(self.joint_color(d), 1.5));
        surface.set_glow(None);
        surface.stroke(
            &Shape::circle(at, radius * 0.45),
            &Stroke::new(Color::rgba(255, 160, 0, 128), 0.8),
        );
        let cross = Stroke::new(Color::rgba(255, 140, 0, 56), 0.6);
        let reach = radius * 1.9;
        surface.stroke(
            &Shape::line(at - Point::new(reach, 0.0), at + Point::new(reach, 0.0)),
            &cross,
        );
        surface.stroke(
            &Shape::line(at - Point::new(0.0, reach), at + Point::new(0.0, reach)),
            &cross,
        );
    }

    /// 円の代わりに四隅の括弧と追跡表示
    fn head(&self, surface: &mut dyn Surface, center: Point, radius: f32) {
        let b = radius * 1.45;
        let arm = b * 0.38;
        let stroke = Stroke::new(PALETTE.face_stroke, 1.5);
        surface.set_glow(Some(Glow::new(PALETTE.face_glow, 6.0)));
        for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = center + Point::new(sx * b, sy * b);
            surface.stroke(
                &Shape::Polyline(vec![
                    corner - Point::new(0.0, sy * arm),
                    corner,
                    corner - Point::new(sx * arm, 0.0),
                ]),
                &stroke,
            );
        }
        let label_size = 8.0;
        surface.text(
            "◈ TRACKING",
            Point::new(center.x - b, center.y - b - 6.0 - label_size),
            label_size,
            PALETTE.face_stroke,
        );
        let sys = (center.x * 0.1).max(0.0) as u32;
        surface.text(
            &format!("SYS:{sys:02X}"),
            Point::new(center.x - b, center.y + b + 14.0 - label_size),
            label_size,
            PALETTE.face_stroke,
        );
        surface.set_glow(None);
    }

    fn face(&self, surface: &mut dyn Surface, layout: &FaceLayout, time: f32) {
        face::contour_lines(surface, layout, &PALETTE, 6.0, None);
        self.visor(surface, layout, time);
        self.mouth(surface, layout);
    }
}
