use super::style::{Palette, RenderStyle};
use crate::render::surface::{Color, Glow, Paint, Point, Shape, Surface};

const PALETTE: Palette = Palette {
    background: Color::hex(0x050510),
    grid: Color::rgba(0, 80, 180, 31),
    head_fill: Color::rgba(40, 120, 220, 26),
    head_stroke: Color::rgba(80, 200, 255, 97),
    face_stroke: Color::rgba(80, 200, 255, 128),
    face_glow: Color::hex(0x00CCFF),
    eye_iris: Color::hex(0x00CCFF),
    eye_glow: Color::hex(0x00AAFF),
    hand: Color::hex(0x00FF88),
};

/// 深度で青緑からくすんだ紫へ変わる発光線
#[derive(Debug, Default)]
pub struct Neon;

impl Neon {
    pub fn new() -> Self {
        Self
    }
}

impl RenderStyle for Neon {
    fn palette(&self) -> &Palette {
        &PALETTE
    }

    fn bone_color(&self, d: f32) -> Color {
        Color::from_f32(d * 80.0, 255.0 - d * 120.0, 220.0 - d * 60.0, 1.0)
    }

    fn bone_glow(&self, d: f32) -> Color {
        self.bone_color(d)
    }

    fn bone_width(&self, s: f32) -> f32 {
        (4.0 * s).max(2.0)
    }

    fn joint_color(&self, d: f32) -> Color {
        Color::from_f32(d * 100.0, 255.0, 255.0 - d * 100.0, 1.0)
    }

    fn joint_glow(&self, d: f32) -> Color {
        self.bone_color(d)
    }

    fn joint(&self, surface: &mut dyn Surface, at: Point, radius: f32, d: f32, _time: f32) {
        surface.set_glow(Some(Glow::new(self.joint_glow(d), 20.0)));
        // ハイライトを左上にずらした球
        let paint = Paint::radial(
            at - Point::new(radius * 0.3, radius * 0.3),
            radius,
            &[
                (0.0, Color::WHITE),
                (0.4, self.joint_color(d)),
                (1.0, Color::from_f32(d * 100.0, 200.0 - d * 80.0, 0.0, 0.5)),
            ],
        );
        surface.fill(&Shape::circle(at, radius), &paint);
    }
}
