use super::style::{Palette, RenderStyle};
use crate::render::surface::{Color, Glow, Paint, Point, Shape, Surface};

const PALETTE: Palette = Palette {
    background: Color::hex(0x0D0015),
    grid: Color::rgba(255, 0, 220, 51),
    head_fill: Color::rgba(100, 0, 150, 31),
    head_stroke: Color::rgba(255, 50, 255, 97),
    face_stroke: Color::rgba(255, 80, 255, 148),
    face_glow: Color::hex(0xFF00FF),
    eye_iris: Color::rgba(255, 130, 255, 235),
    eye_glow: Color::hex(0xFF55FF),
    hand: Color::hex(0xFF88FF),
};

const GLOW: Color = Color::hex(0xFF00FF);
const HORIZON: f32 = 0.55;
/// 走査線の掃引速度 (画面高さ/秒)
const SWEEP_RATE: f32 = 0.18;
const SUN_STRIPES: usize = 6;

/// 夕日と紫の地平線
#[derive(Debug, Default)]
pub struct Synthwave;

impl Synthwave {
    pub fn new() -> Self {
        Self
    }

    fn sky(&self, surface: &mut dyn Surface, w: f32, h: f32) {
        let horizon = h * HORIZON;
        surface.fill(
            &Shape::rect(0.0, 0.0, w, horizon),
            &Paint::linear(
                Point::new(0.0, 0.0),
                Point::new(0.0, horizon),
                &[
                    (0.0, Color::hex(0x0D0015)),
                    (0.6, Color::hex(0x180025)),
                    (1.0, Color::hex(0x2A0040)),
                ],
            ),
        );

        let sun = Point::new(w / 2.0, horizon * 0.62);
        let r = w.min(h) * 0.10;
        surface.fill(
            &Shape::circle(sun, r),
            &Paint::radial(
                sun,
                r,
                &[
                    (0.0, Color::rgba(255, 230, 120, 255)),
                    (0.35, Color::rgba(255, 80, 190, 242)),
                    (0.72, Color::rgba(180, 0, 255, 166)),
                    (1.0, Color::rgba(90, 0, 180, 0)),
                ],
            ),
        );
        // 下半分を横縞で切り欠く
        let cut = Paint::Solid(PALETTE.background);
        for s in 1..=SUN_STRIPES {
            let sy = sun.y + r * (s as f32 / 7.0);
            let half = (r * r - (sy - sun.y).powi(2)).max(0.0).sqrt();
            surface.fill(&Shape::rect(sun.x - half, sy - 1.5, half * 2.0, 3.0), &cut);
        }

        surface.fill(
            &Shape::rect(0.0, horizon - 22.0, w, 44.0),
            &Paint::linear(
                Point::new(0.0, horizon - 22.0),
                Point::new(0.0, horizon + 22.0),
                &[
                    (0.0, Color::TRANSPARENT),
                    (0.5, Color::rgba(255, 0, 200, 97)),
                    (1.0, Color::TRANSPARENT),
                ],
            ),
        );
    }
}

impl RenderStyle for Synthwave {
    fn palette(&self) -> &Palette {
        &PALETTE
    }

    fn bone_color(&self, d: f32) -> Color {
        Color::from_f32(255.0 - d * 50.0, d * 80.0, 255.0, 1.0)
    }

    fn bone_glow(&self, _d: f32) -> Color {
        GLOW
    }

    fn bone_width(&self, s: f32) -> f32 {
        (4.0 * s).max(2.0)
    }

    fn joint_color(&self, d: f32) -> Color {
        Color::from_f32(255.0, 60.0 + d * 80.0, 255.0, 1.0)
    }

    fn joint_glow(&self, _d: f32) -> Color {
        GLOW
    }

    fn background(&mut self, surface: &mut dyn Surface, _time: f32) {
        let (w, h) = surface.size();
        surface.clear(PALETTE.background);
        self.sky(surface, w, h);
    }

    fn horizon_ratio(&self) -> f32 {
        HORIZON
    }

    fn grid_glow(&self) -> Option<Glow> {
        Some(Glow::new(GLOW, 5.0))
    }

    fn scanlines(&self, surface: &mut dyn Surface, time: f32) {
        let (w, h) = surface.size();
        let line = Paint::Solid(Color::rgba(0, 0, 0, 26));
        let mut y = 0.0;
        while y < h {
            surface.fill(&Shape::rect(0.0, y, w, 1.0), &line);
            y += 3.0;
        }
        if h <= 0.0 {
            return;
        }
        let sweep = (time * SWEEP_RATE * h).rem_euclid(h);
        surface.fill(
            &Shape::rect(0.0, sweep - 35.0, w, 70.0),
            &Paint::linear(
                Point::new(0.0, sweep - 35.0),
                Point::new(0.0, sweep + 35.0),
                &[
                    (0.0, Color::TRANSPARENT),
                    (0.5, Color::rgba(255, 0, 255, 18)),
                    (1.0, Color::TRANSPARENT),
                ],
            ),
        );
    }

    /// 中心が白く縁がマゼンタに溶ける球
    fn joint(&self, surface: &mut dyn Surface, at: Point, radius: f32, d: f32, _time: f32) {
        surface.set_glow(Some(Glow::new(self.joint_glow(d), 18.0)));
        surface.fill(
            &Shape::circle(at, radius),
            &Paint::radial(
                at,
                radius,
                &[
                    (0.0, Color::rgba(255, 240, 255, 255)),
                    (0.45, self.joint_color(d)),
                    (1.0, Color::rgba(120, 0, 200, 90)),
                ],
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::surface::CommandRecorder;

    #[test]
    fn test_sky_has_sun_and_stripes() {
        let mut rec = CommandRecorder::new(400.0, 300.0);
        Synthwave::new().background(&mut rec, 0.0);
        let suns = rec
            .fills()
            .filter(|(s, p)| matches!(s, Shape::Circle { .. }) && matches!(p, Paint::Radial { .. }))
            .count();
        assert_eq!(suns, 1);
        let stripes = rec
            .fills()
            .filter(|(s, p)| matches!(s, Shape::Rect { h, .. } if *h == 3.0) && **p == Paint::Solid(PALETTE.background))
            .count();
        assert_eq!(stripes, SUN_STRIPES);
    }

    #[test]
    fn test_sweep_wraps_around_height() {
        let mut rec = CommandRecorder::new(100.0, 90.0);
        let time = 1.0 / SWEEP_RATE * 1.5;
        Synthwave::new().scanlines(&mut rec, time);
        let sweep = rec.fills().last().and_then(|(s, _)| match s {
            Shape::Rect { y, .. } => Some(*y + 35.0),
            _ => None,
        });
        let y = sweep.unwrap();
        assert!((y - 45.0).abs() < 0.1);
    }

    #[test]
    fn test_ramps() {
        let s = Synthwave::new();
        assert_eq!(s.bone_color(0.0), Color::rgb(255, 0, 255));
        assert_eq!(s.joint_color(1.0), Color::rgb(255, 140, 255));
    }
}
