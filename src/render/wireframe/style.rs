use super::face::{self, FaceLayout};
use super::Projector;
use crate::geometry::depth_norm;
use crate::landmark::PoseLandmarks;
use crate::render::surface::{Color, Glow, Paint, Point, Shape, Stroke, Surface};

/// スタイルごとの固定色
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub grid: Color,
    pub head_fill: Color,
    pub head_stroke: Color,
    pub face_stroke: Color,
    pub face_glow: Color,
    pub eye_iris: Color,
    pub eye_glow: Color,
    pub hand: Color,
}

/// 投影済みの骨
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
    /// 始点の奥行きスケール
    pub scale: f32,
    /// 両端の平均深度
    pub z: f32,
}

impl Segment {
    pub fn depth(&self) -> f32 {
        depth_norm(self.z)
    }

    pub fn shape(&self) -> Shape {
        Shape::line(self.a, self.b)
    }
}

/// ワイヤーフレームの描画モチーフ
///
/// 既定実装はネオン系の描き方。スタイルごとに必要なものだけ差し替える。
/// `d` は 0..1 に正規化した深度、`s` は透視スケール。
pub trait RenderStyle {
    fn palette(&self) -> &Palette;

    fn bone_color(&self, d: f32) -> Color;
    fn bone_glow(&self, d: f32) -> Color;
    fn bone_width(&self, s: f32) -> f32;
    fn joint_color(&self, d: f32) -> Color;
    fn joint_glow(&self, d: f32) -> Color;

    /// 関節 1 つ。光彩は呼び出し側で解除される
    fn joint(&self, surface: &mut dyn Surface, at: Point, radius: f32, d: f32, time: f32);

    fn background(&mut self, surface: &mut dyn Surface, _time: f32) {
        surface.clear(self.palette().background);
    }

    /// 画面高さに対する地平線の位置
    fn horizon_ratio(&self) -> f32 {
        0.72
    }

    fn grid_glow(&self) -> Option<Glow> {
        None
    }

    fn scanlines(&self, _surface: &mut dyn Surface, _time: f32) {}

    /// 骨格の後ろに敷く効果
    fn aura(&self, _surface: &mut dyn Surface, _pose: &PoseLandmarks, _projector: &Projector) {}

    fn bones(&self, surface: &mut dyn Surface, segs: &[Segment], _time: f32) {
        for seg in segs {
            let d = seg.depth();
            surface.set_glow(Some(Glow::new(self.bone_glow(d), 14.0)));
            surface.stroke(&seg.shape(), &Stroke::new(self.bone_color(d), self.bone_width(seg.scale)));
        }
        surface.set_glow(None);
    }

    fn head(&self, surface: &mut dyn Surface, center: Point, radius: f32) {
        let palette = self.palette();
        let circle = Shape::circle(center, radius);
        surface.fill(&circle, &Paint::Solid(palette.head_fill));
        surface.set_glow(Some(Glow::new(palette.face_glow, 8.0)));
        surface.stroke(&circle, &Stroke::new(palette.head_stroke, 1.5));
        surface.set_glow(None);
    }

    fn face(&self, surface: &mut dyn Surface, layout: &FaceLayout, _time: f32) {
        let palette = self.palette();
        face::contour_lines(surface, layout, palette, 6.0, None);
        face::ellipse_eyes(surface, layout, palette, 10.0);
        face::lip_curves(surface, layout, palette, 6.0);
    }

    /// 手の骨。光彩は呼び出し側で設定済み
    fn hand(&self, surface: &mut dyn Surface, segments: &[(Point, Point, f32)]) {
        let color = self.palette().hand;
        for (a, b, s) in segments {
            surface.stroke(&Shape::line(*a, *b), &Stroke::new(color, (2.5 * s).max(1.5)));
        }
    }
}

