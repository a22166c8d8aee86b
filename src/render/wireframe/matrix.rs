//! 文字で描くスタイルと、背景に流れ続ける文字の雨

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::face::FaceLayout;
use super::style::{Palette, RenderStyle, Segment};
use crate::render::surface::{Color, Glow, Paint, Point, Shape, Surface};

const PALETTE: Palette = Palette {
    background: Color::hex(0x000A00),
    grid: Color::rgba(0, 180, 0, 20),
    head_fill: Color::rgba(0, 80, 0, 31),
    head_stroke: Color::rgba(0, 200, 50, 89),
    face_stroke: Color::rgba(0, 220, 50, 140),
    face_glow: Color::hex(0x00FF44),
    eye_iris: Color::rgba(0, 255, 60, 235),
    eye_glow: Color::hex(0x00DD44),
    hand: Color::hex(0x00FF88),
};

const GLOW: Color = Color::hex(0x00FF44);

pub const GLYPHS: [char; 30] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'a', 'b', 'c',
    'd', 'e', 'f', '#', '@', '$', '%', 'ア', 'カ', 'タ', 'ナ',
];

/// ハッシュ値から 1 文字選ぶ
pub fn glyph(hash: i64) -> char {
    GLYPHS[hash.rem_euclid(GLYPHS.len() as i64) as usize]
}

/// 格子番号。ハッシュの掛け算が溢れない範囲に収める (NaN は 0)
fn cell(v: f32, size: f32) -> i64 {
    (v / size).floor().clamp(-1.0e9, 1.0e9) as i64
}

/// 1 本の骨・口に並べる文字数の上限
const MAX_GLYPH_RUN: usize = 512;

fn draw_glyph(surface: &mut dyn Surface, c: char, at: Point, size: f32, color: Color) {
    let mut buf = [0u8; 4];
    surface.text(c.encode_utf8(&mut buf), at, size, color);
}

/// 雨の一文字
#[derive(Debug, Clone, Copy, PartialEq)]
struct RainCell {
    column: usize,
    row: i32,
    glyph: char,
    bright: bool,
    /// 描かれてからの tick 数
    age: u32,
}

/// 列ごとに文字が落ち続ける背景
///
/// 残像は tick ごとに一定割合で暗くなり、見えなくなったら捨てる。
/// ビューポートの大きさが変わったら作り直す。
#[derive(Debug)]
pub struct GlyphRain {
    width: f32,
    height: f32,
    drops: Vec<i32>,
    trail: Vec<RainCell>,
    rng: StdRng,
}

impl GlyphRain {
    /// 文字の升目 (px)
    pub const CELL: f32 = 13.0;
    /// 1 tick ごとの残像の減衰
    const FADE: f32 = 0.065;
    /// これより暗くなった残像は捨てる
    const MIN_ALPHA: f32 = 0.02;

    pub fn new(width: f32, height: f32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    pub fn with_rng(width: f32, height: f32, rng: StdRng) -> Self {
        let mut rain = Self {
            width: 0.0,
            height: 0.0,
            drops: Vec::new(),
            trail: Vec::new(),
            rng,
        };
        rain.reset(width, height);
        rain
    }

    fn reset(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        let columns = (width / Self::CELL).ceil().max(0.0) as usize;
        let rows = height / Self::CELL;
        self.drops = (0..columns)
            .map(|_| -((self.rng.gen::<f32>() * rows) as i32))
            .collect();
        self.trail.clear();
    }

    pub fn columns(&self) -> usize {
        self.drops.len()
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn alpha(age: u32) -> f32 {
        (1.0 - Self::FADE).powi(age as i32)
    }

    /// 1 コマ進める
    pub fn tick(&mut self, width: f32, height: f32) {
        if (width, height) != (self.width, self.height) {
            self.reset(width, height);
        }
        for c in &mut self.trail {
            c.age += 1;
        }
        self.trail.retain(|c| Self::alpha(c.age) >= Self::MIN_ALPHA);

        for (column, drop) in self.drops.iter_mut().enumerate() {
            let y = *drop as f32 * Self::CELL;
            if y >= 0.0 && y < self.height {
                self.trail.push(RainCell {
                    column,
                    row: *drop,
                    glyph: GLYPHS[self.rng.gen_range(0..GLYPHS.len())],
                    bright: self.rng.gen::<f32>() > 0.88,
                    age: 0,
                });
            }
            *drop += 1;
            if *drop as f32 * Self::CELL > self.height && self.rng.gen::<f32>() > 0.975 {
                *drop = -((self.rng.gen::<f32>() * 10.0) as i32);
            }
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        surface.clear(PALETTE.background);
        for c in &self.trail {
            let fade = Self::alpha(c.age);
            let at = Point::new(c.column as f32 * Self::CELL, c.row as f32 * Self::CELL);
            if c.bright {
                surface.set_glow(Some(Glow::new(Color::hex(0x00FF55), 8.0)));
                draw_glyph(surface, c.glyph, at, Self::CELL, Color::hex(0xBBFFBB).with_alpha(fade));
                surface.set_glow(None);
            } else {
                draw_glyph(surface, c.glyph, at, Self::CELL, Color::rgb(0, 205, 55).with_alpha(0.72 * fade));
            }
        }
    }
}

/// 緑の文字列
#[derive(Debug)]
pub struct Matrix {
    rain: Option<GlyphRain>,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::new()
    }
}

impl Matrix {
    pub fn new() -> Self {
        Self { rain: None }
    }

    pub fn rain(&self) -> Option<&GlyphRain> {
        self.rain.as_ref()
    }

    /// 時間で揺らぐ文字選択用のカウンタ
    fn flicker(time: f32) -> i64 {
        (time * 500.0) as i64
    }
}

impl RenderStyle for Matrix {
    fn palette(&self) -> &Palette {
        &PALETTE
    }

    fn bone_color(&self, d: f32) -> Color {
        Color::from_f32(0.0, 255.0 - d * 70.0, 0.0, 0.85)
    }

    fn bone_glow(&self, _d: f32) -> Color {
        GLOW
    }

    fn bone_width(&self, s: f32) -> f32 {
        (3.0 * s).max(1.5)
    }

    fn joint_color(&self, _d: f32) -> Color {
        Color::rgba(0, 255, 70, 235)
    }

    fn joint_glow(&self, _d: f32) -> Color {
        GLOW
    }

    fn background(&mut self, surface: &mut dyn Surface, _time: f32) {
        let (w, h) = surface.size();
        let rain = self.rain.get_or_insert_with(|| GlyphRain::new(w, h));
        rain.tick(w, h);
        rain.draw(surface);
        surface.fill(&Shape::rect(0.0, 0.0, w, h), &Paint::Solid(Color::rgba(0, 8, 0, 82)));
    }

    /// 骨に沿って 11px ごとに文字を置く
    fn bones(&self, surface: &mut dyn Surface, segs: &[Segment], _time: f32) {
        const STEP: f32 = 11.0;
        surface.set_glow(Some(Glow::new(GLOW, 5.0)));
        for seg in segs {
            let color = self.bone_color(seg.depth());
            let delta = seg.b - seg.a;
            let steps = ((delta.norm() / STEP) as usize).clamp(1, MAX_GLYPH_RUN);
            for k in 0..=steps {
                let p = seg.a + delta * (k as f32 / steps as f32);
                let c = glyph(cell(p.x, STEP) * 31 + cell(p.y, STEP) * 17);
                draw_glyph(surface, c, p - Point::new(4.0, 6.0), 10.0, color);
            }
        }
        surface.set_glow(None);
    }

    fn joint(&self, surface: &mut dyn Surface, at: Point, radius: f32, d: f32, time: f32) {
        let size = (radius * 1.1).max(8.0).floor();
        let offsets = [
            (0.0, 0.0),
            (-radius * 0.8, -radius),
            (radius * 0.5, -radius * 0.7),
            (radius * 0.2, radius * 0.85),
            (-radius * 0.55, radius * 0.5),
        ];
        let t = Self::flicker(time);
        let base = cell(at.x, 10.0) * 31 + cell(at.y, 10.0) * 17;
        surface.set_glow(Some(Glow::new(self.joint_glow(d), 10.0)));
        for (i, (dx, dy)) in offsets.into_iter().enumerate() {
            let c = glyph(base + i as i64 + t);
            let p = at + Point::new(dx - radius * 0.4, dy + radius * 0.4 - size);
            draw_glyph(surface, c, p, size, self.joint_color(d));
        }
    }

    fn face(&self, surface: &mut dyn Surface, layout: &FaceLayout, _time: f32) {
        surface.set_glow(Some(Glow::new(PALETTE.face_glow, 4.0)));
        let last = layout.contour.len().saturating_sub(1);
        for p in layout.contour[..last].iter().flatten() {
            let c = glyph(cell(p.x, 10.0) * 13 + cell(p.y, 10.0) * 7);
            draw_glyph(surface, c, *p - Point::new(4.0, 5.0), 9.0, PALETTE.face_stroke);
        }

        if let Some(eyes) = &layout.eyes {
            surface.set_glow(Some(Glow::new(PALETTE.face_glow, 8.0)));
            for eye in eyes {
                let c = eye.center();
                let ew = eye.half_width();
                for k in 0..5i64 {
                    let g = glyph(cell(c.x, 10.0) * 7 + cell(c.y, 10.0) * 13 + k);
                    let ox = ((k % 3) - 1) as f32 * ew * 0.5;
                    let oy = if k < 3 { -7.0 } else { 4.2 };
                    let color = if k == 0 { Color::hex(0xCCFFCC) } else { PALETTE.eye_iris };
                    draw_glyph(surface, g, c + Point::new(ox - 4.0, oy - 11.0), 11.0, color);
                }
            }
        }

        if let Some(mouth) = &layout.mouth {
            surface.set_glow(Some(Glow::new(PALETTE.face_glow, 4.0)));
            let c = mouth.center();
            let (mw, mh) = (mouth.half_width(), mouth.half_height());
            let steps = ((mw * 0.18) as usize).clamp(3, MAX_GLYPH_RUN);
            let drop = if mh > 4.0 { mh * 0.35 } else { 2.0 };
            for k in 0..=steps {
                let x = mouth.left.x + (mouth.right.x - mouth.left.x) * (k as f32 / steps as f32);
                let g = glyph(cell(x, 10.0) * 11 + cell(c.y, 10.0) * 7);
                draw_glyph(surface, g, Point::new(x - 4.0, c.y + drop - 10.0), 10.0, PALETTE.face_stroke);
            }
        }
        surface.set_glow(None);
    }

    /// 手は骨の始点に 1 文字ずつ
    fn hand(&self, surface: &mut dyn Surface, segments: &[(Point, Point, f32)]) {
        for (a, _, _) in segments {
            let g = glyph(cell(a.x, 10.0) * 11 + cell(a.y, 14.0) * 7);
            draw_glyph(surface, g, *a - Point::new(4.0, 5.0), 9.0, PALETTE.hand);
        }
    }
}
