//! `u32` ピクセルバッファへのソフトウェアラスタライザ

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use super::surface::{Color, Dash, Glow, LineCap, Paint, Point, Shape, Stroke, Surface, VideoFrame};

/// グリフの列数と行数 (3x5 ブロック)
const GLYPH_COLS: usize = 3;
const GLYPH_ROWS: usize = 5;
/// 1 線分あたりの破線周期数の上限
const MAX_DASH_PERIODS: f32 = 10_000.0;

/// スナップショットのファイル名 `vtube-YYYY-MM-DD-HH-MM-SS.png`
pub fn snapshot_file_name(now: DateTime<Local>) -> String {
    format!("vtube-{}.png", now.format("%Y-%m-%d-%H-%M-%S"))
}

/// 3x5 の文字パターン (各行の下位3bit、左が上位)
fn glyph_rows(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '@' => [0b010, 0b101, 0b111, 0b100, 0b011],
        '$' => [0b011, 0b110, 0b010, 0b011, 0b110],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ' ' => [0; 5],
        other => {
            // カナや記号は文字コードから決まる模様で代用
            let h = (other as u32).wrapping_mul(2_654_435_761) >> 17;
            let mut rows = [0u8; 5];
            for (i, row) in rows.iter_mut().enumerate() {
                *row = ((h >> (i * 3)) & 0b111) as u8;
            }
            rows[0] |= 0b010;
            rows
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> (f32, f32) {
    let ab = b - a;
    let len2 = ab.norm_squared();
    let t = if len2 > 0.0 {
        (p - a).dot(&ab) / len2
    } else {
        0.0
    };
    let closest = a + ab * t.clamp(0.0, 1.0);
    ((p - closest).norm(), t)
}

/// 破線パターンで折れ線を分割する
fn apply_dash(points: &[Point], dash: &Dash) -> Vec<Vec<Point>> {
    let period = dash.on + dash.off;
    if dash.on <= 0.0 || period <= 0.0 || !period.is_finite() {
        return vec![points.to_vec()];
    }
    let mut runs = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut phase = dash.offset.rem_euclid(period);

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = (b - a).norm();
        if !len.is_finite() || len / period > MAX_DASH_PERIODS {
            if current.len() > 1 {
                runs.push(std::mem::take(&mut current));
            }
            current.clear();
            // 画面をはるかに超える線分は破線にせず実線で渡す
            if len.is_finite() {
                runs.push(vec![a, b]);
            }
            continue;
        }
        let mut walked = 0.0;
        while walked < len {
            let drawing = phase < dash.on;
            let left_in_phase = if drawing { dash.on - phase } else { period - phase };
            let step = left_in_phase.min(len - walked);
            let p0 = a + (b - a) * (walked / len);
            let p1 = a + (b - a) * ((walked + step) / len);
            if drawing {
                if current.is_empty() {
                    current.push(p0);
                }
                current.push(p1);
            } else if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            walked += step;
            phase = (phase + step) % period;
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}

/// RGB ピクセルバッファ
pub struct PixelSurface {
    width: usize,
    height: usize,
    buffer: Vec<u32>,
    glow: Option<Glow>,
}

impl PixelSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![0u32; width * height],
            glow: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.buffer[y * self.width + x])
        } else {
            None
        }
    }

    /// サイズ変更 (内容は黒で初期化)
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.buffer = vec![0u32; width * height];
    }

    /// 左右反転済みのバッファを `out` へ
    pub fn mirrored_into(&self, out: &mut Vec<u32>) {
        out.clear();
        out.reserve(self.buffer.len());
        for row in self.buffer.chunks(self.width.max(1)) {
            out.extend(row.iter().rev());
        }
    }

    pub fn to_image(&self, mirror: bool) -> image::RgbImage {
        let w = self.width;
        image::RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let sx = if mirror { w - 1 - x as usize } else { x as usize };
            let px = self.buffer[y as usize * w + sx];
            image::Rgb([(px >> 16) as u8, (px >> 8) as u8, px as u8])
        })
    }

    /// PNG として保存し、保存先パスを返す
    pub fn save_snapshot(&self, dir: &Path, mirror: bool) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create snapshot dir: {}", dir.display()))?;
        let path = dir.join(snapshot_file_name(Local::now()));
        self.to_image(mirror)
            .save(&path)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
        Ok(path)
    }

    /// ピクセルにアルファ合成（境界チェック付き）
    fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let alpha = color.alpha() * coverage;
        if alpha <= 0.0 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if alpha >= 1.0 {
            self.buffer[idx] = color.to_u32();
            return;
        }
        let dst = self.buffer[idx];
        let mix = |src: u8, shift: u32| {
            let d = ((dst >> shift) & 0xFF) as f32;
            (d + (src as f32 - d) * alpha).round() as u32
        };
        self.buffer[idx] = (mix(color.r, 16) << 16) | (mix(color.g, 8) << 8) | mix(color.b, 0);
    }

    /// 偶奇規則のスキャンライン塗りつぶし
    fn fill_polygon(&mut self, points: &[Point], paint: &Paint) {
        if points.len() < 3 {
            return;
        }
        let (min_y, max_y) = points
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        let y0 = (min_y.floor() as i32).max(0);
        let y1 = (max_y.ceil() as i32).min(self.height as i32 - 1);

        let mut crossings: Vec<f32> = Vec::new();
        for y in y0..=y1 {
            let sy = y as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let a = points[i];
                let b = points[(i + 1) % points.len()];
                if (a.y <= sy && b.y > sy) || (b.y <= sy && a.y > sy) {
                    crossings.push(a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for span in crossings.chunks(2) {
                let [left, right] = span else {
                    continue;
                };
                let x0 = ((left - 0.5).ceil() as i32).max(0);
                let x1 = ((right - 0.5).floor() as i32).min(self.width as i32 - 1);
                for x in x0..=x1 {
                    let color = paint.color_at(Point::new(x as f32 + 0.5, sy));
                    self.blend_pixel(x, y, color, 1.0);
                }
            }
        }
    }

    /// 太さのある線分 (カプセル)
    fn draw_segment(&mut self, a: Point, b: Point, stroke: &Stroke) {
        // 細線でも途切れないよう最低幅を確保し、その分だけ薄くする
        let half = (stroke.width / 2.0).max(0.75);
        let coverage = stroke.width.clamp(0.0, 1.0).max(0.3);
        let x0 = (a.x.min(b.x) - half).floor() as i32;
        let x1 = (a.x.max(b.x) + half).ceil() as i32;
        let y0 = (a.y.min(b.y) - half).floor() as i32;
        let y1 = (a.y.max(b.y) + half).ceil() as i32;

        for y in y0.max(0)..=y1.min(self.height as i32 - 1) {
            for x in x0.max(0)..=x1.min(self.width as i32 - 1) {
                let p = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let (dist, t) = distance_to_segment(p, a, b);
                if dist > half {
                    continue;
                }
                if stroke.cap == LineCap::Butt && !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let color = stroke.paint.color_at(p);
                self.blend_pixel(x, y, color, coverage);
            }
        }
    }

    fn stroke_points(&mut self, points: &[Point], stroke: &Stroke) {
        if points.len() == 1 {
            self.draw_segment(points[0], points[0], stroke);
            return;
        }
        let runs = match &stroke.dash {
            Some(dash) => apply_dash(points, dash),
            None => vec![points.to_vec()],
        };
        for run in runs {
            for pair in run.windows(2) {
                self.draw_segment(pair[0], pair[1], stroke);
            }
        }
    }

    fn outline(shape: &Shape) -> Vec<Point> {
        let mut points = shape.flatten();
        if shape.is_closed() {
            if let Some(&first) = points.first() {
                points.push(first);
            }
        }
        points
    }

    /// 光彩は輪郭を太く薄く重ねて近似する
    fn draw_glow(&mut self, outline: &[Point], base_width: f32) {
        let Some(glow) = self.glow else {
            return;
        };
        if glow.radius <= 0.0 || glow.color.a == 0 {
            return;
        }
        for k in (1..=3).rev() {
            let spread = glow.radius * k as f32 / 3.0;
            let halo = Stroke::new(glow.color.with_alpha(glow.color.alpha() * 0.18), base_width + spread * 2.0);
            self.stroke_points(outline, &halo);
        }
    }
}

impl Surface for PixelSurface {
    fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    fn clear(&mut self, color: Color) {
        self.buffer.fill(color.to_u32());
    }

    fn fill(&mut self, shape: &Shape, paint: &Paint) {
        let points = shape.flatten();
        if self.glow.is_some() {
            let outline = Self::outline(shape);
            self.draw_glow(&outline, 0.0);
        }
        self.fill_polygon(&points, paint);
    }

    fn stroke(&mut self, shape: &Shape, stroke: &Stroke) {
        let outline = Self::outline(shape);
        self.draw_glow(&outline, stroke.width);
        self.stroke_points(&outline, stroke);
    }

    fn text(&mut self, text: &str, at: Point, size: f32, color: Color) {
        let cell = (size / GLYPH_ROWS as f32).max(1.0);
        let advance = cell * (GLYPH_COLS + 1) as f32;
        for (i, c) in text.chars().enumerate() {
            let rows = glyph_rows(c);
            let ox = at.x + i as f32 * advance;
            for (ry, row) in rows.iter().enumerate() {
                for cx in 0..GLYPH_COLS {
                    if row & (0b100u8 >> cx) == 0 {
                        continue;
                    }
                    let x = ox + cx as f32 * cell;
                    let y = at.y + ry as f32 * cell;
                    let block = Shape::rect(x, y, cell, cell);
                    self.fill_polygon(&block.flatten(), &Paint::Solid(color));
                }
            }
        }
    }

    fn draw_video(&mut self, frame: &VideoFrame) {
        if frame.width == 0 || frame.height == 0 {
            return;
        }
        for y in 0..self.height {
            let sy = y * frame.height / self.height.max(1);
            for x in 0..self.width {
                let sx = x * frame.width / self.width.max(1);
                if let Some(px) = frame.pixel(sx, sy) {
                    self.buffer[y * self.width + x] = px;
                }
            }
        }
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.glow = glow;
    }
}
