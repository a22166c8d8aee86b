//! 即時モードの描画サーフェス
//!
//! レンダラーはこの trait にだけ描く。実体はピクセルバッファ (`PixelSurface`) か
//! テスト用の記録器 (`CommandRecorder`)。

use nalgebra::Vector2;
use std::f32::consts::TAU;

pub type Point = Vector2<f32>;

/// 8bit RGBA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// 0xRRGGBB
    pub const fn hex(rgb: u32) -> Self {
        Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// 0xRRGGBBAA
    pub const fn hexa(rgba: u32) -> Self {
        Self::rgba((rgba >> 24) as u8, (rgba >> 16) as u8, (rgba >> 8) as u8, rgba as u8)
    }

    /// 浮動小数の成分から (範囲外は切り詰め)
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        let c = |v: f32| v.clamp(0.0, 255.0) as u8;
        Self::rgba(c(r), c(g), c(b), (a.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// minifb 形式 (0RGB)
    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// グラデーション上の色 (offset 0..1 昇順)
pub type ColorStops = Vec<(f32, Color)>;

fn sample_stops(stops: &[(f32, Color)], t: f32) -> Color {
    let Some(&(first_at, first)) = stops.first() else {
        return Color::TRANSPARENT;
    };
    if t <= first_at {
        return first;
    }
    for pair in stops.windows(2) {
        let (a_at, a) = pair[0];
        let (b_at, b) = pair[1];
        if t <= b_at {
            let span = b_at - a_at;
            let local = if span > 0.0 { (t - a_at) / span } else { 1.0 };
            return a.lerp(b, local);
        }
    }
    stops.last().map_or(first, |&(_, c)| c)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear {
        from: Point,
        to: Point,
        stops: ColorStops,
    },
    Radial {
        center: Point,
        radius: f32,
        stops: ColorStops,
    },
}

impl Paint {
    pub fn linear(from: Point, to: Point, stops: &[(f32, Color)]) -> Self {
        Self::Linear {
            from,
            to,
            stops: stops.to_vec(),
        }
    }

    pub fn radial(center: Point, radius: f32, stops: &[(f32, Color)]) -> Self {
        Self::Radial {
            center,
            radius,
            stops: stops.to_vec(),
        }
    }

    pub fn color_at(&self, p: Point) -> Color {
        match self {
            Self::Solid(c) => *c,
            Self::Linear { from, to, stops } => {
                let axis = to - from;
                let len2 = axis.norm_squared();
                let t = if len2 > 0.0 {
                    (p - from).dot(&axis) / len2
                } else {
                    0.0
                };
                sample_stops(stops, t)
            }
            Self::Radial {
                center,
                radius,
                stops,
            } => {
                let t = if *radius > 0.0 {
                    (p - center).norm() / radius
                } else {
                    1.0
                };
                sample_stops(stops, t)
            }
        }
    }

    /// 代表色 (記録・テスト用)
    pub fn base_color(&self) -> Color {
        match self {
            Self::Solid(c) => *c,
            Self::Linear { stops, .. } | Self::Radial { stops, .. } => {
                stops.first().map_or(Color::TRANSPARENT, |&(_, c)| c)
            }
        }
    }
}

impl From<Color> for Paint {
    fn from(c: Color) -> Self {
        Self::Solid(c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
}

/// 破線 (描画長, 空白長, 開始オフセット)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dash {
    pub on: f32,
    pub off: f32,
    pub offset: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f32,
    pub cap: LineCap,
    pub dash: Option<Dash>,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            paint: Paint::Solid(color),
            width,
            cap: LineCap::Round,
            dash: None,
        }
    }

    pub fn butt(mut self) -> Self {
        self.cap = LineCap::Butt;
        self
    }

    pub fn dashed(mut self, on: f32, off: f32, offset: f32) -> Self {
        self.dash = Some(Dash { on, off, offset });
        self
    }

    pub fn color(&self) -> Color {
        self.paint.base_color()
    }
}

/// 図形の周囲に付けるぼかし光
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub color: Color,
    pub radius: f32,
}

impl Glow {
    pub fn new(color: Color, radius: f32) -> Self {
        Self { color, radius }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line(Point, Point),
    Polyline(Vec<Point>),
    Polygon(Vec<Point>),
    Circle {
        center: Point,
        radius: f32,
    },
    Ellipse {
        center: Point,
        rx: f32,
        ry: f32,
        rotation: f32,
    },
    /// 塗りでは弦で閉じる
    Arc {
        center: Point,
        radius: f32,
        start: f32,
        end: f32,
    },
    Quad {
        from: Point,
        ctrl: Point,
        to: Point,
    },
    Cubic {
        from: Point,
        c1: Point,
        c2: Point,
        to: Point,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
}

const CURVE_STEPS: usize = 16;

fn arc_steps(radius: f32, sweep: f32) -> usize {
    ((radius.abs() * sweep.abs() / 4.0).ceil() as usize).clamp(8, 128)
}

impl Shape {
    pub fn line(a: Point, b: Point) -> Self {
        Self::Line(a, b)
    }

    pub fn circle(center: Point, radius: f32) -> Self {
        Self::Circle { center, radius }
    }

    pub fn ellipse(center: Point, rx: f32, ry: f32) -> Self {
        Self::Ellipse {
            center,
            rx,
            ry,
            rotation: 0.0,
        }
    }

    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::Rect { x, y, w, h }
    }

    /// 正多角形 (最初の頂点の角度 `phase`)
    pub fn regular(center: Point, radius: f32, sides: usize, phase: f32) -> Self {
        let sides = sides.max(3);
        Self::Polygon(
            (0..sides)
                .map(|i| {
                    let a = phase + i as f32 * TAU / sides as f32;
                    center + Point::new(a.cos(), a.sin()) * radius
                })
                .collect(),
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            Self::Polygon(_) | Self::Circle { .. } | Self::Ellipse { .. } | Self::Rect { .. }
        )
    }

    /// 折れ線近似
    pub fn flatten(&self) -> Vec<Point> {
        match self {
            Self::Line(a, b) => vec![*a, *b],
            Self::Polyline(pts) | Self::Polygon(pts) => pts.clone(),
            Self::Circle { center, radius } => {
                let n = arc_steps(*radius, TAU);
                (0..n)
                    .map(|i| {
                        let a = i as f32 * TAU / n as f32;
                        center + Point::new(a.cos(), a.sin()) * *radius
                    })
                    .collect()
            }
            Self::Ellipse {
                center,
                rx,
                ry,
                rotation,
            } => {
                let n = arc_steps(rx.max(*ry), TAU);
                let (sin_r, cos_r) = rotation.sin_cos();
                (0..n)
                    .map(|i| {
                        let a = i as f32 * TAU / n as f32;
                        let (x, y) = (rx * a.cos(), ry * a.sin());
                        center + Point::new(x * cos_r - y * sin_r, x * sin_r + y * cos_r)
                    })
                    .collect()
            }
            Self::Arc {
                center,
                radius,
                start,
                end,
            } => {
                let n = arc_steps(*radius, end - start);
                (0..=n)
                    .map(|i| {
                        let a = start + (end - start) * i as f32 / n as f32;
                        center + Point::new(a.cos(), a.sin()) * *radius
                    })
                    .collect()
            }
            Self::Quad { from, ctrl, to } => (0..=CURVE_STEPS)
                .map(|i| {
                    let t = i as f32 / CURVE_STEPS as f32;
                    let u = 1.0 - t;
                    from * (u * u) + ctrl * (2.0 * u * t) + to * (t * t)
                })
                .collect(),
            Self::Cubic { from, c1, c2, to } => (0..=CURVE_STEPS)
                .map(|i| {
                    let t = i as f32 / CURVE_STEPS as f32;
                    let u = 1.0 - t;
                    from * (u * u * u)
                        + c1 * (3.0 * u * u * t)
                        + c2 * (3.0 * u * t * t)
                        + to * (t * t * t)
                })
                .collect(),
            Self::Rect { x, y, w, h } => vec![
                Point::new(*x, *y),
                Point::new(x + w, *y),
                Point::new(x + w, y + h),
                Point::new(*x, y + h),
            ],
        }
    }
}

/// 映像フレーム (0RGB, 行優先)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoFrame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl VideoFrame {
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            self.pixels.get(y * self.width + x).copied()
        } else {
            None
        }
    }
}

/// 外部が所有する描画先
pub trait Surface {
    fn size(&self) -> (f32, f32);
    fn clear(&mut self, color: Color);
    fn fill(&mut self, shape: &Shape, paint: &Paint);
    fn stroke(&mut self, shape: &Shape, stroke: &Stroke);
    /// 左上 `at` から等幅のブロック文字で描く
    fn text(&mut self, text: &str, at: Point, size: f32, color: Color);
    /// 映像をサーフェス全体に引き伸ばして描く
    fn draw_video(&mut self, frame: &VideoFrame);
    /// 以降の fill/stroke に付ける光彩。None で解除
    fn set_glow(&mut self, glow: Option<Glow>);
}

/// 記録された描画命令
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Fill {
        shape: Shape,
        paint: Paint,
        glow: Option<Glow>,
    },
    Stroke {
        shape: Shape,
        stroke: Stroke,
        glow: Option<Glow>,
    },
    Text {
        text: String,
        at: Point,
        size: f32,
        color: Color,
    },
    Video {
        width: usize,
        height: usize,
    },
}

/// 描画命令を記録するだけのサーフェス
#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    width: f32,
    height: f32,
    glow: Option<Glow>,
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// 線分としてストロークされたもの (始点, 終点, 色)
    pub fn stroked_lines(&self) -> Vec<(Point, Point, Color)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Stroke {
                    shape: Shape::Line(a, b),
                    stroke,
                    ..
                } => Some((*a, *b, stroke.color())),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> impl Iterator<Item = (&Shape, &Paint)> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Fill { shape, paint, .. } => Some((shape, paint)),
            _ => None,
        })
    }
}

impl Surface for CommandRecorder {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill(&mut self, shape: &Shape, paint: &Paint) {
        self.commands.push(DrawCommand::Fill {
            shape: shape.clone(),
            paint: paint.clone(),
            glow: self.glow,
        });
    }

    fn stroke(&mut self, shape: &Shape, stroke: &Stroke) {
        self.commands.push(DrawCommand::Stroke {
            shape: shape.clone(),
            stroke: stroke.clone(),
            glow: self.glow,
        });
    }

    fn text(&mut self, text: &str, at: Point, size: f32, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            size,
            color,
        });
    }

    fn draw_video(&mut self, frame: &VideoFrame) {
        self.commands.push(DrawCommand::Video {
            width: frame.width,
            height: frame.height,
        });
    }

    fn set_glow(&mut self, glow: Option<Glow>) {
        self.glow = glow;
    }
}
