//! 顔の投影レイアウトと共通の描き方 (輪郭・楕円目・唇)

use super::style::Palette;
use super::Projector;
use crate::landmark::index::{EyeIndices, FACE_OVAL, LEFT_EYE, RIGHT_EYE};
use crate::landmark::{FaceIndex, FaceLandmarks};
use crate::render::surface::{Color, Glow, Paint, Point, Shape, Stroke, Surface};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeLayout {
    pub outer: Point,
    pub inner: Point,
    pub top: Point,
    pub bottom: Point,
}

impl EyeLayout {
    pub fn center(&self) -> Point {
        (self.outer + self.inner) / 2.0
    }

    pub fn half_width(&self) -> f32 {
        (self.outer - self.inner).norm() / 2.0
    }

    /// 1px 未満にはしない
    pub fn half_height(&self) -> f32 {
        ((self.top - self.bottom).norm() / 2.0).max(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouthLayout {
    pub left: Point,
    pub right: Point,
    pub top: Point,
    pub bottom: Point,
}

impl MouthLayout {
    pub fn center(&self) -> Point {
        (self.left + self.right) / 2.0
    }

    pub fn half_width(&self) -> f32 {
        (self.right - self.left).norm() / 2.0
    }

    pub fn half_height(&self) -> f32 {
        (self.top - self.bottom).norm() / 2.0
    }
}

/// 投影済みの顔パーツ。点が欠けたパーツは None
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLayout {
    pub contour: Vec<Option<Point>>,
    pub eyes: Option<[EyeLayout; 2]>,
    pub mouth: Option<MouthLayout>,
}

impl FaceLayout {
    pub fn project(face: &FaceLandmarks, projector: &Projector) -> Self {
        let at = |i: FaceIndex| face.get(i).map(|lm| projector.point(lm));
        let eye = |e: &EyeIndices| {
            Some(EyeLayout {
                outer: at(e.outer)?,
                inner: at(e.inner)?,
                top: at(e.top)?,
                bottom: at(e.bottom)?,
            })
        };
        let eyes = match (eye(&LEFT_EYE), eye(&RIGHT_EYE)) {
            (Some(l), Some(r)) => Some([l, r]),
            _ => None,
        };
        let mouth = (|| {
            Some(MouthLayout {
                left: at(FaceIndex::MouthLeft)?,
                right: at(FaceIndex::MouthRight)?,
                top: at(FaceIndex::UpperLipInner)?,
                bottom: at(FaceIndex::LowerLipInner)?,
            })
        })();
        Self {
            contour: FACE_OVAL
                .iter()
                .map(|&i| face.at(i).map(|lm| projector.point(lm)))
                .collect(),
            eyes,
            mouth,
        }
    }

    /// 両端が揃っている輪郭線分
    pub fn contour_segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.contour.windows(2).filter_map(|w| Some((w[0]?, w[1]?)))
    }
}

pub(super) fn contour_lines(
    surface: &mut dyn Surface,
    layout: &FaceLayout,
    palette: &Palette,
    glow: f32,
    dash: Option<(f32, f32)>,
) {
    let mut stroke = Stroke::new(palette.face_stroke, 0.8);
    if let Some((on, off)) = dash {
        stroke = stroke.dashed(on, off, 0.0);
    }
    surface.set_glow(Some(Glow::new(palette.face_glow, glow)));
    for (a, b) in layout.contour_segments() {
        surface.stroke(&Shape::line(a, b), &stroke);
    }
    surface.set_glow(None);
}

/// 黒目 + 虹彩 + 瞳孔 + ハイライトの楕円目
pub(super) fn ellipse_eyes(surface: &mut dyn Surface, layout: &FaceLayout, palette: &Palette, glow: f32) {
    let Some(eyes) = &layout.eyes else {
        return;
    };
    for eye in eyes {
        let c = eye.center();
        let (ew, eh) = (eye.half_width(), eye.half_height());
        let socket = Shape::ellipse(c, ew, eh);
        surface.fill(&socket, &Paint::Solid(Color::rgba(0, 0, 0, 209)));
        // 閉じかけの目は輪郭だけ
        if eh > 2.0 {
            surface.fill(&Shape::ellipse(c, ew * 0.55, eh * 0.75), &Paint::Solid(palette.eye_iris));
            surface.fill(
                &Shape::circle(c, (ew * 0.28).min(eh * 0.45)),
                &Paint::Solid(Color::rgba(0, 0, 0, 235)),
            );
            surface.fill(
                &Shape::circle(c - Point::new(ew * 0.18, eh * 0.22), (ew * 0.11).min(eh * 0.16)),
                &Paint::Solid(Color::rgba(255, 255, 255, 235)),
            );
        }
        surface.set_glow(Some(Glow::new(palette.eye_glow, glow)));
        surface.stroke(&socket, &Stroke::new(palette.eye_glow, 1.5));
        surface.set_glow(None);
    }
}

/// 上下 2 本のベジェで描く唇。開いていれば口内を塗る
pub(super) fn lip_curves(surface: &mut dyn Surface, layout: &FaceLayout, palette: &Palette, glow: f32) {
    let Some(mouth) = &layout.mouth else {
        return;
    };
    let c = mouth.center();
    let (mw, mh) = (mouth.half_width(), mouth.half_height());
    if mh > 3.0 {
        surface.fill(
            &Shape::ellipse(c, mw * 0.72, mh * 0.85),
            &Paint::Solid(Color::rgba(0, 0, 0, 230)),
        );
    }
    let stroke = Stroke::new(palette.face_stroke, 1.5);
    surface.set_glow(Some(Glow::new(palette.face_glow, glow)));
    for lift in [-0.6, 0.9] {
        surface.stroke(
            &Shape::Cubic {
                from: mouth.left,
                c1: c + Point::new(-mw * 0.3, mh * lift),
                c2: c + Point::new(mw * 0.3, mh * lift),
                to: mouth.right,
            },
            &stroke,
        );
    }
    surface.set_glow(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectionConfig;
    use crate::landmark::Landmark;

    fn approx_eq_f32(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn flat_face() -> FaceLandmarks {
        let mut pts = vec![Landmark::new(0.5, 0.5, 0.0); 468];
        pts[FaceIndex::LeftEyeOuter as usize] = Landmark::new(0.40, 0.40, 0.0);
        pts[FaceIndex::LeftEyeInner as usize] = Landmark::new(0.45, 0.40, 0.0);
        pts[FaceIndex::LeftEyeTop as usize] = Landmark::new(0.425, 0.39, 0.0);
        pts[FaceIndex::LeftEyeBottom as usize] = Landmark::new(0.425, 0.41, 0.0);
        FaceLandmarks(pts)
    }

    #[test]
    fn test_eye_layout_sizes() {
        let projector = Projector::new(1000.0, 1000.0, ProjectionConfig::default());
        let layout = FaceLayout::project(&flat_face(), &projector);
        let [left, right] = layout.eyes.unwrap();
        assert!(approx_eq_f32(left.half_width(), 25.0));
        assert!(approx_eq_f32(left.half_height(), 10.0));
        assert!(approx_eq_f32(left.center().x, 425.0));
        // 右目の点は全部同じ位置
        assert_eq!(right.half_height(), 1.0);
    }

    #[test]
    fn test_short_face_drops_parts() {
        let projector = Projector::new(640.0, 480.0, ProjectionConfig::default());
        let face = FaceLandmarks(vec![Landmark::new(0.5, 0.5, 0.0); 200]);
        let layout = FaceLayout::project(&face, &projector);
        assert!(layout.eyes.is_none());
        assert!(layout.mouth.is_none());
        assert_eq!(layout.contour.len(), FACE_OVAL.len());
        assert!(layout.contour_segments().count() < FACE_OVAL.len() - 1);
    }
}
