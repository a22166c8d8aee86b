//! 2D カートゥーンアバター
//!
//! 状態を持たず、毎フレームその時点のランドマークから描き直す。

use std::f32::consts::PI;

use super::skeleton::HAND_CONNECTIONS;
use super::surface::{Color, Paint, Point, Shape, Stroke, Surface};
use super::{FrameContext, Renderer};
use crate::geometry::{eye_openness, segment_visible, to_screen, ScreenPoint};
use crate::landmark::index::{EyeIndices, LEFT_BROW, LEFT_EYE, RIGHT_BROW, RIGHT_EYE};
use crate::landmark::{FaceIndex, FaceLandmarks, HandLandmarks, LandmarkFrame, PoseIndex, PoseLandmarks};

/// 配色
mod palette {
    use super::Color;

    pub const BACKGROUND: Color = Color::hex(0x0D0D1A);
    pub const SKIN: Color = Color::hex(0xFFD4B4);
    pub const SKIN_DARK: Color = Color::hex(0xD4956A);
    pub const HAIR: Color = Color::hex(0x2C1810);
    pub const SHIRT: Color = Color::hex(0x4A90D9);
    pub const SHIRT_DARK: Color = Color::hex(0x2E6CAF);
    pub const PANTS: Color = Color::hex(0x5C4FCF);
    pub const PANTS_DARK: Color = Color::hex(0x3E35A0);
    pub const OUTLINE: Color = Color::hex(0x1A1A3E);
    pub const EYE_WHITE: Color = Color::hex(0xFFFFFF);
    pub const EYE_IRIS: Color = Color::hex(0x4A90D9);
    pub const EYE_PUPIL: Color = Color::hex(0x1A1A2E);
    pub const MOUTH: Color = Color::hex(0xE8747C);
    pub const MOUTH_INSIDE: Color = Color::hex(0x3D0010);
    pub const BLUSH: Color = Color::rgba(255, 150, 150, 77);
    pub const NOSE: Color = Color::rgba(180, 120, 100, 115);
    pub const SHADOW: Color = Color::rgba(0, 0, 0, 64);
}

/// 頭の最小半径 (px)
const MIN_HEAD_RADIUS: f32 = 35.0;
/// 口がこれより開いていたら口内を描く (px)
const MOUTH_OPEN_PX: f32 = 4.0;

fn pt(p: &ScreenPoint) -> Point {
    Point::new(p.x, p.y)
}

#[derive(Debug, Default)]
pub struct CartoonAvatar;

struct Canvas<'s> {
    surface: &'s mut dyn Surface,
    w: f32,
    h: f32,
    floor: f32,
}

impl Canvas<'_> {
    fn screen(&self, pose: &PoseLandmarks, idx: PoseIndex) -> Option<ScreenPoint> {
        pose.get(idx).map(|lm| to_screen(lm, self.w, self.h))
    }

    fn face_point(&self, face: &FaceLandmarks, idx: usize) -> Option<Point> {
        face.at(idx).map(|lm| pt(&to_screen(lm, self.w, self.h)))
    }

    /// 両端の信頼度が下限以上のときだけ線分を描く
    fn segment(&mut self, pose: &PoseLandmarks, a: PoseIndex, b: PoseIndex, color: Color, width: f32) {
        let (Some(la), Some(lb)) = (pose.get(a), pose.get(b)) else {
            return;
        };
        if !segment_visible(la, lb, self.floor, 1.0) {
            return;
        }
        let (pa, pb) = (to_screen(la, self.w, self.h), to_screen(lb, self.w, self.h));
        self.surface
            .stroke(&Shape::line(pt(&pa), pt(&pb)), &Stroke::new(color, width));
    }

    fn torso(&mut self, pose: &PoseLandmarks) {
        let corners = [
            PoseIndex::LeftShoulder,
            PoseIndex::RightShoulder,
            PoseIndex::RightHip,
            PoseIndex::LeftHip,
        ]
        .map(|i| self.screen(pose, i));
        let [Some(ls), Some(rs), Some(rh), Some(lh)] = corners else {
            return;
        };
        if [ls, rs, rh, lh].iter().any(|p| p.v <= self.floor) {
            return;
        }
        let quad = Shape::Polygon(vec![pt(&ls), pt(&rs), pt(&rh), pt(&lh)]);
        let paint = Paint::linear(
            Point::new((ls.x + rs.x) / 2.0, ls.y),
            Point::new((lh.x + rh.x) / 2.0, lh.y),
            &[(0.0, palette::SHIRT), (1.0, palette::SHIRT_DARK)],
        );
        self.surface.fill(&quad, &paint);
        self.surface.stroke(&quad, &Stroke::new(palette::OUTLINE, 2.0));
    }

    fn neck(&mut self, pose: &PoseLandmarks) {
        let (Some(ls), Some(rs), Some(nose)) = (
            self.screen(pose, PoseIndex::LeftShoulder),
            self.screen(pose, PoseIndex::RightShoulder),
            self.screen(pose, PoseIndex::Nose),
        ) else {
            return;
        };
        if ls.v <= self.floor || rs.v <= self.floor {
            return;
        }
        let base = Point::new((ls.x + rs.x) / 2.0, (ls.y + rs.y) / 2.0);
        self.surface
            .stroke(&Shape::line(base, pt(&nose)), &Stroke::new(palette::SKIN, 14.0));
    }

    /// 頭を描いて (中心, 半径) を返す
    fn head(&mut self, pose: &PoseLandmarks) -> Option<(Point, f32)> {
        let nose = self.screen(pose, PoseIndex::Nose)?;
        let ear_distance = match (
            self.screen(pose, PoseIndex::LeftEar),
            self.screen(pose, PoseIndex::RightEar),
        ) {
            (Some(le), Some(re)) => le.distance(&re),
            _ => 0.0,
        };
        let r = (ear_distance * 0.65).max(MIN_HEAD_RADIUS);
        let c = pt(&nose);

        self.surface.fill(
            &Shape::circle(c + Point::new(3.0, 3.0), r),
            &Paint::Solid(palette::SHADOW),
        );
        let face = Shape::circle(c, r);
        self.surface.fill(&face, &Paint::Solid(palette::SKIN));
        self.surface.stroke(&face, &Stroke::new(palette::SKIN_DARK, 2.0));

        let hair = Paint::Solid(palette::HAIR);
        // 上半分を髪で覆う
        self.surface.fill(
            &Shape::Arc {
                center: c,
                radius: r,
                start: PI,
                end: 2.0 * PI,
            },
            &hair,
        );
        self.surface
            .fill(&Shape::ellipse(c - Point::new(0.0, r * 0.35), r * 0.65, r * 0.45), &hair);
        for (side, tilt) in [(-1.0, -0.3), (1.0, 0.3)] {
            self.surface.fill(
                &Shape::Ellipse {
                    center: c + Point::new(side * r * 0.85, r * 0.1),
                    rx: r * 0.15,
                    ry: r * 0.45,
                    rotation: tilt,
                },
                &hair,
            );
        }
        Some((c, r))
    }

    fn eyebrows(&mut self, face: &FaceLandmarks) {
        let stroke = Stroke::new(palette::HAIR, 3.5);
        for brow in [LEFT_BROW, RIGHT_BROW] {
            let pts: Option<Vec<Point>> = brow.iter().map(|&i| self.face_point(face, i)).collect();
            let Some(pts) = pts else {
                continue;
            };
            // 各点を制御点にした2次曲線で中点を結ぶ
            let mut path = vec![pts[0]];
            let mut from = pts[0];
            for pair in pts.windows(2) {
                let mid = (pair[0] + pair[1]) / 2.0;
                path.extend(
                    Shape::Quad {
                        from,
                        ctrl: pair[0],
                        to: mid,
                    }
                    .flatten()
                    .into_iter()
                    .skip(1),
                );
                from = mid;
            }
            path.push(pts[pts.len() - 1]);
            self.surface.stroke(&Shape::Polyline(path), &stroke);
        }
    }

    fn eye_openness(&self, face: &FaceLandmarks, eye: &EyeIndices) -> f32 {
        let get = |i: FaceIndex| self.face_point(face, i as usize);
        match (get(eye.top), get(eye.bottom), get(eye.outer), get(eye.inner)) {
            (Some(t), Some(b), Some(o), Some(i)) => eye_openness((t - b).norm(), (o - i).norm()),
            _ => 1.0,
        }
    }

    fn anime_eye(&mut self, c: Point, ew: f32, eh: f32) {
        // 閉じている
        if eh < 1.0 {
            return;
        }
        let white = Shape::ellipse(c, ew, eh);
        self.surface.fill(&white, &Paint::Solid(palette::EYE_WHITE));
        self.surface
            .fill(&Shape::ellipse(c, ew * 0.65, eh * 0.65), &Paint::Solid(palette::EYE_IRIS));
        self.surface
            .fill(&Shape::ellipse(c, ew * 0.32, eh * 0.32), &Paint::Solid(palette::EYE_PUPIL));
        self.surface.fill(
            &Shape::circle(c - Point::new(ew * 0.22, eh * 0.22), ew * 0.14),
            &Paint::Solid(Color::WHITE),
        );
        self.surface.stroke(&white, &Stroke::new(palette::EYE_PUPIL, 1.5));
        self.surface.stroke(
            &Shape::Quad {
                from: c - Point::new(ew, 0.0),
                ctrl: c - Point::new(0.0, eh * 1.4),
                to: c + Point::new(ew, 0.0),
            },
            &Stroke::new(palette::EYE_PUPIL, 2.0),
        );
    }

    fn face_features(&mut self, face: &FaceLandmarks) {
        let corner = |s: &Self, i: FaceIndex| s.face_point(face, i as usize);
        let eyes = (
            corner(self, LEFT_EYE.outer),
            corner(self, LEFT_EYE.inner),
            corner(self, RIGHT_EYE.outer),
            corner(self, RIGHT_EYE.inner),
        );
        if let (Some(lo), Some(li), Some(ro), Some(ri)) = eyes {
            let left = (lo + li) / 2.0;
            let right = (ro + ri) / 2.0;
            let ew = (lo.x - li.x).abs() * 0.65;
            let eh = ew * 0.55;

            let l_open = self.eye_openness(face, &LEFT_EYE);
            let r_open = self.eye_openness(face, &RIGHT_EYE);
            self.anime_eye(left, ew, eh * l_open);
            self.anime_eye(right, ew, eh * r_open);

            let blush = Paint::Solid(palette::BLUSH);
            for c in [
                left + Point::new(-ew * 0.3, eh * 2.5),
                right + Point::new(ew * 0.3, eh * 2.5),
            ] {
                self.surface.fill(&Shape::ellipse(c, ew * 0.7, eh * 0.5), &blush);
            }
        }

        let mouth = (
            corner(self, FaceIndex::MouthLeft),
            corner(self, FaceIndex::MouthRight),
            corner(self, FaceIndex::UpperLipInner),
            corner(self, FaceIndex::LowerLipInner),
        );
        if let (Some(ml), Some(mr), Some(mt), Some(mb)) = mouth {
            let c = (ml + mr) / 2.0;
            let mw = (mr.x - ml.x).abs();
            let mh = (mb.y - mt.y).abs();
            if mh > MOUTH_OPEN_PX {
                self.surface.fill(
                    &Shape::ellipse(c, mw * 0.4, mh * 0.6),
                    &Paint::Solid(palette::MOUTH_INSIDE),
                );
            }
            self.surface.stroke(
                &Shape::Cubic {
                    from: ml,
                    c1: c + Point::new(-mw * 0.1, mw * 0.12),
                    c2: c + Point::new(mw * 0.1, mw * 0.12),
                    to: mr,
                },
                &Stroke::new(palette::MOUTH, 2.0),
            );
        }
    }

    fn nose(&mut self, face: &FaceLandmarks) {
        let get = |i: FaceIndex| self.face_point(face, i as usize);
        let (Some(bridge), Some(tip), Some(ln), Some(rn)) = (
            get(FaceIndex::NoseBridge),
            get(FaceIndex::NoseTip),
            get(FaceIndex::LeftNostril),
            get(FaceIndex::RightNostril),
        ) else {
            return;
        };
        let stroke = Stroke::new(palette::NOSE, 1.5);
        self.surface.stroke(&Shape::line(bridge, tip), &stroke);
        for (nostril, dx) in [(ln, -2.0), (rn, 2.0)] {
            self.surface.stroke(
                &Shape::Quad {
                    from: tip,
                    ctrl: nostril,
                    to: nostril + Point::new(dx, 3.0),
                },
                &stroke,
            );
        }
    }

    /// 顔が検出されていないときの点目
    fn simple_eyes(&mut self, c: Point, r: f32) {
        for dx in [-r * 0.32, r * 0.32] {
            let er = r * 0.12;
            let eye = c + Point::new(dx, -r * 0.1);
            self.surface
                .fill(&Shape::circle(eye, er), &Paint::Solid(palette::EYE_PUPIL));
            self.surface.fill(
                &Shape::circle(eye - Point::new(er * 0.3, er * 0.3), er * 0.3),
                &Paint::Solid(Color::WHITE),
            );
        }
    }

    fn hand(&mut self, hand: &HandLandmarks) {
        let bone = Stroke::new(palette::SKIN, 6.0);
        for (a, b) in HAND_CONNECTIONS.iter() {
            let (Some(la), Some(lb)) = (hand.get(*a), hand.get(*b)) else {
                continue;
            };
            let (pa, pb) = (to_screen(la, self.w, self.h), to_screen(lb, self.w, self.h));
            self.surface.stroke(&Shape::line(pt(&pa), pt(&pb)), &bone);
        }
        let joint = Paint::Solid(palette::SKIN_DARK);
        for lm in &hand.landmarks {
            let p = to_screen(lm, self.w, self.h);
            self.surface.fill(&Shape::circle(pt(&p), 4.0), &joint);
        }
    }
}

impl CartoonAvatar {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for CartoonAvatar {
    fn name(&self) -> &'static str {
        "2d"
    }

    fn render_frame(&mut self, frame: &LandmarkFrame, ctx: &FrameContext<'_>, surface: &mut dyn Surface) {
        let (w, h) = surface.size();
        surface.set_glow(None);
        surface.clear(palette::BACKGROUND);
        let Some(pose) = frame.pose() else {
            return;
        };
        let mut canvas = Canvas {
            surface,
            w,
            h,
            floor: ctx.visibility_floor,
        };

        use PoseIndex::*;
        canvas.segment(pose, LeftHip, LeftKnee, palette::PANTS, 22.0);
        canvas.segment(pose, LeftKnee, LeftAnkle, palette::PANTS_DARK, 18.0);
        canvas.segment(pose, RightHip, RightKnee, palette::PANTS, 22.0);
        canvas.segment(pose, RightKnee, RightAnkle, palette::PANTS_DARK, 18.0);

        canvas.torso(pose);

        canvas.segment(pose, LeftShoulder, LeftElbow, palette::SHIRT, 18.0);
        canvas.segment(pose, LeftElbow, LeftWrist, palette::SKIN, 14.0);
        canvas.segment(pose, RightShoulder, RightElbow, palette::SHIRT, 18.0);
        canvas.segment(pose, RightElbow, RightWrist, palette::SKIN, 14.0);

        canvas.neck(pose);

        if let Some((center, radius)) = canvas.head(pose) {
            match frame.face() {
                Some(face) => {
                    canvas.eyebrows(face);
                    canvas.face_features(face);
                    canvas.nose(face);
                }
                None => canvas.simple_eyes(center, radius),
            }
        }

        for hand in frame.hands() {
            canvas.hand(hand);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;
    use crate::render::surface::{CommandRecorder, DrawCommand};

    fn standing_pose(vis: f32) -> PoseLandmarks {
        let mut pts = vec![Landmark::with_visibility(0.5, 0.5, 0.0, vis); PoseIndex::COUNT];
        let mut set = |i: PoseIndex, x: f32, y: f32| pts[i as usize] = Landmark::with_visibility(x, y, 0.0, vis);
        set(PoseIndex::Nose, 0.5, 0.2);
        set(PoseIndex::LeftEar, 0.52, 0.2);
        set(PoseIndex::RightEar, 0.48, 0.2);
        set(PoseIndex::LeftShoulder, 0.6, 0.35);
        set(PoseIndex::RightShoulder, 0.4, 0.35);
        set(PoseIndex::LeftElbow, 0.65, 0.5);
        set(PoseIndex::RightElbow, 0.35, 0.5);
        set(PoseIndex::LeftWrist, 0.66, 0.62);
        set(PoseIndex::RightWrist, 0.34, 0.62);
        set(PoseIndex::LeftHip, 0.57, 0.62);
        set(PoseIndex::RightHip, 0.43, 0.62);
        set(PoseIndex::LeftKnee, 0.57, 0.78);
        set(PoseIndex::RightKnee, 0.43, 0.78);
        set(PoseIndex::LeftAnkle, 0.57, 0.94);
        set(PoseIndex::RightAnkle, 0.43, 0.94);
        PoseLandmarks(pts)
    }

    fn render(frame: &LandmarkFrame) -> CommandRecorder {
        let mut rec = CommandRecorder::new(640.0, 480.0);
        CartoonAvatar::new().render_frame(frame, &FrameContext::new(0.0), &mut rec);
        rec
    }

    #[test]
    fn test_no_pose_only_clears() {
        let rec = render(&LandmarkFrame::default());
        assert_eq!(rec.commands(), &[DrawCommand::Clear(palette::BACKGROUND)]);
    }

    #[test]
    fn test_pose_only_uses_simple_eyes() {
        let frame = LandmarkFrame {
            pose: Some(standing_pose(0.9)),
            ..Default::default()
        };
        let rec = render(&frame);
        // 脚4 + 腕4 + 首
        assert_eq!(rec.stroked_lines().len(), 9);
        let torso = rec.fills().any(|(s, p)| matches!(s, Shape::Polygon(v) if v.len() == 4) && matches!(p, Paint::Linear { .. }));
        assert!(torso);
        let pupils = rec
            .fills()
            .filter(|(s, p)| matches!(s, Shape::Circle { .. }) && p.base_color() == palette::EYE_PUPIL)
            .count();
        assert_eq!(pupils, 2);
    }

    #[test]
    fn test_head_radius_has_floor() {
        let frame = LandmarkFrame {
            pose: Some(standing_pose(0.9)),
            ..Default::default()
        };
        let rec = render(&frame);
        let radius = rec
            .fills()
            .find_map(|(s, p)| match s {
                Shape::Circle { radius, .. } if p.base_color() == palette::SKIN => Some(*radius),
                _ => None,
            })
            .unwrap();
        // 耳間 25.6px * 0.65 < 35
        assert_eq!(radius, MIN_HEAD_RADIUS);
    }

    #[test]
    fn test_low_visibility_limb_is_skipped() {
        let mut pose = standing_pose(0.9);
        pose.0[PoseIndex::LeftKnee as usize].visibility = Some(0.1);
        let frame = LandmarkFrame {
            pose: Some(pose),
            ..Default::default()
        };
        let rec = render(&frame);
        assert_eq!(rec.stroked_lines().len(), 7);
    }

    #[test]
    fn test_face_replaces_simple_eyes() {
        let mut face = vec![Landmark::new(0.5, 0.2, 0.0); 478];
        face[FaceIndex::LeftEyeOuter as usize] = Landmark::new(0.47, 0.18, 0.0);
        face[FaceIndex::LeftEyeInner as usize] = Landmark::new(0.49, 0.18, 0.0);
        face[FaceIndex::LeftEyeTop as usize] = Landmark::new(0.48, 0.175, 0.0);
        face[FaceIndex::LeftEyeBottom as usize] = Landmark::new(0.48, 0.185, 0.0);
        face[FaceIndex::RightEyeOuter as usize] = Landmark::new(0.53, 0.18, 0.0);
        face[FaceIndex::RightEyeInner as usize] = Landmark::new(0.51, 0.18, 0.0);
        face[FaceIndex::RightEyeTop as usize] = Landmark::new(0.52, 0.175, 0.0);
        face[FaceIndex::RightEyeBottom as usize] = Landmark::new(0.52, 0.185, 0.0);
        let frame = LandmarkFrame {
            pose: Some(standing_pose(0.9)),
            faces: vec![FaceLandmarks(face)],
            ..Default::default()
        };
        let rec = render(&frame);
        let eye_whites = rec
            .fills()
            .filter(|(s, p)| matches!(s, Shape::Ellipse { .. }) && p.base_color() == palette::EYE_WHITE)
            .count();
        assert_eq!(eye_whites, 2);
        let dot_pupils = rec
            .fills()
            .filter(|(s, p)| matches!(s, Shape::Circle { .. }) && p.base_color() == palette::EYE_PUPIL)
            .count();
        assert_eq!(dot_pupils, 0);
    }

    #[test]
    fn test_non_finite_points_are_not_drawn() {
        let mut pose = standing_pose(0.9);
        pose.0[PoseIndex::LeftWrist as usize].x = f32::INFINITY;
        pose.0[PoseIndex::RightKnee as usize].z = f32::NAN;
        let frame = LandmarkFrame {
            pose: Some(pose),
            ..Default::default()
        };
        let rec = render(&frame);
        // 左前腕と右脚 2 本が消える
        assert_eq!(rec.stroked_lines().len(), 6);

        let mut hand = vec![Landmark::new(0.3, 0.6, 0.0); 21];
        hand[0].x = f32::NAN;
        let frame = LandmarkFrame {
            faces: vec![FaceLandmarks(vec![Landmark::new(f32::NEG_INFINITY, 0.2, 0.0); 478])],
            hands: vec![HandLandmarks {
                landmarks: hand,
                ..Default::default()
            }],
            ..frame
        };
        let rec = render(&frame);
        assert!(rec
            .stroked_lines()
            .iter()
            .all(|(a, b, _)| a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()));

        let mut pixels = crate::render::PixelSurface::new(64, 48);
        CartoonAvatar::new().render_frame(&frame, &FrameContext::new(0.0), &mut pixels);
    }
}
