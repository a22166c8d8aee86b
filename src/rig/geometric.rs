//! ランドマークの幾何だけで回転を推定する簡易ソルバー
//!
//! IK は行わない。各ボーンは隣接ランドマークの向きから独立に求める。

use anyhow::Result;
use nalgebra::{Vector2, Vector3};
use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;

use super::solver::{EyeOpenness, FaceRig, HandRig, HipsRig, MouthShape, PoseRig, RigSolver, VideoSize};
use super::BoneName;
use crate::geometry::eye_openness;
use crate::landmark::index::{EyeIndices, FINGER_CHAINS, LEFT_EYE, RIGHT_EYE};
use crate::landmark::{
    FaceIndex, FaceLandmarks, HandIndex, HandLandmarks, Handedness, Landmark, PoseIndex,
    PoseLandmarks,
};

/// 正面時の「鼻先 - 両目中点」の縦距離 (目幅比)
const NEUTRAL_NOSE_DROP: f32 = 0.6;
/// 無表情時の「口幅 / 目幅」
const NEUTRAL_MOUTH_WIDTH: f32 = 0.45;

const FINGER_SEGMENTS: [&str; 3] = ["Proximal", "Intermediate", "Distal"];

#[derive(Debug, Clone, Default)]
pub struct GeometricSolver;

impl GeometricSolver {
    pub fn new() -> Self {
        Self
    }
}

fn vec3(lm: &Landmark) -> Vector3<f32> {
    Vector3::new(lm.x, lm.y, lm.z)
}

/// 映像のアスペクトを考慮した画像平面上の点
fn pixel(lm: &Landmark, video: VideoSize) -> Vector2<f32> {
    Vector2::new(lm.x * video.width as f32, lm.y * video.height as f32)
}

/// 2ベクトルのなす角 (どちらかが長さ0なら0)
fn angle_between(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    let denom = a.norm() * b.norm();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

fn face_point(face: &FaceLandmarks, index: FaceIndex, video: VideoSize) -> Option<Vector2<f32>> {
    face.get(index).map(|lm| pixel(lm, video))
}

fn solve_eye(face: &FaceLandmarks, eye: &EyeIndices, video: VideoSize) -> Option<f32> {
    let outer = face_point(face, eye.outer, video)?;
    let inner = face_point(face, eye.inner, video)?;
    let top = face_point(face, eye.top, video)?;
    let bottom = face_point(face, eye.bottom, video)?;
    Some(eye_openness((top - bottom).norm(), (outer - inner).norm()))
}

/// 虹彩中心の目中心からのずれ (目幅の半分で正規化)
fn solve_pupil_offset(
    face: &FaceLandmarks,
    eye: &EyeIndices,
    iris: FaceIndex,
    video: VideoSize,
) -> Option<Vector2<f32>> {
    let iris = face_point(face, iris, video)?;
    let outer = face_point(face, eye.outer, video)?;
    let inner = face_point(face, eye.inner, video)?;
    let half = (outer - inner).norm() / 2.0;
    if half <= f32::EPSILON {
        return None;
    }
    let center = (outer + inner) / 2.0;
    Some((iris - center) / half)
}

fn solve_mouth(face: &FaceLandmarks, eye_width: f32, video: VideoSize) -> Option<MouthShape> {
    let left = face_point(face, FaceIndex::MouthLeft, video)?;
    let right = face_point(face, FaceIndex::MouthRight, video)?;
    let upper = face_point(face, FaceIndex::UpperLipInner, video)?;
    let lower = face_point(face, FaceIndex::LowerLipInner, video)?;

    let width = (right - left).norm();
    if width <= f32::EPSILON || eye_width <= f32::EPSILON {
        return None;
    }
    let open = clamp01(((upper - lower).norm() / width - 0.05) / 0.4);
    let width_ratio = width / eye_width;
    let spread = clamp01((width_ratio - NEUTRAL_MOUTH_WIDTH) / 0.15);
    let narrow = clamp01((NEUTRAL_MOUTH_WIDTH - width_ratio) / 0.1);

    Some(MouthShape {
        a: open * (1.0 - spread * 0.5) * (1.0 - narrow),
        i: spread * (1.0 - open),
        u: narrow * (1.0 - open),
        e: spread * open,
        o: narrow * open,
    })
}

fn pose_point(pose: &PoseLandmarks, index: PoseIndex) -> Option<Vector3<f32>> {
    pose.get(index).map(vec3)
}

/// 腕の回転。T ポーズ (腕が水平) からの角度
///
/// `outward` は体の外側を向く画像 x の符号 (左腕 +1, 右腕 -1)。
fn arm_rotation(from: Vector3<f32>, to: Vector3<f32>, outward: f32) -> Vector3<f32> {
    let d = to - from;
    let horizontal = d.x * outward;
    // 画像座標は y が下向きなので、下げた腕が正の角度になる
    let drop = d.y.atan2(horizontal);
    let swing = (-d.z).atan2(horizontal.hypot(d.y));
    Vector3::new(0.0, swing * outward, -drop * outward)
}

/// 脚の回転。真下を向いた状態からの角度
fn leg_rotation(from: Vector3<f32>, to: Vector3<f32>) -> Vector3<f32> {
    let d = to - from;
    let forward = (-d.z).atan2(d.y);
    let side = d.x.atan2(d.y);
    Vector3::new(-forward, 0.0, side)
}

/// 関節の曲がり (上位セグメントと下位セグメントのなす角)
fn bend(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> f32 {
    angle_between(&(b - a), &(c - b))
}

struct LimbChain {
    upper: BoneName,
    lower: BoneName,
    root: PoseIndex,
    middle: PoseIndex,
    end: PoseIndex,
}

const ARMS: [(LimbChain, f32); 2] = [
    (
        LimbChain {
            upper: BoneName::LeftUpperArm,
            lower: BoneName::LeftLowerArm,
            root: PoseIndex::LeftShoulder,
            middle: PoseIndex::LeftElbow,
            end: PoseIndex::LeftWrist,
        },
        1.0,
    ),
    (
        LimbChain {
            upper: BoneName::RightUpperArm,
            lower: BoneName::RightLowerArm,
            root: PoseIndex::RightShoulder,
            middle: PoseIndex::RightElbow,
            end: PoseIndex::RightWrist,
        },
        -1.0,
    ),
];

const LEGS: [LimbChain; 2] = [
    LimbChain {
        upper: BoneName::LeftUpperLeg,
        lower: BoneName::LeftLowerLeg,
        root: PoseIndex::LeftHip,
        middle: PoseIndex::LeftKnee,
        end: PoseIndex::LeftAnkle,
    },
    LimbChain {
        upper: BoneName::RightUpperLeg,
        lower: BoneName::RightLowerLeg,
        root: PoseIndex::RightHip,
        middle: PoseIndex::RightKnee,
        end: PoseIndex::RightAnkle,
    },
];

fn solve_hips(world: &PoseLandmarks, image: &PoseLandmarks) -> Option<HipsRig> {
    let left = pose_point(world, PoseIndex::LeftHip)?;
    let right = pose_point(world, PoseIndex::RightHip)?;
    let d = left - right;
    let yaw = d.z.atan2(d.x);
    let roll = -d.y.atan2(d.x);

    let position = match (
        pose_point(image, PoseIndex::LeftHip),
        pose_point(image, PoseIndex::RightHip),
    ) {
        (Some(l), Some(r)) => {
            let mid = (l + r) / 2.0;
            Some(Vector3::new(0.5 - mid.x, 0.6 - mid.y, mid.z))
        }
        _ => None,
    };

    Some(HipsRig {
        position,
        rotation: Some(Vector3::new(0.0, yaw, roll)),
    })
}

impl RigSolver for GeometricSolver {
    fn solve_face(&self, face: &FaceLandmarks, video: VideoSize) -> Result<Option<FaceRig>> {
        let (Some(left_outer), Some(right_outer), Some(nose)) = (
            face_point(face, FaceIndex::LeftEyeOuter, video),
            face_point(face, FaceIndex::RightEyeOuter, video),
            face_point(face, FaceIndex::NoseTip, video),
        ) else {
            return Ok(None);
        };

        let across = right_outer - left_outer;
        let eye_width = across.norm();
        if eye_width <= f32::EPSILON {
            return Ok(None);
        }
        let mid = (left_outer + right_outer) / 2.0;
        let rel = (nose - mid) / eye_width;

        // 目尻を結ぶ線の傾きがロール、鼻先のずれがヨー/ピッチ
        let roll = across.y.atan2(across.x.abs());
        let yaw = (rel.x * 1.5).clamp(-1.0, 1.0).asin();
        let pitch = ((rel.y - NEUTRAL_NOSE_DROP) * 1.5).clamp(-1.0, 1.0).asin();
        let head = Vector3::new(pitch, yaw, roll).map(|v| v.clamp(-FRAC_PI_2, FRAC_PI_2));

        let eye = match (
            solve_eye(face, &LEFT_EYE, video),
            solve_eye(face, &RIGHT_EYE, video),
        ) {
            (Some(left), Some(right)) => Some(EyeOpenness { left, right }),
            _ => None,
        };

        let pupil = match (
            solve_pupil_offset(face, &LEFT_EYE, FaceIndex::LeftIris, video),
            solve_pupil_offset(face, &RIGHT_EYE, FaceIndex::RightIris, video),
        ) {
            (Some(l), Some(r)) => Some(((l + r) / 2.0).map(|v| v.clamp(-1.0, 1.0))),
            _ => None,
        };

        Ok(Some(FaceRig {
            head,
            pupil,
            eye,
            mouth: solve_mouth(face, eye_width, video),
        }))
    }

    fn solve_pose(
        &self,
        world: &PoseLandmarks,
        image: &PoseLandmarks,
        _video: VideoSize,
    ) -> Result<Option<PoseRig>> {
        if world.is_empty() {
            return Ok(None);
        }

        let hips = solve_hips(world, image);
        let mut rotations = BTreeMap::new();

        if let (Some(ls), Some(rs)) = (
            pose_point(world, PoseIndex::LeftShoulder),
            pose_point(world, PoseIndex::RightShoulder),
        ) {
            let d = ls - rs;
            let hips_rot = hips
                .as_ref()
                .and_then(|h| h.rotation)
                .unwrap_or_else(Vector3::zeros);
            let spine = Vector3::new(0.0, d.z.atan2(d.x) - hips_rot.y, -d.y.atan2(d.x) - hips_rot.z);
            rotations.insert(BoneName::Spine, spine);
        }

        for (chain, outward) in &ARMS {
            let (Some(root), Some(middle)) =
                (pose_point(world, chain.root), pose_point(world, chain.middle))
            else {
                continue;
            };
            let upper = arm_rotation(root, middle, *outward);
            rotations.insert(chain.upper, upper);
            if let Some(end) = pose_point(world, chain.end) {
                let lower = arm_rotation(middle, end, *outward) - upper;
                rotations.insert(chain.lower, lower);
            }
        }

        for chain in &LEGS {
            let (Some(root), Some(middle)) =
                (pose_point(world, chain.root), pose_point(world, chain.middle))
            else {
                continue;
            };
            rotations.insert(chain.upper, leg_rotation(root, middle));
            if let Some(end) = pose_point(world, chain.end) {
                // 膝は後ろにしか曲がらない
                rotations.insert(chain.lower, Vector3::new(bend(root, middle, end), 0.0, 0.0));
            }
        }

        if hips.is_none() && rotations.is_empty() {
            return Ok(None);
        }
        Ok(Some(PoseRig { hips, rotations }))
    }

    fn solve_hand(&self, hand: &HandLandmarks, side: Handedness) -> Result<Option<HandRig>> {
        if hand.landmarks.len() < HandIndex::COUNT {
            return Ok(None);
        }
        let point = |i: HandIndex| hand.get(i).map(vec3).unwrap_or_else(Vector3::zeros);
        let wrist = point(HandIndex::Wrist);
        let side_name = side.as_str();
        let sign = match side {
            Handedness::Left => 1.0,
            Handedness::Right => -1.0,
        };

        let mut joints = Vec::with_capacity(16);

        let palm = point(HandIndex::MiddleMcp) - wrist;
        let across = point(HandIndex::PinkyMcp) - point(HandIndex::IndexMcp);
        let wrist_rot = Vector3::new(
            (-palm.z).atan2(-palm.y),
            across.z.atan2(across.x.abs()) * sign,
            palm.x.atan2(-palm.y),
        );
        joints.push((format!("{}Wrist", side_name), wrist_rot));

        for (finger, chain) in FINGER_CHAINS.iter() {
            let mut points = [wrist; 5];
            for (slot, idx) in points[1..].iter_mut().zip(chain.iter()) {
                *slot = point(*idx);
            }
            for (k, segment) in FINGER_SEGMENTS.iter().enumerate() {
                let curl = bend(points[k], points[k + 1], points[k + 2]);
                let rotation = if *finger == "Thumb" {
                    Vector3::new(0.0, curl * sign, 0.0)
                } else {
                    Vector3::new(0.0, 0.0, curl * sign)
                };
                joints.push((format!("{}{}{}", side_name, finger, segment), rotation));
            }
        }

        Ok(Some(HandRig { joints }))
    }
}
