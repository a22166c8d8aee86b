//! ランドマーク → 人型リグのボーン回転・表情ウェイト
//!
//! 全出力チャンネルは `ChannelSmoother` を通してから書き込む。

use anyhow::Result;
use nalgebra::Vector3;

use super::gate::LIMB_GATES;
use super::smooth::{ChannelKey, ChannelSmoother};
use crate::config::{GateConfig, SmoothConfig};
use crate::landmark::LandmarkFrame;
use crate::rig::model::HIPS_REST_POSITION;
use crate::rig::{BoneName, Expression, FaceRig, HumanoidRig, PoseRig, RigSolver, VideoSize};

/// 首は頭の回転の3割だけ追従する
const NECK_SHARE: f32 = 0.3;
/// 瞳オフセット → 視線角 (度)
const GAZE_YAW_DEG: f32 = 15.0;
const GAZE_PITCH_DEG: f32 = 10.0;

/// ソルバーの手首ジョイント名をリグのボーン名へ
///
/// "RightWrist" → rightHand, "LeftIndexProximal" → leftIndexProximal
pub fn remap_hand_joint(name: &str) -> Option<BoneName> {
    let renamed = match name.strip_suffix("Wrist") {
        Some(side) => format!("{}Hand", side),
        None => name.to_string(),
    };
    let mut chars = renamed.chars();
    let first = chars.next()?;
    let bone: String = first.to_lowercase().chain(chars).collect();
    bone.parse().ok()
}

/// ソルバー結果を「今フレームは更新なし」に畳み込む
fn settle<T>(group: &str, result: Result<Option<T>>) -> Option<T> {
    match result {
        Ok(rig) => rig,
        Err(e) => {
            log::debug!("{} solver failed, skipping frame: {:#}", group, e);
            None
        }
    }
}

pub struct Retargeter {
    smoother: ChannelSmoother,
    alpha: SmoothConfig,
    gates: GateConfig,
}

impl Retargeter {
    pub fn new(alpha: SmoothConfig, gates: GateConfig) -> Self {
        Self {
            smoother: ChannelSmoother::new(gates.deadzone),
            alpha,
            gates,
        }
    }

    pub fn smoother(&self) -> &ChannelSmoother {
        &self.smoother
    }

    /// 1フレーム分をリグへ反映する。欠けているグループは何もしない
    pub fn apply(
        &mut self,
        frame: &LandmarkFrame,
        solver: &dyn RigSolver,
        rig: &mut dyn HumanoidRig,
        video: VideoSize,
    ) {
        if let Some(face) = frame.face() {
            if let Some(face_rig) = settle("face", solver.solve_face(face, video)) {
                self.apply_face(&face_rig, rig);
            }
        }

        if let Some(image) = frame.pose() {
            let world = frame.pose_world().unwrap_or(image);
            if let Some(pose_rig) = settle("pose", solver.solve_pose(world, image, video)) {
                self.apply_pose(&pose_rig, frame, rig);
            }
        }

        for hand in frame.hands() {
            let side = hand.handedness;
            let Some(hand_rig) = settle("hand", solver.solve_hand(hand, side)) else {
                continue;
            };
            for (joint, rotation) in &hand_rig.joints {
                let Some(bone) = remap_hand_joint(joint) else {
                    continue;
                };
                let alpha = if bone.is_hand_root() {
                    self.alpha.hand
                } else {
                    self.alpha.finger
                };
                self.smooth_bone(rig, bone, Some(*rotation), alpha);
            }
        }
    }

    fn apply_face(&mut self, face: &FaceRig, rig: &mut dyn HumanoidRig) {
        let head = face.head;
        self.smooth_bone(rig, BoneName::Head, Some(head), self.alpha.head);
        self.smooth_bone(rig, BoneName::Neck, Some(head * NECK_SHARE), self.alpha.head);

        if rig.has_look_at() {
            if let Some(pupil) = face.pupil {
                let yaw = self
                    .smoother
                    .smooth(ChannelKey::GazeYaw, Some(-pupil.x * GAZE_YAW_DEG), self.alpha.gaze);
                let pitch = self.smoother.smooth(
                    ChannelKey::GazePitch,
                    Some(pupil.y * GAZE_PITCH_DEG),
                    self.alpha.gaze,
                );
                rig.set_look_at(yaw, pitch);
            }
        }

        if let Some(eye) = face.eye {
            let left = 1.0 - eye.left.clamp(0.0, 1.0);
            let right = 1.0 - eye.right.clamp(0.0, 1.0);
            if rig.supports_expression(Expression::BlinkLeft)
                || rig.supports_expression(Expression::BlinkRight)
            {
                self.smooth_expression(rig, Expression::BlinkLeft, left);
                self.smooth_expression(rig, Expression::BlinkRight, right);
            } else {
                self.smooth_expression(rig, Expression::Blink, (left + right) / 2.0);
            }
        }

        if let Some(mouth) = face.mouth {
            self.smooth_expression(rig, Expression::Aa, mouth.a);
            self.smooth_expression(rig, Expression::Ih, mouth.i);
            self.smooth_expression(rig, Expression::Ou, mouth.o);
            self.smooth_expression(rig, Expression::Ee, mouth.e);
            self.smooth_expression(rig, Expression::Oh, mouth.u);
        }
    }

    fn apply_pose(&mut self, pose: &PoseRig, frame: &LandmarkFrame, rig: &mut dyn HumanoidRig) {
        if let Some(hips) = &pose.hips {
            if rig.has_bone(BoneName::Hips) {
                let target = hips.position.map(|p| Vector3::new(p.x, p.y + 1.0, -p.z));
                let rest = rig
                    .bone_position(BoneName::Hips)
                    .unwrap_or(HIPS_REST_POSITION);
                let position = self.smoother.smooth_vec3_from(
                    ChannelKey::BonePosition(BoneName::Hips),
                    target,
                    self.alpha.hips_position,
                    rest,
                );
                rig.set_bone_position(BoneName::Hips, position);
            }
            self.smooth_bone(rig, BoneName::Hips, hips.rotation, self.alpha.hips_rotation);
        }

        let spine = pose.rotation(BoneName::Spine);
        self.smooth_bone(rig, BoneName::Spine, spine, self.alpha.torso);
        let chest = pose.rotation(BoneName::Chest).or(spine);
        self.smooth_bone(rig, BoneName::Chest, chest, self.alpha.torso);

        let Some(image) = frame.pose() else {
            return;
        };
        for gate in &LIMB_GATES {
            // ゲート不通過なら前回値のまま (既定姿勢へ戻さない)
            if !gate.passes(image, &self.gates) {
                continue;
            }
            self.smooth_bone(rig, gate.bone, pose.rotation(gate.bone), self.alpha.limb);
        }
    }

    fn smooth_bone(
        &mut self,
        rig: &mut dyn HumanoidRig,
        bone: BoneName,
        target: Option<Vector3<f32>>,
        alpha: f32,
    ) {
        let Some(current) = rig.bone_rotation(bone) else {
            return;
        };
        if target.is_none() {
            return;
        }
        let value = self.smoother.smooth_vec3_from(
            ChannelKey::BoneRotation(bone),
            target,
            alpha,
            current,
        );
        rig.set_bone_rotation(bone, value);
    }

    fn smooth_expression(&mut self, rig: &mut dyn HumanoidRig, expression: Expression, target: f32) {
        if !rig.supports_expression(expression) {
            return;
        }
        let rest = rig.expression(expression).unwrap_or(0.0);
        let value = self.smoother.smooth_from(
            ChannelKey::Expression(expression),
            Some(target.clamp(0.0, 1.0)),
            self.alpha.expression,
            rest,
        );
        rig.set_expression(expression, value);
    }
}
