use anyhow::Result;
use nalgebra::Vector3;
use std::collections::BTreeMap;

use talava_avatar::config::{GateConfig, SmoothConfig};
use talava_avatar::landmark::{
    FaceLandmarks, HandLandmarks, Handedness, Landmark, LandmarkFrame, PoseIndex, PoseLandmarks,
};
use talava_avatar::rig::{
    BoneName, FaceRig, HandRig, Humanoid, HumanoidRig, PoseRig, RigSolver, VideoSize,
};
use talava_avatar::tracker::Retargeter;

/// 左上腕だけを毎フレーム同じ回転で返す
struct UpperArmSolver(Vector3<f32>);

impl RigSolver for UpperArmSolver {
    fn solve_face(&self, _face: &FaceLandmarks, _video: VideoSize) -> Result<Option<FaceRig>> {
        Ok(None)
    }

    fn solve_pose(
        &self,
        _world: &PoseLandmarks,
        _image: &PoseLandmarks,
        _video: VideoSize,
    ) -> Result<Option<PoseRig>> {
        let mut rotations = BTreeMap::new();
        rotations.insert(BoneName::LeftUpperArm, self.0);
        Ok(Some(PoseRig {
            hips: None,
            rotations,
        }))
    }

    fn solve_hand(&self, _hand: &HandLandmarks, _side: Handedness) -> Result<Option<HandRig>> {
        Ok(None)
    }
}

fn visible_pose(visibility: f32) -> LandmarkFrame {
    LandmarkFrame {
        pose: Some(PoseLandmarks(vec![
            Landmark::with_visibility(0.5, 0.5, 0.0, visibility);
            PoseIndex::COUNT
        ])),
        ..Default::default()
    }
}

fn upper_arm(rig: &Humanoid) -> Vector3<f32> {
    rig.bone_rotation(BoneName::LeftUpperArm).unwrap()
}

#[test]
fn test_upper_arm_converges_on_x_only() {
    let solver = UpperArmSolver(Vector3::new(0.5, 0.0, 0.0));
    let mut rig = Humanoid::full();
    let mut retargeter = Retargeter::new(SmoothConfig::default(), GateConfig::default());
    let frame = visible_pose(0.9);

    for _ in 0..10 {
        retargeter.apply(&frame, &solver, &mut rig, VideoSize::default());
    }
    let rot = upper_arm(&rig);
    let expected_residual = 0.5 * 0.82f32.powi(10);
    assert!(((0.5 - rot.x) - expected_residual).abs() < 1e-4);
    assert_eq!(rot.y, 0.0);
    assert_eq!(rot.z, 0.0);

    for _ in 0..50 {
        retargeter.apply(&frame, &solver, &mut rig, VideoSize::default());
    }
    let settled = upper_arm(&rig);
    assert!((0.5 - settled.x).abs() < GateConfig::default().deadzone);

    // 不感帯に入った後は動かない
    retargeter.apply(&frame, &solver, &mut rig, VideoSize::default());
    assert_eq!(upper_arm(&rig), settled);
}

#[test]
fn test_low_visibility_holds_last_rotation() {
    let solver = UpperArmSolver(Vector3::new(0.5, 0.0, 0.0));
    let mut rig = Humanoid::full();
    let mut retargeter = Retargeter::new(SmoothConfig::default(), GateConfig::default());

    for _ in 0..5 {
        retargeter.apply(&visible_pose(0.9), &solver, &mut rig, VideoSize::default());
    }
    let held = upper_arm(&rig);
    assert!(held.x > 0.0);

    for _ in 0..5 {
        retargeter.apply(&visible_pose(0.1), &solver, &mut rig, VideoSize::default());
    }
    assert_eq!(upper_arm(&rig), held);
}

#[test]
fn test_empty_frames_change_nothing() {
    let solver = UpperArmSolver(Vector3::new(0.5, 0.0, 0.0));
    let mut rig = Humanoid::full();
    let mut retargeter = Retargeter::new(SmoothConfig::default(), GateConfig::default());
    for _ in 0..5 {
        retargeter.apply(&LandmarkFrame::default(), &solver, &mut rig, VideoSize::default());
    }
    assert!(retargeter.smoother().is_empty());
    assert_eq!(upper_arm(&rig), Vector3::zeros());
}
