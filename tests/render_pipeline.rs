use std::f32::consts::{PI, TAU};
use std::time::{Duration, Instant};

use talava_avatar::config::{GateConfig, ModelConfig, ProjectionConfig, SmoothConfig};
use talava_avatar::landmark::{Landmark, LandmarkFrame, PoseIndex, PoseLandmarks};
use talava_avatar::mode::{Control, Mode, ModeController};
use talava_avatar::render::{CommandRecorder, PixelSurface, StyleKind};
use talava_avatar::rig::HumanoidRig;

const W: usize = 320;
const H: usize = 240;

fn standing_pose() -> LandmarkFrame {
    let mut pts = vec![Landmark::with_visibility(0.5, 0.5, 0.0, 0.95); PoseIndex::COUNT];
    let mut set = |idx: PoseIndex, x: f32, y: f32| {
        pts[idx as usize] = Landmark::with_visibility(x, y, 0.0, 0.95);
    };
    set(PoseIndex::Nose, 0.50, 0.20);
    set(PoseIndex::LeftEar, 0.45, 0.21);
    set(PoseIndex::RightEar, 0.55, 0.21);
    set(PoseIndex::LeftShoulder, 0.42, 0.35);
    set(PoseIndex::RightShoulder, 0.58, 0.35);
    set(PoseIndex::LeftElbow, 0.38, 0.48);
    set(PoseIndex::RightElbow, 0.62, 0.48);
    set(PoseIndex::LeftWrist, 0.37, 0.60);
    set(PoseIndex::RightWrist, 0.63, 0.60);
    set(PoseIndex::LeftHip, 0.45, 0.62);
    set(PoseIndex::RightHip, 0.55, 0.62);
    set(PoseIndex::LeftKnee, 0.45, 0.78);
    set(PoseIndex::RightKnee, 0.55, 0.78);
    set(PoseIndex::LeftAnkle, 0.45, 0.93);
    set(PoseIndex::RightAnkle, 0.55, 0.93);
    LandmarkFrame {
        pose: Some(PoseLandmarks(pts)),
        ..Default::default()
    }
}

fn controller(style: StyleKind) -> ModeController {
    ModeController::new(
        style,
        SmoothConfig::default(),
        GateConfig::default(),
        ProjectionConfig::default(),
        ModelConfig::default(),
    )
}

/// 空フレームと姿勢のみフレームで何ピクセル変わるか
fn changed_pixels(mode: Mode) -> usize {
    let mut c = controller(StyleKind::Neon);
    c.set_mode(mode);
    let mut empty = PixelSurface::new(W, H);
    c.on_frame(LandmarkFrame::default(), None, 0.0, &mut empty);
    let mut posed = PixelSurface::new(W, H);
    c.on_frame(standing_pose(), None, 0.0, &mut posed);
    empty
        .buffer()
        .iter()
        .zip(posed.buffer())
        .filter(|(a, b)| a != b)
        .count()
}

#[test]
fn test_pose_only_frame_draws_cartoon() {
    assert!(changed_pixels(Mode::TwoD) > 500);
}

#[test]
fn test_pose_only_frame_draws_wireframe() {
    assert!(changed_pixels(Mode::ThreeD) > 500);
}

#[test]
fn test_cartoon_falls_back_to_dot_eyes() {
    let mut c = controller(StyleKind::Neon);
    c.set_mode(Mode::TwoD);
    let mut rec = CommandRecorder::new(W as f32, H as f32);
    c.on_frame(standing_pose(), None, 0.0, &mut rec);
    assert!(!rec.stroked_lines().is_empty());
    assert!(rec.fills().count() > 2);
}

#[test]
fn test_every_style_renders_to_pixels() {
    for style in StyleKind::ALL {
        let mut c = controller(style);
        c.set_mode(Mode::ThreeD);
        let mut surface = PixelSurface::new(W, H);
        for i in 0..3 {
            c.on_frame(standing_pose(), None, i as f32 * 0.033, &mut surface);
        }
        assert!(surface.buffer().iter().any(|&px| px != 0), "{style}");
    }
}

#[test]
fn test_resize_between_frames() {
    let mut c = controller(StyleKind::Matrix);
    c.set_mode(Mode::ThreeD);
    let mut surface = PixelSurface::new(W, H);
    c.on_frame(standing_pose(), None, 0.0, &mut surface);
    surface.resize(160, 120);
    c.on_frame(standing_pose(), None, 0.1, &mut surface);
    assert_eq!(surface.buffer().len(), 160 * 120);
}

#[test]
fn test_skinned_rotation_round_trip() {
    let mut c = controller(StyleKind::Neon);
    c.apply(Control::SetMode(Mode::Skinned));
    c.apply(Control::RotateModel(TAU));
    let rotation = c.skinned().unwrap().model_rotation();
    assert!((rotation - PI).abs() < 1e-4);

    c.apply(Control::RotateModel(PI / 2.0));
    let rotation = c.skinned().unwrap().model_rotation();
    assert!((rotation - 1.5 * PI).abs() < 1e-4);
    let rig_rotation = c.skinned().unwrap().rig().unwrap().root_rotation();
    assert!((rig_rotation - rotation).abs() < 1e-6);
}

#[test]
fn test_skinned_display_ticks_consume_mailbox() {
    let mut c = controller(StyleKind::Neon);
    c.set_mode(Mode::Skinned);
    let mut rec = CommandRecorder::new(W as f32, H as f32);
    let t0 = Instant::now();
    c.on_frame(standing_pose(), None, 0.0, &mut rec);
    for i in 0..5 {
        c.tick_display(t0 + Duration::from_millis(i * 16));
    }
    assert!(!c.skinned().unwrap().retargeter().smoother().is_empty());

    // 非アクティブ中は tick しても平滑化状態は変わらない
    c.set_mode(Mode::TwoD);
    let before = c.skinned().unwrap().retargeter().smoother().len();
    c.on_frame(LandmarkFrame::default(), None, 0.1, &mut rec);
    c.tick_display(t0 + Duration::from_millis(200));
    assert_eq!(c.skinned().unwrap().retargeter().smoother().len(), before);
}
