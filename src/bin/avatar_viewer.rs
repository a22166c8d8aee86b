//! 記録ファイルなしで描画を確認するビューア
//!
//! 手を振る合成姿勢を流し、全モード・全スタイルを切り替えて見られる。

use anyhow::Result;
use std::time::Instant;

use talava_avatar::config::Config;
use talava_avatar::landmark::{Landmark, LandmarkFrame, PoseIndex, PoseLandmarks};
use talava_avatar::mode::{Control, Mode, ModeController};
use talava_avatar::render::{MinifbRenderer, PixelSurface};

/// 直立姿勢 (x, y, z)
const STANDING: [(f32, f32, f32); PoseIndex::COUNT] = [
    (0.50, 0.22, -0.30),
    (0.49, 0.20, -0.28),
    (0.48, 0.20, -0.28),
    (0.47, 0.20, -0.28),
    (0.51, 0.20, -0.28),
    (0.52, 0.20, -0.28),
    (0.53, 0.20, -0.28),
    (0.46, 0.22, -0.15),
    (0.54, 0.22, -0.15),
    (0.49, 0.25, -0.27),
    (0.51, 0.25, -0.27),
    (0.42, 0.35, -0.05),
    (0.58, 0.35, -0.05),
    (0.39, 0.48, -0.02),
    (0.61, 0.48, -0.02),
    (0.38, 0.60, -0.05),
    (0.62, 0.60, -0.05),
    (0.37, 0.62, -0.06),
    (0.63, 0.62, -0.06),
    (0.38, 0.63, -0.07),
    (0.62, 0.63, -0.07),
    (0.39, 0.62, -0.06),
    (0.61, 0.62, -0.06),
    (0.45, 0.62, 0.00),
    (0.55, 0.62, 0.00),
    (0.45, 0.78, 0.02),
    (0.55, 0.78, 0.02),
    (0.45, 0.93, 0.05),
    (0.55, 0.93, 0.05),
    (0.44, 0.95, 0.06),
    (0.56, 0.95, 0.06),
    (0.46, 0.97, 0.00),
    (0.54, 0.97, 0.00),
];

/// 右手 (画面左側) を振る
fn demo_frame(time: f32) -> LandmarkFrame {
    let mut pts: Vec<Landmark> = STANDING
        .iter()
        .map(|&(x, y, z)| Landmark::with_visibility(x, y, z, 0.95))
        .collect();
    let sway = (time * 0.8).sin() * 0.01;
    for p in pts.iter_mut() {
        p.x += sway;
    }

    let wave = (time * 3.0).sin() * 0.06;
    let shoulder = pts[PoseIndex::RightShoulder as usize];
    let elbow = Landmark::with_visibility(shoulder.x - 0.09, shoulder.y - 0.02, -0.04, 0.95);
    let wrist = Landmark::with_visibility(elbow.x - 0.02 + wave, elbow.y - 0.13, -0.06, 0.95);
    pts[PoseIndex::RightElbow as usize] = elbow;
    for idx in [
        PoseIndex::RightWrist,
        PoseIndex::RightPinky,
        PoseIndex::RightIndex,
        PoseIndex::RightThumb,
    ] {
        pts[idx as usize] = Landmark::with_visibility(wrist.x, wrist.y - 0.015, wrist.z, 0.95);
    }
    pts[PoseIndex::RightWrist as usize] = wrist;

    LandmarkFrame {
        pose: Some(PoseLandmarks(pts)),
        timestamp_ms: Some((time * 1000.0) as u64),
        ..Default::default()
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    println!("Avatar Viewer ({})", env!("GIT_VERSION"));
    println!("V/2/3/R: モード  F1-F5: スタイル  M: 反転  Esc: 終了");

    let config = Config::load_or_default("config.toml");
    let mut controller = ModeController::from_config(&config)?;
    controller.set_mode(Mode::ThreeD);

    let mut window = MinifbRenderer::new("Avatar Viewer", config.view.width, config.view.height)?;
    window.set_target_fps(config.view.target_fps);
    let mut surface = PixelSurface::new(config.view.width, config.view.height);
    let mut mirror = config.view.mirror;
    let started = Instant::now();

    'outer: while window.is_open() {
        for control in window.controls() {
            match control {
                Control::Quit => break 'outer,
                Control::ToggleMirror => mirror = !mirror,
                Control::Snapshot => {}
                other => controller.apply(other),
            }
        }

        let (w, h) = window.size();
        if w > 0 && h > 0 {
            surface.resize(w, h);
        }

        let time = started.elapsed().as_secs_f32();
        controller.on_frame(demo_frame(time), None, time, &mut surface);
        controller.tick_display(Instant::now());
        window.present(&surface, mirror)?;
    }

    Ok(())
}
