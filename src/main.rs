use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use bevy::app::{App, AppExit, ScheduleRunnerPlugin, Update};
use bevy::ecs::prelude::*;

use talava_avatar::config::Config;
use talava_avatar::fps::FpsCounter;
use talava_avatar::landmark::LandmarkFrame;
use talava_avatar::mode::{Control, ModeController};
use talava_avatar::render::{MinifbRenderer, PixelSurface};
use talava_avatar::replay::LandmarkReplay;

const CONFIG_PATH: &str = "config.toml";

// --- Bevy Resources ---

/// 再生側から届いた未描画のフレーム
#[derive(Resource, Default)]
struct Incoming(Option<LandmarkFrame>);

#[derive(Resource)]
struct Clock {
    started: Instant,
    fps: FpsCounter,
}

struct Viewport {
    window: MinifbRenderer,
    surface: PixelSurface,
    mirror: bool,
    snapshot_dir: PathBuf,
}

struct Stage(ModeController);

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn open_replay(config: &Config) -> Result<LandmarkReplay> {
    let replay = &config.replay;
    match LandmarkReplay::load(&replay.path, replay.fps, replay.looping) {
        Ok(r) => Ok(r),
        Err(e) => {
            // 入力なしでも表示ループは回す
            log::warn!("no landmark input: {:#}", e);
            LandmarkReplay::from_frames(Vec::new(), replay.fps, replay.looping)
        }
    }
}

fn main() -> Result<()> {
    init_logger();
    log::info!("Talava Avatar ({})", env!("GIT_VERSION"));

    let config = Config::load_or_default(CONFIG_PATH);
    let controller = ModeController::from_config(&config)?;
    log::info!("mode: {}  style: {}", controller.mode(), controller.style());
    log::info!("操作: [V/2/3/R] モード  [F1-F5] スタイル  [←→↑↓/Home] モデル  [M] 反転  [S] 保存  [Esc] 終了");

    let replay = open_replay(&config)?;
    let view = &config.view;
    let mut window = MinifbRenderer::new("Talava Avatar", view.width, view.height)?;
    window.set_target_fps(0);

    let frame_duration = Duration::from_secs_f64(1.0 / view.target_fps.max(1) as f64);

    let mut app = App::new();
    app.add_plugins(ScheduleRunnerPlugin::run_loop(frame_duration))
        .insert_resource(Incoming::default())
        .insert_resource(Clock {
            started: Instant::now(),
            fps: FpsCounter::new(Instant::now()),
        })
        .insert_non_send_resource(replay)
        .insert_non_send_resource(Stage(controller))
        .insert_non_send_resource(Viewport {
            window,
            surface: PixelSurface::new(view.width, view.height),
            mirror: view.mirror,
            snapshot_dir: PathBuf::from(&view.snapshot_dir),
        })
        .add_systems(
            Update,
            (input_system, replay_system, frame_system, display_system, present_system).chain(),
        );

    app.run();

    log::info!("Shutting down...");
    Ok(())
}

// --- Systems ---

fn input_system(mut viewport: NonSendMut<Viewport>, mut stage: NonSendMut<Stage>, mut exit: EventWriter<AppExit>) {
    let viewport = &mut *viewport;
    if !viewport.window.is_open() {
        exit.send(AppExit::Success);
        return;
    }

    let (w, h) = viewport.window.size();
    if w > 0 && h > 0 {
        viewport.surface.resize(w, h);
    }

    for control in viewport.window.controls() {
        match control {
            Control::Quit => {
                exit.send(AppExit::Success);
            }
            Control::ToggleMirror => {
                viewport.mirror = !viewport.mirror;
                log::info!("mirror: {}", viewport.mirror);
            }
            Control::Snapshot => match viewport.surface.save_snapshot(&viewport.snapshot_dir, viewport.mirror) {
                Ok(path) => log::info!("snapshot saved: {}", path.display()),
                Err(e) => log::warn!("snapshot failed: {:#}", e),
            },
            other => stage.0.apply(other),
        }
    }
}

fn replay_system(mut replay: NonSendMut<LandmarkReplay>, mut incoming: ResMut<Incoming>) {
    if let Some(frame) = replay.poll(Instant::now()) {
        incoming.0 = Some(frame);
    }
}

/// フレーム配信側。新着があるときだけ描く
fn frame_system(
    mut incoming: ResMut<Incoming>,
    mut stage: NonSendMut<Stage>,
    mut viewport: NonSendMut<Viewport>,
    clock: Res<Clock>,
) {
    let Some(frame) = incoming.0.take() else {
        return;
    };
    let time = clock.started.elapsed().as_secs_f32();
    stage.0.on_frame(frame, None, time, &mut viewport.surface);
}

/// 表示 tick 側。スキンアバターの時計を毎回進める
fn display_system(mut stage: NonSendMut<Stage>) {
    stage.0.tick_display(Instant::now());
}

fn present_system(mut viewport: NonSendMut<Viewport>, mut clock: ResMut<Clock>) {
    let viewport = &mut *viewport;
    if let Err(e) = viewport.window.present(&viewport.surface, viewport.mirror) {
        log::warn!("present failed: {:#}", e);
    }
    if let Some(fps) = clock.fps.tick(Instant::now()) {
        log::debug!("FPS: {:.1}", fps);
    }
}
