//! スキンメッシュ人型アバター
//!
//! フレームは表示ループの tick で受け取り、リターゲッター経由でリグへ書き込む。
//! シーングラフ側の描画は外部。ここでは状態パネルだけ描く。

use std::f32::consts::{PI, TAU};
use std::path::Path;
use std::time::Instant;

use super::surface::{Color, Paint, Point, Shape, Surface};
use super::{FrameContext, Renderer};
use crate::config::{GateConfig, ModelConfig, SmoothConfig};
use crate::error::ModelLoadError;
use crate::landmark::LandmarkFrame;
use crate::rig::{Expression, GeometricSolver, Humanoid, HumanoidRig, RigSolver, VideoSize};
use crate::tracker::Retargeter;

const PANEL_BACKGROUND: Color = Color::hex(0x101018);
const PANEL_TEXT: Color = Color::hex(0xC8C8E0);
const METER: Color = Color::hex(0x4A90D9);

pub struct SkinnedAvatar {
    rig: Option<Box<dyn HumanoidRig>>,
    solver: Box<dyn RigSolver>,
    retargeter: Retargeter,
    alpha: SmoothConfig,
    gates: GateConfig,
    video: VideoSize,
    active: bool,
    last_tick: Option<Instant>,
    model_rotation: f32,
    model_scale: f32,
}

impl SkinnedAvatar {
    pub fn new(alpha: SmoothConfig, gates: GateConfig) -> Self {
        Self::with_solver(Box::new(GeometricSolver::new()), alpha, gates)
    }

    pub fn with_solver(solver: Box<dyn RigSolver>, alpha: SmoothConfig, gates: GateConfig) -> Self {
        Self {
            rig: None,
            solver,
            retargeter: Retargeter::new(alpha, gates),
            alpha,
            gates,
            video: VideoSize::default(),
            active: false,
            last_tick: None,
            model_rotation: PI,
            model_scale: 1.0,
        }
    }

    /// 設定の初期回転・拡大率・映像サイズを反映する
    pub fn configure(&mut self, model: &ModelConfig) {
        self.video = VideoSize {
            width: model.video_width,
            height: model.video_height,
        };
        self.set_model_rotation(model.rotation_deg.to_radians());
        self.set_model_scale(model.scale);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn rig(&self) -> Option<&dyn HumanoidRig> {
        self.rig.as_deref()
    }

    pub fn retargeter(&self) -> &Retargeter {
        &self.retargeter
    }

    pub fn model_rotation(&self) -> f32 {
        self.model_rotation
    }

    pub fn model_scale(&self) -> f32 {
        self.model_scale
    }

    /// モデル記述ファイルを読み込んで差し替える
    ///
    /// 失敗時は今のモデルと平滑化状態をそのまま残す。
    pub fn load_from_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ModelLoadError> {
        let path = path.as_ref();
        match Humanoid::load(path) {
            Ok(model) => {
                log::info!(
                    "loaded humanoid model {:?} ({} bones) from {}",
                    model.name(),
                    model.bone_count(),
                    path.display()
                );
                self.attach(Box::new(model));
                Ok(())
            }
            Err(e) => {
                log::warn!("failed to load model {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// リグを差し替え、平滑化チャンネルを作り直す
    pub fn attach(&mut self, mut rig: Box<dyn HumanoidRig>) {
        rig.set_root_rotation(self.model_rotation);
        rig.set_root_scale(self.model_scale);
        self.retargeter = Retargeter::new(self.alpha, self.gates);
        self.rig = Some(rig);
    }

    /// Y軸回転 (ラジアン)。平滑化せず即座に反映する
    pub fn set_model_rotation(&mut self, radians: f32) {
        self.model_rotation = radians.rem_euclid(TAU);
        if let Some(rig) = self.rig.as_mut() {
            rig.set_root_rotation(self.model_rotation);
        }
    }

    pub fn set_model_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        self.model_scale = scale;
        if let Some(rig) = self.rig.as_mut() {
            rig.set_root_scale(scale);
        }
    }

    /// カメラ正面・等倍へ戻す
    pub fn reset_transform(&mut self) {
        self.set_model_rotation(PI);
        self.set_model_scale(1.0);
    }

    /// 表示ループの 1 tick
    ///
    /// 時計は常に進める。非アクティブ中はリギングも update もしない。
    pub fn tick(&mut self, now: Instant, frame: Option<&LandmarkFrame>) {
        let dt = self
            .last_tick
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f32());
        self.last_tick = Some(now);
        if !self.active {
            return;
        }
        let Some(rig) = self.rig.as_deref_mut() else {
            return;
        };
        if let Some(frame) = frame {
            self.retargeter.apply(frame, self.solver.as_ref(), rig, self.video);
        }
        rig.update(dt);
    }
}

impl Renderer for SkinnedAvatar {
    fn name(&self) -> &'static str {
        "skinned"
    }

    /// モデル名・向き・表情ウェイトの一覧
    fn render_frame(&mut self, _frame: &LandmarkFrame, _ctx: &FrameContext<'_>, surface: &mut dyn Surface) {
        surface.set_glow(None);
        surface.clear(PANEL_BACKGROUND);
        let Some(rig) = self.rig.as_deref() else {
            surface.text("NO MODEL", Point::new(16.0, 16.0), 12.0, PANEL_TEXT);
            return;
        };
        surface.text(
            &format!("ROT {:.0} SCALE {:.2}", rig.root_rotation().to_degrees(), rig.root_scale()),
            Point::new(16.0, 16.0),
            12.0,
            PANEL_TEXT,
        );
        let mut y = 40.0;
        for expr in Expression::ALL {
            let Some(weight) = rig.expression(expr) else {
                continue;
            };
            surface.text(expr.as_str(), Point::new(16.0, y), 8.0, PANEL_TEXT);
            surface.fill(
                &Shape::rect(120.0, y, 160.0 * weight.clamp(0.0, 1.0), 8.0),
                &Paint::Solid(METER),
            );
            y += 14.0;
        }
    }
}
