//! 表示モードの切り替え
//!
//! 描画系はすべて `ModeController` が持つ。フレーム配信 (`on_frame`) と
//! 表示 tick (`tick_display`) の 2 系統はメールボックスだけで繋がる。

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::config::{Config, GateConfig, ModelConfig, ProjectionConfig, SmoothConfig};
use crate::error::UnknownName;
use crate::landmark::{FrameMailbox, LandmarkFrame};
use crate::render::{
    CameraOverlay, CartoonAvatar, FrameContext, Renderer, SkinnedAvatar, StyleKind, Surface, VideoFrame,
    WireframeAvatar,
};
use crate::rig::Humanoid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// カメラ映像 + ランドマーク
    #[default]
    Overlay,
    TwoD,
    ThreeD,
    Skinned,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Overlay, Mode::TwoD, Mode::ThreeD, Mode::Skinned];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Overlay => "overlay",
            Mode::TwoD => "2d",
            Mode::ThreeD => "3d",
            Mode::Skinned => "skinned",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlay" | "camera" => Ok(Mode::Overlay),
            "2d" => Ok(Mode::TwoD),
            "3d" => Ok(Mode::ThreeD),
            "skinned" | "vrm" => Ok(Mode::Skinned),
            _ => Err(UnknownName {
                kind: "mode",
                name: s.to_string(),
            }),
        }
    }
}

/// 利用者からの操作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    SetMode(Mode),
    SetStyle(StyleKind),
    /// モデルの Y 軸回転に加算 (ラジアン)
    RotateModel(f32),
    /// モデルの拡大率に乗算
    ScaleModel(f32),
    ResetModel,
    ToggleMirror,
    Snapshot,
    Quit,
}

pub struct ModeController {
    mode: Mode,
    overlay: CameraOverlay,
    cartoon: CartoonAvatar,
    wireframe: WireframeAvatar,
    /// 初めてスキンモードに入ったときに作る
    skinned: Option<SkinnedAvatar>,
    mailbox: FrameMailbox,
    /// スキンアバターに適用済みのメールボックス番号
    applied: u64,
    smoothing: SmoothConfig,
    gating: GateConfig,
    projection: ProjectionConfig,
    model: ModelConfig,
}

impl ModeController {
    pub fn new(
        style: StyleKind,
        smoothing: SmoothConfig,
        gating: GateConfig,
        projection: ProjectionConfig,
        model: ModelConfig,
    ) -> Self {
        Self {
            mode: Mode::Overlay,
            overlay: CameraOverlay::new(),
            cartoon: CartoonAvatar::new(),
            wireframe: WireframeAvatar::new(style),
            skinned: None,
            mailbox: FrameMailbox::new(),
            applied: 0,
            smoothing,
            gating,
            projection,
            model,
        }
    }

    /// 設定ファイルの初期モード・スタイルで起動する
    pub fn from_config(config: &Config) -> Result<Self, UnknownName> {
        let mode: Mode = config.style.mode.parse()?;
        let style: StyleKind = config.style.style.parse()?;
        let mut controller = Self::new(
            style,
            config.smoothing,
            config.gating,
            config.projection,
            config.model.clone(),
        );
        controller.set_mode(mode);
        Ok(controller)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn style(&self) -> StyleKind {
        self.wireframe.style()
    }

    pub fn mailbox(&self) -> &FrameMailbox {
        &self.mailbox
    }

    pub fn skinned(&self) -> Option<&SkinnedAvatar> {
        self.skinned.as_ref()
    }

    /// モードを切り替える。同じモードへの遷移は何もしない
    ///
    /// 戻り値は切り替えが起きたかどうか。
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode {
            return false;
        }
        if self.mode == Mode::Skinned {
            if let Some(skinned) = self.skinned.as_mut() {
                skinned.set_active(false);
            }
        }
        if mode == Mode::Skinned {
            self.skinned_or_init().set_active(true);
        }
        log::info!("mode: {} -> {}", self.mode, mode);
        self.mode = mode;
        true
    }

    pub fn set_style(&mut self, style: StyleKind) {
        if style == self.wireframe.style() {
            return;
        }
        log::info!("style: {} -> {}", self.wireframe.style(), style);
        self.wireframe.set_style(style);
    }

    /// 描画系に関わる操作を反映する。ミラー・保存・終了は呼び出し側の担当
    pub fn apply(&mut self, control: Control) {
        match control {
            Control::SetMode(mode) => {
                self.set_mode(mode);
            }
            Control::SetStyle(style) => self.set_style(style),
            Control::RotateModel(delta) => {
                if let Some(skinned) = self.skinned.as_mut() {
                    skinned.set_model_rotation(skinned.model_rotation() + delta);
                }
            }
            Control::ScaleModel(factor) => {
                if let Some(skinned) = self.skinned.as_mut() {
                    skinned.set_model_scale(skinned.model_scale() * factor);
                }
            }
            Control::ResetModel => {
                if let Some(skinned) = self.skinned.as_mut() {
                    skinned.reset_transform();
                }
            }
            Control::ToggleMirror | Control::Snapshot | Control::Quit => {}
        }
    }

    /// フレーム配信 1 回分
    ///
    /// フレームは常にメールボックスへ入る。スキンモード以外では
    /// 現在のレンダラーでちょうど 1 回描く。
    pub fn on_frame(&mut self, frame: LandmarkFrame, video: Option<&VideoFrame>, time: f32, surface: &mut dyn Surface) {
        let ctx = FrameContext {
            video,
            time,
            visibility_floor: self.gating.visibility_floor,
            projection: self.projection,
        };
        let renderer: &mut dyn Renderer = match self.mode {
            Mode::Overlay => &mut self.overlay,
            Mode::TwoD => &mut self.cartoon,
            Mode::ThreeD => &mut self.wireframe,
            Mode::Skinned => match self.skinned.as_mut() {
                Some(skinned) => skinned,
                None => {
                    self.mailbox.post(frame);
                    return;
                }
            },
        };
        renderer.render_frame(&frame, &ctx, surface);
        self.mailbox.post(frame);
    }

    /// 表示 tick。スキンアバターが一度でも作られていれば毎回進める
    ///
    /// リターゲットは新着フレームがあるときだけ。非アクティブの間に届いた
    /// フレームは再アクティブ化後の最初の tick で適用される。
    pub fn tick_display(&mut self, now: Instant) {
        let Some(skinned) = self.skinned.as_mut() else {
            return;
        };
        skinned.tick(now, self.mailbox.newer_than(self.applied));
        if skinned.is_active() {
            self.applied = self.mailbox.sequence();
        }
    }

    fn skinned_or_init(&mut self) -> &mut SkinnedAvatar {
        let (smoothing, gating, model) = (self.smoothing, self.gating, &self.model);
        self.skinned
            .get_or_insert_with(|| build_skinned(smoothing, gating, model))
    }
}

fn build_skinned(smoothing: SmoothConfig, gating: GateConfig, model: &ModelConfig) -> SkinnedAvatar {
    let mut avatar = SkinnedAvatar::new(smoothing, gating);
    avatar.configure(model);
    let loaded = match &model.path {
        Some(path) => avatar.load_from_path(path).is_ok(),
        None => false,
    };
    if !loaded {
        log::info!("using built-in humanoid rig");
        avatar.attach(Box::new(Humanoid::full()));
    }
    avatar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, PoseIndex, PoseLandmarks};
    use crate::render::CommandRecorder;
    use crate::rig::BoneName;
    use nalgebra::Vector3;
    use std::time::Duration;

    fn controller() -> ModeController {
        ModeController::new(
            StyleKind::Neon,
            SmoothConfig::default(),
            GateConfig::default(),
            ProjectionConfig::default(),
            ModelConfig::default(),
        )
    }

    fn pose_frame() -> LandmarkFrame {
        let mut pts = vec![Landmark::with_visibility(0.5, 0.5, 0.0, 0.9); PoseIndex::COUNT];
        pts[PoseIndex::LeftShoulder as usize] = Landmark::with_visibility(0.6, 0.3, 0.0, 0.9);
        pts[PoseIndex::LeftElbow as usize] = Landmark::with_visibility(0.7, 0.45, 0.0, 0.9);
        pts[PoseIndex::LeftWrist as usize] = Landmark::with_visibility(0.75, 0.6, 0.0, 0.9);
        LandmarkFrame {
            pose: Some(PoseLandmarks(pts)),
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("2d".parse::<Mode>().unwrap(), Mode::TwoD);
        assert_eq!(" 3D ".parse::<Mode>().unwrap(), Mode::ThreeD);
        assert_eq!("vrm".parse::<Mode>().unwrap(), Mode::Skinned);
        let err = "4d".parse::<Mode>().unwrap_err();
        assert_eq!(err.kind, "mode");
        assert_eq!(err.name, "4d");
    }

    #[test]
    fn test_self_loop_is_noop() {
        let mut c = controller();
        assert!(!c.set_mode(Mode::Overlay));
        assert!(c.set_mode(Mode::TwoD));
        assert!(!c.set_mode(Mode::TwoD));
        assert_eq!(c.mode(), Mode::TwoD);
    }

    #[test]
    fn test_skinned_is_built_lazily_once() {
        let mut c = controller();
        assert!(c.skinned().is_none());
        c.set_mode(Mode::Skinned);
        assert!(c.skinned().unwrap().is_active());

        let mut rec = CommandRecorder::new(320.0, 240.0);
        let t0 = Instant::now();
        c.on_frame(pose_frame(), None, 0.0, &mut rec);
        c.tick_display(t0);
        let channels = c.skinned().unwrap().retargeter().smoother().len();
        assert!(channels > 0);

        c.set_mode(Mode::ThreeD);
        assert!(!c.skinned().unwrap().is_active());
        c.set_mode(Mode::Skinned);
        // 作り直されていれば平滑化チャンネルは空になる
        assert_eq!(c.skinned().unwrap().retargeter().smoother().len(), channels);
        c.tick_display(t0 + Duration::from_millis(16));
    }

    fn bone_rotations(c: &ModeController) -> Vec<Option<Vector3<f32>>> {
        let rig = c.skinned().unwrap().rig().unwrap();
        BoneName::ALL.iter().map(|&b| rig.bone_rotation(b)).collect()
    }

    #[test]
    fn test_display_tick_retargets_only_new_frames() {
        let mut c = controller();
        c.set_mode(Mode::Skinned);
        let mut rec = CommandRecorder::new(320.0, 240.0);
        let t0 = Instant::now();
        c.on_frame(pose_frame(), None, 0.0, &mut rec);
        c.tick_display(t0);
        let first = bone_rotations(&c);

        // 新着なし: 同じフレームで平滑化を進めない
        c.tick_display(t0 + Duration::from_millis(16));
        c.tick_display(t0 + Duration::from_millis(32));
        assert_eq!(bone_rotations(&c), first);

        c.on_frame(pose_frame(), None, 0.0, &mut rec);
        c.tick_display(t0 + Duration::from_millis(48));
        assert_ne!(bone_rotations(&c), first);
    }

    #[test]
    fn test_frames_while_inactive_apply_on_return() {
        let mut c = controller();
        c.set_mode(Mode::Skinned);
        c.set_mode(Mode::ThreeD);
        let mut rec = CommandRecorder::new(320.0, 240.0);
        let t0 = Instant::now();
        c.on_frame(pose_frame(), None, 0.0, &mut rec);
        c.tick_display(t0);
        assert!(c.skinned().unwrap().retargeter().smoother().is_empty());

        c.set_mode(Mode::Skinned);
        c.tick_display(t0 + Duration::from_millis(16));
        assert!(!c.skinned().unwrap().retargeter().smoother().is_empty());
    }

    #[test]
    fn test_frames_always_reach_mailbox() {
        let mut c = controller();
        let mut rec = CommandRecorder::new(320.0, 240.0);
        for mode in Mode::ALL {
            c.set_mode(mode);
            c.on_frame(pose_frame(), None, 0.0, &mut rec);
        }
        assert_eq!(c.mailbox().sequence(), 4);
    }

    #[test]
    fn test_renders_only_active_renderer() {
        let mut c = controller();
        c.set_mode(Mode::ThreeD);
        let mut rec = CommandRecorder::new(320.0, 240.0);
        c.on_frame(LandmarkFrame::default(), None, 0.0, &mut rec);
        // 3D は姿勢なしでも背景とグリッドを描く
        assert!(!rec.commands().is_empty());

        c.set_mode(Mode::Skinned);
        let mut rec = CommandRecorder::new(320.0, 240.0);
        c.on_frame(LandmarkFrame::default(), None, 0.0, &mut rec);
        assert!(rec.stroked_lines().is_empty());
    }

    #[test]
    fn test_style_and_model_controls() {
        let mut c = controller();
        c.apply(Control::SetStyle(StyleKind::Matrix));
        assert_eq!(c.style(), StyleKind::Matrix);

        // スキンアバターがまだなければ無視
        c.apply(Control::ScaleModel(2.0));
        c.apply(Control::SetMode(Mode::Skinned));
        c.apply(Control::ScaleModel(2.0));
        assert_eq!(c.skinned().unwrap().model_scale(), 2.0);
        c.apply(Control::ResetModel);
        assert_eq!(c.skinned().unwrap().model_scale(), 1.0);
    }

    #[test]
    fn test_from_config_rejects_unknown_style() {
        let mut config = Config::default();
        config.style.style = "vaporwave".to_string();
        let err = ModeController::from_config(&config).err().unwrap();
        assert_eq!(err.kind, "style");

        config.style.style = "ghost".to_string();
        config.style.mode = "skinned".to_string();
        let c = ModeController::from_config(&config).unwrap();
        assert_eq!(c.mode(), Mode::Skinned);
        assert!(c.skinned().is_some());
    }
}
