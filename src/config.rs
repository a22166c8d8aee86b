use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::geometry::{DEFAULT_DEPTH_SCALE, DEFAULT_FOV, VISIBILITY_FLOOR};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub gating: GateConfig,
    #[serde(default)]
    pub smoothing: SmoothConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub style: StyleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    /// 左右反転表示
    #[serde(default)]
    pub mirror: bool,
    /// 表示ループの目標FPS
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// スナップショット保存先
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

fn default_width() -> usize { 1280 }
fn default_height() -> usize { 720 }
fn default_target_fps() -> u32 { 60 }
fn default_snapshot_dir() -> String { "snapshots".to_string() }

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            mirror: false,
            target_fps: default_target_fps(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ProjectionConfig {
    /// 透視投影の視距離定数
    #[serde(default = "default_fov")]
    pub fov: f32,
    /// ランドマークzに掛ける倍率
    #[serde(default = "default_depth_scale")]
    pub depth_scale: f32,
}

fn default_fov() -> f32 { DEFAULT_FOV }
fn default_depth_scale() -> f32 { DEFAULT_DEPTH_SCALE }

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            depth_scale: default_depth_scale(),
        }
    }
}

/// 信頼度ゲートと不感帯
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct GateConfig {
    /// 描画時に線分を捨てる信頼度の下限
    #[serde(default = "default_visibility_floor")]
    pub visibility_floor: f32,
    /// 肩・腰
    #[serde(default = "default_proximal")]
    pub proximal: f32,
    /// 肘・膝
    #[serde(default = "default_middle")]
    pub middle: f32,
    /// 手首・足首
    #[serde(default = "default_distal")]
    pub distal: f32,
    /// 平滑化の不感帯 (回転はラジアン)
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,
}

fn default_visibility_floor() -> f32 { VISIBILITY_FLOOR }
fn default_proximal() -> f32 { 0.5 }
fn default_middle() -> f32 { 0.4 }
fn default_distal() -> f32 { 0.3 }
fn default_deadzone() -> f32 { 0.001 }

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            visibility_floor: default_visibility_floor(),
            proximal: default_proximal(),
            middle: default_middle(),
            distal: default_distal(),
            deadzone: default_deadzone(),
        }
    }
}

/// チャンネル種別ごとの追従係数 α (大きいほど速く追従)
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SmoothConfig {
    #[serde(default = "default_head")]
    pub head: f32,
    #[serde(default = "default_gaze")]
    pub gaze: f32,
    #[serde(default = "default_expression")]
    pub expression: f32,
    #[serde(default = "default_hips_position")]
    pub hips_position: f32,
    #[serde(default = "default_hips_rotation")]
    pub hips_rotation: f32,
    #[serde(default = "default_torso")]
    pub torso: f32,
    #[serde(default = "default_limb")]
    pub limb: f32,
    #[serde(default = "default_hand")]
    pub hand: f32,
    #[serde(default = "default_finger")]
    pub finger: f32,
}

fn default_head() -> f32 { 0.25 }
fn default_gaze() -> f32 { 0.08 }
fn default_expression() -> f32 { 0.2 }
fn default_hips_position() -> f32 { 0.08 }
fn default_hips_rotation() -> f32 { 0.07 }
fn default_torso() -> f32 { 0.12 }
fn default_limb() -> f32 { 0.18 }
fn default_hand() -> f32 { 0.15 }
fn default_finger() -> f32 { 0.25 }

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            head: default_head(),
            gaze: default_gaze(),
            expression: default_expression(),
            hips_position: default_hips_position(),
            hips_rotation: default_hips_rotation(),
            torso: default_torso(),
            limb: default_limb(),
            hand: default_hand(),
            finger: default_finger(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayConfig {
    /// 記録済みランドマーク (JSON Lines)
    #[serde(default = "default_replay_path")]
    pub path: String,
    /// 配信レート。推定モデルの処理レート相当
    #[serde(default = "default_replay_fps")]
    pub fps: f32,
    #[serde(default = "default_replay_loop")]
    pub looping: bool,
}

fn default_replay_path() -> String { "landmarks.jsonl".to_string() }
fn default_replay_fps() -> f32 { 30.0 }
fn default_replay_loop() -> bool { true }

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: default_replay_path(),
            fps: default_replay_fps(),
            looping: default_replay_loop(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// 人型モデル記述ファイル
    #[serde(default)]
    pub path: Option<String>,
    /// Y軸回転 (度)。180でカメラ正面
    #[serde(default = "default_rotation_deg")]
    pub rotation_deg: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// ソルバーに渡す映像サイズのヒント
    #[serde(default = "default_video_width")]
    pub video_width: u32,
    #[serde(default = "default_video_height")]
    pub video_height: u32,
}

fn default_rotation_deg() -> f32 { 180.0 }
fn default_scale() -> f32 { 1.0 }
fn default_video_width() -> u32 { 1280 }
fn default_video_height() -> u32 { 720 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            rotation_deg: default_rotation_deg(),
            scale: default_scale(),
            video_width: default_video_width(),
            video_height: default_video_height(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StyleConfig {
    /// 起動時のモード ("overlay", "2d", "3d", "skinned")
    #[serde(default = "default_mode")]
    pub mode: String,
    /// 起動時の3Dスタイル ("neon", "ghost", "robot", "matrix", "synthwave")
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_mode() -> String { "overlay".to_string() }
fn default_style() -> String { "neon".to_string() }

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            style: default_style(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// 読めなければデフォルト設定で起動する
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("config fallback to defaults: {:#}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.view.width, 1280);
        assert_eq!(config.gating.visibility_floor, 0.3);
        assert_eq!(config.gating.proximal, 0.5);
        assert_eq!(config.gating.middle, 0.4);
        assert_eq!(config.gating.distal, 0.3);
        assert_eq!(config.gating.deadzone, 0.001);
        assert_eq!(config.smoothing.limb, 0.18);
        assert_eq!(config.style.mode, "overlay");
    }

    #[test]
    fn test_partial_section_override() {
        let toml_str = r#"
            [smoothing]
            head = 0.5

            [gating]
            deadzone = 0.01
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.smoothing.head, 0.5);
        assert_eq!(config.smoothing.gaze, 0.08);
        assert_eq!(config.gating.deadzone, 0.01);
        assert_eq!(config.gating.proximal, 0.5);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.projection.fov, 900.0);
        assert_eq!(config.model.rotation_deg, 180.0);
    }
}
