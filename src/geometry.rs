//! 正規化ランドマーク座標から画面座標への変換
//!
//! 状態を持たない純関数のみ。

use crate::landmark::Landmark;

/// これ未満の信頼度の点を端点に持つ線分は描かない
pub const VISIBILITY_FLOOR: f32 = 0.3;
/// 透視投影の視距離定数
pub const DEFAULT_FOV: f32 = 900.0;
/// ランドマークzのピクセル換算倍率
pub const DEFAULT_DEPTH_SCALE: f32 = 300.0;

/// ピクセル空間の点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// 信頼度 (欠けていれば 1)
    pub v: f32,
}

impl ScreenPoint {
    pub fn distance(&self, other: &ScreenPoint) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// 透視投影後の点と奥行きスケール
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    /// 1より大きいほど手前
    pub scale: f32,
}

pub fn to_screen(lm: &Landmark, width: f32, height: f32) -> ScreenPoint {
    ScreenPoint {
        x: lm.x * width,
        y: lm.y * height,
        z: lm.z,
        v: lm.visibility_or(1.0),
    }
}

/// 簡易透視投影
///
/// s = fov / (fov + z * depth_scale)。zが負 (手前) ほど s が大きくなる。
pub fn project_perspective(
    lm: &Landmark,
    width: f32,
    height: f32,
    fov: f32,
    depth_scale: f32,
) -> Projected {
    let z = lm.z * depth_scale;
    // 視点を越える深度で符号が反転しないよう下限を設ける
    let denom = (fov + z).max(fov * 0.1);
    let s = fov / denom;
    Projected {
        x: (lm.x - 0.5) * width * s + width / 2.0,
        y: (lm.y - 0.5) * height * s + height / 2.0,
        scale: s,
    }
}

/// 深度を色ランプ用に 0..1 へ正規化
pub fn depth_norm(z: f32) -> f32 {
    ((z + 0.3) / 0.6).clamp(0.0, 1.0)
}

/// 目の開き具合 (縦幅 / 横幅 を 4.5 倍して 1 で頭打ち)
pub fn eye_openness(vertical: f32, horizontal: f32) -> f32 {
    if horizontal > 0.0 {
        (vertical / horizontal * 4.5).min(1.0)
    } else {
        1.0
    }
}

/// 両端点が描画可能な信頼度か
pub fn segment_visible(a: &Landmark, b: &Landmark, floor: f32, missing: f32) -> bool {
    a.visibility_or(missing) >= floor && b.visibility_or(missing) >= floor
}
