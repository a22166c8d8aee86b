use anyhow::Result;
use nalgebra::{Vector2, Vector3};
use std::collections::BTreeMap;

use super::BoneName;
use crate::landmark::{FaceLandmarks, HandLandmarks, Handedness, PoseLandmarks};

/// ソルバーに渡す映像サイズのヒント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl Default for VideoSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// 目の開き (1 = 全開)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeOpenness {
    pub left: f32,
    pub right: f32,
}

/// 母音の口形ウェイト
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouthShape {
    pub a: f32,
    pub i: f32,
    pub u: f32,
    pub e: f32,
    pub o: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FaceRig {
    /// 頭部回転 (オイラー角, ラジアン)
    pub head: Vector3<f32>,
    /// 瞳の正規化オフセット (-1..1)
    pub pupil: Option<Vector2<f32>>,
    pub eye: Option<EyeOpenness>,
    pub mouth: Option<MouthShape>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HipsRig {
    /// 腰のワールド位置 (メートル)
    pub position: Option<Vector3<f32>>,
    pub rotation: Option<Vector3<f32>>,
}

/// 体のリグ結果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PoseRig {
    pub hips: Option<HipsRig>,
    /// 腰以外のボーン回転
    pub rotations: BTreeMap<BoneName, Vector3<f32>>,
}

impl PoseRig {
    pub fn rotation(&self, bone: BoneName) -> Option<Vector3<f32>> {
        self.rotations.get(&bone).copied()
    }
}

/// 手のリグ結果
///
/// 関節名はソルバー側の命名 ("RightWrist", "LeftIndexProximal" など)。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandRig {
    pub joints: Vec<(String, Vector3<f32>)>,
}

/// ランドマークからボーン回転を推定する外部ソルバー
///
/// 結果が無い場合は `Ok(None)`。エラーも呼び出し側では「今フレームは更新なし」として扱う。
pub trait RigSolver {
    fn solve_face(&self, face: &FaceLandmarks, video: VideoSize) -> Result<Option<FaceRig>>;

    /// `world` はメートル単位の3D姿勢 (無ければ画像座標の姿勢が渡される)
    fn solve_pose(
        &self,
        world: &PoseLandmarks,
        image: &PoseLandmarks,
        video: VideoSize,
    ) -> Result<Option<PoseRig>>;

    fn solve_hand(&self, hand: &HandLandmarks, side: Handedness) -> Result<Option<HandRig>>;
}
