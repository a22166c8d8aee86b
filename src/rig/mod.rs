//! スキンメッシュ人型モデルとリグソルバーとの境界

pub mod geometric;
pub mod model;
pub mod solver;

use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;

pub use geometric::GeometricSolver;
pub use model::{Humanoid, ModelDescription, REQUIRED_BONES};
pub use solver::{EyeOpenness, FaceRig, HandRig, HipsRig, MouthShape, PoseRig, RigSolver, VideoSize};

macro_rules! humanoid_bones {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// 人型ボーン名 (VRM humanoid の命名)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum BoneName {
            $($variant),+
        }

        impl BoneName {
            pub const ALL: &'static [BoneName] = &[$(BoneName::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(BoneName::$variant => $name),+
                }
            }
        }

        impl FromStr for BoneName {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(BoneName::$variant),)+
                    _ => Err(s.to_string()),
                }
            }
        }
    };
}

humanoid_bones! {
    Hips => "hips",
    Spine => "spine",
    Chest => "chest",
    UpperChest => "upperChest",
    Neck => "neck",
    Head => "head",
    LeftEye => "leftEye",
    RightEye => "rightEye",
    Jaw => "jaw",
    LeftUpperLeg => "leftUpperLeg",
    LeftLowerLeg => "leftLowerLeg",
    LeftFoot => "leftFoot",
    LeftToes => "leftToes",
    RightUpperLeg => "rightUpperLeg",
    RightLowerLeg => "rightLowerLeg",
    RightFoot => "rightFoot",
    RightToes => "rightToes",
    LeftShoulder => "leftShoulder",
    LeftUpperArm => "leftUpperArm",
    LeftLowerArm => "leftLowerArm",
    LeftHand => "leftHand",
    RightShoulder => "rightShoulder",
    RightUpperArm => "rightUpperArm",
    RightLowerArm => "rightLowerArm",
    RightHand => "rightHand",
    LeftThumbProximal => "leftThumbProximal",
    LeftThumbIntermediate => "leftThumbIntermediate",
    LeftThumbDistal => "leftThumbDistal",
    LeftIndexProximal => "leftIndexProximal",
    LeftIndexIntermediate => "leftIndexIntermediate",
    LeftIndexDistal => "leftIndexDistal",
    LeftMiddleProximal => "leftMiddleProximal",
    LeftMiddleIntermediate => "leftMiddleIntermediate",
    LeftMiddleDistal => "leftMiddleDistal",
    LeftRingProximal => "leftRingProximal",
    LeftRingIntermediate => "leftRingIntermediate",
    LeftRingDistal => "leftRingDistal",
    LeftLittleProximal => "leftLittleProximal",
    LeftLittleIntermediate => "leftLittleIntermediate",
    LeftLittleDistal => "leftLittleDistal",
    RightThumbProximal => "rightThumbProximal",
    RightThumbIntermediate => "rightThumbIntermediate",
    RightThumbDistal => "rightThumbDistal",
    RightIndexProximal => "rightIndexProximal",
    RightIndexIntermediate => "rightIndexIntermediate",
    RightIndexDistal => "rightIndexDistal",
    RightMiddleProximal => "rightMiddleProximal",
    RightMiddleIntermediate => "rightMiddleIntermediate",
    RightMiddleDistal => "rightMiddleDistal",
    RightRingProximal => "rightRingProximal",
    RightRingIntermediate => "rightRingIntermediate",
    RightRingDistal => "rightRingDistal",
    RightLittleProximal => "rightLittleProximal",
    RightLittleIntermediate => "rightLittleIntermediate",
    RightLittleDistal => "rightLittleDistal",
}

impl BoneName {
    /// 手首 (手全体の根元) か
    pub fn is_hand_root(&self) -> bool {
        matches!(self, Self::LeftHand | Self::RightHand)
    }
}

impl fmt::Display for BoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 表情ブレンドシェイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expression {
    Aa,
    Ih,
    Ou,
    Ee,
    Oh,
    Blink,
    BlinkLeft,
    BlinkRight,
}

impl Expression {
    pub const ALL: [Expression; 8] = [
        Self::Aa,
        Self::Ih,
        Self::Ou,
        Self::Ee,
        Self::Oh,
        Self::Blink,
        Self::BlinkLeft,
        Self::BlinkRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aa => "aa",
            Self::Ih => "ih",
            Self::Ou => "ou",
            Self::Ee => "ee",
            Self::Oh => "oh",
            Self::Blink => "blink",
            Self::BlinkLeft => "blinkLeft",
            Self::BlinkRight => "blinkRight",
        }
    }
}

impl FromStr for Expression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// スキンメッシュ人型モデル (シーングラフ側が所有)
///
/// 回転はオイラー角 (XYZ, ラジアン)。ボーンの生成・破棄はしない。
pub trait HumanoidRig {
    fn has_bone(&self, bone: BoneName) -> bool;
    fn bone_rotation(&self, bone: BoneName) -> Option<Vector3<f32>>;
    fn set_bone_rotation(&mut self, bone: BoneName, rotation: Vector3<f32>);
    fn bone_position(&self, bone: BoneName) -> Option<Vector3<f32>>;
    fn set_bone_position(&mut self, bone: BoneName, position: Vector3<f32>);

    fn supports_expression(&self, expression: Expression) -> bool;
    fn expression(&self, expression: Expression) -> Option<f32>;
    fn set_expression(&mut self, expression: Expression, weight: f32);

    fn has_look_at(&self) -> bool;
    /// 視線 (度)
    fn set_look_at(&mut self, yaw: f32, pitch: f32);

    /// モデル全体のY軸回転 (ラジアン)
    fn set_root_rotation(&mut self, radians: f32);
    fn root_rotation(&self) -> f32;
    fn set_root_scale(&mut self, scale: f32);
    fn root_scale(&self) -> f32;

    /// 表示フレームごとのアニメーション更新
    fn update(&mut self, dt: f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_name_round_trip() {
        for bone in BoneName::ALL {
            assert_eq!(bone.as_str().parse::<BoneName>(), Ok(*bone));
        }
        assert_eq!(BoneName::ALL.len(), 55);
    }

    #[test]
    fn test_unknown_bone_name() {
        assert_eq!("leftWrist".parse::<BoneName>(), Err("leftWrist".to_string()));
    }

    #[test]
    fn test_expression_names() {
        assert_eq!("blinkLeft".parse::<Expression>(), Ok(Expression::BlinkLeft));
        assert_eq!("aa".parse::<Expression>(), Ok(Expression::Aa));
        assert!("smile".parse::<Expression>().is_err());
    }
}
