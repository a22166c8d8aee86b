use nalgebra::Vector3;
use std::collections::HashMap;

use crate::rig::{BoneName, Expression};

/// 平滑化チャンネルの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    BoneRotation(BoneName),
    BonePosition(BoneName),
    Expression(Expression),
    GazeYaw,
    GazePitch,
}

/// 不感帯付きの成分ごとEMA
///
/// 目標が非有限なら何もしない。前回値との差が不感帯未満なら更新しない。
/// それ以外は前回値から目標へ α で線形補間する。
pub struct ChannelSmoother {
    deadzone: f32,
    scalars: HashMap<ChannelKey, f32>,
    vectors: HashMap<ChannelKey, Vector3<f32>>,
}

fn step(prev: f32, target: f32, alpha: f32, deadzone: f32) -> f32 {
    if !target.is_finite() {
        return prev;
    }
    let delta = target - prev;
    if delta.abs() < deadzone {
        return prev;
    }
    prev + delta * alpha
}

fn sanitize_alpha(alpha: f32) -> f32 {
    if alpha.is_finite() {
        alpha.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl ChannelSmoother {
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone,
            scalars: HashMap::new(),
            vectors: HashMap::new(),
        }
    }

    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    /// スカラーチャンネルを更新して現在値を返す。初回の前回値は 0
    pub fn smooth(&mut self, key: ChannelKey, target: Option<f32>, alpha: f32) -> f32 {
        self.smooth_from(key, target, alpha, 0.0)
    }

    pub fn smooth_from(&mut self, key: ChannelKey, target: Option<f32>, alpha: f32, rest: f32) -> f32 {
        let alpha = sanitize_alpha(alpha);
        let deadzone = self.deadzone;
        let value = self.scalars.entry(key).or_insert(rest);
        if let Some(target) = target {
            *value = step(*value, target, alpha, deadzone);
        }
        *value
    }

    /// 3成分チャンネル (オイラー回転・位置)。初回の前回値はゼロベクトル
    pub fn smooth_vec3(
        &mut self,
        key: ChannelKey,
        target: Option<Vector3<f32>>,
        alpha: f32,
    ) -> Vector3<f32> {
        self.smooth_vec3_from(key, target, alpha, Vector3::zeros())
    }

    /// 各軸を独立に同じ α でフィルタする
    pub fn smooth_vec3_from(
        &mut self,
        key: ChannelKey,
        target: Option<Vector3<f32>>,
        alpha: f32,
        rest: Vector3<f32>,
    ) -> Vector3<f32> {
        let alpha = sanitize_alpha(alpha);
        let deadzone = self.deadzone;
        let value = self.vectors.entry(key).or_insert(rest);
        if let Some(target) = target {
            for axis in 0..3 {
                value[axis] = step(value[axis], target[axis], alpha, deadzone);
            }
        }
        *value
    }

    pub fn scalar(&self, key: ChannelKey) -> Option<f32> {
        self.scalars.get(&key).copied()
    }

    pub fn vec3(&self, key: ChannelKey) -> Option<Vector3<f32>> {
        self.vectors.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.scalars.len() + self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&mut self) {
        self.scalars.clear();
        self.vectors.clear();
    }
}
