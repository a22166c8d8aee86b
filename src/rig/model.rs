use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{BoneName, Expression, HumanoidRig};
use crate::error::{ModelLoadError, Result};

/// 人型として最低限必要なボーン
pub const REQUIRED_BONES: [BoneName; 15] = [
    BoneName::Hips,
    BoneName::Spine,
    BoneName::Head,
    BoneName::LeftUpperArm,
    BoneName::LeftLowerArm,
    BoneName::LeftHand,
    BoneName::RightUpperArm,
    BoneName::RightLowerArm,
    BoneName::RightHand,
    BoneName::LeftUpperLeg,
    BoneName::LeftLowerLeg,
    BoneName::LeftFoot,
    BoneName::RightUpperLeg,
    BoneName::RightLowerLeg,
    BoneName::RightFoot,
];

/// 腰の初期ワールド位置
pub const HIPS_REST_POSITION: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// モデル記述ファイル (JSON)
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDescription {
    #[serde(default)]
    pub name: String,
    pub bones: Vec<String>,
    #[serde(default)]
    pub expressions: Vec<String>,
    #[serde(default)]
    pub look_at: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BoneState {
    rotation: Vector3<f32>,
    position: Vector3<f32>,
}

/// メモリ上の人型リグ
#[derive(Debug, Clone)]
pub struct Humanoid {
    name: String,
    bones: HashMap<BoneName, BoneState>,
    expressions: HashMap<Expression, f32>,
    look_at: Option<(f32, f32)>,
    root_rotation: f32,
    root_scale: f32,
    elapsed: f32,
}

impl Humanoid {
    pub fn from_description(desc: &ModelDescription) -> Result<Self> {
        let mut bones = HashMap::new();
        for name in &desc.bones {
            let bone: BoneName = name
                .parse()
                .map_err(ModelLoadError::UnknownBone)?;
            let position = if bone == BoneName::Hips {
                HIPS_REST_POSITION
            } else {
                Vector3::zeros()
            };
            bones.insert(
                bone,
                BoneState {
                    rotation: Vector3::zeros(),
                    position,
                },
            );
        }

        let missing: Vec<String> = REQUIRED_BONES
            .iter()
            .filter(|b| !bones.contains_key(b))
            .map(|b| b.as_str().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ModelLoadError::MissingBones(missing));
        }

        let mut expressions = HashMap::new();
        for name in &desc.expressions {
            let expr: Expression = name
                .parse()
                .map_err(ModelLoadError::UnknownExpression)?;
            expressions.insert(expr, 0.0);
        }

        Ok(Self {
            name: desc.name.clone(),
            bones,
            expressions,
            look_at: desc.look_at.then_some((0.0, 0.0)),
            root_rotation: 0.0,
            root_scale: 1.0,
            elapsed: 0.0,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let desc: ModelDescription = serde_json::from_str(json)?;
        Self::from_description(&desc)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// 全ボーン・表情・視線を持つモデル
    pub fn full() -> Self {
        let desc = ModelDescription {
            name: "full".to_string(),
            bones: BoneName::ALL.iter().map(|b| b.as_str().to_string()).collect(),
            expressions: Expression::ALL.iter().map(|e| e.as_str().to_string()).collect(),
            look_at: true,
        };
        // 全ボーンを含むので必須ボーン検査は必ず通る
        match Self::from_description(&desc) {
            Ok(model) => model,
            Err(_) => unreachable!("full humanoid always has required bones"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn look_at(&self) -> Option<(f32, f32)> {
        self.look_at
    }

    /// update で積算された経過時間 (秒)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }
}

impl HumanoidRig for Humanoid {
    fn has_bone(&self, bone: BoneName) -> bool {
        self.bones.contains_key(&bone)
    }

    fn bone_rotation(&self, bone: BoneName) -> Option<Vector3<f32>> {
        self.bones.get(&bone).map(|b| b.rotation)
    }

    fn set_bone_rotation(&mut self, bone: BoneName, rotation: Vector3<f32>) {
        if let Some(state) = self.bones.get_mut(&bone) {
            state.rotation = rotation;
        }
    }

    fn bone_position(&self, bone: BoneName) -> Option<Vector3<f32>> {
        self.bones.get(&bone).map(|b| b.position)
    }

    fn set_bone_position(&mut self, bone: BoneName, position: Vector3<f32>) {
        if let Some(state) = self.bones.get_mut(&bone) {
            state.position = position;
        }
    }

    fn supports_expression(&self, expression: Expression) -> bool {
        self.expressions.contains_key(&expression)
    }

    fn expression(&self, expression: Expression) -> Option<f32> {
        self.expressions.get(&expression).copied()
    }

    fn set_expression(&mut self, expression: Expression, weight: f32) {
        if let Some(w) = self.expressions.get_mut(&expression) {
            *w = weight.clamp(0.0, 1.0);
        }
    }

    fn has_look_at(&self) -> bool {
        self.look_at.is_some()
    }

    fn set_look_at(&mut self, yaw: f32, pitch: f32) {
        if self.look_at.is_some() {
            self.look_at = Some((yaw, pitch));
        }
    }

    fn set_root_rotation(&mut self, radians: f32) {
        self.root_rotation = radians;
    }

    fn root_rotation(&self) -> f32 {
        self.root_rotation
    }

    fn set_root_scale(&mut self, scale: f32) {
        self.root_scale = scale;
    }

    fn root_scale(&self) -> f32 {
        self.root_scale
    }

    fn update(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_json(extra: &str) -> String {
        let bones: Vec<String> = REQUIRED_BONES
            .iter()
            .map(|b| format!("\"{}\"", b.as_str()))
            .collect();
        format!(
            r#"{{"name":"test","bones":[{}{}],"expressions":["aa","blinkLeft"],"look_at":true}}"#,
            bones.join(","),
            extra
        )
    }

    #[test]
    fn test_load_minimal_model() {
        let model = Humanoid::from_json_str(&required_json("")).unwrap();
        assert_eq!(model.name(), "test");
        assert_eq!(model.bone_count(), REQUIRED_BONES.len());
        assert!(model.has_bone(BoneName::Hips));
        assert!(!model.has_bone(BoneName::LeftShoulder));
        assert_eq!(model.bone_position(BoneName::Hips), Some(HIPS_REST_POSITION));
        assert!(model.supports_expression(Expression::Aa));
        assert!(!model.supports_expression(Expression::Oh));
        assert!(model.has_look_at());
    }

    #[test]
    fn test_missing_required_bones() {
        let err = Humanoid::from_json_str(r#"{"bones":["hips","spine"]}"#).unwrap_err();
        match err {
            ModelLoadError::MissingBones(missing) => {
                assert!(missing.contains(&"head".to_string()));
                assert!(!missing.contains(&"hips".to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_bone_is_rejected() {
        let err = Humanoid::from_json_str(&required_json(",\"tail\"")).unwrap_err();
        assert!(matches!(err, ModelLoadError::UnknownBone(ref n) if n == "tail"));
    }

    #[test]
    fn test_parse_error_is_descriptive() {
        let err = Humanoid::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ModelLoadError::Parse(_)));
        assert!(err.to_string().contains("not a valid humanoid description"));
    }

    #[test]
    fn test_missing_file() {
        let err = Humanoid::load("no/such/model.json").unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }

    #[test]
    fn test_writes_to_absent_bones_are_ignored() {
        let mut model = Humanoid::from_json_str(&required_json("")).unwrap();
        model.set_bone_rotation(BoneName::LeftShoulder, Vector3::new(1.0, 0.0, 0.0));
        assert!(model.bone_rotation(BoneName::LeftShoulder).is_none());
        model.set_expression(Expression::Oh, 1.0);
        assert!(model.expression(Expression::Oh).is_none());
    }

    #[test]
    fn test_full_model() {
        let model = Humanoid::full();
        assert_eq!(model.bone_count(), BoneName::ALL.len());
        for expr in Expression::ALL {
            assert!(model.supports_expression(expr));
        }
    }

    #[test]
    fn test_update_accumulates_time() {
        let mut model = Humanoid::full();
        model.update(0.016);
        model.update(f32::NAN);
        model.update(0.016);
        assert!((model.elapsed() - 0.032).abs() < 1e-6);
    }
}
