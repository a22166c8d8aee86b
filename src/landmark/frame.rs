use serde::{Deserialize, Serialize};

use super::index::{FaceIndex, HandIndex, PoseIndex};

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 相対深度 (負ほどカメラに近い)
    #[serde(default)]
    pub z: f32,
    /// 信頼度 (0.0〜1.0)。顔・手には無い
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: Some(visibility),
        }
    }

    /// 信頼度。欠けている場合は `default` を使う
    pub fn visibility_or(&self, default: f32) -> f32 {
        self.visibility.unwrap_or(default)
    }

    /// 座標がすべて有限か。NaN・無限大を含む点は欠損と同じ扱い
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// 体ランドマーク列
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseLandmarks(pub Vec<Landmark>);

impl PoseLandmarks {
    /// 非有限な座標の点は `None`
    pub fn get(&self, index: PoseIndex) -> Option<&Landmark> {
        self.0.get(index as usize).filter(|lm| lm.is_finite())
    }

    /// 信頼度。点が無い、または値が無い場合は 0
    pub fn visibility(&self, index: PoseIndex) -> f32 {
        self.get(index).map_or(0.0, |lm| lm.visibility_or(0.0))
    }

    /// 有限な点だけ
    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter().filter(|lm| lm.is_finite())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 顔メッシュ (約468点、refine 時は478点)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceLandmarks(pub Vec<Landmark>);

impl FaceLandmarks {
    pub fn get(&self, index: FaceIndex) -> Option<&Landmark> {
        self.at(index as usize)
    }

    pub fn at(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index).filter(|lm| lm.is_finite())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

impl Handedness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// 手 1 つ分 (21点 + 左右ラベル)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub handedness: Handedness,
}

impl HandLandmarks {
    pub fn get(&self, index: HandIndex) -> Option<&Landmark> {
        self.at(index as usize)
    }

    pub fn at(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index).filter(|lm| lm.is_finite())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.landmarks.iter().filter(|lm| lm.is_finite())
    }
}

/// 1 映像フレーム分の推定結果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    #[serde(default)]
    pub pose: Option<PoseLandmarks>,
    /// メートル単位の3D姿勢。リギング専用
    #[serde(default)]
    pub pose_world: Option<PoseLandmarks>,
    #[serde(default)]
    pub faces: Vec<FaceLandmarks>,
    #[serde(default)]
    pub hands: Vec<HandLandmarks>,
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
}

impl LandmarkFrame {
    /// 空でない体ランドマーク
    pub fn pose(&self) -> Option<&PoseLandmarks> {
        self.pose.as_ref().filter(|p| !p.is_empty())
    }

    pub fn pose_world(&self) -> Option<&PoseLandmarks> {
        self.pose_world.as_ref().filter(|p| !p.is_empty())
    }

    /// 先頭の顔
    pub fn face(&self) -> Option<&FaceLandmarks> {
        self.faces.first().filter(|f| !f.is_empty())
    }

    pub fn hands(&self) -> impl Iterator<Item = &HandLandmarks> {
        self.hands.iter().filter(|h| !h.landmarks.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.pose().is_none() && self.face().is_none() && self.hands().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_defaults() {
        let lm = Landmark::new(0.5, 0.5, 0.0);
        assert_eq!(lm.visibility_or(1.0), 1.0);
        let lm = Landmark::with_visibility(0.5, 0.5, 0.0, 0.7);
        assert_eq!(lm.visibility_or(1.0), 0.7);
    }

    #[test]
    fn test_pose_short_array_is_safe() {
        let pose = PoseLandmarks(vec![Landmark::with_visibility(0.5, 0.3, 0.0, 0.9)]);
        assert!(pose.get(PoseIndex::Nose).is_some());
        assert!(pose.get(PoseIndex::LeftShoulder).is_none());
        assert_eq!(pose.visibility(PoseIndex::LeftShoulder), 0.0);
        assert_eq!(pose.visibility(PoseIndex::Nose), 0.9);
    }

    #[test]
    fn test_non_finite_points_are_missing() {
        let mut pts = vec![Landmark::with_visibility(0.5, 0.5, 0.0, 0.9); PoseIndex::COUNT];
        pts[PoseIndex::LeftWrist as usize].x = f32::INFINITY;
        pts[PoseIndex::RightWrist as usize].z = f32::NAN;
        let pose = PoseLandmarks(pts);
        assert!(pose.get(PoseIndex::LeftWrist).is_none());
        assert!(pose.get(PoseIndex::RightWrist).is_none());
        assert_eq!(pose.visibility(PoseIndex::LeftWrist), 0.0);
        assert_eq!(pose.iter().count(), PoseIndex::COUNT - 2);

        let hand = HandLandmarks {
            landmarks: vec![Landmark::new(f32::NAN, 0.5, 0.0), Landmark::new(0.5, 0.5, 0.0)],
            handedness: Handedness::Left,
        };
        assert!(hand.at(0).is_none());
        assert_eq!(hand.iter().count(), 1);

        let face = FaceLandmarks(vec![Landmark::new(0.5, f32::NEG_INFINITY, 0.0)]);
        assert!(face.at(0).is_none());
    }

    #[test]
    fn test_empty_groups_are_absent() {
        let frame = LandmarkFrame {
            pose: Some(PoseLandmarks(Vec::new())),
            faces: vec![FaceLandmarks(Vec::new())],
            ..Default::default()
        };
        assert!(frame.pose().is_none());
        assert!(frame.face().is_none());
        assert!(frame.is_empty());
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{"pose":[{"x":0.1,"y":0.2,"visibility":0.8}],"hands":[{"landmarks":[{"x":0.5,"y":0.5}],"handedness":"Left"}]}"#;
        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();
        let pose = frame.pose().unwrap();
        assert_eq!(pose.get(PoseIndex::Nose).unwrap().z, 0.0);
        assert_eq!(frame.hands[0].handedness, Handedness::Left);
        assert!(frame.faces.is_empty());
    }
}
